/*!
Configuration loaded from a `KEY=VALUE` file.

```text
# Minimum level to write
LOG_LEVEL=INFO
LOG_FILES_MAX=10
LOG_FILE_SIZE_MAX=10485760
LOG_DIR_PATH=log
LOG_TO_CONSOLE=TRUE
LOG_TO_FILE=TRUE
```

Each line is split at its first `=`, and the key and value are trimmed of surrounding whitespace. Blank lines, lines starting with `#`, lines without an `=`, and unknown keys are ignored.

Configuration is forgiving: a missing file, or a value that can't be understood, falls back to a default rather than failing.
*/

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use quill_core::{internal_warn, Level};

/**
Configuration for a [`Logger`](crate::Logger).
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /**
    Records below this level are discarded.

    Set by `LOG_LEVEL` to one of `DEBUG`, `NEED`, `INFO`, `WARN`, `ERROR`, or `FATAL`, ignoring case. Any other value keeps the current level. Defaults to `ERROR`.
    */
    pub min_level: Level,
    /**
    The maximum number of log files to keep.

    Set by `LOG_FILES_MAX`. Defaults to `10`.
    */
    pub max_files: usize,
    /**
    The size of a log file that causes writes to roll over to a new one.

    Set by `LOG_FILE_SIZE_MAX`. Defaults to 10MiB.
    */
    pub max_file_size_bytes: u64,
    /**
    The directory to write log files to.

    Set by `LOG_DIR_PATH`. Defaults to `log`.
    */
    pub dir: PathBuf,
    /**
    Whether to write records to the console.

    Set by `LOG_TO_CONSOLE`. Only the value `TRUE` enables it. Defaults to disabled.
    */
    pub to_console: bool,
    /**
    Whether to write records to log files.

    Set by `LOG_TO_FILE`. Only the value `TRUE` enables it. Defaults to disabled.
    */
    pub to_file: bool,
}

const DEFAULT_MAX_FILES: usize = quill_file::DEFAULT_MAX_FILES;
const DEFAULT_MAX_FILE_SIZE_BYTES: u64 = quill_file::DEFAULT_MAX_FILE_SIZE_BYTES;
const DEFAULT_DIR: &str = "log";

impl Default for Config {
    fn default() -> Self {
        Config {
            min_level: Level::Error,
            max_files: DEFAULT_MAX_FILES,
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_BYTES,
            dir: PathBuf::from(DEFAULT_DIR),
            to_console: false,
            to_file: false,
        }
    }
}

impl Config {
    /**
    The path configuration is conventionally loaded from, relative to the working directory.
    */
    pub const DEFAULT_PATH: &'static str = "config/log_config.conf";

    /**
    Load configuration from the file at `path`.

    This never fails. If the file doesn't exist then the defaults are used. If it exists but can't be read then the failure is reported on the [internal](quill_core::internal) channel and the defaults are used.
    */
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();

        match fs::read_to_string(path) {
            Ok(contents) => Config::parse(&contents),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Config::default(),
            Err(err) => {
                internal_warn!(
                    "failed to read configuration from {}: {}; using defaults",
                    path.display(),
                    err
                );

                Config::default()
            }
        }
    }

    /**
    Parse configuration from the contents of a file.
    */
    pub fn parse(contents: &str) -> Self {
        let mut config = Config::default();

        for line in contents.lines() {
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                continue;
            };

            config.set(key.trim(), value.trim());
        }

        config
    }

    fn set(&mut self, key: &str, value: &str) {
        match key {
            "LOG_LEVEL" => {
                // Full names only, unlike `Level::from_str`
                if let Some(level) = Level::ALL
                    .into_iter()
                    .find(|level| level.as_str().eq_ignore_ascii_case(value))
                {
                    self.min_level = level;
                }
            }
            "LOG_FILES_MAX" => {
                self.max_files = value.parse().unwrap_or(DEFAULT_MAX_FILES);
            }
            "LOG_FILE_SIZE_MAX" => {
                self.max_file_size_bytes = value.parse().unwrap_or(DEFAULT_MAX_FILE_SIZE_BYTES);
            }
            "LOG_DIR_PATH" => {
                self.dir = PathBuf::from(value);
            }
            "LOG_TO_CONSOLE" => {
                self.to_console = value == "TRUE";
            }
            "LOG_TO_FILE" => {
                self.to_file = value == "TRUE";
            }
            _ => (),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();

        assert_eq!(Level::Error, config.min_level);
        assert_eq!(10, config.max_files);
        assert_eq!(10 * 1024 * 1024, config.max_file_size_bytes);
        assert_eq!(Path::new("log"), config.dir);
        assert!(!config.to_console);
        assert!(!config.to_file);
    }

    #[test]
    fn parse_all_keys() {
        let config = Config::parse(
            "
            # A comment
            LOG_LEVEL = info

            LOG_FILES_MAX=2
            LOG_FILE_SIZE_MAX = 100
            LOG_DIR_PATH= /var/log/app
            LOG_TO_CONSOLE=TRUE
            LOG_TO_FILE=TRUE
            ",
        );

        assert_eq!(
            Config {
                min_level: Level::Info,
                max_files: 2,
                max_file_size_bytes: 100,
                dir: PathBuf::from("/var/log/app"),
                to_console: true,
                to_file: true,
            },
            config
        );
    }

    #[test]
    fn level_names_are_case_insensitive() {
        for (value, expected) in [
            ("DEBUG", Level::Debug),
            ("need", Level::Need),
            ("Info", Level::Info),
            ("WARN", Level::Warn),
            ("error", Level::Error),
            ("FATAL", Level::Fatal),
        ] {
            let config = Config::parse(&format!("LOG_LEVEL={}", value));

            assert_eq!(expected, config.min_level, "{}", value);
        }
    }

    #[test]
    fn unknown_level_keeps_the_current_value() {
        let config = Config::parse("LOG_LEVEL=WARN\nLOG_LEVEL=LOUD");

        assert_eq!(Level::Warn, config.min_level);
    }

    #[test]
    fn abbreviated_level_names_keep_the_current_value() {
        for value in ["E", "inf", "dbg", "ERR", "WARNING", "INFORMATION", ""] {
            let config = Config::parse(&format!("LOG_LEVEL=NEED\nLOG_LEVEL={}", value));

            assert_eq!(Level::Need, config.min_level, "{}", value);
        }
    }

    #[test]
    fn malformed_numbers_use_defaults() {
        let config = Config::parse(
            "LOG_FILES_MAX=3\nLOG_FILES_MAX=-1\nLOG_FILE_SIZE_MAX=10k",
        );

        assert_eq!(10, config.max_files);
        assert_eq!(10 * 1024 * 1024, config.max_file_size_bytes);
    }

    #[test]
    fn flags_are_only_enabled_by_true() {
        for value in ["true", "1", "yes", "", "TRUE!"] {
            let config = Config::parse(&format!("LOG_TO_CONSOLE=TRUE\nLOG_TO_CONSOLE={}", value));

            assert!(!config.to_console, "{}", value);
        }
    }

    #[test]
    fn value_is_split_at_the_first_equals() {
        let config = Config::parse("LOG_DIR_PATH=logs/a=b\nNOT_A_PAIR\nUNKNOWN=1");

        assert_eq!(Path::new("logs/a=b"), config.dir);
    }

    #[test]
    fn load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();

        assert_eq!(
            Config::default(),
            Config::load(dir.path().join("missing.conf"))
        );
    }

    #[test]
    fn load_reads_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log_config.conf");

        fs::write(&path, "LOG_LEVEL=DEBUG\nLOG_TO_FILE=TRUE\n").unwrap();

        let config = Config::load(&path);

        assert_eq!(Level::Debug, config.min_level);
        assert!(config.to_file);
    }

    #[test]
    fn load_unreadable_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();

        // A directory can't be read as a file
        assert_eq!(Config::default(), Config::load(dir.path()));
    }
}
