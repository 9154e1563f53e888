/*!
The [`Setup`] type.
*/

use std::sync::Arc;

use quill_core::{Level, Sink};
use quill_file::FileSetBuilder;
use quill_term::Console;
use time::UtcOffset;

use crate::{
    config::Config,
    dispatch::{self, Sinks},
    internal_metrics::InternalMetrics,
    Error, Logger,
};

/**
Configure a [`Logger`].

Use [`crate::setup`] or [`Setup::from_config`] to begin a [`Setup`], then call [`Setup::spawn`] to complete it.
*/
pub struct Setup {
    min_level: Level,
    console: Option<Console>,
    file: Option<FileSetBuilder>,
    extra: Vec<Box<dyn Sink + Send + Sync>>,
    utc_offset: Option<UtcOffset>,
}

impl Default for Setup {
    fn default() -> Self {
        Self::new()
    }
}

impl Setup {
    /**
    Create a setup with no sinks, discarding records below [`Level::Error`].
    */
    pub fn new() -> Self {
        Setup {
            min_level: Level::default(),
            console: None,
            file: None,
            extra: Vec::new(),
            utc_offset: None,
        }
    }

    /**
    Create a setup from loaded configuration.
    */
    pub fn from_config(config: &Config) -> Self {
        let mut setup = Setup::new().min_level(config.min_level);

        if config.to_console {
            setup = setup.to_console(quill_term::stdout());
        }

        if config.to_file {
            setup = setup.to_file(
                quill_file::set(&config.dir)
                    .max_files(config.max_files)
                    .max_file_size_bytes(config.max_file_size_bytes),
            );
        }

        setup
    }

    /**
    Discard records below `min_level`.
    */
    pub fn min_level(mut self, min_level: Level) -> Self {
        self.min_level = min_level;
        self
    }

    /**
    Write records to the console.
    */
    pub fn to_console(mut self, console: Console) -> Self {
        self.console = Some(console);
        self
    }

    /**
    Write records to a set of rolling log files.

    The file set is opened when the logger is spawned.
    */
    pub fn to_file(mut self, file: FileSetBuilder) -> Self {
        self.file = Some(file);
        self
    }

    /**
    Also write records to `sink`.

    Additional sinks are called after the console and file sinks, in the order they were added.
    */
    pub fn emit_to(mut self, sink: impl Sink + Send + Sync + 'static) -> Self {
        self.extra.push(Box::new(sink));
        self
    }

    /**
    The offset to render timestamps with.

    By default, the local offset is used if it can be determined when the logger is spawned, and UTC otherwise.
    */
    pub fn utc_offset(mut self, offset: UtcOffset) -> Self {
        self.utc_offset = Some(offset);
        self
    }

    /**
    Complete the setup, opening any files and starting the background thread that writes to sinks.
    */
    #[must_use = "dropping the logger immediately shuts it down"]
    pub fn spawn(self) -> Result<Logger, Error> {
        let utc_offset = self
            .utc_offset
            .unwrap_or_else(|| UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC));

        let file = match self.file {
            Some(file) => Some(Arc::new(file.utc_offset(utc_offset).open()?)),
            None => None,
        };

        let metrics = Arc::new(InternalMetrics::default());

        let (sender, receiver) = quill_queue::unbounded();

        let handle = dispatch::spawn(
            receiver,
            Sinks {
                console: self.console,
                file: file.clone(),
                extra: self.extra,
            },
            metrics.clone(),
        )?;

        Ok(Logger::new(
            self.min_level,
            utc_offset,
            sender,
            handle,
            file,
            metrics,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_config_without_sinks() {
        let logger = Setup::from_config(&Config::default()).spawn().unwrap();

        assert_eq!(Level::Error, logger.min_level());
        assert!(logger.file_set().is_none());
    }

    #[test]
    fn from_config_opens_files() {
        let dir = tempfile::tempdir().unwrap();

        let config = Config {
            min_level: Level::Info,
            dir: dir.path().join("log"),
            to_file: true,
            ..Default::default()
        };

        let logger = Setup::from_config(&config).spawn().unwrap();

        assert_eq!(Level::Info, logger.min_level());
        assert_eq!(
            Some(dir.path().join("log").as_path()),
            logger.file_set().map(|files| files.dir())
        );
        assert_eq!(1, logger.file_set().unwrap().files().len());
    }

    #[test]
    fn spawn_fails_if_files_cant_be_opened() {
        let dir = tempfile::tempdir().unwrap();
        let not_a_dir = dir.path().join("file");

        std::fs::write(&not_a_dir, "").unwrap();

        assert!(crate::setup()
            .to_file(quill_file::set(not_a_dir.join("log")))
            .spawn()
            .is_err());
    }
}
