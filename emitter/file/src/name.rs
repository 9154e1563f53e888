/*!
Naming of log files and archives.

Log files are named:

```text
{millis}_{date}.log
```

where:

- `millis`: The 13-digit number of milliseconds since the Unix epoch when the file was created. This is the file's key in the index, and what orders files from oldest to newest.
- `date`: The local date and time the file was created, formatted as `YYYY-MM-DD-HH-MM-SS`.

For example:

```text
1716778800123_2024-05-27-03-00-00.log
```

Archives are named after the time range they cover, using the digits of the `date` portion of the archived file and the file that followed it:

```text
20240527030000-20240527041512.tar.gz
```

If that name is already taken, a counter is added before the extension, like `20240527030000-20240527041512.1.tar.gz`.
*/

use std::sync::OnceLock;

use regex::Regex;
use time::{OffsetDateTime, UtcOffset};

/**
The extension of log files.
*/
pub const FILE_EXT: &str = "log";

/**
The extension of archives.
*/
pub const ARCHIVE_EXT: &str = "tar.gz";

fn file_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();

    PATTERN.get_or_init(|| {
        Regex::new(r"^(\d{13})_\d{4}-\d{2}-\d{2}-\d{2}-\d{2}-\d{2}\.log$")
            .expect("the file name pattern is valid")
    })
}

/**
Build the name of a log file created at `millis` since the Unix epoch.

The date portion is rendered in `offset`.
*/
pub fn file_name(millis: u64, offset: UtcOffset) -> String {
    let ts = OffsetDateTime::from_unix_timestamp_nanos(millis as i128 * 1_000_000)
        .unwrap_or(OffsetDateTime::UNIX_EPOCH);
    let local = ts.checked_to_offset(offset).unwrap_or(ts);

    format!(
        "{:>013}_{:>04}-{:>02}-{:>02}-{:>02}-{:>02}-{:>02}.{}",
        millis,
        local.year(),
        u8::from(local.month()),
        local.day(),
        local.hour(),
        local.minute(),
        local.second(),
        FILE_EXT,
    )
}

/**
Get the key of a log file from its name.

Returns `None` if the name doesn't match the log file naming scheme.
*/
pub fn parse_file_name(file_name: &str) -> Option<u64> {
    let captures = file_name_pattern().captures(file_name)?;

    captures.get(1)?.as_str().parse().ok()
}

/**
Get the digits of the date portion of a log file name.

The date portion is everything between the first `_` and the last `.`. For `1716778800123_2024-05-27-03-00-00.log` this is `20240527030000`.

Returns `None` if either delimiter is missing or the date portion is empty.
*/
pub fn file_time_digits(file_name: &str) -> Option<String> {
    let start = file_name.find('_')?;
    let end = file_name.rfind('.')?;

    if end <= start {
        return None;
    }

    let digits: String = file_name[start + 1..end]
        .chars()
        .filter(|c| *c != '-')
        .collect();

    if digits.is_empty() {
        None
    } else {
        Some(digits)
    }
}

/**
Get the label of an archive covering the time from `oldest` up to `next`.

Both arguments are log file names.
*/
pub fn archive_label(oldest: &str, next: &str) -> Option<String> {
    Some(format!(
        "{}-{}",
        file_time_digits(oldest)?,
        file_time_digits(next)?
    ))
}

/**
Build the name of an archive from its label.
*/
pub fn archive_name(label: &str) -> String {
    format!("{}.{}", label, ARCHIVE_EXT)
}

/**
Build the name of the `n`th archive with the same label.

The first archive, `n = 0`, is named the same as [`archive_name`].
*/
pub fn nth_archive_name(label: &str, n: usize) -> String {
    match n {
        0 => archive_name(label),
        n => format!("{}.{}.{}", label, n, ARCHIVE_EXT),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_utc() {
        // 2024-05-27T03:00:00.123Z
        assert_eq!(
            "1716778800123_2024-05-27-03-00-00.log",
            file_name(1716778800123, UtcOffset::UTC)
        );
    }

    #[test]
    fn file_name_offset() {
        let offset = UtcOffset::from_hms(10, 0, 0).unwrap();

        assert_eq!(
            "1716778800123_2024-05-27-13-00-00.log",
            file_name(1716778800123, offset)
        );
    }

    #[test]
    fn file_name_roundtrips_through_parse() {
        let name = file_name(1716778800123, UtcOffset::UTC);

        assert_eq!(Some(1716778800123), parse_file_name(&name));
    }

    #[test]
    fn parse_file_name_rejects_other_files() {
        for name in [
            "",
            "log.txt",
            "1716778800123_2024-05-27-03-00-00.txt",
            "1716778800123_2024-05-27-03-00-00.log.bak",
            "171677880012_2024-05-27-03-00-00.log",
            "17167788001234_2024-05-27-03-00-00.log",
            "1716778800123_2024-05-27-03-00.log",
            "1716778800123-2024-05-27-03-00-00.log",
            "20240527030000-20240527041512.tar.gz",
        ] {
            assert_eq!(None, parse_file_name(name), "{}", name);
        }
    }

    #[test]
    fn file_time_digits_extracts_the_date() {
        assert_eq!(
            Some("20240527030000".to_owned()),
            file_time_digits("1716778800123_2024-05-27-03-00-00.log")
        );
    }

    #[test]
    fn file_time_digits_uses_first_underscore_and_last_dot() {
        assert_eq!(
            Some("a_b.c".to_owned()),
            file_time_digits("x_a_b.c.log")
        );
    }

    #[test]
    fn file_time_digits_requires_both_delimiters() {
        // A name that matches the naming scheme always has both delimiters,
        // so the date is only missing for names that don't
        assert_eq!(None, file_time_digits("1716778800123-2024-05-27.log"));
        assert_eq!(None, file_time_digits("1716778800123_2024-05-27"));
        assert_eq!(None, file_time_digits("no delimiters"));
        assert_eq!(None, file_time_digits("a.b_c"));
        assert_eq!(None, file_time_digits("1716778800123_.log"));
    }

    #[test]
    fn nth_archive_name_adds_a_counter() {
        assert_eq!("a-b.tar.gz", nth_archive_name("a-b", 0));
        assert_eq!("a-b.1.tar.gz", nth_archive_name("a-b", 1));
        assert_eq!("a-b.12.tar.gz", nth_archive_name("a-b", 12));
    }

    #[test]
    fn archive_label_spans_both_files() {
        assert_eq!(
            Some("20240527030000-20240527041512".to_owned()),
            archive_label(
                "1716778800123_2024-05-27-03-00-00.log",
                "1716783312000_2024-05-27-04-15-12.log"
            )
        );

        assert_eq!(
            None,
            archive_label("1716778800123_2024-05-27-03-00-00.log", "next")
        );
    }

    #[test]
    fn archive_name_uses_label() {
        assert_eq!(
            "20240527030000-20240527041512.tar.gz",
            archive_name("20240527030000-20240527041512")
        );
    }
}
