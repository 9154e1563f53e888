/*!
The [`Level`] type.

Levels are totally ordered from [`Level::Debug`] (least severe) to [`Level::Fatal`] (most severe). A record is kept when its level is greater than or equal to the configured minimum.
*/

use core::{fmt, str::FromStr};

/**
The severity of a record.
*/
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    /**
    Verbose information useful while developing.
    */
    Debug,
    /**
    Information that's needed to follow what the program is doing, but too noisy for `Info`.
    */
    Need,
    /**
    Informative events about normal operation.
    */
    Info,
    /**
    Something unexpected happened, but the program can carry on.
    */
    Warn,
    /**
    An operation failed.
    */
    Error,
    /**
    The program can't continue.
    */
    Fatal,
}

impl Level {
    /**
    All levels, from least to most severe.
    */
    pub const ALL: [Level; 6] = [
        Level::Debug,
        Level::Need,
        Level::Info,
        Level::Warn,
        Level::Error,
        Level::Fatal,
    ];

    /**
    The name of the level, as it appears in rendered records and configuration files.
    */
    pub const fn as_str(&self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Need => "NEED",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Fatal => "FATAL",
        }
    }
}

impl fmt::Debug for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lvl = s.as_bytes();

        match lvl.first() {
            Some(b'D') | Some(b'd') => {
                parse(lvl, b"DEBUG", Level::Debug).or_else(|_| parse(lvl, b"DBG", Level::Debug))
            }
            Some(b'N') | Some(b'n') => parse(lvl, b"NEED", Level::Need),
            Some(b'I') | Some(b'i') => parse(lvl, b"INFORMATION", Level::Info),
            Some(b'W') | Some(b'w') => {
                parse(lvl, b"WARNING", Level::Warn).or_else(|_| parse(lvl, b"WRN", Level::Warn))
            }
            Some(b'E') | Some(b'e') => {
                parse(lvl, b"ERROR", Level::Error).or_else(|_| parse(lvl, b"ERR", Level::Error))
            }
            Some(b'F') | Some(b'f') => parse(lvl, b"FATAL", Level::Fatal),
            Some(_) => Err(ParseLevelError {}),
            None => Err(ParseLevelError {}),
        }
    }
}

fn parse(
    mut input: &[u8],
    mut expected_uppercase: &[u8],
    ok: Level,
) -> Result<Level, ParseLevelError> {
    // Assume the first character has already been matched
    input = &input[1..];
    expected_uppercase = &expected_uppercase[1..];

    // Doesn't require a full match of the expected content
    // For example, `INF` will match `INFORMATION`
    while let Some(b) = input.first() {
        let Some(e) = expected_uppercase.first() else {
            return Err(ParseLevelError {});
        };

        if b.to_ascii_uppercase() != *e {
            return Err(ParseLevelError {});
        }

        expected_uppercase = &expected_uppercase[1..];
        input = &input[1..];
    }

    Ok(ok)
}

/**
An error attempting to parse a [`Level`] from text.
*/
#[derive(Debug)]
pub struct ParseLevelError {}

impl fmt::Display for ParseLevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("the input was not a valid level")
    }
}

impl std::error::Error for ParseLevelError {}

impl Default for Level {
    fn default() -> Self {
        Level::Error
    }
}
