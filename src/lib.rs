/*!
Asynchronous logging to the console and size-rotated files.

`quill` moves the cost of writing logs off the threads that produce them. Records are formatted on the calling thread into finished messages, queued, and written to sinks by a single background thread. Log files are rolled over by size, and the oldest are archived and deleted so disk usage stays bounded.

# Getting started

```
# fn main() -> Result<(), quill::Error> {
# let dir = tempfile::tempdir()?;
let logger = quill::setup()
    .min_level(quill::Level::Info)
    .to_console(quill::term::stdout())
    .to_file(quill::file::set(dir.path()).max_files(10))
    .spawn()?;

quill::info!(logger, "started with {} workers", 4);
quill::warn!(logger).append("disk usage at ").append(93).append("%");

// Write everything queued so far and stop the background thread
logger.shutdown();
# Ok(())
# }
```

# Configuration

A logger can also be configured from a `KEY=VALUE` file. See the [`config`] module for the format:

```
let logger = quill::Logger::from_config(&quill::Config::load(quill::Config::DEFAULT_PATH))?;
# Ok::<(), quill::Error>(())
```

# Records

Each record starts with a header giving the local time, level, and call site, followed by whatever text was appended to it:

```text
[2024-05-27 13:00:00:123][INFO][main.rs][main(42)] started with 4 workers
```

Records below the logger's minimum level are disabled. They don't allocate, and nothing appended to them is formatted.

# Diagnostics

Problems inside the pipeline, like a failed archive or a message dropped because its log file disappeared, are reported on the [`internal`] channel rather than through the logger itself. By default, warnings on it are written to `stderr`. [`Logger::sample_metrics`] gives counters for the health of the queue, sinks, and files.
*/

#![deny(missing_docs)]

use std::{fmt, io};

mod dispatch;
mod internal_metrics;
mod logger;
mod macros;

pub mod config;
pub mod record;
pub mod setup;
pub mod source;

#[doc(inline)]
pub use quill_core::{internal, metric, Empty, Level, Message, Metric, Sink};

#[doc(inline)]
pub use self::{config::Config, logger::Logger, record::Record, setup::Setup, source::Source};

/**
Write messages to the console.
*/
pub use quill_term as term;

/**
Write messages to size-rotated log files.
*/
pub use quill_file as file;

/**
Start configuring a [`Logger`].
*/
pub fn setup() -> Setup {
    Setup::new()
}

/**
An error attempting to spawn a [`Logger`].
*/
pub struct Error(Box<dyn std::error::Error + Send + Sync>);

impl Error {
    fn new(e: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Error(e.into())
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::new(err)
    }
}

impl From<quill_file::Error> for Error {
    fn from(err: quill_file::Error) -> Self {
        Error::new(err)
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}
