/*!
The [`Logger`] type.
*/

use std::{
    sync::{Arc, Mutex, PoisonError},
    thread,
    time::Duration,
};

use quill_core::{internal_warn, metric::Metric, Level, Message};
use quill_file::FileSet;
use quill_queue::Sender;
use time::{OffsetDateTime, UtcOffset};

use crate::{
    config::Config, internal_metrics::InternalMetrics, record, setup::Setup, source::Source,
    Error, Record,
};

/**
A handle to a running logging pipeline.

Records are produced through [`Logger::record`] or the level macros like [`info!`](crate::info). Finished messages are queued and written to sinks by a single background thread, so producers never wait on disk IO.

Share a logger between threads by reference or through an `Arc`. Call [`Logger::shutdown`] (or drop the logger) at the end of `main` to make sure everything that was logged is written.
*/
pub struct Logger {
    min_level: Level,
    utc_offset: UtcOffset,
    sender: Sender<Message>,
    handle: Mutex<Option<thread::JoinHandle<()>>>,
    file: Option<Arc<FileSet>>,
    metrics: Arc<InternalMetrics>,
}

impl Logger {
    pub(crate) fn new(
        min_level: Level,
        utc_offset: UtcOffset,
        sender: Sender<Message>,
        handle: thread::JoinHandle<()>,
        file: Option<Arc<FileSet>>,
        metrics: Arc<InternalMetrics>,
    ) -> Self {
        Logger {
            min_level,
            utc_offset,
            sender,
            handle: Mutex::new(Some(handle)),
            file,
            metrics,
        }
    }

    /**
    Spawn a logger from loaded configuration.

    This is a shorthand for [`Setup::from_config`] followed by [`Setup::spawn`].
    */
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        Setup::from_config(config).spawn()
    }

    /**
    The minimum level of records that will be written.
    */
    pub fn min_level(&self) -> Level {
        self.min_level
    }

    /**
    Whether a record at `level` would be written.
    */
    pub fn is_enabled(&self, level: Level) -> bool {
        level >= self.min_level
    }

    /**
    Start a record at `level`.

    If `level` is below the minimum level then the returned record is disabled and nothing appended to it is kept.
    */
    pub fn record(&self, level: Level, source: Source) -> Record<'_> {
        Record::new(self, level, source)
    }

    /**
    The set of log files being written to, if file output is enabled.
    */
    pub fn file_set(&self) -> Option<&FileSet> {
        self.file.as_deref()
    }

    /**
    Wait for all messages sent so far to be written, up to `timeout`.

    Returns `false` if the timeout expired first.
    */
    pub fn blocking_flush(&self, timeout: Duration) -> bool {
        quill_queue::sync::blocking_flush(&self.sender, timeout)
    }

    /**
    Stop accepting records, write everything that's already been queued, and wait for the background thread to finish.

    Records finished after this call are discarded. Calling this more than once is fine; only the first call does anything.
    */
    pub fn shutdown(&self) {
        self.sender.close();

        let handle = self
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(handle) = handle {
            if handle.join().is_err() {
                self.metrics.dispatch_panicked.increment();

                internal_warn!("the dispatcher thread panicked");
            }
        }
    }

    /**
    Get an iterator of metrics produced by the pipeline.

    These include the state of the queue, sink failures, and file IO.
    */
    pub fn sample_metrics(&self) -> impl Iterator<Item = Metric> + 'static {
        let file = self
            .file
            .as_ref()
            .map(|file| file.sample_metrics())
            .into_iter()
            .flatten();

        self.sender
            .sample_metrics()
            .chain(self.metrics.sample())
            .chain(file)
    }

    pub(crate) fn push(&self, msg: Message) {
        self.sender.send(msg);
    }

    pub(crate) fn now(&self) -> OffsetDateTime {
        record::now(self.utc_offset)
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        self.shutdown();
    }
}
