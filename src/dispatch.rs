/*!
The background thread that writes messages to sinks.
*/

use std::{
    io,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
    thread,
    time::Duration,
};

use quill_core::{internal_debug, internal_warn, Message, Sink};
use quill_file::FileSet;
use quill_queue::Receiver;
use quill_term::Console;

use crate::internal_metrics::InternalMetrics;

/**
The name of the dispatcher thread.
*/
pub(crate) const THREAD_NAME: &str = "quill-dispatch";

const FINAL_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

/**
The destinations messages are written to, in order.
*/
pub(crate) struct Sinks {
    pub(crate) console: Option<Console>,
    pub(crate) file: Option<Arc<FileSet>>,
    pub(crate) extra: Vec<Box<dyn Sink + Send + Sync>>,
}

impl Sinks {
    fn emit(&self, msg: &Message, metrics: &InternalMetrics) {
        if let Some(console) = &self.console {
            emit_contained("console", console, msg, metrics);
        }

        if let Some(file) = &self.file {
            emit_contained("file", &**file, msg, metrics);
        }

        for sink in &self.extra {
            emit_contained("custom", sink, msg, metrics);
        }
    }

    fn finish(self) {
        let flushed = self
            .extra
            .iter()
            .map(|sink| sink.blocking_flush(FINAL_FLUSH_TIMEOUT))
            .fold(true, |flushed, sink_flushed| flushed && sink_flushed);

        if !flushed {
            internal_warn!("not all sinks flushed within {:?}", FINAL_FLUSH_TIMEOUT);
        }

        if let Some(file) = &self.file {
            if let Err(err) = file.close() {
                internal_warn!("failed to close the active log file: {}", err);
            }
        }
    }
}

/**
Spawn the dispatcher thread.

It runs until the queue is closed and fully drained, then flushes and closes its sinks.
*/
pub(crate) fn spawn(
    receiver: Receiver<Message>,
    sinks: Sinks,
    metrics: Arc<InternalMetrics>,
) -> Result<thread::JoinHandle<()>, io::Error> {
    thread::Builder::new()
        .name(THREAD_NAME.into())
        .spawn(move || {
            internal_debug!("dispatcher started");

            receiver.blocking_exec(|msg| sinks.emit(&msg, &metrics));

            sinks.finish();

            internal_debug!("dispatcher stopped");
        })
}

fn emit_contained(name: &str, sink: &dyn Sink, msg: &Message, metrics: &InternalMetrics) {
    if panic::catch_unwind(AssertUnwindSafe(|| sink.emit(msg))).is_err() {
        metrics.sink_panicked.increment();

        internal_warn!("the {} sink panicked writing a message", name);
    }
}
