use quill_core::metric::Counter;

quill_core::metrics!(pub(crate) struct InternalMetrics {
    queue_pushed: Counter,
    queue_processed: Counter,
    queue_panicked: Counter,
    queue_closed_dropped: Counter,
});
