use quill_core::metric::Counter;

quill_core::metrics!(pub(crate) struct InternalMetrics {
    sink_panicked: Counter,
    dispatch_panicked: Counter,
});
