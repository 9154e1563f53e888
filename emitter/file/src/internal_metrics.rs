use quill_core::metric::Counter;

quill_core::metrics!(pub(crate) struct InternalMetrics {
    file_set_read_failed: Counter,
    file_open_failed: Counter,
    file_create: Counter,
    file_create_failed: Counter,
    file_write_failed: Counter,
    file_delete: Counter,
    file_delete_failed: Counter,
    file_archive: Counter,
    file_archive_failed: Counter,
    file_missing_recovered: Counter,
    file_msg_dropped: Counter,
});
