use std::{
    alloc::{GlobalAlloc, Layout, System},
    cell::Cell,
    sync::atomic::{AtomicUsize, Ordering},
};

use quill::Level;

struct Counting;

static ALLOCATIONS: AtomicUsize = AtomicUsize::new(0);

thread_local! {
    static TRACKING: Cell<bool> = const { Cell::new(false) };
}

fn count() {
    if TRACKING.try_with(|tracking| tracking.get()).unwrap_or(false) {
        ALLOCATIONS.fetch_add(1, Ordering::Relaxed);
    }
}

unsafe impl GlobalAlloc for Counting {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        count();
        System.alloc(layout)
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        System.dealloc(ptr, layout)
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        count();
        System.realloc(ptr, layout, new_size)
    }
}

#[global_allocator]
static ALLOCATOR: Counting = Counting;

fn allocations(f: impl FnOnce()) -> usize {
    let before = ALLOCATIONS.load(Ordering::Relaxed);

    TRACKING.with(|tracking| tracking.set(true));
    f();
    TRACKING.with(|tracking| tracking.set(false));

    ALLOCATIONS.load(Ordering::Relaxed) - before
}

#[test]
fn filtered_records_do_not_allocate() {
    let logger = quill::setup().min_level(Level::Error).spawn().unwrap();

    let value = String::from("a value");

    let filtered = allocations(|| {
        quill::debug!(logger, "formatted {} {}", 1, value);
        quill::info!(logger).append("appended ").append(&value);

        let mut record = logger.record(Level::Warn, quill::source!());
        record.append(42).printf(format_args!("{}", value));
        record.emit();
    });

    let enabled = allocations(|| {
        quill::error!(logger, "formatted {}", value);
    });

    logger.shutdown();

    assert_eq!(0, filtered);
    assert!(enabled > 0);

    assert_eq!(
        Some(1),
        logger
            .sample_metrics()
            .find(|metric| metric.name() == "queue_pushed")
            .map(|metric| metric.value())
    );
}
