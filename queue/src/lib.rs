/*!
An unbounded, ordered hand-off queue between many producers and a single consumer.

Producers call [`Sender::send`], which only holds the queue's lock long enough to append an item and wake the consumer. The consumer runs [`Receiver::blocking_exec`] on a dedicated thread, blocking while there's nothing to do and processing items one at a time outside of the lock.

Items are processed in the order they were sent. Once an item has been accepted by [`Sender::send`] it will always be processed, including after the queue is closed: the consumer only exits once the queue is both closed and empty.
*/

#![deny(missing_docs)]

use std::{
    collections::VecDeque,
    mem,
    panic::{self, AssertUnwindSafe},
    sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError},
};

use internal_metrics::InternalMetrics;
use quill_core::metric::Metric;

mod internal_metrics;

pub mod sync;

/**
Create a new queue, returning its producing and consuming halves.
*/
pub fn unbounded<T>() -> (Sender<T>, Receiver<T>) {
    let shared = Arc::new(Shared {
        metrics: Default::default(),
        state: Mutex::new(State {
            queue: VecDeque::new(),
            watchers: Watchers::new(),
            is_open: true,
            is_draining: false,
            is_receiving: true,
        }),
        wake: Condvar::new(),
    });

    (
        Sender {
            shared: shared.clone(),
        },
        Receiver { shared },
    )
}

/**
The producing half of a queue.

Dropping the sender closes the queue.
*/
pub struct Sender<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Drop for Sender<T> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<T> Sender<T> {
    /**
    Append an item to the tail of the queue and wake the consumer.

    If the queue has already been closed then the item is discarded.
    */
    pub fn send(&self, item: T) {
        let mut state = self.shared.lock();

        // If the channel is closed then return without adding the item
        if !state.is_open {
            drop(state);

            self.shared.metrics.queue_closed_dropped.increment();
            return;
        }

        state.queue.push_back(item);
        drop(state);

        self.shared.metrics.queue_pushed.increment();
        self.shared.wake.notify_one();
    }

    /**
    Close the queue.

    The consumer will finish processing any items that are already queued and then return. Items sent after the queue is closed are discarded.
    */
    pub fn close(&self) {
        self.shared.lock().is_open = false;
        self.shared.wake.notify_all();
    }

    /**
    Whether the queue is still accepting items.
    */
    pub fn is_open(&self) -> bool {
        self.shared.lock().is_open
    }

    /**
    Call `watcher` once every item sent before this call has been processed.

    If the consumer is idle then `watcher` is called immediately on the current thread.
    */
    pub fn on_next_flush(&self, watcher: impl FnOnce() + Send + 'static) {
        let watcher = Box::new(watcher);

        let mut state = self.shared.lock();

        // If the consumer isn't working through items and there's nothing
        // queued, or there's no consumer at all, then there's nothing to wait for
        if !state.is_receiving || (!state.is_draining && state.queue.is_empty()) {
            // Drop the lock before signalling the watcher
            drop(state);

            watcher();
        }
        // If there's pending work then schedule the watcher
        else {
            state.watchers.push(watcher);
        }
    }

    /**
    Sample the queue's internal metrics.
    */
    pub fn sample_metrics(&self) -> impl Iterator<Item = Metric> + 'static {
        self.shared.sample_metrics()
    }
}

/**
The consuming half of a queue.

Dropping the receiver closes the queue.
*/
pub struct Receiver<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Drop for Receiver<T> {
    fn drop(&mut self) {
        let watchers = {
            let mut state = self.shared.lock();

            state.is_open = false;
            state.is_draining = false;
            state.is_receiving = false;

            mem::take(&mut state.watchers)
        };

        // Nothing is going to process the queue anymore, so
        // don't leave anyone waiting on it
        watchers.notify();
    }
}

impl<T> Receiver<T> {
    /**
    Process items until the queue is closed and empty.

    This method blocks the calling thread. It's expected to be run on a thread dedicated to the queue.

    Each item is passed to `on_item` outside of the queue's lock, so producers are never blocked by it. If `on_item` panics then the panic is caught and processing continues with the next item.
    */
    pub fn blocking_exec(self, mut on_item: impl FnMut(T)) {
        loop {
            // Run inside the lock
            {
                let mut state = self.shared.lock();

                while state.queue.is_empty() && state.is_open {
                    state = self
                        .shared
                        .wake
                        .wait(state)
                        .unwrap_or_else(PoisonError::into_inner);
                }

                // If the queue is closed and there's nothing left in it then
                // return; this will drop the receiver
                if state.queue.is_empty() {
                    return;
                }

                state.is_draining = true;
            }

            // Run outside of the lock
            let watchers = loop {
                let next = {
                    let mut state = self.shared.lock();

                    match state.queue.pop_front() {
                        Some(item) => item,
                        // If there are no items left then mark that we're done draining
                        // and take the watchers waiting on it
                        None => {
                            state.is_draining = false;

                            break mem::take(&mut state.watchers);
                        }
                    }
                };

                // Process the item, taking care not to panic
                match panic::catch_unwind(AssertUnwindSafe(|| on_item(next))) {
                    Ok(()) => self.shared.metrics.queue_processed.increment(),
                    Err(_) => self.shared.metrics.queue_panicked.increment(),
                }
            };

            // After the queue has been drained, notify any watchers
            watchers.notify();
        }
    }

    /**
    Sample the queue's internal metrics.
    */
    pub fn sample_metrics(&self) -> impl Iterator<Item = Metric> + 'static {
        self.shared.sample_metrics()
    }
}

struct Shared<T> {
    metrics: InternalMetrics,
    state: Mutex<State<T>>,
    wake: Condvar,
}

impl<T> Shared<T> {
    // A panic while the lock is held can only come from this module,
    // which never leaves the state half-updated
    fn lock(&self) -> MutexGuard<State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn sample_metrics(&self) -> impl Iterator<Item = Metric> + 'static {
        let queue_length = { self.lock().queue.len() };

        self.metrics.sample().chain(Some(Metric::new(
            env!("CARGO_PKG_NAME"),
            "queue_length",
            queue_length,
        )))
    }
}

struct State<T> {
    queue: VecDeque<T>,
    watchers: Watchers,
    is_open: bool,
    is_draining: bool,
    is_receiving: bool,
}

struct Watchers(Vec<Watcher>);

type Watcher = Box<dyn FnOnce() + Send>;

impl Default for Watchers {
    fn default() -> Self {
        Watchers::new()
    }
}

impl Watchers {
    fn new() -> Self {
        Watchers(Vec::new())
    }

    fn push(&mut self, watcher: Watcher) {
        self.0.push(watcher);
    }

    fn notify(self) {
        for watcher in self.0 {
            let _ = panic::catch_unwind(AssertUnwindSafe(watcher));
        }
    }
}
