/*!
Block the current thread until a queue has been flushed.
*/

use std::{
    sync::{Arc, Condvar, Mutex, PoisonError},
    time::Duration,
};

use crate::Sender;

#[derive(Clone)]
struct Trigger(Arc<(Mutex<bool>, Condvar)>);

impl Trigger {
    fn new() -> Self {
        Trigger(Arc::new((Mutex::new(false), Condvar::new())))
    }

    fn trigger(self) {
        *(self.0).0.lock().unwrap_or_else(PoisonError::into_inner) = true;
        (self.0).1.notify_all();
    }

    fn wait_timeout(&self, timeout: Duration) -> bool {
        let flushed = (self.0).0.lock().unwrap_or_else(PoisonError::into_inner);

        let (flushed, _) = (self.0)
            .1
            .wait_timeout_while(flushed, timeout, |flushed| !*flushed)
            .unwrap_or_else(PoisonError::into_inner);

        *flushed
    }
}

/**
Wait until every item sent to `sender` before this call has been processed, or `timeout` elapses.

Returns `true` if the queue was flushed within the timeout.
*/
pub fn blocking_flush<T>(sender: &Sender<T>, timeout: Duration) -> bool {
    let on_flush = Trigger::new();

    sender.on_next_flush({
        let on_flush = on_flush.clone();

        move || {
            on_flush.trigger();
        }
    });

    on_flush.wait_timeout(timeout)
}
