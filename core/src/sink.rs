/*!
The [`Sink`] trait.

A sink is a destination for finished [`Message`]s, like the console or a set of rolling files. Sinks are driven from a single background thread, so they receive messages one at a time, in the order they were produced.

Sinks never report failures back to their caller. A sink that can't write a message is expected to record the failure through [`crate::internal`] and its own metrics, then carry on.
*/

use core::time::Duration;
use std::sync::Arc;

use crate::{empty::Empty, message::Message};

/**
A destination for finished messages.
*/
pub trait Sink {
    /**
    Write a message.
    */
    fn emit(&self, msg: &Message);

    /**
    Block until any buffered messages are durably written, or `timeout` elapses.

    Returns `true` if the flush completed within the timeout.
    */
    fn blocking_flush(&self, timeout: Duration) -> bool {
        let _ = timeout;

        true
    }
}

impl<'a, T: Sink + ?Sized> Sink for &'a T {
    fn emit(&self, msg: &Message) {
        (**self).emit(msg)
    }

    fn blocking_flush(&self, timeout: Duration) -> bool {
        (**self).blocking_flush(timeout)
    }
}

impl<'a, T: Sink + ?Sized + 'a> Sink for Box<T> {
    fn emit(&self, msg: &Message) {
        (**self).emit(msg)
    }

    fn blocking_flush(&self, timeout: Duration) -> bool {
        (**self).blocking_flush(timeout)
    }
}

impl<'a, T: Sink + ?Sized + 'a> Sink for Arc<T> {
    fn emit(&self, msg: &Message) {
        (**self).emit(msg)
    }

    fn blocking_flush(&self, timeout: Duration) -> bool {
        (**self).blocking_flush(timeout)
    }
}

impl<T: Sink> Sink for Option<T> {
    fn emit(&self, msg: &Message) {
        match self {
            Some(sink) => sink.emit(msg),
            None => Empty.emit(msg),
        }
    }

    fn blocking_flush(&self, timeout: Duration) -> bool {
        match self {
            Some(sink) => sink.blocking_flush(timeout),
            None => Empty.blocking_flush(timeout),
        }
    }
}

impl Sink for Empty {
    fn emit(&self, _: &Message) {}
}

/**
A [`Sink`] from a function.

Use [`from_fn`] to create one.
*/
pub struct FromFn<F>(F);

impl<F: Fn(&Message)> Sink for FromFn<F> {
    fn emit(&self, msg: &Message) {
        (self.0)(msg)
    }
}

/**
Create a [`Sink`] that calls `f` for each message.
*/
pub fn from_fn<F: Fn(&Message)>(f: F) -> FromFn<F> {
    FromFn(f)
}
