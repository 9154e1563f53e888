/*!
Core types shared by the `quill` crates.

This crate defines the [`Level`] of a record, the finished [`Message`] that flows from producers to
sinks, the [`Sink`] trait that destinations implement, and the ambient infrastructure every crate in
the workspace leans on: an [`internal`] channel for self-diagnostics and the [`metric`] types used to
sample internal counters.
*/

#![deny(missing_docs)]

pub mod empty;
pub mod internal;
pub mod level;
pub mod message;
pub mod metric;
pub mod sink;

#[doc(inline)]
pub use self::{empty::Empty, level::Level, message::Message, metric::Metric, sink::Sink};
