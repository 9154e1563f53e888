/*!
Self-diagnostics.

The logging pipeline can't report its own failures through itself without risking a feedback loop, so problems like a failed archive or a dropped message go through a separate, process-wide internal channel instead.

By default, warnings and errors on the internal channel are written to `stderr` and everything else is discarded. Call [`init`] once, early in the program, to send internal events to a [`Sink`] of your choosing instead.
*/

use core::fmt;
use std::{
    io::{self, Write},
    sync::OnceLock,
};

use crate::{level::Level, message::Message, sink::Sink};

static INTERNAL: OnceLock<Box<dyn Sink + Send + Sync>> = OnceLock::new();

/**
Route internal events to `sink`.

This can only be called once; subsequent calls return `false` and leave the original sink in place.
*/
pub fn init(sink: impl Sink + Send + Sync + 'static) -> bool {
    INTERNAL.set(Box::new(sink)).is_ok()
}

/**
Whether an internal event at `level` would be emitted anywhere.
*/
pub fn is_enabled(level: Level) -> bool {
    INTERNAL.get().is_some() || level >= Level::Warn
}

/**
Emit an internal event.

The `source` is a short name for the component reporting the event, usually its module path.

Prefer the [`internal_warn!`](crate::internal_warn) and [`internal_debug!`](crate::internal_debug) macros.
*/
pub fn emit(level: Level, source: &str, args: fmt::Arguments) {
    if !is_enabled(level) {
        return;
    }

    let text = format!("[{}][{}] {}\n", level, source, args);

    match INTERNAL.get() {
        Some(sink) => sink.emit(&Message::new(level, text)),
        None => {
            let _ = io::stderr().lock().write_all(text.as_bytes());
        }
    }
}

/**
Emit a warning on the internal channel.
*/
#[macro_export]
macro_rules! internal_warn {
    ($($arg:tt)*) => {
        $crate::internal::emit(
            $crate::level::Level::Warn,
            module_path!(),
            format_args!($($arg)*),
        )
    };
}

/**
Emit a debug event on the internal channel.
*/
#[macro_export]
macro_rules! internal_debug {
    ($($arg:tt)*) => {
        if $crate::internal::is_enabled($crate::level::Level::Debug) {
            $crate::internal::emit(
                $crate::level::Level::Debug,
                module_path!(),
                format_args!($($arg)*),
            )
        }
    };
}
