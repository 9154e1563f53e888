/*!
Write messages to the console.

Messages are written verbatim: the text a producer recorded is exactly the text that appears on the terminal. Color is off by default. Call [`Console::colored`] to tint each message by its level.

# Getting started

Pass a console sink to `quill::Setup::to_console`, or use it directly:

```
use quill_core::{Level, Message, Sink};

let console = quill_term::stdout();

console.emit(&Message::new(Level::Info, "hello from quill\n"));
```
*/

#![deny(missing_docs)]

use core::time::Duration;
use std::{cell::RefCell, io::Write};

use quill_core::{Level, Message, Sink};
use termcolor::{Buffer, BufferWriter, Color, ColorChoice, ColorSpec, WriteColor};

/**
Get a sink that writes to `stdout`.

Colors won't be used unless [`Console::colored`] is called.
*/
pub fn stdout() -> Console {
    Console::stdout()
}

/**
Get a sink that writes to `stderr`.
*/
pub fn stderr() -> Console {
    Console::stderr()
}

/**
A sink that writes to the console.

Use [`stdout`] or [`stderr`] to construct one.
*/
pub struct Console {
    writer: BufferWriter,
    stream: Stream,
}

#[derive(Debug, Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

impl Console {
    /**
    Get a sink that writes to `stdout`.

    Colors won't be used unless [`Console::colored`] is called.
    */
    pub fn stdout() -> Self {
        Console {
            writer: BufferWriter::stdout(ColorChoice::Never),
            stream: Stream::Stdout,
        }
    }

    /**
    Get a sink that writes to `stderr`.

    Colors won't be used unless [`Console::colored`] is called.
    */
    pub fn stderr() -> Self {
        Console {
            writer: BufferWriter::stderr(ColorChoice::Never),
            stream: Stream::Stderr,
        }
    }

    /**
    Whether to write using colors.

    By default, colors aren't used. If `colored` is true then each message is tinted by its level, even if the output isn't a terminal.
    */
    pub fn colored(mut self, colored: bool) -> Self {
        let choice = if colored {
            ColorChoice::Always
        } else {
            ColorChoice::Never
        };

        self.writer = match self.stream {
            Stream::Stdout => BufferWriter::stdout(choice),
            Stream::Stderr => BufferWriter::stderr(choice),
        };

        self
    }
}

impl Default for Console {
    fn default() -> Self {
        Console::stdout()
    }
}

impl Sink for Console {
    fn emit(&self, msg: &Message) {
        with_shared_buf(&self.writer, |writer, buf| print_message(writer, buf, msg));
    }

    fn blocking_flush(&self, _: Duration) -> bool {
        true
    }
}

fn print_message(out: &BufferWriter, buf: &mut Buffer, msg: &Message) {
    write_message(buf, msg);

    let _ = out.print(buf);
}

fn write_message(buf: &mut Buffer, msg: &Message) {
    try_write_fg(buf, msg.text(), level_color(msg.level()));
}

fn level_color(level: Level) -> Option<Color> {
    match level {
        Level::Debug => Some(Color::Ansi256(244)),
        Level::Need => Some(Color::Ansi256(69)),
        Level::Info => None,
        Level::Warn => Some(Color::Ansi256(202)),
        Level::Error => Some(Color::Ansi256(124)),
        Level::Fatal => Some(Color::Ansi256(160)),
    }
}

fn write_fg(buf: &mut Buffer, v: &str, color: Color) {
    let _ = buf.set_color(ColorSpec::new().set_fg(Some(color)));
    let _ = buf.write_all(v.as_bytes());
    let _ = buf.reset();
}

fn try_write_fg(buf: &mut Buffer, v: &str, color: Option<Color>) {
    if let Some(color) = color {
        write_fg(buf, v, color);
    } else {
        write_plain(buf, v);
    }
}

fn write_plain(buf: &mut Buffer, v: &str) {
    let _ = buf.write_all(v.as_bytes());
}

fn with_shared_buf(writer: &BufferWriter, with_buf: impl FnOnce(&BufferWriter, &mut Buffer)) {
    thread_local! {
        static BUF: RefCell<Option<Buffer>> = RefCell::new(None);
    }

    BUF.with(|buf| {
        match buf.try_borrow_mut() {
            // If there are no overlapping references then use the cached buffer
            Ok(mut slot) => {
                match &mut *slot {
                    // If there's a cached buffer then clear it and print using it
                    Some(buf) => {
                        buf.clear();
                        with_buf(writer, buf);
                    }
                    // If there's no cached buffer then create one and use it
                    // It'll be cached for future callers on this thread
                    None => {
                        let mut buf = writer.buffer();
                        with_buf(writer, &mut buf);

                        *slot = Some(buf);
                    }
                }
            }
            // If there are overlapping references then just create a
            // buffer on-demand to use
            Err(_) => {
                with_buf(writer, &mut writer.buffer());
            }
        }
    });
}
