/*!
The [`Record`] type.

A record is a message under construction. It's started by [`Logger::record`](crate::Logger::record) or one of the level macros, which writes a header like:

```text
[2024-05-27 13:00:00:123][INFO][main.rs][main(42)]
```

Text is then appended to it, and when the record is finished the complete message is sent to the logger's background thread.

A record whose level is below the logger's minimum is disabled. Disabled records don't allocate and appending to them does nothing.
*/

use core::fmt::{self, Write as _};

use time::{OffsetDateTime, UtcOffset};

use crate::{source::Source, Level, Logger, Message};

/**
The maximum number of bytes [`Record::printf`] will render in a single call.

Anything beyond it is truncated.
*/
pub const RENDER_BUF_LEN: usize = 1024;

const INITIAL_CAPACITY: usize = 128;

/**
A message under construction.

The record is finished either explicitly through [`Record::emit`], or when it goes out of scope. Either way, it's only ever sent once.
*/
#[must_use = "records are sent when they go out of scope, which for an unused record is immediately"]
pub struct Record<'a> {
    logger: &'a Logger,
    level: Level,
    buf: Option<String>,
}

impl<'a> Record<'a> {
    pub(crate) fn new(logger: &'a Logger, level: Level, source: Source) -> Self {
        if !logger.is_enabled(level) {
            return Record {
                logger,
                level,
                buf: None,
            };
        }

        let mut buf = String::with_capacity(INITIAL_CAPACITY);
        write_header(&mut buf, logger.now(), level, source);

        Record {
            logger,
            level,
            buf: Some(buf),
        }
    }

    /**
    The level of the record.
    */
    pub fn level(&self) -> Level {
        self.level
    }

    /**
    Whether the record will be sent when it's finished.
    */
    pub fn is_enabled(&self) -> bool {
        self.buf.is_some()
    }

    /**
    The text of the record so far, including its header.

    This is `None` if the record is disabled.
    */
    pub fn text(&self) -> Option<&str> {
        self.buf.as_deref()
    }

    /**
    Append the text of `value` to the record.
    */
    pub fn append(&mut self, value: impl fmt::Display) -> &mut Self {
        if let Some(buf) = &mut self.buf {
            let _ = write!(buf, "{}", value);
        }

        self
    }

    /**
    Append formatted text to the record.

    At most [`RENDER_BUF_LEN`] bytes are rendered. Longer output is truncated at the last complete character that fits.
    */
    pub fn printf(&mut self, args: fmt::Arguments) -> &mut Self {
        if let Some(buf) = &mut self.buf {
            let mut bounded = Bounded {
                buf,
                remaining: RENDER_BUF_LEN,
            };

            // An error here means the output was truncated
            let _ = bounded.write_fmt(args);
        }

        self
    }

    /**
    Finish the record, sending it to the logger.
    */
    pub fn emit(mut self) {
        self.finish();
    }

    fn finish(&mut self) {
        if let Some(mut buf) = self.buf.take() {
            if !buf.ends_with('\n') {
                buf.push('\n');
            }

            self.logger.push(Message::new(self.level, buf));
        }
    }
}

impl<'a> fmt::Write for Record<'a> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if let Some(buf) = &mut self.buf {
            buf.push_str(s);
        }

        Ok(())
    }
}

impl<'a> fmt::Debug for Record<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("level", &self.level)
            .field("text", &self.buf)
            .finish()
    }
}

impl<'a> Drop for Record<'a> {
    fn drop(&mut self) {
        self.finish();
    }
}

struct Bounded<'a> {
    buf: &'a mut String,
    remaining: usize,
}

impl<'a> fmt::Write for Bounded<'a> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if s.len() <= self.remaining {
            self.buf.push_str(s);
            self.remaining -= s.len();

            return Ok(());
        }

        let mut end = self.remaining;
        while !s.is_char_boundary(end) {
            end -= 1;
        }

        self.buf.push_str(&s[..end]);
        self.remaining = 0;

        Err(fmt::Error)
    }
}

fn write_header(buf: &mut String, now: OffsetDateTime, level: Level, source: Source) {
    let _ = write!(
        buf,
        "[{:>04}-{:>02}-{:>02} {:>02}:{:>02}:{:>02}:{:>03}][{}]{} ",
        now.year(),
        u8::from(now.month()),
        now.day(),
        now.hour(),
        now.minute(),
        now.second(),
        now.millisecond(),
        level,
        source,
    );
}

/**
Get the current time in `offset`.
*/
pub(crate) fn now(offset: UtcOffset) -> OffsetDateTime {
    let now = OffsetDateTime::now_utc();

    now.checked_to_offset(offset).unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use std::{
        fmt::Write,
        sync::{Arc, Mutex},
    };

    use super::*;
    use crate::{setup, Sink};

    #[derive(Clone, Default)]
    struct Collect(Arc<Mutex<Vec<Message>>>);

    impl Sink for Collect {
        fn emit(&self, msg: &Message) {
            self.0.lock().unwrap().push(msg.clone());
        }
    }

    impl Collect {
        fn take(&self) -> Vec<Message> {
            std::mem::take(&mut *self.0.lock().unwrap())
        }
    }

    fn logger(min_level: Level) -> (Logger, Collect) {
        let collect = Collect::default();

        let logger = setup()
            .min_level(min_level)
            .utc_offset(UtcOffset::UTC)
            .emit_to(collect.clone())
            .spawn()
            .unwrap();

        (logger, collect)
    }

    fn body(msg: &Message) -> &str {
        msg.text().split_once("] ").unwrap().1
    }

    #[test]
    fn header_format() {
        let mut buf = String::new();

        write_header(
            &mut buf,
            // 2024-05-27T03:00:07.045Z
            OffsetDateTime::from_unix_timestamp_nanos(1716778807045 * 1_000_000).unwrap(),
            Level::Warn,
            Source::new("src/app/main.rs", "run", 42),
        );

        assert_eq!("[2024-05-27 03:00:07:045][WARN][main.rs][run(42)] ", buf);
    }

    #[test]
    fn enabled_record_is_sent_once_on_drop() {
        let (logger, collect) = logger(Level::Info);

        {
            let mut record = logger.record(Level::Info, crate::source!());
            record.append("a").append(1).append(' ').append(2.5);
        }

        logger.shutdown();

        let msgs = collect.take();

        assert_eq!(1, msgs.len());
        assert_eq!(Level::Info, msgs[0].level());
        assert_eq!("a1 2.5\n", body(&msgs[0]));
        assert!(msgs[0].text().contains("[INFO][record.rs][enabled_record_is_sent_once_on_drop("));
    }

    #[test]
    fn explicit_emit_sends_once() {
        let (logger, collect) = logger(Level::Debug);

        let mut record = logger.record(Level::Debug, crate::source!());
        record.append("explicit");
        record.emit();

        logger.shutdown();

        let msgs = collect.take();

        assert_eq!(1, msgs.len());
        assert_eq!("explicit\n", body(&msgs[0]));
    }

    #[test]
    fn existing_newline_is_not_doubled() {
        let (logger, collect) = logger(Level::Debug);

        logger.record(Level::Error, crate::source!()).append("line\n");

        logger.shutdown();

        assert_eq!("line\n", body(&collect.take()[0]));
    }

    #[test]
    fn disabled_record_sends_nothing() {
        let (logger, collect) = logger(Level::Warn);

        let mut record = logger.record(Level::Info, crate::source!());

        assert!(!record.is_enabled());
        assert_eq!(None, record.text());

        record.append("ignored").printf(format_args!("{}", "ignored"));
        let _ = write!(record, "ignored");

        drop(record);
        logger.shutdown();

        assert!(collect.take().is_empty());
    }

    #[test]
    fn printf_is_bounded() {
        let (logger, collect) = logger(Level::Debug);

        let long = "x".repeat(RENDER_BUF_LEN + 100);

        logger
            .record(Level::Info, crate::source!())
            .printf(format_args!("{}{}", long, "never rendered"));

        logger.shutdown();

        let msgs = collect.take();

        assert_eq!(format!("{}\n", "x".repeat(RENDER_BUF_LEN)), body(&msgs[0]));
    }

    #[test]
    fn printf_truncates_at_a_char_boundary() {
        let (logger, collect) = logger(Level::Debug);

        // Each character is 2 bytes, so the limit falls in the middle of one
        let long = "é".repeat(RENDER_BUF_LEN);
        let prefix = "a";

        logger
            .record(Level::Info, crate::source!())
            .printf(format_args!("{}{}", prefix, long));

        logger.shutdown();

        let msgs = collect.take();
        let rendered = body(&msgs[0]).trim_end_matches('\n');

        assert_eq!(RENDER_BUF_LEN - 1, rendered.len());
        assert!(rendered.starts_with('a'));
        assert!(rendered[1..].chars().all(|c| c == 'é'));
    }

    #[test]
    fn write_is_unbounded() {
        let (logger, collect) = logger(Level::Debug);

        let long = "y".repeat(RENDER_BUF_LEN * 2);

        {
            let mut record = logger.record(Level::Info, crate::source!());
            write!(record, "{}", long).unwrap();
        }

        logger.shutdown();

        assert_eq!(format!("{}\n", long), body(&collect.take()[0]));
    }

    #[test]
    fn level_macros_render_through_printf() {
        let (logger, collect) = logger(Level::Need);

        crate::debug!(logger, "filtered {}", 1);
        crate::need!(logger, "need {}", 2);
        crate::info!(logger, "info {}", 3);
        crate::warn!(logger).append("warn ").append(4);
        crate::error!(logger, "error {}", 5);
        crate::fatal!(logger, "fatal {}", 6);

        logger.shutdown();

        let msgs = collect.take();

        assert_eq!(
            vec![
                (Level::Need, "need 2\n"),
                (Level::Info, "info 3\n"),
                (Level::Warn, "warn 4\n"),
                (Level::Error, "error 5\n"),
                (Level::Fatal, "fatal 6\n"),
            ],
            msgs.iter()
                .map(|msg| (msg.level(), body(msg)))
                .collect::<Vec<_>>()
        );
    }
}
