/*!
The [`Message`] type.

A message is a single record that has been fully rendered to text. Once built it's immutable: sinks write its text verbatim.
*/

use core::fmt;

use crate::level::Level;

/**
A finished, rendered record.

The [`Level`] travels alongside the text so sinks can style output without re-parsing it. It's never written back into the text.
*/
#[derive(Clone, PartialEq, Eq)]
pub struct Message {
    level: Level,
    text: Box<str>,
}

impl Message {
    /**
    Create a message from its level and rendered text.
    */
    pub fn new(level: Level, text: impl Into<Box<str>>) -> Self {
        Message {
            level,
            text: text.into(),
        }
    }

    /**
    The level the message was recorded at.
    */
    pub fn level(&self) -> Level {
        self.level
    }

    /**
    The rendered text of the message.
    */
    pub fn text(&self) -> &str {
        &self.text
    }

    /**
    The rendered text of the message as raw bytes.
    */
    pub fn as_bytes(&self) -> &[u8] {
        self.text.as_bytes()
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("level", &self.level)
            .field("text", &self.text)
            .finish()
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
