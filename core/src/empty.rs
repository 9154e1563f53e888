/*!
The [`Empty`] type.

An [`Empty`] can be used as a default in place of a more meaningful implementation. As a [`crate::Sink`] it discards every message.
*/

/**
A type that behaves like a default, empty, null value.
*/
#[derive(Default, Debug, Clone, Copy)]
pub struct Empty;
