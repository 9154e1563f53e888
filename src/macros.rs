/*!
Macros for producing records.
*/

/**
Capture the [`Source`](crate::source::Source) of the call site.
*/
#[macro_export]
macro_rules! source {
    () => {
        $crate::source::Source::new(file!(), $crate::__function!(), line!())
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __function {
    () => {{
        fn __f() {}

        $crate::source::function_name(::core::any::type_name_of_val(&__f))
    }};
}

#[doc(hidden)]
#[macro_export]
macro_rules! __record {
    ($level:expr, $logger:expr) => {
        $logger.record($level, $crate::source!())
    };
    ($level:expr, $logger:expr, $($arg:tt)+) => {{
        $logger
            .record($level, $crate::source!())
            .printf(::core::format_args!($($arg)+));
    }};
}

/**
Produce a record at the `DEBUG` level.

With just a logger, this returns a [`Record`](crate::Record) to append to. The record is finished when it goes out of scope:

```
# let logger = quill::setup().min_level(quill::Level::Debug).spawn().unwrap();
quill::debug!(logger).append("loaded ").append(3).append(" items");
```

With a format string, the formatted text is appended and the record is finished immediately:

```
# let logger = quill::setup().min_level(quill::Level::Debug).spawn().unwrap();
quill::debug!(logger, "loaded {} items", 3);
```
*/
#[macro_export]
macro_rules! debug {
    ($($tt:tt)+) => {
        $crate::__record!($crate::Level::Debug, $($tt)+)
    };
}

/**
Produce a record at the `NEED` level.

See [`debug!`](crate::debug) for usage.
*/
#[macro_export]
macro_rules! need {
    ($($tt:tt)+) => {
        $crate::__record!($crate::Level::Need, $($tt)+)
    };
}

/**
Produce a record at the `INFO` level.

See [`debug!`](crate::debug) for usage.
*/
#[macro_export]
macro_rules! info {
    ($($tt:tt)+) => {
        $crate::__record!($crate::Level::Info, $($tt)+)
    };
}

/**
Produce a record at the `WARN` level.

See [`debug!`](crate::debug) for usage.
*/
#[macro_export]
macro_rules! warn {
    ($($tt:tt)+) => {
        $crate::__record!($crate::Level::Warn, $($tt)+)
    };
}

/**
Produce a record at the `ERROR` level.

See [`debug!`](crate::debug) for usage.
*/
#[macro_export]
macro_rules! error {
    ($($tt:tt)+) => {
        $crate::__record!($crate::Level::Error, $($tt)+)
    };
}

/**
Produce a record at the `FATAL` level.

See [`debug!`](crate::debug) for usage.
*/
#[macro_export]
macro_rules! fatal {
    ($($tt:tt)+) => {
        $crate::__record!($crate::Level::Fatal, $($tt)+)
    };
}
