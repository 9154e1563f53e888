/*!
The [`Source`] type.

A source is the call site a record was produced at. Use the [`source!`](crate::source) macro to capture one.
*/

use core::fmt;

/**
The file, function, and line a record was produced at.
*/
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Source {
    file: &'static str,
    function: &'static str,
    line: u32,
}

impl Source {
    /**
    Create a source from its parts.

    The `file` may be a full path; only its base name is rendered.
    */
    pub const fn new(file: &'static str, function: &'static str, line: u32) -> Self {
        Source {
            file,
            function,
            line,
        }
    }

    /**
    The base name of the source file, without any leading directories.
    */
    pub fn file(&self) -> &'static str {
        base_name(self.file)
    }

    /**
    The name of the function.
    */
    pub const fn function(&self) -> &'static str {
        self.function
    }

    /**
    The line number.
    */
    pub const fn line(&self) -> u32 {
        self.line
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}][{}({})]", self.file(), self.function, self.line)
    }
}

/**
Strip any `/` or `\` separated directories from `path`.
*/
pub fn base_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/**
Get the innermost named function from the type name of a function item declared inside it.

This is used by [`source!`](crate::source), which declares a function `__f` at the call site and passes its type name here. Closures and async blocks between the call site and the enclosing function are skipped.
*/
pub fn function_name(type_name: &'static str) -> &'static str {
    let mut name = type_name.strip_suffix("::__f").unwrap_or(type_name);

    while let Some(outer) = name.strip_suffix("::{{closure}}") {
        name = outer;
    }

    name.rsplit("::").next().unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_name_strips_directories() {
        for (path, expected) in [
            ("main.rs", "main.rs"),
            ("src/main.rs", "main.rs"),
            ("/home/user/app/src/main.rs", "main.rs"),
            ("C:\\app\\src\\main.rs", "main.rs"),
            ("src\\nested/mixed.rs", "mixed.rs"),
            ("", ""),
        ] {
            assert_eq!(expected, base_name(path), "{}", path);
        }
    }

    #[test]
    fn function_name_skips_closures() {
        assert_eq!("run", function_name("app::worker::run::__f"));
        assert_eq!(
            "run",
            function_name("app::worker::run::{{closure}}::{{closure}}::__f")
        );
        assert_eq!("main", function_name("main::__f"));
    }

    #[test]
    fn source_captures_the_call_site() {
        let source = crate::source!();

        assert_eq!("source.rs", source.file());
        assert_eq!("source_captures_the_call_site", source.function());
        assert_eq!(line!() - 4, source.line());
    }

    #[test]
    fn source_in_closure_uses_enclosing_function() {
        let source = (|| crate::source!())();

        assert_eq!("source_in_closure_uses_enclosing_function", source.function());
    }

    #[test]
    fn source_display() {
        let source = Source::new("src/app/main.rs", "main", 42);

        assert_eq!("[main.rs][main(42)]", source.to_string());
    }
}
