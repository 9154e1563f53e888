/*!
Internal metrics.

Each crate in the workspace tracks the health of its part of the pipeline with relaxed atomic [`Counter`]s. They're declared with the [`metrics!`](crate::metrics) macro and sampled as an iterator of [`Metric`]s.
*/

use core::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

/**
A sampled value of an internal counter or gauge.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Metric {
    source: &'static str,
    name: &'static str,
    value: usize,
}

impl Metric {
    /**
    Create a new metric sample.

    The `source` is the name of the crate that produced it.
    */
    pub const fn new(source: &'static str, name: &'static str, value: usize) -> Self {
        Metric {
            source,
            name,
            value,
        }
    }

    /**
    The crate that produced the sample.
    */
    pub const fn source(&self) -> &'static str {
        self.source
    }

    /**
    The name of the metric.
    */
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /**
    The sampled value.
    */
    pub const fn value(&self) -> usize {
        self.value
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}: {}", self.source, self.name, self.value)
    }
}

/**
A monotonic counter.
*/
#[derive(Default)]
pub struct Counter(AtomicUsize);

impl Counter {
    /**
    Add one to the counter.
    */
    pub fn increment(&self) {
        self.increment_by(1);
    }

    /**
    Add `by` to the counter.
    */
    pub fn increment_by(&self, by: usize) {
        self.0.fetch_add(by, Ordering::Relaxed);
    }

    /**
    Get the current value of the counter.
    */
    pub fn sample(&self) -> usize {
        self.0.load(Ordering::Relaxed)
    }
}

/**
Declare a container of [`Counter`]s with a `sample` method.

The generated `sample` method yields one [`Metric`] per field, named after the field and sourced from the calling crate.
*/
#[macro_export]
macro_rules! metrics {
    ($(#[$meta:meta])* $vis:vis struct $container:ident {
        $(
            $name:ident: $ty:ty,
        )*
    }) => {
        $(#[$meta])*
        #[derive(Default)]
        $vis struct $container {
            $(
                pub(crate) $name: $ty
            ),*
        }

        impl $container {
            #[allow(dead_code)]
            pub(crate) fn sample(
                &self,
            ) -> impl Iterator<Item = $crate::metric::Metric> + 'static {
                let $container {
                    $(
                        $name
                    ),*
                } = self;

                [
                    $(
                        $crate::metric::Metric::new(
                            env!("CARGO_PKG_NAME"),
                            stringify!($name),
                            $name.sample(),
                        )
                    ),*
                ]
                .into_iter()
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    metrics!(struct TestMetrics {
        a: Counter,
        b: Counter,
    });

    #[test]
    fn sample_yields_every_counter() {
        let metrics = TestMetrics::default();

        metrics.a.increment();
        metrics.b.increment_by(3);

        let sampled: Vec<_> = metrics.sample().collect();

        assert_eq!(
            vec![
                Metric::new("quill_core", "a", 1),
                Metric::new("quill_core", "b", 3),
            ],
            sampled
        );
    }
}
