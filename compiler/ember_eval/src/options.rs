//! Evaluation options.

/// Evaluation flags, fixed for the duration of one evaluation.
///
/// Engine-wide defaults come from the builder; a [`Context`](crate::Context)
/// may replace them by returning `Some` from `options()`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Options {
    /// Unknown variables, properties and methods are failures.
    pub strict: bool,
    /// Strict-mode lookup failures become null with a warning.
    pub silent: bool,
    /// `assert` statements are checked.
    pub assertions: bool,
    /// Cancellation raises `Cancelled` instead of yielding null.
    pub cancellable: bool,
    /// Null operands are arithmetic failures instead of zero.
    pub strict_arithmetic: bool,
    /// Significant digits for host decimal arithmetic; carried for delegates.
    pub math_precision: Option<u32>,
    /// Decimal places float division rounds to; negative leaves it unrounded.
    pub math_scale: i32,
    pub charset: String,
    /// Maximum nesting of script function calls.
    pub max_depth: usize,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            strict: false,
            silent: false,
            assertions: false,
            cancellable: true,
            strict_arithmetic: false,
            math_precision: None,
            math_scale: -1,
            charset: "UTF-8".to_owned(),
            max_depth: 512,
        }
    }
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    #[must_use]
    pub fn with_silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    #[must_use]
    pub fn with_assertions(mut self, assertions: bool) -> Self {
        self.assertions = assertions;
        self
    }

    #[must_use]
    pub fn with_cancellable(mut self, cancellable: bool) -> Self {
        self.cancellable = cancellable;
        self
    }

    #[must_use]
    pub fn with_strict_arithmetic(mut self, strict_arithmetic: bool) -> Self {
        self.strict_arithmetic = strict_arithmetic;
        self
    }

    #[must_use]
    pub fn with_math_precision(mut self, precision: Option<u32>) -> Self {
        self.math_precision = precision;
        self
    }

    #[must_use]
    pub fn with_math_scale(mut self, scale: i32) -> Self {
        self.math_scale = scale;
        self
    }

    #[must_use]
    pub fn with_charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = charset.into();
        self
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}
