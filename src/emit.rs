//! Rendering of sampled runs as numbered test-case macro invocations.
//!
//! Each run becomes one line of the form
//!
//! ```text
//! test_macro!(test_003: inline, f64, (8, 7, 1, 3), 'R', 'C');
//! ```
//!
//! where the argument list is produced by a caller-supplied closure. The
//! output is meant to be pasted into a `#[cfg(test)]` module that defines
//! the macro.
//!
//! # Example
//!
//! ```
//! use doe_sampler::emit::CaseEmitter;
//!
//! let runs = vec![vec!["f32", "R"], vec!["f64", "C"]];
//! let lines = CaseEmitter::new("test_macro", "inline")
//!     .render_runs(&runs, |run| format!("{}, '{}'", run[0], run[1]));
//!
//! assert_eq!(lines[0], "test_macro!(test_000: inline, f32, 'R');");
//! assert_eq!(lines[1], "test_macro!(test_001: inline, f64, 'C');");
//! ```

/// Name of the `n`-th generated test case, zero-padded to three digits.
#[must_use]
pub fn case_name(n: usize) -> String {
    format!("test_{n:03}")
}

/// Renders runs as `macro!(test_NNN: mode, args);` lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseEmitter {
    /// Name of the macro being invoked, without the `!`.
    pub macro_name: String,
    /// First token inside the invocation, e.g. `inline` or `should_panic`.
    pub mode: String,
    /// Number of the first emitted case.
    pub first: usize,
}

impl CaseEmitter {
    /// Create an emitter numbering cases from zero.
    pub fn new(macro_name: impl Into<String>, mode: impl Into<String>) -> Self {
        Self {
            macro_name: macro_name.into(),
            mode: mode.into(),
            first: 0,
        }
    }

    /// Start numbering at `first`, e.g. 100 for a block of failure cases.
    #[must_use]
    pub fn starting_at(mut self, first: usize) -> Self {
        self.first = first;
        self
    }

    /// Render a single case with already formatted arguments.
    #[must_use]
    pub fn render(&self, index: usize, args: &str) -> String {
        format!(
            "{}!({}: {}, {});",
            self.macro_name,
            case_name(self.first + index),
            self.mode,
            args
        )
    }

    /// Render one line per run, formatting arguments with `args`.
    pub fn render_runs<T, F>(&self, runs: &[Vec<T>], mut args: F) -> Vec<String>
    where
        F: FnMut(&[T]) -> String,
    {
        runs.iter()
            .enumerate()
            .map(|(n, run)| self.render(n, &args(run)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_name() {
        assert_eq!(case_name(0), "test_000");
        assert_eq!(case_name(42), "test_042");
        assert_eq!(case_name(1234), "test_1234");
    }

    #[test]
    fn test_render_matches_gemm_style() {
        let emitter = CaseEmitter::new("test_macro", "inline");
        let line = emitter.render(0, "f32, (7, 8, 1, 1), (8, 9, 1, 1), 'R', 'R', 'N', 'N'");
        assert_eq!(
            line,
            "test_macro!(test_000: inline, f32, (7, 8, 1, 1), (8, 9, 1, 1), 'R', 'R', 'N', 'N');"
        );
    }

    #[test]
    fn test_starting_offset() {
        let runs = vec![vec![7, 5], vec![8, 9]];
        let lines = CaseEmitter::new("test_macro", "should_panic")
            .starting_at(100)
            .render_runs(&runs, |run| format!("({}, {})", run[0], run[1]));

        assert_eq!(
            lines,
            vec![
                "test_macro!(test_100: should_panic, (7, 5));",
                "test_macro!(test_101: should_panic, (8, 9));"
            ]
        );
    }

    #[test]
    fn test_render_nothing() {
        let runs: Vec<Vec<u8>> = Vec::new();
        let lines = CaseEmitter::new("m", "inline").render_runs(&runs, |_| String::new());
        assert!(lines.is_empty());
    }
}
