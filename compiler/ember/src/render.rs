//! Error rendering with source snippets.

use std::io::Write;

use ariadne::{Color, Config, Label, Report, ReportKind, Source};

use crate::error::Error;

/// Render `error` against the source it came from.
///
/// Errors without a span (cancellation) render as a single line.
pub fn render_error_to(
    error: &Error,
    name: &str,
    source: &str,
    writer: &mut dyn Write,
    color: bool,
) -> std::io::Result<()> {
    let Some(span) = error.span() else {
        return writeln!(writer, "error: {error}");
    };
    let range = span.to_range();
    let range = range.start.min(source.len())..range.end.min(source.len());

    let title = match error {
        Error::Parse(_) => "parse error",
        Error::Runtime(_) => "runtime error",
        Error::Thrown { .. } => "uncaught exception",
        Error::Assertion { .. } => "assertion failed",
        Error::Cancelled => "cancelled",
    };

    Report::build(ReportKind::Error, (name, range.clone()))
        .with_config(Config::default().with_color(color))
        .with_message(title)
        .with_label(
            Label::new((name, range))
                .with_message(error.message())
                .with_color(Color::Red),
        )
        .finish()
        .write((name, Source::from(source)), &mut *writer)
}

/// Render to a string without color codes.
pub fn render_error_to_string(error: &Error, name: &str, source: &str) -> String {
    let mut buf = Vec::new();
    render_error_to(error, name, source, &mut buf, false).ok();
    String::from_utf8_lossy(&buf).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Engine;

    #[test]
    fn test_parse_error_shows_source() {
        let source = "x = (1 + ]";
        let Err(err) = Engine::new().create_script(source) else {
            panic!("expected a parse error");
        };
        let output = render_error_to_string(&err, "input", source);
        assert!(output.contains("parse error"));
        assert!(output.contains("x = (1 + ]"));
    }

    #[test]
    fn test_spanless_error_is_one_line() {
        let output = render_error_to_string(&Error::Cancelled, "input", "x");
        assert_eq!(output, "error: evaluation cancelled\n");
    }
}
