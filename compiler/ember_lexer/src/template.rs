//! Splitting template literal bodies into text and `${...}` segments.

use crate::cook_escape::cook;
use crate::lex_error::{LexError, LexErrorKind};
use ember_ir::Span;

/// One piece of a template body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TemplateSegment {
    /// Cooked text.
    Text(String),
    /// Embedded expression source, as a byte range of the raw body.
    Expr { start: usize, end: usize },
}

fn offset(base: u32, at: usize) -> u32 {
    base.saturating_add(u32::try_from(at).unwrap_or(u32::MAX))
}

/// Split a raw template body (between the backticks).
///
/// `base_offset` is the source offset of the body. Braces inside an
/// interpolation nest, and quoted strings inside it may contain `}`.
pub fn split_template(raw: &str, base_offset: u32) -> Result<Vec<TemplateSegment>, LexError> {
    let bytes = raw.as_bytes();
    let mut segments = Vec::new();
    let mut text_start = 0;
    let mut i = 0;

    let flush = |segments: &mut Vec<TemplateSegment>, from: usize, to: usize| {
        if from < to {
            let slice = &raw[from..to];
            let text = cook(slice, offset(base_offset, from))?.unwrap_or_else(|| slice.to_owned());
            segments.push(TemplateSegment::Text(text));
        }
        Ok::<(), LexError>(())
    };

    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'$' if bytes.get(i + 1) == Some(&b'{') => {
                flush(&mut segments, text_start, i)?;
                let expr_start = i + 2;
                let expr_end = find_closing_brace(bytes, expr_start).ok_or_else(|| {
                    LexError::new(
                        LexErrorKind::UnterminatedInterpolation,
                        Span::new(offset(base_offset, i), offset(base_offset, raw.len())),
                    )
                })?;
                segments.push(TemplateSegment::Expr {
                    start: expr_start,
                    end: expr_end,
                });
                i = expr_end + 1;
                text_start = i;
            }
            _ => i += 1,
        }
    }
    flush(&mut segments, text_start, raw.len())?;
    Ok(segments)
}

/// Length of a template body plus its closing backtick, starting just
/// after the opening one; `None` if the template never closes.
pub(crate) fn template_len(bytes: &[u8]) -> Option<usize> {
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'`' => return Some(i + 1),
            b'$' if bytes.get(i + 1) == Some(&b'{') => i = find_closing_brace(bytes, i + 2)? + 1,
            _ => i += 1,
        }
    }
    None
}

/// Index of the `}` closing an interpolation that starts at `from`.
///
/// Quoted strings and nested templates inside it are skipped whole.
fn find_closing_brace(bytes: &[u8], from: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut i = from;
    while i < bytes.len() {
        let b = bytes[i];
        if let Some(q) = quote {
            if b == b'\\' {
                i += 1;
            } else if b == q {
                quote = None;
            }
        } else {
            match b {
                b'\'' | b'"' => quote = Some(b),
                b'`' => {
                    i += 1 + template_len(&bytes[i + 1..])?;
                    continue;
                }
                b'{' => depth += 1,
                b'}' if depth == 0 => return Some(i),
                b'}' => depth -= 1,
                _ => {}
            }
        }
        i += 1;
    }
    None
}
