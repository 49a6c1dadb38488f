//! Escape processing for string and template literals.
//!
//! Valid escapes: `\\` `\n` `\t` `\r` `\b` `\f` `\0` `\'` `\"` `` \` `` `\$`
//! and `\uXXXX`.

use ember_ir::Span;

use crate::lex_error::{LexError, LexErrorKind};

/// Unescape literal content.
///
/// `base_offset` is the source offset of `content`, used to position errors.
/// Returns `Ok(None)` when there is nothing to cook so the caller can intern
/// the slice directly.
pub fn cook(content: &str, base_offset: u32) -> Result<Option<String>, LexError> {
    if !content.contains('\\') {
        return Ok(None);
    }

    let mut result = String::with_capacity(content.len());
    let mut chars = content.char_indices();

    while let Some((i, c)) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        let at = |len: usize| {
            let start = base_offset.saturating_add(u32::try_from(i).unwrap_or(u32::MAX));
            Span::new(
                start,
                start.saturating_add(u32::try_from(len).unwrap_or(u32::MAX)),
            )
        };
        match chars.next() {
            Some((_, esc)) => match esc {
                '\\' => result.push('\\'),
                'n' => result.push('\n'),
                't' => result.push('\t'),
                'r' => result.push('\r'),
                'b' => result.push('\u{8}'),
                'f' => result.push('\u{c}'),
                '0' => result.push('\0'),
                '\'' | '"' | '`' | '$' => result.push(esc),
                'u' => {
                    let hex: String = chars.by_ref().take(4).map(|(_, h)| h).collect();
                    let decoded = (hex.len() == 4)
                        .then(|| u32::from_str_radix(&hex, 16).ok())
                        .flatten()
                        .and_then(char::from_u32);
                    match decoded {
                        Some(ch) => result.push(ch),
                        None => {
                            return Err(LexError::new(
                                LexErrorKind::InvalidUnicodeEscape,
                                at(2 + hex.len()),
                            ))
                        }
                    }
                }
                other => return Err(LexError::invalid_escape(at(1 + other.len_utf8()), other)),
            },
            None => return Err(LexError::invalid_escape(at(1), '\\')),
        }
    }

    Ok(Some(result))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_escapes_is_fast_path() {
        assert_eq!(cook("plain", 0), Ok(None));
    }

    #[test]
    fn test_common_escapes() {
        assert_eq!(
            cook(r"a\nb\t\'\\", 0),
            Ok(Some("a\nb\t'\\".to_owned()))
        );
    }

    #[test]
    fn test_unicode_escape() {
        assert_eq!(cook(r"\u0041", 0), Ok(Some("A".to_owned())));
        assert_eq!(
            cook(r"\u00G1", 0).map_err(|e| e.kind),
            Err(LexErrorKind::InvalidUnicodeEscape)
        );
    }

    #[test]
    fn test_invalid_escape_is_positioned() {
        let err = cook(r"ab\q", 10).err();
        assert_eq!(
            err,
            Some(LexError::invalid_escape(Span::new(12, 14), 'q'))
        );
    }
}
