//! JSON-with-comments support for `tsconfig.json`.
//!
//! Comments and trailing commas are blanked out with spaces before the text is
//! handed to `serde_json`, so line and column numbers in its errors still point
//! at the original text.

use serde_json::Value;

/// Replace `//` and `/* */` comments and trailing commas with whitespace
///
/// Newlines inside block comments are kept. String literals are copied
/// untouched, escapes included.
pub fn strip(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'"' => {
                out.push(b'"');
                i += 1;
                while i < bytes.len() {
                    let byte = bytes[i];
                    out.push(byte);
                    i += 1;
                    if byte == b'\\' && i < bytes.len() {
                        out.push(bytes[i]);
                        i += 1;
                    } else if byte == b'"' {
                        break;
                    }
                }
            }
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    out.push(if bytes[i] == b'\r' { b'\r' } else { b' ' });
                    i += 1;
                }
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                out.extend_from_slice(b"  ");
                i += 2;
                while i < bytes.len() {
                    if bytes[i] == b'*' && bytes.get(i + 1) == Some(&b'/') {
                        out.extend_from_slice(b"  ");
                        i += 2;
                        break;
                    }
                    out.push(if bytes[i] == b'\n' || bytes[i] == b'\r' { bytes[i] } else { b' ' });
                    i += 1;
                }
            }
            b',' if next_significant(bytes, i + 1).is_some_and(|b| b == b'}' || b == b']') => {
                out.push(b' ');
                i += 1;
            }
            byte => {
                out.push(byte);
                i += 1;
            }
        }
    }

    // Only ASCII bytes were replaced, with ASCII, so the result is still UTF-8.
    String::from_utf8(out).unwrap_or_else(|err| String::from_utf8_lossy(err.as_bytes()).into_owned())
}

/// First byte after `from` that is not whitespace or part of a comment
fn next_significant(bytes: &[u8], mut from: usize) -> Option<u8> {
    while from < bytes.len() {
        match bytes[from] {
            b' ' | b'\t' | b'\n' | b'\r' => from += 1,
            b'/' if bytes.get(from + 1) == Some(&b'/') => {
                while from < bytes.len() && bytes[from] != b'\n' {
                    from += 1;
                }
            }
            b'/' if bytes.get(from + 1) == Some(&b'*') => {
                from += 2;
                while from < bytes.len()
                    && !(bytes[from] == b'*' && bytes.get(from + 1) == Some(&b'/'))
                {
                    from += 1;
                }
                from += 2;
            }
            byte => return Some(byte),
        }
    }
    None
}

/// Parse JSONC text into a `serde_json::Value`
///
/// A leading byte order mark is skipped and blank input reads as `{}`.
pub fn parse(text: &str) -> Result<Value, serde_json::Error> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let stripped = strip(text);
    if stripped.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_str(&stripped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn strips_line_and_block_comments() {
        let text = "{\n  // line\n  \"a\": /* inline */ 1\n}";
        assert_eq!(parse(text).unwrap(), json!({ "a": 1 }));
        assert_eq!(strip(text).len(), text.len());
        assert_eq!(strip(text).lines().count(), text.lines().count());
    }

    #[test]
    fn keeps_comment_markers_inside_strings() {
        let text = r#"{ "include": ["src/**/*", "http://x/*y*/"], "q": "a\"//b" }"#;
        assert_eq!(
            parse(text).unwrap(),
            json!({ "include": ["src/**/*", "http://x/*y*/"], "q": "a\"//b" })
        );
    }

    #[test]
    fn drops_trailing_commas() {
        let text = "{ \"a\": [1, 2,], \"b\": { \"c\": true, /* x */ }, }";
        assert_eq!(parse(text).unwrap(), json!({ "a": [1, 2], "b": { "c": true } }));
    }

    #[test]
    fn blank_and_bom_input() {
        assert_eq!(parse("  \n").unwrap(), json!({}));
        assert_eq!(parse("\u{feff}{}").unwrap(), json!({}));
    }

    #[test]
    fn syntax_errors_keep_positions() {
        let err = parse("{\n  // c\n  \"a\": }").unwrap_err();
        assert_eq!(err.line(), 3);
    }
}
