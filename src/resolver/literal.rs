//! Structural decoder for the legacy serialized configuration.
//!
//! Older firmware stores its whole configuration as one text dataset holding
//! a literal mapping:
//!
//! ```text
//! {'nimages': 100, 'ntrigger': 1, 'omega_increment': 0.1,
//!  'roi_mode': None, 'flatfield_correction_applied': True,
//!  'beam_center': (1605.2, 1702.9), 'description': b'EIGER2 XE 16M'}
//! ```
//!
//! Supported syntax:
//! - mappings `{k: v, ...}`, lists `[...]` and tuples `(...)`, trailing commas allowed
//! - single or double quoted strings with backslash escapes, optional
//!   `b`/`u`/`r` prefixes
//! - integers and floats (with exponent), signed
//!
//! Strings decode to text, so a `b'...'` literal must hold ASCII only: a
//! `\xNN` escape above `\x7f` is rejected rather than widened to a code
//! point. Integers must fit in `i64` (or `u64` when positive); larger ones are
//! rejected rather than rounded to a float.
//! - `True`, `False`, `None`
//!
//! Values are parsed into [`serde_json::Value`]. Nothing is evaluated.

use serde_json::{Map, Number, Value};

use super::ResolveError;

/// Maximum nesting of containers
const MAX_DEPTH: usize = 64;

/// Decode a serialized mapping.
///
/// Fails with [`ResolveError::DecodeError`] on any syntax error, on trailing
/// content, or when the top-level value is not a mapping.
pub fn decode_mapping(text: &str) -> Result<Map<String, Value>, ResolveError> {
    match decode(text)? {
        Value::Object(map) => Ok(map),
        other => Err(ResolveError::DecodeError {
            offset: 0,
            message: format!("expected a mapping at top level, found {}", kind_name(&other)),
        }),
    }
}

/// Decode any single literal value
pub fn decode(text: &str) -> Result<Value, ResolveError> {
    let mut parser = Parser {
        input: text.as_bytes(),
        pos: 0,
    };
    let value = parser.value(0)?;
    parser.skip_whitespace();
    if parser.pos != parser.input.len() {
        return Err(parser.error("unexpected trailing content"));
    }
    Ok(value)
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "None",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}

struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn error(&self, message: impl Into<String>) -> ResolveError {
        ResolveError::DecodeError {
            offset: self.pos,
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\n' | b'\r')) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, byte: u8) -> Result<(), ResolveError> {
        if self.peek() == Some(byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(format!("expected '{}'", byte as char)))
        }
    }

    fn value(&mut self, depth: usize) -> Result<Value, ResolveError> {
        if depth > MAX_DEPTH {
            return Err(self.error("nesting too deep"));
        }
        self.skip_whitespace();

        match self.peek() {
            None => Err(self.error("unexpected end of input")),
            Some(b'{') => self.mapping(depth),
            Some(b'[') => self.sequence(b']', depth),
            Some(b'(') => self.sequence(b')', depth),
            Some(b'\'' | b'"') => self.string(false, false).map(Value::String),
            Some(b'-' | b'+' | b'.' | b'0'..=b'9') => self.number(),
            Some(c) if c.is_ascii_alphabetic() => self.word(),
            Some(c) => Err(self.error(format!("unexpected character '{}'", c as char))),
        }
    }

    fn mapping(&mut self, depth: usize) -> Result<Value, ResolveError> {
        self.expect(b'{')?;
        let mut map = Map::new();

        loop {
            self.skip_whitespace();
            if self.peek() == Some(b'}') {
                self.pos += 1;
                return Ok(Value::Object(map));
            }

            let key_offset = self.pos;
            let key = match self.value(depth + 1)? {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => (if b { "True" } else { "False" }).to_string(),
                Value::Null => "None".to_string(),
                _ => {
                    return Err(ResolveError::DecodeError {
                        offset: key_offset,
                        message: "mapping keys must be scalars".to_string(),
                    })
                }
            };

            self.skip_whitespace();
            self.expect(b':')?;
            let value = self.value(depth + 1)?;
            map.insert(key, value);

            self.skip_whitespace();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b'}') => {}
                _ => return Err(self.error("expected ',' or '}'")),
            }
        }
    }

    fn sequence(&mut self, close: u8, depth: usize) -> Result<Value, ResolveError> {
        self.pos += 1;
        let mut items = Vec::new();

        loop {
            self.skip_whitespace();
            if self.peek() == Some(close) {
                self.pos += 1;
                return Ok(Value::Array(items));
            }

            items.push(self.value(depth + 1)?);

            self.skip_whitespace();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(c) if c == close => {}
                _ => return Err(self.error(format!("expected ',' or '{}'", close as char))),
            }
        }
    }

    fn word(&mut self) -> Result<Value, ResolveError> {
        let input = self.input;
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == b'_') {
            self.pos += 1;
        }
        let word = &input[start..self.pos];

        match word {
            b"True" => Ok(Value::Bool(true)),
            b"False" => Ok(Value::Bool(false)),
            b"None" => Ok(Value::Null),
            prefix
                if prefix.len() <= 2
                    && prefix.iter().all(|c| b"bBuUrR".contains(c))
                    && matches!(self.peek(), Some(b'\'' | b'"')) =>
            {
                let raw = prefix.iter().any(|c| *c == b'r' || *c == b'R');
                let bytes = prefix.iter().any(|c| *c == b'b' || *c == b'B');
                self.string(raw, bytes).map(Value::String)
            }
            _ => {
                self.pos = start;
                Err(self.error(format!(
                    "unknown name '{}'",
                    String::from_utf8_lossy(word)
                )))
            }
        }
    }

    fn string(&mut self, raw: bool, bytes: bool) -> Result<String, ResolveError> {
        let quote = match self.peek() {
            Some(q @ (b'\'' | b'"')) => q,
            _ => return Err(self.error("expected a quote")),
        };
        self.pos += 1;

        let mut out: Vec<u8> = Vec::new();
        loop {
            let c = self
                .peek()
                .ok_or_else(|| self.error("unterminated string"))?;
            self.pos += 1;

            match c {
                c if c == quote => break,
                b'\n' => return Err(self.error("newline in string")),
                b'\\' if raw => {
                    // A raw string still cannot end on an escaped quote
                    out.push(b'\\');
                    if let Some(next) = self.peek() {
                        out.push(next);
                        self.pos += 1;
                    }
                }
                b'\\' => self.escape(&mut out, bytes)?,
                c if bytes && !c.is_ascii() => {
                    self.pos -= 1;
                    return Err(self.error("non-ASCII character in bytes literal"));
                }
                c => out.push(c),
            }
        }

        String::from_utf8(out).map_err(|_| self.error("string is not valid UTF-8"))
    }

    fn escape(&mut self, out: &mut Vec<u8>, bytes: bool) -> Result<(), ResolveError> {
        let c = self
            .peek()
            .ok_or_else(|| self.error("unterminated escape"))?;
        self.pos += 1;

        match c {
            b'\\' | b'\'' | b'"' => out.push(c),
            b'n' => out.push(b'\n'),
            b't' => out.push(b'\t'),
            b'r' => out.push(b'\r'),
            b'0' => out.push(0),
            b'\n' => {}
            b'x' if bytes => self.push_byte(out)?,
            b'x' => self.push_code_point(2, out)?,
            b'u' | b'U' if bytes => {
                out.push(b'\\');
                out.push(c);
            }
            b'u' => self.push_code_point(4, out)?,
            b'U' => self.push_code_point(8, out)?,
            other => {
                out.push(b'\\');
                out.push(other);
            }
        }
        Ok(())
    }

    fn push_byte(&mut self, out: &mut Vec<u8>) -> Result<(), ResolveError> {
        let start = self.pos;
        let mut ascii = Vec::new();
        self.push_code_point(2, &mut ascii)?;
        match ascii.as_slice() {
            [byte] => {
                out.push(*byte);
                Ok(())
            }
            _ => {
                self.pos = start;
                Err(self.error("byte escape above \\x7f cannot be decoded as text"))
            }
        }
    }

    fn push_code_point(&mut self, digits: usize, out: &mut Vec<u8>) -> Result<(), ResolveError> {
        let end = self.pos + digits;
        let hex = self
            .input
            .get(self.pos..end)
            .and_then(|h| std::str::from_utf8(h).ok())
            .ok_or_else(|| self.error("truncated escape"))?;
        let code = u32::from_str_radix(hex, 16).map_err(|_| self.error("invalid hex escape"))?;
        let ch = char::from_u32(code).ok_or_else(|| self.error("invalid code point"))?;
        self.pos = end;

        let mut buf = [0u8; 4];
        out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
        Ok(())
    }

    fn number(&mut self) -> Result<Value, ResolveError> {
        let start = self.pos;
        let mut is_float = false;

        if matches!(self.peek(), Some(b'-' | b'+')) {
            self.pos += 1;
        }
        while let Some(c) = self.peek() {
            match c {
                b'0'..=b'9' | b'_' => {}
                b'.' => is_float = true,
                b'e' | b'E' => {
                    is_float = true;
                    if matches!(self.input.get(self.pos + 1), Some(b'-' | b'+')) {
                        self.pos += 1;
                    }
                }
                _ => break,
            }
            self.pos += 1;
        }

        let text: String = String::from_utf8_lossy(&self.input[start..self.pos])
            .chars()
            .filter(|c| *c != '_')
            .collect();

        if !is_float {
            if let Ok(int) = text.parse::<i64>() {
                return Ok(Value::Number(int.into()));
            }
            if let Ok(int) = text.parse::<u64>() {
                return Ok(Value::Number(int.into()));
            }
            let digits = text.trim_start_matches(['-', '+']);
            if !digits.is_empty() && digits.bytes().all(|c| c.is_ascii_digit()) {
                return Err(ResolveError::DecodeError {
                    offset: start,
                    message: format!("integer '{}' out of range", text),
                });
            }
        }
        text.parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| ResolveError::DecodeError {
                offset: start,
                message: format!("invalid number '{}'", text),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_configuration_mapping() {
        let text = "{'nimages': 100, 'ntrigger': 1, 'omega_increment': 0.1,\n \
                    'roi_mode': None, 'flatfield_correction_applied': True,\n \
                    'beam_center': (1605.2, 1702.9), 'description': b'EIGER2 XE 16M'}";
        let map = decode_mapping(text).unwrap();

        assert_eq!(map["nimages"], json!(100));
        assert_eq!(map["ntrigger"], json!(1));
        assert_eq!(map["omega_increment"], json!(0.1));
        assert_eq!(map["roi_mode"], Value::Null);
        assert_eq!(map["flatfield_correction_applied"], json!(true));
        assert_eq!(map["beam_center"], json!([1605.2, 1702.9]));
        assert_eq!(map["description"], json!("EIGER2 XE 16M"));
    }

    #[test]
    fn test_nested_and_trailing_commas() {
        let map = decode_mapping(r#"{"a": {"b": [1, 2,], "c": (3,)}, 4: -2.5e-3,}"#).unwrap();
        assert_eq!(map["a"], json!({"b": [1, 2], "c": [3]}));
        assert_eq!(map["4"], json!(-0.0025));
    }

    #[test]
    fn test_escapes() {
        assert_eq!(decode(r"'it\'s\tfine\x41'").unwrap(), json!("it's\tfineA"));
        assert_eq!(decode(r"r'C:\data'").unwrap(), json!(r"C:\data"));
        assert_eq!(decode(r#""\u00e9""#).unwrap(), json!("é"));
    }

    #[test]
    fn test_code_is_rejected() {
        let err = decode_mapping("{'a': __import__('os')}").unwrap_err();
        assert!(matches!(err, ResolveError::DecodeError { offset: 6, .. }));
    }

    #[test]
    fn test_top_level_must_be_mapping() {
        assert!(matches!(
            decode_mapping("[1, 2]"),
            Err(ResolveError::DecodeError { .. })
        ));
    }

    #[test]
    fn test_syntax_errors() {
        for text in ["{'a': 1", "{'a' 1}", "{'a': 1} extra", "'open", "{[1]: 2}", ""] {
            assert!(
                matches!(decode_mapping(text), Err(ResolveError::DecodeError { .. })),
                "{:?} should fail",
                text
            );
        }
    }

    #[test]
    fn test_bytes_literals_stay_ascii() {
        assert_eq!(decode(r"b'EIGER\x41'").unwrap(), json!("EIGERA"));
        assert_eq!(decode(r"b'\u00e9'").unwrap(), json!(r"\u00e9"));
        assert!(matches!(
            decode(r"b'\xff'"),
            Err(ResolveError::DecodeError { offset: 4, .. })
        ));
        assert!(decode("b'caf\u{e9}'").is_err());
        // Outside bytes literals the escape is a code point
        assert_eq!(decode(r"'\xff'").unwrap(), json!("\u{ff}"));
    }

    #[test]
    fn test_integer_range() {
        assert_eq!(decode("-9223372036854775808").unwrap(), json!(i64::MIN));
        assert_eq!(decode("18446744073709551615").unwrap(), json!(u64::MAX));
        assert!(matches!(
            decode("{'n': 18446744073709551616}"),
            Err(ResolveError::DecodeError { offset: 6, .. })
        ));
        assert!(decode("-9223372036854775809").is_err());
        assert_eq!(decode("1e30").unwrap(), json!(1e30));
    }

    #[test]
    fn test_nesting_limit() {
        let deep = format!("{}{}", "[".repeat(MAX_DEPTH + 2), "]".repeat(MAX_DEPTH + 2));
        assert!(decode(&deep).is_err());
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Arbitrary text is either decoded or rejected, never a panic
            #[test]
            fn test_decode_never_panics(text in "\\PC{0,64}") {
                let _ = decode(&text);
            }

            /// Flat integer mappings decode to the same keys and values
            #[test]
            fn test_integer_mapping(entries in prop::collection::btree_map("[a-z_]{1,12}", any::<i32>(), 0..12)) {
                let text = format!(
                    "{{{}}}",
                    entries
                        .iter()
                        .map(|(k, v)| format!("'{}': {}", k, v))
                        .collect::<Vec<_>>()
                        .join(", ")
                );
                let map = decode_mapping(&text).unwrap();
                prop_assert_eq!(map.len(), entries.len());
                for (key, value) in &entries {
                    prop_assert_eq!(map[key.as_str()].as_i64(), Some(i64::from(*value)));
                }
            }
        }
    }
}
