//! Decoder for PHP `serialize()` output, the panel's `api=serialize` format.
//!
//! Grammar handled:
//!
//! ```text
//! N;                      null
//! b:0; | b:1;             bool
//! i:<int>;                integer
//! d:<float>;              float, including INF, -INF and NAN
//! s:<len>:"<bytes>";      string, <len> counted in bytes
//! a:<n>:{<key><value>..}  array, keys are i: or s: entries
//! O:<len>:"<class>":<n>:{..}  object, always decoded as a map
//! ```
//!
//! An array whose keys are exactly `0..n` in order (including the empty
//! array) decodes to `Value::List`, the same shape `json_encode` gives it.
//! Any other array decodes to `Value::Map`.
//!
//! References (`r:` / `R:`) and custom-serialized objects (`C:`) are rejected.

use thiserror::Error;

use crate::value::{Key, Map, Value};

/// Nesting deeper than this is treated as malformed input.
const MAX_DEPTH: usize = 512;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at byte {offset}")]
pub struct UnserializeError {
    pub offset: usize,
    pub message: String,
}

/// Decode one complete serialized document. Trailing bytes are an error.
pub fn from_bytes(input: &[u8]) -> Result<Value, UnserializeError> {
    let mut parser = Parser { input, pos: 0 };
    let value = parser.value(0)?;
    if parser.pos != input.len() {
        return Err(parser.error("trailing data after document"));
    }
    Ok(value)
}

pub fn from_str(input: &str) -> Result<Value, UnserializeError> {
    from_bytes(input.as_bytes())
}

struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn error(&self, message: &str) -> UnserializeError {
        UnserializeError {
            offset: self.pos,
            message: message.to_string(),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn next(&mut self) -> Result<u8, UnserializeError> {
        let b = self.peek().ok_or_else(|| self.error("unexpected end of input"))?;
        self.pos += 1;
        Ok(b)
    }

    fn expect(&mut self, want: u8) -> Result<(), UnserializeError> {
        match self.peek() {
            Some(b) if b == want => {
                self.pos += 1;
                Ok(())
            }
            Some(_) => Err(self.error(&format!("expected '{}'", want as char))),
            None => Err(self.error("unexpected end of input")),
        }
    }

    /// Bytes up to (not including) `delim`; consumes the delimiter.
    fn until(&mut self, delim: u8) -> Result<&'a [u8], UnserializeError> {
        let input = self.input;
        let start = self.pos;
        let len = input[start..]
            .iter()
            .position(|&b| b == delim)
            .ok_or_else(|| self.error(&format!("missing '{}'", delim as char)))?;
        self.pos = start + len + 1;
        Ok(&input[start..start + len])
    }

    fn text_until(&mut self, delim: u8) -> Result<&'a str, UnserializeError> {
        let start = self.pos;
        let bytes = self.until(delim)?;
        std::str::from_utf8(bytes).map_err(|_| UnserializeError {
            offset: start,
            message: "non-ASCII token".to_string(),
        })
    }

    fn integer(&mut self, delim: u8) -> Result<i64, UnserializeError> {
        let start = self.pos;
        let text = self.text_until(delim)?;
        text.parse().map_err(|_| UnserializeError {
            offset: start,
            message: format!("invalid integer {text:?}"),
        })
    }

    fn length(&mut self, delim: u8) -> Result<usize, UnserializeError> {
        let start = self.pos;
        let text = self.text_until(delim)?;
        text.parse().map_err(|_| UnserializeError {
            offset: start,
            message: format!("invalid length {text:?}"),
        })
    }

    fn float(&mut self) -> Result<f64, UnserializeError> {
        let start = self.pos;
        let text = self.text_until(b';')?;
        let parsed = match text {
            "INF" => Some(f64::INFINITY),
            "-INF" => Some(f64::NEG_INFINITY),
            "NAN" => Some(f64::NAN),
            _ => text.parse().ok(),
        };
        parsed.ok_or_else(|| UnserializeError {
            offset: start,
            message: format!("invalid float {text:?}"),
        })
    }

    /// `<len>:"<bytes>"` without the trailing terminator.
    fn quoted(&mut self) -> Result<String, UnserializeError> {
        let len = self.length(b':')?;
        self.expect(b'"')?;
        let start = self.pos;
        let end = start
            .checked_add(len)
            .filter(|&end| end <= self.input.len())
            .ok_or_else(|| self.error("string length exceeds input"))?;
        self.pos = end;
        self.expect(b'"')?;
        Ok(String::from_utf8_lossy(&self.input[start..end]).into_owned())
    }

    fn value(&mut self, depth: usize) -> Result<Value, UnserializeError> {
        if depth > MAX_DEPTH {
            return Err(self.error("nesting too deep"));
        }
        let tag_pos = self.pos;
        match self.next()? {
            b'N' => {
                self.expect(b';')?;
                Ok(Value::Null)
            }
            b'b' => {
                self.expect(b':')?;
                match self.integer(b';')? {
                    0 => Ok(Value::Bool(false)),
                    1 => Ok(Value::Bool(true)),
                    _ => Err(UnserializeError {
                        offset: tag_pos,
                        message: "boolean must be 0 or 1".to_string(),
                    }),
                }
            }
            b'i' => {
                self.expect(b':')?;
                Ok(Value::Int(self.integer(b';')?))
            }
            b'd' => {
                self.expect(b':')?;
                Ok(Value::Float(self.float()?))
            }
            b's' => {
                self.expect(b':')?;
                let s = self.quoted()?;
                self.expect(b';')?;
                Ok(Value::Str(s))
            }
            b'a' => {
                self.expect(b':')?;
                let count = self.length(b':')?;
                let map = self.entries(count, depth)?;
                Ok(list_or_map(map))
            }
            b'O' => {
                self.expect(b':')?;
                self.quoted()?;
                self.expect(b':')?;
                let count = self.length(b':')?;
                Ok(Value::Map(self.entries(count, depth)?))
            }
            b'r' | b'R' => Err(UnserializeError {
                offset: tag_pos,
                message: "references are not supported".to_string(),
            }),
            other => Err(UnserializeError {
                offset: tag_pos,
                message: format!("unknown type tag '{}'", other as char),
            }),
        }
    }

    /// `{<key><value>...}` holding exactly `count` pairs.
    fn entries(&mut self, count: usize, depth: usize) -> Result<Map, UnserializeError> {
        self.expect(b'{')?;
        let mut map = Map::with_capacity(count.min(1024));
        for _ in 0..count {
            let key = self.key()?;
            let value = self.value(depth + 1)?;
            map.insert(key, value);
        }
        self.expect(b'}')?;
        Ok(map)
    }

    fn key(&mut self) -> Result<Key, UnserializeError> {
        let tag_pos = self.pos;
        match self.next()? {
            b'i' => {
                self.expect(b':')?;
                Ok(Key::Int(self.integer(b';')?))
            }
            b's' => {
                self.expect(b':')?;
                let s = self.quoted()?;
                self.expect(b';')?;
                Ok(Key::from_text(&s))
            }
            _ => Err(UnserializeError {
                offset: tag_pos,
                message: "array key must be an integer or string".to_string(),
            }),
        }
    }
}

fn list_or_map(map: Map) -> Value {
    let sequential = map
        .keys()
        .enumerate()
        .all(|(i, key)| i64::try_from(i).is_ok_and(|i| *key == Key::Int(i)));
    if sequential {
        Value::List(map.into_values().collect())
    } else {
        Value::Map(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars() {
        assert_eq!(from_str("N;").unwrap(), Value::Null);
        assert_eq!(from_str("b:1;").unwrap(), Value::Bool(true));
        assert_eq!(from_str("b:0;").unwrap(), Value::Bool(false));
        assert_eq!(from_str("i:-42;").unwrap(), Value::Int(-42));
        assert_eq!(from_str("d:0.5;").unwrap(), Value::Float(0.5));
        assert_eq!(from_str("d:1.0E+25;").unwrap(), Value::Float(1.0e25));
        assert_eq!(from_str("d:-INF;").unwrap(), Value::Float(f64::NEG_INFINITY));
        assert!(from_str("d:NAN;").unwrap().as_f64().unwrap().is_nan());
        assert_eq!(from_str(r#"s:5:"hello";"#).unwrap(), Value::from("hello"));
    }

    #[test]
    fn string_length_counts_bytes() {
        assert_eq!(from_str("s:6:\"caf\u{e9}!\";").unwrap(), Value::from("caf\u{e9}!"));
        assert_eq!(from_str(r#"s:3:"a"b";"#).unwrap(), Value::from("a\"b"));
        assert_eq!(from_str(r#"s:0:"";"#).unwrap(), Value::from(""));
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let value = from_bytes(b"s:2:\"a\xff\";").unwrap();
        assert_eq!(value, Value::from("a\u{fffd}"));
    }

    #[test]
    fn nested_arrays_keep_order_and_key_types() {
        let input = r#"a:2:{s:10:"time_taken";d:0.5;s:8:"iscripts";a:1:{i:1;a:1:{s:4:"name";s:9:"WordPress";}}}"#;
        let value = from_str(input).unwrap();
        assert_eq!(value.get("time_taken"), Some(&Value::Float(0.5)));
        let scripts = value.get("iscripts").unwrap().as_map().unwrap();
        assert_eq!(scripts.keys().collect::<Vec<_>>(), vec![&Key::Int(1)]);
        assert_eq!(
            value.get("iscripts").and_then(|s| s.get(1i64)).and_then(|s| s.get("name")),
            Some(&Value::from("WordPress"))
        );
    }

    #[test]
    fn numeric_string_keys_normalise() {
        let value = from_str(r#"a:1:{s:2:"26";b:1;}"#).unwrap();
        assert_eq!(value.get(26i64), Some(&Value::Bool(true)));
    }

    #[test]
    fn objects_decode_as_maps() {
        let input = r#"O:8:"stdClass":1:{s:4:"done";i:1;}"#;
        assert_eq!(from_str(input).unwrap().get("done"), Some(&Value::Int(1)));
    }

    #[test]
    fn empty_array_is_a_list() {
        assert_eq!(from_str("a:0:{}").unwrap(), Value::List(Vec::new()));
    }

    #[test]
    fn sequential_arrays_decode_as_lists() {
        let value = from_str(r#"a:2:{i:0;s:3:"bad";i:1;N;}"#).unwrap();
        assert_eq!(value, Value::List(vec![Value::from("bad"), Value::Null]));
        assert_eq!(value.index(1), Some(&Value::Null));

        // "0" is a canonical integer key, so this is a list too.
        let value = from_str(r#"a:1:{s:1:"0";b:1;}"#).unwrap();
        assert_eq!(value, Value::List(vec![Value::Bool(true)]));
    }

    #[test]
    fn gapped_or_reordered_keys_stay_maps() {
        let gap = from_str(r#"a:2:{i:0;N;i:2;N;}"#).unwrap();
        assert_eq!(gap.as_map().map(|m| m.len()), Some(2));

        let reordered = from_str(r#"a:2:{i:1;N;i:0;N;}"#).unwrap();
        let keys: Vec<_> = reordered.as_map().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec![Key::Int(1), Key::Int(0)]);

        let object = from_str(r#"O:8:"stdClass":1:{i:0;N;}"#).unwrap();
        assert!(object.as_map().is_some());
    }

    #[test]
    fn rejects_html_bodies() {
        let err = from_str("<html><body>Login</body></html>").unwrap_err();
        assert_eq!(err.offset, 0);
    }

    #[test]
    fn rejects_trailing_data() {
        let err = from_str("i:1;i:2;").unwrap_err();
        assert_eq!(err.offset, 4);
        assert!(err.message.contains("trailing"));
    }

    #[test]
    fn rejects_truncated_input() {
        assert!(from_str(r#"s:10:"short";"#).is_err());
        assert!(from_str("a:2:{i:0;N;}").is_err());
        assert!(from_str("i:12").is_err());
        assert!(from_str("").is_err());
    }

    #[test]
    fn rejects_bad_tokens() {
        assert!(from_str("b:2;").is_err());
        assert!(from_str("i:abc;").is_err());
        assert!(from_str("d:fast;").is_err());
        assert!(from_str("a:1:{d:0.5;N;}").is_err());
        assert!(from_str("a:1:{i:0;r:1;}").is_err());
    }

    #[test]
    fn rejects_excessive_nesting() {
        let depth = MAX_DEPTH + 2;
        let mut input = "a:1:{i:0;".repeat(depth);
        input.push_str("N;");
        input.push_str(&"}".repeat(depth));
        assert!(from_str(&input).unwrap_err().message.contains("too deep"));
    }
}
