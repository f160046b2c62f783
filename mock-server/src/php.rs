//! PHP `serialize()` encoder for the mock's `api=serialize` replies, and the
//! `json_encode` view of the same document for `api=json`.

use serde_json::Value;

pub fn to_string(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value);
    out
}

/// The document as PHP's `json_encode` would write it: an array keyed
/// `0..n` in order (the empty array included) becomes a JSON list.
pub fn json_encode(value: &Value) -> String {
    as_php_json(value).to_string()
}

fn as_php_json(value: &Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.iter().map(as_php_json).collect()),
        Value::Object(map) => {
            let sequential = map
                .keys()
                .enumerate()
                .all(|(i, key)| integer_key(key) == i64::try_from(i).ok());
            if sequential {
                Value::Array(map.values().map(as_php_json).collect())
            } else {
                Value::Object(map.iter().map(|(k, v)| (k.clone(), as_php_json(v))).collect())
            }
        }
        other => other.clone(),
    }
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("N;"),
        Value::Bool(b) => out.push_str(if *b { "b:1;" } else { "b:0;" }),
        Value::Number(n) => match n.as_i64() {
            Some(i) => out.push_str(&format!("i:{i};")),
            None => out.push_str(&format!("d:{};", n.as_f64().unwrap_or(f64::NAN))),
        },
        Value::String(s) => write_string(out, s),
        Value::Array(items) => {
            out.push_str(&format!("a:{}:{{", items.len()));
            for (i, item) in items.iter().enumerate() {
                out.push_str(&format!("i:{i};"));
                write_value(out, item);
            }
            out.push('}');
        }
        Value::Object(map) => {
            out.push_str(&format!("a:{}:{{", map.len()));
            for (key, item) in map {
                match integer_key(key) {
                    Some(i) => out.push_str(&format!("i:{i};")),
                    None => write_string(out, key),
                }
                write_value(out, item);
            }
            out.push('}');
        }
    }
}

fn write_string(out: &mut String, s: &str) {
    out.push_str(&format!("s:{}:\"{}\";", s.len(), s));
}

/// PHP stores keys like `"26"` as integers.
fn integer_key(key: &str) -> Option<i64> {
    key.parse::<i64>().ok().filter(|n| n.to_string() == key)
}
