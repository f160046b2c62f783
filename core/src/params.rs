//! Per-call parameter mapping and its query-string encoding.

use std::fmt;

use indexmap::IndexMap;

use crate::config::ResponseFormat;

/// Name of the parameter selecting the remote operation.
pub const ACT: &str = "act";

/// A single parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Str(String),
    Int(i64),
    Bool(bool),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Str(s) => f.write_str(s),
            ParamValue::Int(n) => write!(f, "{n}"),
            ParamValue::Bool(b) => f.write_str(if *b { "true" } else { "false" }),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Str(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Str(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

/// Ordered mapping of parameter names to values for one request.
///
/// An empty mapping selects the panel's default (list scripts) view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    entries: IndexMap<String, ParamValue>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a mapping whose first entry is `act=<name>`.
    pub fn act(name: &str) -> Self {
        Self::new().with(ACT, name)
    }

    pub fn with(mut self, key: &str, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace `key`. A replaced key keeps its original position.
    pub fn insert(&mut self, key: &str, value: impl Into<ParamValue>) {
        self.entries.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Encode as a query string without the leading `?`.
    ///
    /// `act` always comes first when present, followed by `api=<format>`,
    /// then every other entry in insertion order.
    pub fn to_query(&self, format: ResponseFormat) -> String {
        let mut pairs: Vec<String> = Vec::with_capacity(self.entries.len() + 1);
        if let Some(act) = self.entries.get(ACT) {
            pairs.push(encode_pair(ACT, act));
        }
        pairs.push(format!("api={}", format.api_value()));
        pairs.extend(
            self.entries
                .iter()
                .filter(|(k, _)| k.as_str() != ACT)
                .map(|(k, v)| encode_pair(k, v)),
        );
        pairs.join("&")
    }
}

impl<K: AsRef<str>, V: Into<ParamValue>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (k, v) in iter {
            params.insert(k.as_ref(), v);
        }
        params
    }
}

fn encode_pair(key: &str, value: &ParamValue) -> String {
    format!(
        "{}={}",
        urlencoding::encode(key),
        urlencoding::encode(&value.to_string())
    )
}
