//! Datastar signals sent with a request.

use serde_json::{Map, Value};

use crate::core::LiveError;

/// Query parameter carrying signals on GET requests.
const QUERY_KEY: &str = "datastar";

/// Client signal store, a JSON object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Signals(Map<String, Value>);

impl Signals {
    /// Signals from the `datastar` query parameter.
    pub fn from_query(query: &str) -> Result<Self, LiveError> {
        let raw = url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == QUERY_KEY)
            .map(|(_, value)| value.into_owned())
            .ok_or_else(|| LiveError::malformed("missing `datastar` query parameter"))?;
        Self::from_json(raw.as_bytes())
    }

    /// Signals from a JSON request body.
    pub fn from_body(body: &[u8]) -> Result<Self, LiveError> {
        Self::from_json(body)
    }

    fn from_json(bytes: &[u8]) -> Result<Self, LiveError> {
        match serde_json::from_slice(bytes) {
            Ok(Value::Object(map)) => Ok(Self(map)),
            Ok(other) => Err(LiveError::malformed(format!(
                "signals must be a JSON object, got {}",
                kind(&other)
            ))),
            Err(e) => Err(LiveError::malformed(format!("invalid signals: {e}"))),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Whether `key` holds `expected`, as a number or numeric string.
    pub fn number_equals(&self, key: &str, expected: f64) -> bool {
        let value = match self.get(key) {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        value == Some(expected)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_query() {
        let signals = Signals::from_query("datastar=%7B%22question%22%3A4%7D").unwrap();
        assert!(signals.number_equals("question", 4.0));
        assert_eq!(signals.len(), 1);
    }

    #[test]
    fn test_from_query_ignores_other_params() {
        let signals = Signals::from_query("x=1&datastar=%7B%7D&y=2").unwrap();
        assert_eq!(signals.len(), 0);
    }

    #[test]
    fn test_missing_param_is_malformed() {
        assert!(matches!(
            Signals::from_query("other=1"),
            Err(LiveError::MalformedSignal(_))
        ));
    }

    #[test]
    fn test_bad_json_is_malformed() {
        for body in [&b"{"[..], b"[1,2]", b"4", b""] {
            assert!(matches!(
                Signals::from_body(body),
                Err(LiveError::MalformedSignal(_))
            ));
        }
    }

    #[test]
    fn test_number_equals_is_loose() {
        let signals = Signals::from_body(br#"{"a": 4, "b": "4", "c": " 4 ", "d": 5, "e": true}"#).unwrap();
        assert!(signals.number_equals("a", 4.0));
        assert!(signals.number_equals("b", 4.0));
        assert!(signals.number_equals("c", 4.0));
        assert!(!signals.number_equals("d", 4.0));
        assert!(!signals.number_equals("e", 4.0));
        assert!(!signals.number_equals("missing", 4.0));
    }
}
