//! Lenient field decoding for form payloads.
//!
//! Browsers and API clients send whatever they like. A form field that is not
//! a string decodes to text anyway: numbers keep their digits, anything else
//! becomes empty, so the sanitizers never see a non-string.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => b,
        Value::String(s) => matches!(s.trim(), "true" | "on" | "1"),
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "super::string")]
        value: String,
        #[serde(default, deserialize_with = "super::flag")]
        enabled: bool,
    }

    fn probe(json: &str) -> Probe {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn non_strings_become_text_or_empty() {
        assert_eq!(probe(r#"{"value": "abc"}"#).value, "abc");
        assert_eq!(probe(r#"{"value": 12.5}"#).value, "12.5");
        assert_eq!(probe(r#"{"value": null}"#).value, "");
        assert_eq!(probe(r#"{"value": {"x": 1}}"#).value, "");
        assert_eq!(probe(r#"{"value": [1, 2]}"#).value, "");
        assert_eq!(probe("{}").value, "");
    }

    #[test]
    fn flags_accept_checkbox_strings() {
        assert!(probe(r#"{"enabled": true}"#).enabled);
        assert!(probe(r#"{"enabled": "on"}"#).enabled);
        assert!(!probe(r#"{"enabled": 0}"#).enabled);
    }
}
