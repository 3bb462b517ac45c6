use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

use crate::errors::{ConfigurationError, Result};

static UNQUOTED_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<lead>[{,]\s*)(?P<key>[A-Za-z_][A-Za-z0-9_-]*)\s*:").expect("valid regex")
});

/// Parse a property value.
///
/// Strict JSON first, then a lenient form (single quotes, unquoted object
/// keys), finally the raw string.
pub fn parse_value(raw: &str) -> Value {
    let stripped = raw.trim();
    if let Ok(value) = serde_json::from_str(stripped) {
        return value;
    }
    let double_quoted = stripped.replace('\'', "\"");
    if let Ok(value) = serde_json::from_str(&double_quoted) {
        return value;
    }
    if stripped.starts_with('{') || stripped.starts_with('[') {
        // Apostrophes inside double quoted values must survive.
        for candidate in [stripped, double_quoted.as_str()] {
            let keyed = UNQUOTED_KEY.replace_all(candidate, "$lead\"$key\":");
            if let Ok(value) = serde_json::from_str(&keyed) {
                return value;
            }
        }
    }
    Value::String(raw.to_string())
}

/// Split `KEY=VALUE` on the first `=`.
pub fn split_key_value(pair: &str) -> Result<(&str, &str)> {
    match pair.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim(), value)),
        _ => Err(ConfigurationError::MalformedKeyValue(pair.to_string()))?,
    }
}

/// Parse repeated `KEY=VALUE` pairs into a property map.
///
/// Later pairs win, except that two objects under one key are merged.
pub fn parse_key_values<S: AsRef<str>>(pairs: &[S]) -> Result<Map<String, Value>> {
    let mut out = Map::new();
    for pair in pairs {
        let (key, raw) = split_key_value(pair.as_ref())?;
        let parsed = parse_value(raw);
        match (out.get_mut(key), parsed) {
            (Some(Value::Object(existing)), Value::Object(update)) => existing.extend(update),
            (_, parsed) => {
                out.insert(key.to_string(), parsed);
            }
        }
    }
    Ok(out)
}
