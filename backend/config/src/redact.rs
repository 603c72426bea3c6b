//! Config redaction: produce safe-to-log config snapshots by masking secrets.

use serde_json::Value;

/// Keys whose values are secrets.
static SENSITIVE_KEYS: &[&str] = &[
    "gemini_api_key",
    "openrouter_api_key",
    "api_key",
    "apiKey",
    "token",
    "secret",
    "password",
];

/// Redact a config JSON value, masking every sensitive field.
///
/// The first four characters are kept as a hint.
pub fn redact(value: &Value) -> Value {
    redact_recursive(value, "")
}

fn is_sensitive_key(key: &str) -> bool {
    SENSITIVE_KEYS.iter().any(|k| k.eq_ignore_ascii_case(key))
}

fn redact_recursive(value: &Value, key: &str) -> Value {
    match value {
        Value::String(s) if is_sensitive_key(key) && !s.is_empty() => {
            let hint: String = s.chars().take(4).collect();
            if s.chars().count() > 4 {
                Value::String(format!("{hint}***"))
            } else {
                Value::String("***".to_string())
            }
        }
        Value::Array(arr) => Value::Array(arr.iter().map(|v| redact_recursive(v, key)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), redact_recursive(v, k)))
                .collect(),
        ),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::AppConfig;
    use serde_json::json;

    #[test]
    fn redacts_provider_keys() {
        let mut config = AppConfig::default();
        config.provider.gemini_api_key = Some("AIzaSyD-secret-value".into());
        let redacted = redact(&serde_json::to_value(&config).unwrap());
        let key = redacted["provider"]["gemini_api_key"].as_str().unwrap();
        assert_eq!(key, "AIza***");
    }

    #[test]
    fn short_secret_is_fully_masked() {
        let redacted = redact(&json!({"password": "abc"}));
        assert_eq!(redacted["password"], "***");
    }

    #[test]
    fn passthrough_non_sensitive() {
        let redacted = redact(&json!({ "logging": { "level": "debug" }, "gemini_api_key": null }));
        assert_eq!(redacted["logging"]["level"], "debug");
        assert!(redacted["gemini_api_key"].is_null());
    }
}
