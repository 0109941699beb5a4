//! Masking of credentials before anything reaches a log line.
use std::sync::OnceLock;

use http::HeaderMap;
use regex::Regex;
use serde_json::Value;

pub static SANITIZED_VALUE: &str = "**********";

const SECRET_WORDS: [&str; 7] = ["secret", "key", "session", "password", "token", "captcha_code", "refresh"];

static SECRET_KEY: OnceLock<Option<Regex>> = OnceLock::new();

fn secret_key_regex() -> Option<&'static Regex> {
    SECRET_KEY
        .get_or_init(|| {
            let alternatives = SECRET_WORDS
                .map(|word| format!(r"(^|\b|[-_]){word}($|\b|[-_])"))
                .join("|");
            Regex::new(&format!("(?i)({alternatives})")).ok()
        })
        .as_ref()
}

pub fn should_sanitize(key: &str) -> bool {
    match key.to_ascii_lowercase().as_str() {
        "authorization" | "cookie" | "set-cookie" | "password" | "access_token" => true,
        key => secret_key_regex().is_some_and(|re| re.is_match(key)),
    }
}

pub fn sanitize_value(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, value) in map.iter_mut() {
                if should_sanitize(key) {
                    *value = Value::String(SANITIZED_VALUE.to_string());
                } else {
                    sanitize_value(value);
                }
            }
        }
        Value::Array(values) => values.iter_mut().for_each(sanitize_value),
        _ => {}
    }
}

/// Render headers for a log line, one `name: value` pair per entry, secrets masked.
pub fn loggable_headers(headers: &HeaderMap) -> String {
    headers
        .iter()
        .map(|(name, value)| {
            let value = if should_sanitize(name.as_str()) {
                SANITIZED_VALUE
            } else {
                value.to_str().unwrap_or("<binary>")
            };
            format!("{name}: {value}")
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use http::header;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_should_sanitize() {
        assert!(should_sanitize("Authorization"));
        assert!(should_sanitize("x-api-key"));
        assert!(should_sanitize("refresh_token"));
        assert!(should_sanitize("captcha_code"));
        assert!(!should_sanitize("content-type"));
        assert!(!should_sanitize("monkey"));
        assert!(!should_sanitize("email"));
    }

    #[test]
    fn test_sanitize_nested_value() {
        let mut value = json!({"data": {"access_token": "abc", "items": [{"name": "x"}]}});
        sanitize_value(&mut value);
        assert_eq!(value, json!({"data": {"access_token": SANITIZED_VALUE, "items": [{"name": "x"}]}}));
    }

    #[test]
    fn test_loggable_headers_masks_authorization() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer abc".parse().unwrap());
        headers.insert(header::ACCEPT, "application/json".parse().unwrap());
        let rendered = loggable_headers(&headers);
        assert!(rendered.contains("authorization: **********"));
        assert!(rendered.contains("accept: application/json"));
        assert!(!rendered.contains("abc"));
    }
}
