//! Provider error message normalization
//!
//! Upstream failures reach us as strings of mixed shape, for example
//! `HTTP 400: Bad Request - {"error":"Invalid input"}`, a bare JSON body, or a plain
//! transport message. These helpers turn them into a short human-readable message and a
//! coarse HTTP status class.

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

fn http_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^HTTP\s+\d{3}\s*:?\s*").expect("static regex is valid"))
}

/// Extract a human-readable message from a provider error string.
///
/// Order: the reason phrase after an `HTTP NNN:` status line, then the `error` /
/// `message` / `detail` field of an embedded JSON fragment, then the trimmed input.
/// Falls back to `default` when nothing usable remains.
pub fn extract_error_message(raw: &str, default: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return default.to_string();
    }

    if let Some(prefix) = http_prefix().find(trimmed) {
        let rest = trimmed[prefix.end()..].trim();
        let reason = rest.split(" - ").next().unwrap_or_default().trim();
        if !reason.is_empty() && !reason.starts_with('{') {
            return reason.to_string();
        }
        if let Some(message) = json_message(rest) {
            return message;
        }
        return if rest.is_empty() {
            default.to_string()
        } else {
            rest.to_string()
        };
    }

    if let Some(message) = json_message(trimmed) {
        return message;
    }

    trimmed.to_string()
}

/// Map an error string to a coarse HTTP status: `HTTP 4xx` → 400, `HTTP 5xx` → 500,
/// anything else → 500.
pub fn status_code_from_error(raw: &str) -> u16 {
    if raw.contains("HTTP 4") {
        400
    } else {
        500
    }
}

/// Pull `error`, `message` or `detail` out of the first `{...}` span in `text`.
fn json_message(text: &str) -> Option<String> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    let value: Value = serde_json::from_str(&text[start..=end]).ok()?;
    message_field(&value)
}

fn message_field(value: &Value) -> Option<String> {
    for key in ["error", "message", "detail"] {
        match value.get(key) {
            Some(Value::String(s)) if !s.trim().is_empty() => return Some(s.trim().to_string()),
            Some(nested @ Value::Object(_)) => {
                if let Some(message) = message_field(nested) {
                    return Some(message);
                }
            }
            _ => {}
        }
    }
    None
}
