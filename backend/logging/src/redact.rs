//! Log Redaction Layer
//!
//! Scrubs API keys, bot tokens, and phone numbers from strings prior to logging.

use regex::Regex;
use std::sync::LazyLock;

static TELEGRAM_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{6,12}:[A-Za-z0-9_-]{30,}").unwrap());
static TELEPHONE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?:\+?\d{1,3}[-.\s]?)?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}").unwrap());
static API_KEY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(sk-[a-zA-Z0-9_\-]{20,})|(Bearer\s+[a-zA-Z0-9\-\._~+/]+=*)").unwrap());

/// Redacts sensitive patterns in a string.
pub fn redact_sensitive_data(input: &str) -> String {
    // Bot tokens first: their numeric prefix would otherwise look like a phone number.
    let redacted = TELEGRAM_TOKEN_RE.replace_all(input, "[REDACTED_BOT_TOKEN]");
    let redacted = API_KEY_RE.replace_all(&redacted, "[REDACTED_TOKEN]");
    TELEPHONE_RE.replace_all(&redacted, "[REDACTED_PHONE]").into_owned()
}

/// Show only the first `visible` characters of a secret.
pub fn mask_secret(value: &str, visible: usize) -> String {
    let prefix: String = value.chars().take(visible).collect();
    if prefix.len() == value.len() {
        "*".repeat(value.chars().count())
    } else {
        format!("{prefix}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redaction() {
        let raw = "Sending to +1-555-123-4567 with Bearer eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9";
        let clean = redact_sensitive_data(raw);
        assert!(!clean.contains("+1-555-123-4567"));
        assert!(!clean.contains("Bearer eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9"));
    }

    #[test]
    fn redacts_openai_and_bot_tokens() {
        let raw = "key sk-proj-abcdefghijklmnopqrstuvwx token 123456789:AAHk3xYz0123456789abcdefghijklmnopq";
        let clean = redact_sensitive_data(raw);
        assert!(!clean.contains("sk-proj"));
        assert!(clean.contains("[REDACTED_BOT_TOKEN]"));
        assert!(!clean.contains("AAHk3xYz"));
    }

    #[test]
    fn masks_all_but_prefix() {
        assert_eq!(mask_secret("123456789:AAHk3xYz", 10), "123456789:...");
        assert_eq!(mask_secret("abc", 10), "***");
    }
}
