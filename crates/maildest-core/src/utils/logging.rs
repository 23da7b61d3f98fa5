/// Logging utilities for PII redaction
///
/// Raw email addresses never reach a log line or a redirect URL; every
/// surface goes through `mask_email` first.
use regex::Regex;
use std::sync::LazyLock;

// Email redaction regex
static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Z|a-z]{2,}\b").unwrap());

/// Masks an email address, keeping the domain and the first and last
/// character of the local part.
///
/// # Examples
/// ```
/// use maildest_core::utils::logging::mask_email;
///
/// assert_eq!(mask_email("abcdef@domain.com"), "a***f@domain.com");
/// assert_eq!(mask_email("ab@domain.com"), "ab@domain.com");
/// assert_eq!(mask_email("not-an-email"), "invalid-email");
/// ```
pub fn mask_email(email: &str) -> String {
    let Some((local, domain)) = email.split_once('@') else {
        return "invalid-email".to_string();
    };

    let chars: Vec<char> = local.chars().collect();
    if chars.len() <= 2 {
        return format!("{}@{}", local, domain);
    }

    format!(
        "{}***{}@{}",
        chars[0],
        chars[chars.len() - 1],
        domain
    )
}

/// Redacts every email address occurring in free-form text, for error
/// messages that may embed addresses the provider echoed back.
pub fn redact_emails(text: &str) -> String {
    EMAIL_PATTERN
        .replace_all(text, |caps: &regex::Captures| mask_email(&caps[0]))
        .to_string()
}
