/// Email allow-list validation for workspace authentication
///
/// Allow-lists come from the auth secret, then environment variables, then
/// a built-in default domain set. One load per component lifetime; a warm
/// Lambda keeps the configuration it started with.
use crate::config::{AuthConfig, DEFAULT_ALLOWED_DOMAINS};
use crate::error::AuthError;
use crate::services::secrets::{SecretStore, parse_string_set};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::{info, warn};

static EMAIL_FORMAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9_+&*-]+(?:\.[a-zA-Z0-9_+&*-]+)*@(?:[a-zA-Z0-9-]+\.)+[a-zA-Z]{2,7}$")
        .unwrap()
});

/// Outcome of validating one email against the configured allow-lists.
#[derive(Debug, Clone)]
pub struct EmailValidation {
    pub is_valid: bool,
    pub message: String,
    pub email: Option<String>,
}

impl EmailValidation {
    fn valid(message: impl Into<String>, email: &str) -> Self {
        Self {
            is_valid: true,
            message: message.into(),
            email: Some(email.to_string()),
        }
    }

    fn invalid(message: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            message: message.into(),
            email: None,
        }
    }
}

/// Normalized allow-list configuration.
#[derive(Debug, Clone, Default)]
pub struct WorkspaceConfig {
    pub allowed_domains: HashSet<String>,
    pub allowed_emails: HashSet<String>,
}

impl WorkspaceConfig {
    pub fn from_sets(allowed_domains: HashSet<String>, allowed_emails: HashSet<String>) -> Self {
        Self {
            allowed_domains,
            allowed_emails,
        }
    }

    /// Loads the allow-lists: secret JSON first, the environment-sourced
    /// lists when the secret yields nothing, built-in default domains as
    /// the floor. Never fails; a broken secret degrades to the next source.
    pub async fn load(secrets: &dyn SecretStore, auth_config: &AuthConfig) -> Self {
        let mut config = Self::default();

        if let Some(name) = auth_config.secret_name.as_deref() {
            match secrets.get_secret(name).await {
                Ok(secret_json) => match serde_json::from_str::<serde_json::Value>(&secret_json) {
                    Ok(value) => {
                        config.allowed_domains = parse_string_set(value.get("allowed_domains"));
                        config.allowed_emails = parse_string_set(value.get("allowed_emails"));
                    }
                    Err(err) => {
                        warn!(error = %err, "Auth secret is not valid JSON");
                    }
                },
                Err(err) => {
                    warn!(error = %err, "Failed to load email configuration from secrets");
                }
            }
        }

        if config.is_empty() {
            if let Some(domains) = &auth_config.allowed_email_domains {
                config.allowed_domains =
                    parse_string_set(Some(&serde_json::Value::String(domains.clone())));
            }
            if let Some(emails) = &auth_config.allowed_emails {
                config.allowed_emails =
                    parse_string_set(Some(&serde_json::Value::String(emails.clone())));
            }
        }

        if config.is_empty() {
            info!("No email restrictions configured, applying default fallback domains");
            config.allowed_domains = DEFAULT_ALLOWED_DOMAINS
                .iter()
                .map(|d| d.to_string())
                .collect();
        }

        config
    }

    fn is_empty(&self) -> bool {
        self.allowed_domains.is_empty() && self.allowed_emails.is_empty()
    }
}

/// Validates emails against the loaded workspace configuration.
pub struct EmailValidator {
    config: WorkspaceConfig,
}

impl EmailValidator {
    pub fn new(config: WorkspaceConfig) -> Self {
        Self { config }
    }

    /// Applies the allow-list decision rule to one email.
    ///
    /// When both lists are configured the email must satisfy BOTH: the
    /// address must be listed and its domain must be listed. A single
    /// configured list is checked alone, and no configured lists at all
    /// means everyone is admitted.
    pub fn validate(&self, email: &str) -> EmailValidation {
        if email.trim().is_empty() {
            return EmailValidation::invalid("Email cannot be empty");
        }

        let normalized = email.trim().to_lowercase();

        if !EMAIL_FORMAT.is_match(&normalized) {
            return EmailValidation::invalid("Invalid email format");
        }

        let Some(domain) = normalized.rsplit_once('@').map(|(_, d)| d.to_string()) else {
            return EmailValidation::invalid("Could not extract domain from email");
        };

        let email_listed = self.config.allowed_emails.contains(&normalized);
        let domain_listed = self.config.allowed_domains.contains(&domain);
        let has_email_list = !self.config.allowed_emails.is_empty();
        let has_domain_list = !self.config.allowed_domains.is_empty();

        match (has_email_list, has_domain_list) {
            (true, true) => match (email_listed, domain_listed) {
                (true, true) => EmailValidation::valid("Email and domain both allowed", &normalized),
                (false, false) => EmailValidation::invalid(format!(
                    "Email '{}' is not in allowed emails list and domain '{}' is not in allowed domains list",
                    normalized, domain
                )),
                (false, true) => EmailValidation::invalid(format!(
                    "Email '{}' is not in the allowed emails list",
                    normalized
                )),
                (true, false) => EmailValidation::invalid(format!(
                    "Email domain '{}' is not in the allowed domains list",
                    domain
                )),
            },
            (true, false) => {
                if email_listed {
                    EmailValidation::valid("Email explicitly allowed", &normalized)
                } else {
                    EmailValidation::invalid(format!(
                        "Email '{}' is not in the allowed emails list",
                        normalized
                    ))
                }
            }
            (false, true) => {
                if domain_listed {
                    EmailValidation::valid("Email domain is allowed", &normalized)
                } else {
                    EmailValidation::invalid(format!(
                        "Email domain '{}' is not in the allowed domains list",
                        domain
                    ))
                }
            }
            (false, false) => EmailValidation::valid("No email restrictions configured", &normalized),
        }
    }

    pub fn has_restrictions(&self) -> bool {
        !self.config.allowed_domains.is_empty() || !self.config.allowed_emails.is_empty()
    }

    /// One-line summary for health output and logs.
    pub fn configuration_summary(&self) -> String {
        format!(
            "EmailValidator configured with {} allowed domains and {} allowed emails",
            self.config.allowed_domains.len(),
            self.config.allowed_emails.len()
        )
    }
}
