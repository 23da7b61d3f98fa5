/// Secrets Manager gateway
///
/// Read-only and uncached: every call re-fetches, so rotated secrets are
/// picked up without a redeploy. Callers treat failures as non-fatal and
/// fall back to environment variables or proceed without the value.
use crate::error::AuthError;
use async_trait::async_trait;
use std::collections::HashSet;

#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetches the raw secret string for `name`.
    async fn get_secret(&self, name: &str) -> Result<String, AuthError>;
}

/// AWS Secrets Manager implementation
pub struct SecretsManagerStore {
    client: aws_sdk_secretsmanager::Client,
}

impl SecretsManagerStore {
    pub fn new(client: aws_sdk_secretsmanager::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SecretStore for SecretsManagerStore {
    async fn get_secret(&self, name: &str) -> Result<String, AuthError> {
        let response = self
            .client
            .get_secret_value()
            .secret_id(name)
            .send()
            .await
            .map_err(|e| AuthError::SecretAccess(format!("GetSecretValue failed: {}", e)))?;

        response
            .secret_string()
            .map(|s| s.to_string())
            .ok_or_else(|| AuthError::SecretAccess(format!("secret '{}' has no string value", name)))
    }
}

/// Extracts a named string field from a secret JSON blob.
pub fn secret_field(secret_json: &str, key: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(secret_json).ok()?;
    value.get(key)?.as_str().map(|s| s.to_string())
}

/// Parses an allow-list field that may be either a JSON array of strings or
/// a single comma-separated string. Entries are trimmed and lower-cased;
/// empty entries are dropped.
pub fn parse_string_set(value: Option<&serde_json::Value>) -> HashSet<String> {
    let mut set = HashSet::new();
    match value {
        Some(serde_json::Value::Array(items)) => {
            for item in items {
                if let Some(s) = item.as_str() {
                    let cleaned = s.trim().to_lowercase();
                    if !cleaned.is_empty() {
                        set.insert(cleaned);
                    }
                }
            }
        }
        Some(serde_json::Value::String(s)) => {
            for part in s.split(',') {
                let cleaned = part.trim().to_lowercase();
                if !cleaned.is_empty() {
                    set.insert(cleaned);
                }
            }
        }
        _ => {}
    }
    set
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_string_set_array() {
        let value = serde_json::json!(["A.com", " b.com ", ""]);
        let set = parse_string_set(Some(&value));
        assert_eq!(set.len(), 2);
        assert!(set.contains("a.com"));
        assert!(set.contains("b.com"));
    }

    #[test]
    fn test_parse_string_set_comma_string() {
        let value = serde_json::json!("x@a.com, Y@B.COM ,,");
        let set = parse_string_set(Some(&value));
        assert_eq!(set.len(), 2);
        assert!(set.contains("x@a.com"));
        assert!(set.contains("y@b.com"));
    }

    #[test]
    fn test_parse_string_set_absent_or_wrong_type() {
        assert!(parse_string_set(None).is_empty());
        assert!(parse_string_set(Some(&serde_json::json!(42))).is_empty());
        assert!(parse_string_set(Some(&serde_json::json!(""))).is_empty());
    }

    #[test]
    fn test_secret_field() {
        let json = r#"{"client_secret":"s3cr3t","allowed_domains":["a.com"]}"#;
        assert_eq!(secret_field(json, "client_secret"), Some("s3cr3t".to_string()));
        assert_eq!(secret_field(json, "missing"), None);
        assert_eq!(secret_field("not json", "client_secret"), None);
    }
}
