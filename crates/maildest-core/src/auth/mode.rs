/// Authentication mode detection
///
/// Exactly one mode governs a request; it is detected once at the top of
/// the handler and never re-evaluated mid-request.
use crate::config::AuthConfig;
use crate::services::secrets::SecretStore;
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

/// The three authentication modes the service can run in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Full OAuth with Cognito/Google
    Oauth,
    /// OAuth config present but secrets unreachable; mints dev tokens
    Hybrid,
    /// No OAuth config at all; full mock for local development
    Mock,
}

impl AuthMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Oauth => "OAUTH",
            Self::Hybrid => "HYBRID",
            Self::Mock => "MOCK",
        }
    }
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "OAUTH" => Ok(Self::Oauth),
            "HYBRID" => Ok(Self::Hybrid),
            "MOCK" => Ok(Self::Mock),
            _ => Err(()),
        }
    }
}

/// Detects the authentication mode for the current request.
///
/// An explicit, parseable override always wins. Otherwise the mode degrades
/// with the available configuration: full OAuth env config plus a reachable
/// secret gives OAUTH, config alone gives HYBRID, anything less gives MOCK.
/// This function never fails; probe errors only downgrade the result.
pub async fn detect_mode(config: &AuthConfig, secrets: &dyn SecretStore) -> AuthMode {
    if let Some(override_value) = &config.mode_override {
        match AuthMode::from_str(override_value) {
            Ok(mode) => {
                info!(mode = %mode, "Using explicit authentication mode override");
                return mode;
            }
            Err(()) => {
                warn!(
                    value = %override_value,
                    "Invalid AUTH_MODE specified, falling back to auto-detection"
                );
            }
        }
    }

    let has_oauth_config = config.has_oauth_config();

    let has_secrets = match &config.secret_name {
        Some(name) => match secrets.get_secret(name).await {
            Ok(value) => {
                let accessible = !value.trim().is_empty();
                info!(accessible, "Secrets accessibility check");
                accessible
            }
            Err(err) => {
                warn!(error = %err, "Secrets accessibility check failed");
                false
            }
        },
        None => false,
    };

    let mode = match (has_oauth_config, has_secrets) {
        (true, true) => AuthMode::Oauth,
        (true, false) => AuthMode::Hybrid,
        (false, _) => AuthMode::Mock,
    };
    info!(mode = %mode, has_oauth_config, has_secrets, "Detected authentication mode");
    mode
}
