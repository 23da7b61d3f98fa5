/// Service configuration - loaded once from environment variables
///
/// Every environment variable name and every fallback literal the service
/// uses lives here. Call sites never read the environment directly.
use std::env;

/// Frontend base URL used when `FRONTEND_URL` is unset in OAUTH/HYBRID mode.
pub const DEFAULT_FRONTEND_URL: &str = "https://admin.maildest.example.com";

/// Frontend base URL used when `FRONTEND_URL` is unset in MOCK mode
/// (local development against a dev server).
pub const DEFAULT_LOCAL_FRONTEND_URL: &str = "http://localhost:3000";

/// Callback URL of last resort when neither redirect-URI variable is set.
pub const DEFAULT_REDIRECT_URI: &str =
    "https://api.maildest.example.com/dev/auth/google/callback";

/// Domains admitted when no allow-list is configured anywhere.
pub const DEFAULT_ALLOWED_DOMAINS: &[&str] = &["maildest.example.com", "example.co.jp"];

/// Path on the frontend that renders the post-login validation page.
pub const VALIDATION_PATH: &str = "/auth/validation";

#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    /// Cognito hosted-UI domain, e.g. `https://maildest.auth.ap-northeast-1.amazoncognito.com`
    pub cognito_domain_url: Option<String>,
    /// Cognito app client id
    pub client_id: Option<String>,
    /// Google OAuth client id (presence gates OAUTH/HYBRID detection)
    pub google_client_id: Option<String>,
    /// Secrets Manager secret holding client_secret and allow-lists
    pub secret_name: Option<String>,
    /// OAuth callback URL (primary `GOOGLE_REDIRECT_URI`, fallback `OAUTH_CALLBACK_URL`)
    pub redirect_uri: Option<String>,
    /// Frontend base URL for validation-page redirects
    pub frontend_url: Option<String>,
    /// Explicit authentication mode override (`AUTH_MODE`)
    pub mode_override: Option<String>,
    /// Cognito user pool id, needed for user provisioning
    pub user_pool_id: Option<String>,
    /// Identity asserted by the HYBRID flow when no provider is reachable
    pub default_test_email: Option<String>,
    /// Identity asserted by the MOCK flow
    pub mock_user_email: Option<String>,
    /// Comma-separated domain allow-list, used when the secret has none
    pub allowed_email_domains: Option<String>,
    /// Comma-separated email allow-list, used when the secret has none
    pub allowed_emails: Option<String>,
}

fn env_non_empty(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl AuthConfig {
    /// Reads the full configuration from the environment. Nothing here is
    /// fatal: missing values degrade the detected authentication mode
    /// instead of failing startup.
    pub fn from_env() -> Self {
        Self {
            cognito_domain_url: env_non_empty("COGNITO_DOMAIN_URL"),
            client_id: env_non_empty("CLIENT_ID"),
            google_client_id: env_non_empty("GOOGLE_CLIENT_ID"),
            secret_name: env_non_empty("SECRET_NAME"),
            redirect_uri: env_non_empty("GOOGLE_REDIRECT_URI")
                .or_else(|| env_non_empty("OAUTH_CALLBACK_URL")),
            frontend_url: env_non_empty("FRONTEND_URL"),
            mode_override: env_non_empty("AUTH_MODE"),
            user_pool_id: env_non_empty("USER_POOL_ID"),
            default_test_email: env_non_empty("DEFAULT_TEST_EMAIL"),
            mock_user_email: env_non_empty("MOCK_USER_EMAIL"),
            allowed_email_domains: env_non_empty("ALLOWED_EMAIL_DOMAINS"),
            allowed_emails: env_non_empty("ALLOWED_EMAILS"),
        }
    }

    /// Frontend base URL with the hosted default applied.
    pub fn frontend_url(&self) -> &str {
        self.frontend_url.as_deref().unwrap_or(DEFAULT_FRONTEND_URL)
    }

    /// Frontend base URL with the local-development default applied.
    pub fn local_frontend_url(&self) -> &str {
        self.frontend_url
            .as_deref()
            .unwrap_or(DEFAULT_LOCAL_FRONTEND_URL)
    }

    /// Callback URL with the fixed default applied (the token exchange must
    /// always present some redirect_uri to the provider).
    pub fn redirect_uri(&self) -> &str {
        self.redirect_uri.as_deref().unwrap_or(DEFAULT_REDIRECT_URI)
    }

    /// True when the three values gating the OAuth flow are all present.
    pub fn has_oauth_config(&self) -> bool {
        self.cognito_domain_url.is_some()
            && self.client_id.is_some()
            && self.google_client_id.is_some()
    }
}
