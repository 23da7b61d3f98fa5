/// Per-mode authentication flows
///
/// One strategy per authentication mode. The handler detects the mode once,
/// picks a flow, and every subsequent branch lives inside that flow; adding
/// a mode means adding an implementation, not editing switch statements.
use crate::auth::mode::AuthMode;
use crate::auth::tokens::{email_from_id_token, mint_dev_token};
use crate::auth::workspace::WorkspaceAuthService;
use crate::config::{AuthConfig, VALIDATION_PATH};
use crate::error::AuthError;
use crate::services::cognito::{CognitoGateway, UserLookup};
use crate::services::oauth::TokenExchanger;
use crate::services::secrets::{SecretStore, secret_field};
use crate::utils::logging::mask_email;
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use rand::RngCore;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Everything a flow needs, constructed once per process and injected.
#[derive(Clone)]
pub struct AuthDeps {
    pub config: Arc<AuthConfig>,
    pub secrets: Arc<dyn SecretStore>,
    pub cognito: Arc<dyn CognitoGateway>,
    pub workspace: Arc<WorkspaceAuthService>,
}

/// Result of initiating a login.
#[derive(Debug, Clone)]
pub struct InitiateOutcome {
    pub redirect_url: String,
    pub message: Option<String>,
    pub workspace_auth_enabled: bool,
    pub workspace_config: Option<String>,
    pub mode: AuthMode,
}

/// Callback input, with the three places an authorization code may hide.
#[derive(Debug, Clone, Default)]
pub struct CallbackRequest {
    pub query: HashMap<String, String>,
    pub path_params: HashMap<String, String>,
    pub multi_query: HashMap<String, Vec<String>>,
}

impl CallbackRequest {
    /// Locates the authorization code: query parameter first, then path
    /// parameter, then the first entry of a multi-valued query parameter.
    pub fn authorization_code(&self) -> Option<String> {
        self.query
            .get("code")
            .filter(|c| !c.trim().is_empty())
            .or_else(|| self.path_params.get("code").filter(|c| !c.trim().is_empty()))
            .or_else(|| {
                self.multi_query
                    .get("code")
                    .and_then(|values| values.first())
                    .filter(|c| !c.trim().is_empty())
            })
            .cloned()
    }
}

#[async_trait]
pub trait AuthFlow: Send + Sync {
    /// Starts a login, returning the URL the frontend should send the
    /// browser to. Returned as data, not a 302: a redirect issued straight
    /// from the API would trip browser CORS rules.
    async fn initiate(&self) -> Result<InitiateOutcome, AuthError>;

    /// Processes the provider callback. Always produces a redirect
    /// `Location` back to the frontend validation page; failures become
    /// `status=error` redirects, never bare 5xx responses.
    async fn handle_callback(&self, request: &CallbackRequest) -> String;

    /// Renews a session from a refresh token.
    async fn refresh(&self, refresh_token: &str, username: &str)
    -> Result<serde_json::Value, AuthError>;

    /// Ends a session.
    async fn logout(&self, access_token: &str) -> Result<serde_json::Value, AuthError>;
}

/// Selects the flow implementation for a detected mode.
pub fn flow_for(mode: AuthMode, deps: &AuthDeps) -> Box<dyn AuthFlow> {
    match mode {
        AuthMode::Oauth => Box::new(OauthFlow { deps: deps.clone() }),
        AuthMode::Hybrid => Box::new(HybridFlow { deps: deps.clone() }),
        AuthMode::Mock => Box::new(MockFlow { deps: deps.clone() }),
    }
}

/// Builds `{frontend}{/auth/validation}?<params>` with form-urlencoding.
fn validation_redirect(frontend_url: &str, params: &[(&str, &str)]) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params)
        .finish();
    format!(
        "{}{}?{}",
        frontend_url.trim_end_matches('/'),
        VALIDATION_PATH,
        query
    )
}

fn error_redirect(frontend_url: &str, message: &str) -> String {
    validation_redirect(frontend_url, &[("status", "error"), ("message", message)])
}

/// Error redirect carrying the workspace-auth marker, used once the flow
/// has progressed into token exchange / validation territory.
fn workspace_error_redirect(frontend_url: &str, message: &str) -> String {
    validation_redirect(
        frontend_url,
        &[
            ("status", "error"),
            ("message", message),
            ("workspace_auth", "true"),
        ],
    )
}

/// CSRF state parameter: 16 random bytes, URL-safe base64, no padding.
fn generate_state() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

fn urlencode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

// ---------------------------------------------------------------------------
// OAUTH
// ---------------------------------------------------------------------------

pub struct OauthFlow {
    deps: AuthDeps,
}

impl OauthFlow {
    fn config(&self) -> &AuthConfig {
        &self.deps.config
    }

    /// Best-effort client_secret fetch; token exchange proceeds without it
    /// when the secret is missing or unreachable.
    async fn client_secret(&self) -> Option<String> {
        let name = match self.config().secret_name.as_deref() {
            Some(name) => name,
            None => {
                warn!("SECRET_NAME not set, token exchange will omit client_secret");
                return None;
            }
        };

        match self.deps.secrets.get_secret(name).await {
            Ok(secret_json) => {
                let secret = secret_field(&secret_json, "client_secret");
                if secret.is_none() {
                    warn!("client_secret not found in auth secret");
                }
                secret
            }
            Err(err) => {
                warn!(error = %err, "Could not retrieve client_secret, continuing without it");
                None
            }
        }
    }

    async fn exchange_and_validate(&self, code: &str) -> Result<String, AuthError> {
        let config = self.config();
        let domain_url = config
            .cognito_domain_url
            .as_deref()
            .ok_or_else(|| AuthError::Config("COGNITO_DOMAIN_URL not configured".to_string()))?;
        let client_id = config
            .client_id
            .as_deref()
            .ok_or_else(|| AuthError::Config("CLIENT_ID not configured".to_string()))?;

        let client_secret = self.client_secret().await;
        let exchanger = TokenExchanger::new(domain_url, client_id, config.redirect_uri())?;
        let tokens = exchanger.exchange(code, client_secret.as_deref()).await?;

        info!("Token exchange successful, validating workspace access");

        let email = email_from_id_token(&tokens.id_token).ok_or_else(|| {
            AuthError::TokenParse(
                "Failed to extract user information from authentication token".to_string(),
            )
        })?;
        let masked = mask_email(&email);

        let validation = self.deps.workspace.validate_user_access(&email);
        if !validation.is_valid {
            return Err(AuthError::Validation(format!(
                "Access denied: {}",
                validation.message
            )));
        }

        // User provisioning is for pool bookkeeping only; a failure here
        // must never fail the login.
        match self.deps.cognito.lookup_user(&email).await {
            UserLookup::Found => {
                info!(email = %masked, "Cognito user record already exists");
            }
            UserLookup::NotFound => {
                if let Err(err) = self.deps.cognito.provision_user(&email, None).await {
                    warn!(email = %masked, error = %err, "Failed to provision Cognito user");
                }
            }
            UserLookup::Error(err) => {
                warn!(email = %masked, error = %err, "Cognito user lookup failed");
            }
        }

        let expires_in = tokens.expires_in.to_string();
        let mut params: Vec<(&str, &str)> = vec![
            ("status", "success"),
            ("message", "Google Workspace login successful"),
            ("email", &masked),
            ("id_token", &tokens.id_token),
            ("access_token", &tokens.access_token),
        ];
        if let Some(refresh_token) = &tokens.refresh_token {
            params.push(("refresh_token", refresh_token));
        }
        params.push(("expires_in", &expires_in));
        params.push(("token_type", &tokens.token_type));

        info!(email = %masked, "Workspace authentication successful");
        Ok(validation_redirect(config.frontend_url(), &params))
    }
}

#[async_trait]
impl AuthFlow for OauthFlow {
    async fn initiate(&self) -> Result<InitiateOutcome, AuthError> {
        let config = self.config();

        if self.deps.workspace.has_email_restrictions() {
            info!("Workspace authentication is enabled, email validation will be enforced");
        } else {
            warn!("No workspace email restrictions configured, all provider users will be allowed");
        }

        let (Some(domain_url), Some(client_id), Some(callback_url)) = (
            config.cognito_domain_url.as_deref(),
            config.client_id.as_deref(),
            config.redirect_uri.as_deref(),
        ) else {
            return Err(AuthError::Config(
                "OAuth configuration error: missing environment variables".to_string(),
            ));
        };

        let state = generate_state();
        info!(state = %state, "Generated state parameter");

        // prompt=select_account forces Google to show the account chooser
        // even when the browser already holds a session.
        let redirect_url = format!(
            "{}/oauth2/authorize?response_type=code&client_id={}&redirect_uri={}&identity_provider=Google&scope=email+openid+profile&state={}&prompt=select_account",
            domain_url.trim_end_matches('/'),
            client_id,
            urlencode(callback_url),
            urlencode(&state),
        );

        Ok(InitiateOutcome {
            redirect_url,
            message: None,
            workspace_auth_enabled: self.deps.workspace.has_email_restrictions(),
            workspace_config: Some(self.deps.workspace.configuration_info()),
            mode: AuthMode::Oauth,
        })
    }

    async fn handle_callback(&self, request: &CallbackRequest) -> String {
        let frontend_url = self.config().frontend_url().to_string();

        if let Some(error) = request.query.get("error") {
            let description = request.query.get("error_description");
            info!(error = %error, "OAuth error received in callback");
            let message = match description {
                Some(description) => format!("OAuth error: {} - {}", error, description),
                None => format!("OAuth error: {}", error),
            };
            return error_redirect(&frontend_url, &message);
        }

        let Some(code) = request.authorization_code() else {
            info!("No authorization code provided in OAuth callback");
            return error_redirect(&frontend_url, "No authorization code provided");
        };

        if let Some(state) = request.query.get("state") {
            // TODO: compare against the state issued at initiation once a
            // place to store it between the two requests exists.
            info!(state = %state, "Received state parameter");
        }

        info!("Valid authorization code received, proceeding to token exchange");

        match self.exchange_and_validate(&code).await {
            Ok(redirect_url) => redirect_url,
            Err(err) => {
                warn!(error = %err, "Token exchange with workspace validation failed");
                let message = match &err {
                    AuthError::Provider(msg)
                    | AuthError::Validation(msg)
                    | AuthError::TokenParse(msg) => msg.clone(),
                    other => format!("Authentication failed: {}", other),
                };
                workspace_error_redirect(&frontend_url, &message)
            }
        }
    }

    async fn refresh(
        &self,
        refresh_token: &str,
        username: &str,
    ) -> Result<serde_json::Value, AuthError> {
        info!(username = %mask_email(username), "Refreshing tokens");
        let session = self.deps.cognito.refresh_tokens(refresh_token, username).await?;
        Ok(serde_json::to_value(session)?)
    }

    async fn logout(&self, access_token: &str) -> Result<serde_json::Value, AuthError> {
        self.deps.cognito.global_sign_out(access_token).await?;
        Ok(serde_json::json!({
            "message": "Successfully logged out",
        }))
    }
}

// ---------------------------------------------------------------------------
// HYBRID / MOCK
// ---------------------------------------------------------------------------

/// Shared implementation for the two provider-less flows: a "proceed to
/// validation page" initiation and minted dev tokens at the callback.
async fn dev_callback(frontend_url: &str, email: &str, mode: AuthMode) -> String {
    let id_token = mint_dev_token(email, "id");
    let access_token = mint_dev_token(email, "access");
    let refresh_token = format!(
        "{}-refresh-token-{}",
        mode.as_str().to_lowercase(),
        Utc::now().timestamp_millis()
    );
    let message = match mode {
        AuthMode::Hybrid => "Hybrid authentication successful",
        _ => "Mock authentication successful",
    };

    info!(email = %mask_email(email), mode = %mode, "Dev authentication successful");
    validation_redirect(
        frontend_url,
        &[
            ("status", "success"),
            ("message", message),
            ("email", email),
            ("id_token", &id_token),
            ("access_token", &access_token),
            ("refresh_token", &refresh_token),
            ("expires_in", "3600"),
            ("token_type", "Bearer"),
            ("auth_mode", mode.as_str()),
        ],
    )
}

fn dev_refresh(email: &str, mode: AuthMode) -> serde_json::Value {
    serde_json::json!({
        "id_token": mint_dev_token(email, "id"),
        "access_token": mint_dev_token(email, "access"),
        "token_type": "Bearer",
        "expires_in": 3600,
        "auth_mode": mode.as_str(),
    })
}

fn dev_logout(mode: AuthMode) -> serde_json::Value {
    serde_json::json!({
        "message": format!("Successfully logged out from {} mode", mode.as_str().to_lowercase()),
        "auth_mode": mode.as_str(),
    })
}

pub struct HybridFlow {
    deps: AuthDeps,
}

impl HybridFlow {
    fn test_email(&self) -> &str {
        self.deps
            .config
            .default_test_email
            .as_deref()
            .unwrap_or("test@example.com")
    }
}

#[async_trait]
impl AuthFlow for HybridFlow {
    async fn initiate(&self) -> Result<InitiateOutcome, AuthError> {
        let frontend_url = self.deps.config.frontend_url();
        Ok(InitiateOutcome {
            redirect_url: format!(
                "{}{}?mode=hybrid",
                frontend_url.trim_end_matches('/'),
                VALIDATION_PATH
            ),
            message: Some(
                "Hybrid authentication - OAuth config available but some components missing"
                    .to_string(),
            ),
            workspace_auth_enabled: self.deps.workspace.has_email_restrictions(),
            workspace_config: Some(self.deps.workspace.configuration_info()),
            mode: AuthMode::Hybrid,
        })
    }

    async fn handle_callback(&self, _request: &CallbackRequest) -> String {
        dev_callback(
            self.deps.config.frontend_url(),
            self.test_email(),
            AuthMode::Hybrid,
        )
        .await
    }

    async fn refresh(
        &self,
        _refresh_token: &str,
        _username: &str,
    ) -> Result<serde_json::Value, AuthError> {
        Ok(dev_refresh(self.test_email(), AuthMode::Hybrid))
    }

    async fn logout(&self, _access_token: &str) -> Result<serde_json::Value, AuthError> {
        Ok(dev_logout(AuthMode::Hybrid))
    }
}

pub struct MockFlow {
    deps: AuthDeps,
}

impl MockFlow {
    fn mock_email(&self) -> &str {
        self.deps
            .config
            .mock_user_email
            .as_deref()
            .unwrap_or("mock@example.com")
    }
}

#[async_trait]
impl AuthFlow for MockFlow {
    async fn initiate(&self) -> Result<InitiateOutcome, AuthError> {
        let frontend_url = self.deps.config.local_frontend_url();
        Ok(InitiateOutcome {
            redirect_url: format!(
                "{}{}?mode=mock",
                frontend_url.trim_end_matches('/'),
                VALIDATION_PATH
            ),
            message: Some("Mock authentication - no OAuth configuration available".to_string()),
            workspace_auth_enabled: false,
            workspace_config: None,
            mode: AuthMode::Mock,
        })
    }

    async fn handle_callback(&self, _request: &CallbackRequest) -> String {
        dev_callback(
            self.deps.config.local_frontend_url(),
            self.mock_email(),
            AuthMode::Mock,
        )
        .await
    }

    async fn refresh(
        &self,
        _refresh_token: &str,
        _username: &str,
    ) -> Result<serde_json::Value, AuthError> {
        Ok(dev_refresh(self.mock_email(), AuthMode::Mock))
    }

    async fn logout(&self, _access_token: &str) -> Result<serde_json::Value, AuthError> {
        Ok(dev_logout(AuthMode::Mock))
    }
}
