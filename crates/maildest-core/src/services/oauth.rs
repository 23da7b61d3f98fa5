/// Authorization-code token exchange against the Cognito hosted endpoint
use crate::error::AuthError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

/// Connect and read timeout for the token endpoint call.
const TOKEN_ENDPOINT_TIMEOUT: Duration = Duration::from_secs(10);

/// Token set returned by the provider's `/oauth2/token` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSet {
    pub id_token: String,
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub expires_in: i64,
    pub token_type: String,
}

/// Performs the authorization-code-for-tokens exchange.
pub struct TokenExchanger {
    http: reqwest::Client,
    token_url: String,
    client_id: String,
    redirect_uri: String,
}

impl TokenExchanger {
    pub fn new(
        domain_url: &str,
        client_id: &str,
        redirect_uri: &str,
    ) -> Result<Self, AuthError> {
        let http = reqwest::Client::builder()
            .connect_timeout(TOKEN_ENDPOINT_TIMEOUT)
            .timeout(TOKEN_ENDPOINT_TIMEOUT)
            .build()
            .map_err(|e| AuthError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            token_url: format!("{}/oauth2/token", domain_url.trim_end_matches('/')),
            client_id: client_id.to_string(),
            redirect_uri: redirect_uri.to_string(),
        })
    }

    /// Exchanges an authorization code for a token set.
    ///
    /// `client_secret` is optional; some app-client configurations do not
    /// require one. A non-2xx response surfaces as a Provider error carrying
    /// the raw response body so the frontend can display it.
    pub async fn exchange(
        &self,
        code: &str,
        client_secret: Option<&str>,
    ) -> Result<TokenSet, AuthError> {
        let mut form = vec![
            ("grant_type", "authorization_code"),
            ("client_id", self.client_id.as_str()),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
        ];
        if let Some(secret) = client_secret {
            form.push(("client_secret", secret));
        } else {
            warn!("Proceeding with token exchange without client_secret");
        }

        info!(token_url = %self.token_url, redirect_uri = %self.redirect_uri, "Exchanging authorization code");

        let response = self
            .http
            .post(&self.token_url)
            .header("Accept", "application/json")
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        info!(status = status.as_u16(), "Token endpoint responded");

        if status.as_u16() >= 400 {
            return Err(AuthError::Provider(format!("Token exchange failed: {}", body)));
        }

        parse_token_response(&body)
    }
}

fn parse_token_response(body: &str) -> Result<TokenSet, AuthError> {
    serde_json::from_str(body)
        .map_err(|e| AuthError::TokenParse(format!("invalid token response: {}", e)))
}
