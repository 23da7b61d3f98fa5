/// Cognito identity-provider gateway
///
/// Session operations (refresh, sign-out) and best-effort user
/// provisioning. User existence is reported as a lookup outcome rather
/// than thrown, so callers branch on data instead of catching exceptions.
use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::services::secrets::{SecretStore, secret_field};
use async_trait::async_trait;
use aws_sdk_cognitoidentityprovider::types::{AttributeType, AuthFlowType, MessageActionType};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use rand::Rng;
use serde::Serialize;
use sha2::Sha256;
use std::sync::Arc;
use tracing::info;

type HmacSha256 = Hmac<Sha256>;

/// Tokens returned by a refresh. Cognito omits the refresh token itself on
/// REFRESH_TOKEN_AUTH, so every field but `expires_in` is optional.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshedSession {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub expires_in: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
}

/// Result of looking a user up in the pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserLookup {
    Found,
    NotFound,
    Error(String),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CognitoGateway: Send + Sync {
    /// Exchanges a refresh token for a fresh session.
    async fn refresh_tokens(
        &self,
        refresh_token: &str,
        username: &str,
    ) -> Result<RefreshedSession, AuthError>;

    /// Signs the user out of every device.
    async fn global_sign_out(&self, access_token: &str) -> Result<(), AuthError>;

    /// Checks whether a user record exists for this email.
    async fn lookup_user(&self, email: &str) -> UserLookup;

    /// Creates a pool record for a provider-authenticated user.
    async fn provision_user<'a>(&self, email: &str, name: Option<&'a str>)
    -> Result<(), AuthError>;
}

pub struct CognitoIdpGateway {
    client: aws_sdk_cognitoidentityprovider::Client,
    config: Arc<AuthConfig>,
    secrets: Arc<dyn SecretStore>,
}

impl CognitoIdpGateway {
    pub fn new(
        client: aws_sdk_cognitoidentityprovider::Client,
        config: Arc<AuthConfig>,
        secrets: Arc<dyn SecretStore>,
    ) -> Self {
        Self {
            client,
            config,
            secrets,
        }
    }

    fn client_id(&self) -> Result<&str, AuthError> {
        self.config
            .client_id
            .as_deref()
            .ok_or_else(|| AuthError::Config("CLIENT_ID not configured".to_string()))
    }

    fn user_pool_id(&self) -> Result<&str, AuthError> {
        self.config
            .user_pool_id
            .as_deref()
            .ok_or_else(|| AuthError::Config("USER_POOL_ID not configured".to_string()))
    }

    /// Fetches `client_secret` from the auth secret. Uncached, like every
    /// other secret read.
    async fn client_secret(&self) -> Result<String, AuthError> {
        let name = self
            .config
            .secret_name
            .as_deref()
            .ok_or_else(|| AuthError::Config("SECRET_NAME not configured".to_string()))?;
        let secret_json = self.secrets.get_secret(name).await?;
        secret_field(&secret_json, "client_secret").ok_or_else(|| {
            AuthError::SecretAccess("client_secret not found in auth secret".to_string())
        })
    }
}

/// Cognito SECRET_HASH: base64(HMAC-SHA256(client_secret, username + client_id)).
pub fn secret_hash(username: &str, client_id: &str, client_secret: &str) -> Result<String, AuthError> {
    let mut mac = HmacSha256::new_from_slice(client_secret.as_bytes())
        .map_err(|e| AuthError::Config(format!("invalid client secret key: {}", e)))?;
    mac.update(username.as_bytes());
    mac.update(client_id.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

fn temporary_password() -> String {
    // Satisfies the default pool policy (upper, lower, digit, symbol).
    let suffix: u64 = rand::thread_rng().r#gen();
    format!("Gw1!{:016x}", suffix)
}

#[async_trait]
impl CognitoGateway for CognitoIdpGateway {
    async fn refresh_tokens(
        &self,
        refresh_token: &str,
        username: &str,
    ) -> Result<RefreshedSession, AuthError> {
        let client_id = self.client_id()?.to_string();
        let client_secret = self.client_secret().await?;
        let hash = secret_hash(username, &client_id, &client_secret)?;

        let response = self
            .client
            .initiate_auth()
            .client_id(&client_id)
            .auth_flow(AuthFlowType::RefreshTokenAuth)
            .auth_parameters("REFRESH_TOKEN", refresh_token)
            .auth_parameters("SECRET_HASH", hash)
            .send()
            .await
            .map_err(|e| AuthError::Provider(format!("InitiateAuth failed: {}", e)))?;

        let result = response.authentication_result().ok_or_else(|| {
            AuthError::Provider("no authentication result in refresh response".to_string())
        })?;

        info!("Token refresh successful");
        Ok(RefreshedSession {
            id_token: result.id_token().map(str::to_string),
            access_token: result.access_token().map(str::to_string),
            refresh_token: result.refresh_token().map(str::to_string),
            expires_in: result.expires_in(),
            token_type: result.token_type().map(str::to_string),
        })
    }

    async fn global_sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        self.client
            .global_sign_out()
            .access_token(access_token)
            .send()
            .await
            .map_err(|e| AuthError::Provider(format!("GlobalSignOut failed: {}", e)))?;

        info!("Global sign out successful");
        Ok(())
    }

    async fn lookup_user(&self, email: &str) -> UserLookup {
        let user_pool_id = match self.user_pool_id() {
            Ok(id) => id.to_string(),
            Err(err) => return UserLookup::Error(err.to_string()),
        };

        match self
            .client
            .admin_get_user()
            .user_pool_id(user_pool_id)
            .username(email)
            .send()
            .await
        {
            Ok(_) => UserLookup::Found,
            Err(err) => {
                let service_err = err.into_service_error();
                if service_err.is_user_not_found_exception() {
                    UserLookup::NotFound
                } else {
                    UserLookup::Error(service_err.to_string())
                }
            }
        }
    }

    async fn provision_user<'a>(&self, email: &str, name: Option<&'a str>) -> Result<(), AuthError> {
        let user_pool_id = self.user_pool_id()?.to_string();

        let attribute = |attr_name: &str, value: &str| {
            AttributeType::builder()
                .name(attr_name)
                .value(value)
                .build()
                .map_err(|e| AuthError::Provider(format!("invalid user attribute: {}", e)))
        };

        let create_result = self
            .client
            .admin_create_user()
            .user_pool_id(&user_pool_id)
            .username(email)
            .user_attributes(attribute("email", email)?)
            .user_attributes(attribute("name", name.unwrap_or(email))?)
            .user_attributes(attribute("email_verified", "true")?)
            .user_attributes(attribute("custom:auth_provider", "google")?)
            .temporary_password(temporary_password())
            .message_action(MessageActionType::Suppress)
            .send()
            .await;

        if let Err(err) = create_result {
            let service_err = err.into_service_error();
            if service_err.is_username_exists_exception() {
                // Lost a race with a concurrent login; the record exists.
                return Ok(());
            }
            return Err(AuthError::Provider(format!(
                "AdminCreateUser failed: {}",
                service_err
            )));
        }

        self.client
            .admin_set_user_password()
            .user_pool_id(&user_pool_id)
            .username(email)
            .password(temporary_password())
            .permanent(true)
            .send()
            .await
            .map_err(|e| AuthError::Provider(format!("AdminSetUserPassword failed: {}", e)))?;

        info!("Created new Cognito user record");
        Ok(())
    }
}
