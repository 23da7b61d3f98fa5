/// ID-token claim extraction and dev-token minting
use crate::error::AuthError;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Claims read out of an ID token payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentityClaims {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub email_verified: Option<bool>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub family_name: Option<String>,
    #[serde(default)]
    pub sub: Option<String>,
}

/// Decodes the payload segment of a JWT without verifying its signature.
///
/// The callback path trusts the token because it was just handed over by
/// the provider's token endpoint over TLS, but nothing here proves that.
// TODO: verify the signature against the Cognito JWKS before trusting claims.
pub fn decode_claims_unverified(id_token: &str) -> Result<IdentityClaims, AuthError> {
    let mut segments = id_token.split('.');
    let (Some(_header), Some(payload)) = (segments.next(), segments.next()) else {
        return Err(AuthError::TokenParse(
            "ID token does not have a payload segment".to_string(),
        ));
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| AuthError::TokenParse(format!("invalid base64 in ID token payload: {}", e)))?;

    serde_json::from_slice(&bytes)
        .map_err(|e| AuthError::TokenParse(format!("invalid JSON in ID token payload: {}", e)))
}

/// Extracts the email claim, if any, from an ID token.
pub fn email_from_id_token(id_token: &str) -> Option<String> {
    decode_claims_unverified(id_token).ok()?.email
}

/// Mints a structurally valid but unsigned JWT for the HYBRID and MOCK
/// flows. The third segment is a fixed placeholder, never a real signature;
/// nothing downstream of local development should accept these.
pub fn mint_dev_token(email: &str, token_use: &str) -> String {
    let header = serde_json::json!({
        "alg": "HS256",
        "typ": "JWT",
    });

    let now = Utc::now().timestamp();
    let payload = serde_json::json!({
        "sub": format!("dev-user-{:x}", fingerprint(email)),
        "email": email,
        "email_verified": true,
        "name": "Local Dev User",
        "given_name": "Local",
        "family_name": "User",
        "iss": "local-dev-issuer",
        "aud": "local-dev-client",
        "token_use": token_use,
        "iat": now,
        "exp": now + 3600,
    });

    format!(
        "{}.{}.{}",
        URL_SAFE_NO_PAD.encode(header.to_string()),
        URL_SAFE_NO_PAD.encode(payload.to_string()),
        URL_SAFE_NO_PAD.encode("dummy-signature"),
    )
}

fn fingerprint(input: &str) -> u64 {
    use std::hash::{DefaultHasher, Hash, Hasher};
    let mut hasher = DefaultHasher::new();
    input.hash(&mut hasher);
    hasher.finish()
}
