/// End-to-end tests for the auth Lambda handler: each test builds the
/// handler around stubbed AWS collaborators, sends a Lambda HTTP request,
/// and asserts on the response the frontend would see.
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use lambda_http::{Body, Request, Response};
use maildest_auth::{AuthContext, handler};
use maildest_core::auth::validator::{EmailValidator, WorkspaceConfig};
use maildest_core::auth::{AuthDeps, WorkspaceAuthService};
use maildest_core::config::AuthConfig;
use maildest_core::error::AuthError;
use maildest_core::services::cognito::{CognitoGateway, RefreshedSession, UserLookup};
use maildest_core::services::secrets::SecretStore;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct StubSecrets {
    secret_json: Option<String>,
}

#[async_trait]
impl SecretStore for StubSecrets {
    async fn get_secret(&self, _name: &str) -> Result<String, AuthError> {
        self.secret_json
            .clone()
            .ok_or_else(|| AuthError::SecretAccess("secret unreachable".to_string()))
    }
}

struct StubCognito {
    refresh_error: Option<String>,
}

impl StubCognito {
    fn healthy() -> Self {
        Self {
            refresh_error: None,
        }
    }
}

#[async_trait]
impl CognitoGateway for StubCognito {
    async fn refresh_tokens(
        &self,
        _refresh_token: &str,
        _username: &str,
    ) -> Result<RefreshedSession, AuthError> {
        match &self.refresh_error {
            Some(message) => Err(AuthError::Provider(message.clone())),
            None => Ok(RefreshedSession {
                id_token: Some("new-id".to_string()),
                access_token: Some("new-access".to_string()),
                refresh_token: None,
                expires_in: 3600,
                token_type: Some("Bearer".to_string()),
            }),
        }
    }

    async fn global_sign_out(&self, _access_token: &str) -> Result<(), AuthError> {
        Ok(())
    }

    async fn lookup_user(&self, _email: &str) -> UserLookup {
        UserLookup::Found
    }

    async fn provision_user<'a>(
        &self,
        _email: &str,
        _name: Option<&'a str>,
    ) -> Result<(), AuthError> {
        Ok(())
    }
}

/// Context wired for a given config, secret payload, and allowed domains.
fn test_context(
    config: AuthConfig,
    secret_json: Option<&str>,
    allowed_domains: &[&str],
    cognito: StubCognito,
) -> Arc<AuthContext> {
    let domains: HashSet<String> = allowed_domains.iter().map(|d| d.to_string()).collect();
    let workspace = WorkspaceAuthService::with_validator(EmailValidator::new(
        WorkspaceConfig::from_sets(domains, HashSet::new()),
    ));

    AuthContext::with_deps(AuthDeps {
        config: Arc::new(config),
        secrets: Arc::new(StubSecrets {
            secret_json: secret_json.map(str::to_string),
        }),
        cognito: Arc::new(cognito),
        workspace: Arc::new(workspace),
    })
}

fn oauth_config(domain_url: &str) -> AuthConfig {
    AuthConfig {
        cognito_domain_url: Some(domain_url.to_string()),
        client_id: Some("client-1".to_string()),
        google_client_id: Some("google-1".to_string()),
        secret_name: Some("maildest/auth".to_string()),
        redirect_uri: Some("https://api.example.com/dev/auth/google/callback".to_string()),
        frontend_url: Some("https://front.example.com".to_string()),
        ..Default::default()
    }
}

fn get(uri: &str) -> Request {
    http::Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::Empty)
        .unwrap()
}

fn post_json(uri: &str, body: Value) -> Request {
    http::Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn body_json(response: &Response<Body>) -> Value {
    let bytes: &[u8] = match response.body() {
        Body::Text(text) => text.as_bytes(),
        Body::Binary(bytes) => bytes,
        Body::Empty => b"",
    };
    serde_json::from_slice(bytes).unwrap()
}

/// Decoded query parameters of the redirect Location header.
fn location_params(response: &Response<Body>) -> (String, HashMap<String, String>) {
    let location = response.headers()["location"].to_str().unwrap().to_string();
    let query = location.split_once('?').map(|(_, q)| q.to_string()).unwrap_or_default();
    let params = url::form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect();
    (location, params)
}

/// An unsigned JWT carrying the given email claim, shaped like a Cognito
/// id_token for payload-decoding purposes.
fn provider_id_token(email: &str) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(
        serde_json::json!({
            "email": email,
            "email_verified": true,
            "sub": "provider-sub-1",
        })
        .to_string(),
    );
    format!("{}.{}.signature", header, payload)
}

async fn mount_token_endpoint(server: &MockServer, id_token: &str) {
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("client_id=client-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id_token": id_token,
            "access_token": "provider-access-token",
            "refresh_token": "provider-refresh-token",
            "expires_in": 3600,
            "token_type": "Bearer",
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_health_reports_mock_mode_without_config() {
    let ctx = test_context(AuthConfig::default(), None, &[], StubCognito::healthy());

    let response = handler(ctx, get("/auth/health")).await.unwrap();
    assert_eq!(response.status(), 200);

    let body = body_json(&response);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["auth_mode"], "MOCK");
    assert_eq!(body["oauth_flow"], "flexible_auth");
    assert_eq!(body["workspace_auth_enabled"], false);
}

#[tokio::test]
async fn test_health_reports_oauth_mode_with_full_config() {
    let ctx = test_context(
        oauth_config("https://auth.example.com"),
        Some(r#"{"client_secret":"s3cret"}"#),
        &["corp.example.com"],
        StubCognito::healthy(),
    );

    let response = handler(ctx, get("/auth/health")).await.unwrap();
    let body = body_json(&response);
    assert_eq!(body["auth_mode"], "OAUTH");
    assert_eq!(body["oauth_flow"], "google_oauth_2.0");
    assert_eq!(body["workspace_auth_enabled"], true);
}

#[tokio::test]
async fn test_login_returns_authorize_url() {
    let ctx = test_context(
        oauth_config("https://auth.example.com"),
        Some(r#"{"client_secret":"s3cret"}"#),
        &["corp.example.com"],
        StubCognito::healthy(),
    );

    let response = handler(ctx, get("/auth/google/login")).await.unwrap();
    assert_eq!(response.status(), 200);

    let body = body_json(&response);
    assert_eq!(body["status"], "success");
    assert_eq!(body["auth_mode"], "OAUTH");
    let redirect_url = body["redirectUrl"].as_str().unwrap();
    assert!(redirect_url.starts_with("https://auth.example.com/oauth2/authorize?"));
    assert!(redirect_url.contains("identity_provider=Google"));
    assert!(redirect_url.contains("prompt=select_account"));
}

#[tokio::test]
async fn test_login_in_mock_mode_points_at_local_frontend() {
    let ctx = test_context(AuthConfig::default(), None, &[], StubCognito::healthy());

    let response = handler(ctx, get("/auth/google/login")).await.unwrap();
    let body = body_json(&response);
    assert_eq!(body["auth_mode"], "MOCK");
    assert_eq!(
        body["redirectUrl"],
        "http://localhost:3000/auth/validation?mode=mock"
    );
}

#[tokio::test]
async fn test_callback_success_redirects_with_tokens() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, &provider_id_token("user@corp.example.com")).await;

    let ctx = test_context(
        oauth_config(&server.uri()),
        Some(r#"{"client_secret":"s3cret"}"#),
        &["corp.example.com"],
        StubCognito::healthy(),
    );

    let response = handler(ctx, get("/auth/google/callback?code=auth-code-1&state=xyz"))
        .await
        .unwrap();
    assert_eq!(response.status(), 302);

    let (location, params) = location_params(&response);
    assert!(location.starts_with("https://front.example.com/auth/validation?"));
    assert_eq!(params["status"], "success");
    assert_eq!(params["message"], "Google Workspace login successful");
    assert_eq!(params["email"], "u***r@corp.example.com");
    assert_eq!(params["access_token"], "provider-access-token");
    assert_eq!(params["refresh_token"], "provider-refresh-token");
    assert_eq!(params["expires_in"], "3600");
    assert_eq!(params["token_type"], "Bearer");
}

#[tokio::test]
async fn test_callback_denies_email_outside_workspace() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, &provider_id_token("user@elsewhere.example.org")).await;

    let ctx = test_context(
        oauth_config(&server.uri()),
        Some(r#"{"client_secret":"s3cret"}"#),
        &["corp.example.com"],
        StubCognito::healthy(),
    );

    let response = handler(ctx, get("/auth/google/callback?code=auth-code-1"))
        .await
        .unwrap();
    assert_eq!(response.status(), 302);

    let (_, params) = location_params(&response);
    assert_eq!(params["status"], "error");
    assert!(params["message"].starts_with("Access denied:"));
    assert_eq!(params["workspace_auth"], "true");
}

#[tokio::test]
async fn test_callback_provider_failure_redirects_with_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "invalid_grant"
            })),
        )
        .mount(&server)
        .await;

    let ctx = test_context(
        oauth_config(&server.uri()),
        Some(r#"{"client_secret":"s3cret"}"#),
        &["corp.example.com"],
        StubCognito::healthy(),
    );

    let response = handler(ctx, get("/auth/google/callback?code=expired-code"))
        .await
        .unwrap();
    assert_eq!(response.status(), 302);

    let (_, params) = location_params(&response);
    assert_eq!(params["status"], "error");
    assert!(params["message"].contains("Token exchange failed"));
}

#[tokio::test]
async fn test_callback_without_code_redirects_with_error() {
    let ctx = test_context(
        oauth_config("https://auth.example.com"),
        Some(r#"{"client_secret":"s3cret"}"#),
        &["corp.example.com"],
        StubCognito::healthy(),
    );

    let response = handler(ctx, get("/auth/google/callback")).await.unwrap();
    assert_eq!(response.status(), 302);

    let (_, params) = location_params(&response);
    assert_eq!(params["status"], "error");
    assert_eq!(params["message"], "No authorization code provided");
}

#[tokio::test]
async fn test_refresh_returns_session_tokens() {
    let ctx = test_context(
        oauth_config("https://auth.example.com"),
        Some(r#"{"client_secret":"s3cret"}"#),
        &["corp.example.com"],
        StubCognito::healthy(),
    );

    let response = handler(
        ctx,
        post_json(
            "/auth/token/refresh",
            serde_json::json!({
                "refreshToken": "provider-refresh-token",
                "username": "user@corp.example.com",
            }),
        ),
    )
    .await
    .unwrap();

    assert_eq!(response.status(), 200);
    let body = body_json(&response);
    assert_eq!(body["id_token"], "new-id");
    assert_eq!(body["access_token"], "new-access");
    assert_eq!(body["expires_in"], 3600);
}

#[tokio::test]
async fn test_refresh_failure_returns_unauthorized() {
    let ctx = test_context(
        oauth_config("https://auth.example.com"),
        Some(r#"{"client_secret":"s3cret"}"#),
        &["corp.example.com"],
        StubCognito {
            refresh_error: Some("InitiateAuth failed: NotAuthorizedException".to_string()),
        },
    );

    let response = handler(
        ctx,
        post_json(
            "/auth/token/refresh",
            serde_json::json!({
                "refreshToken": "stale-token",
                "username": "user@corp.example.com",
            }),
        ),
    )
    .await
    .unwrap();

    assert_eq!(response.status(), 401);
    let body = body_json(&response);
    assert_eq!(body["status"], "error");
    assert!(body["message"].as_str().unwrap().contains("Token refresh failed"));
}

#[tokio::test]
async fn test_logout_in_mock_mode() {
    let ctx = test_context(AuthConfig::default(), None, &[], StubCognito::healthy());

    let response = handler(
        ctx,
        post_json(
            "/auth/logout",
            serde_json::json!({ "accessToken": "mock-access" }),
        ),
    )
    .await
    .unwrap();

    assert_eq!(response.status(), 200);
    let body = body_json(&response);
    assert_eq!(body["message"], "Successfully logged out from mock mode");
    assert_eq!(body["auth_mode"], "MOCK");
}

#[tokio::test]
async fn test_workspace_domains_endpoint() {
    let ctx = test_context(
        AuthConfig::default(),
        None,
        &["corp.example.com"],
        StubCognito::healthy(),
    );

    let response = handler(ctx, get("/auth/workspace/domains")).await.unwrap();
    assert_eq!(response.status(), 200);

    let body = body_json(&response);
    assert_eq!(body["workspace_auth_enabled"], true);
    assert!(
        body["configuration_summary"]
            .as_str()
            .unwrap()
            .contains("1 allowed domains")
    );
}

#[tokio::test]
async fn test_options_preflight_gets_cors_headers() {
    let ctx = test_context(AuthConfig::default(), None, &[], StubCognito::healthy());

    let request = http::Request::builder()
        .method("OPTIONS")
        .uri("/auth/google/login")
        .body(Body::Empty)
        .unwrap();

    let response = handler(ctx, request).await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
    assert_eq!(
        response.headers()["access-control-allow-methods"],
        "GET,POST,PUT,DELETE,OPTIONS"
    );
    assert!(
        response.headers()["access-control-allow-headers"]
            .to_str()
            .unwrap()
            .contains("Authorization")
    );
}

#[tokio::test]
async fn test_unknown_endpoint_returns_404() {
    let ctx = test_context(AuthConfig::default(), None, &[], StubCognito::healthy());

    let response = handler(ctx, get("/auth/unknown")).await.unwrap();
    assert_eq!(response.status(), 404);

    let body = body_json(&response);
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "Endpoint not found: /auth/unknown");
}

#[tokio::test]
async fn test_wrong_method_returns_405() {
    let ctx = test_context(AuthConfig::default(), None, &[], StubCognito::healthy());

    let response = handler(
        ctx,
        post_json("/auth/health", serde_json::json!({})),
    )
    .await
    .unwrap();

    assert_eq!(response.status(), 405);
    let body = body_json(&response);
    assert_eq!(body["message"], "Method not allowed for /auth/health");
}
