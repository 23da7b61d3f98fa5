/// Health check endpoint
use axum::{Json, extract::State};
use maildest_core::auth::{AuthMode, detect_mode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::context::AuthContext;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
    pub auth_mode: String,
    pub oauth_flow: String,
    pub workspace_auth_enabled: bool,
    pub workspace_auth_config: String,
}

/// Health check handler
/// This endpoint does not require authentication
pub async fn handler(State(ctx): State<Arc<AuthContext>>) -> Json<HealthResponse> {
    let mode = detect_mode(&ctx.deps.config, ctx.deps.secrets.as_ref()).await;

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: maildest_core::VERSION.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        auth_mode: mode.to_string(),
        oauth_flow: if mode == AuthMode::Oauth {
            "google_oauth_2.0".to_string()
        } else {
            "flexible_auth".to_string()
        },
        workspace_auth_enabled: ctx.deps.workspace.has_email_restrictions(),
        workspace_auth_config: ctx.deps.workspace.configuration_info(),
    })
}
