/// Session endpoints: token refresh and logout
use axum::{Json, extract::State};
use maildest_core::auth::{detect_mode, flow_for};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

use crate::context::AuthContext;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
    pub username: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutRequest {
    pub access_token: String,
}

/// POST /auth/token/refresh
pub async fn refresh(
    State(ctx): State<Arc<AuthContext>>,
    Json(body): Json<RefreshRequest>,
) -> Result<Json<Value>, ApiError> {
    let mode = detect_mode(&ctx.deps.config, ctx.deps.secrets.as_ref()).await;
    let flow = flow_for(mode, &ctx.deps);

    match flow.refresh(&body.refresh_token, &body.username).await {
        Ok(tokens) => Ok(Json(tokens)),
        Err(err) => {
            warn!(error = %err, "Token refresh failed");
            Err(ApiError::Unauthorized(format!("Token refresh failed: {}", err)))
        }
    }
}

/// POST /auth/logout
pub async fn logout(
    State(ctx): State<Arc<AuthContext>>,
    Json(body): Json<LogoutRequest>,
) -> Result<Json<Value>, ApiError> {
    let mode = detect_mode(&ctx.deps.config, ctx.deps.secrets.as_ref()).await;
    let flow = flow_for(mode, &ctx.deps);

    match flow.logout(&body.access_token).await {
        Ok(response) => Ok(Json(response)),
        Err(err) => {
            warn!(error = %err, "Logout failed");
            Err(ApiError::Internal(format!("Logout failed: {}", err)))
        }
    }
}
