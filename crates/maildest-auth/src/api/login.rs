/// Login initiation endpoint
///
/// Returns the provider authorization URL as JSON data with a 200 rather
/// than issuing a 302, so the browser fetch that calls this endpoint is
/// not blocked by cross-origin redirect rules.
use axum::{Json, extract::State};
use maildest_core::auth::{detect_mode, flow_for};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::info;

use crate::context::AuthContext;
use crate::error::ApiError;

pub async fn handler(State(ctx): State<Arc<AuthContext>>) -> Result<Json<Value>, ApiError> {
    let mode = detect_mode(&ctx.deps.config, ctx.deps.secrets.as_ref()).await;
    info!(mode = %mode, "Initiating authentication flow");

    let flow = flow_for(mode, &ctx.deps);
    let outcome = flow
        .initiate()
        .await
        .map_err(|err| ApiError::Internal(format!("Failed to initiate authentication: {}", err)))?;

    let mut body = json!({
        "status": "success",
        "redirectUrl": outcome.redirect_url,
        "workspace_auth_enabled": outcome.workspace_auth_enabled,
        "auth_mode": outcome.mode.as_str(),
    });
    if let Some(message) = outcome.message {
        body["message"] = json!(message);
    }
    if let Some(config_summary) = outcome.workspace_config {
        body["workspace_config"] = json!(config_summary);
    }

    Ok(Json(body))
}
