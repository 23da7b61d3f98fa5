/// Workspace allow-list configuration endpoint
use axum::{Json, extract::State};
use serde_json::{Value, json};
use std::sync::Arc;

use crate::context::AuthContext;

/// GET /auth/workspace/domains
pub async fn domains(State(ctx): State<Arc<AuthContext>>) -> Json<Value> {
    Json(json!({
        "workspace_auth_enabled": ctx.deps.workspace.has_email_restrictions(),
        "configuration_summary": ctx.deps.workspace.configuration_info(),
    }))
}
