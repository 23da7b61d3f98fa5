/// OAuth callback endpoint
///
/// Always answers with a 302 back to the frontend validation page; the
/// flow converts every failure into a `status=error` redirect so the user
/// never strands on a bare JSON error mid-login.
use axum::body::Body;
use axum::extract::{RawQuery, State};
use axum::http::{StatusCode, header};
use axum::response::Response;
use maildest_core::auth::{CallbackRequest, detect_mode, flow_for};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::context::AuthContext;
use crate::error::ApiError;

pub async fn handler(
    State(ctx): State<Arc<AuthContext>>,
    RawQuery(query): RawQuery,
) -> Result<Response, ApiError> {
    let request = callback_request_from_query(query.as_deref().unwrap_or(""));
    let mode = detect_mode(&ctx.deps.config, ctx.deps.secrets.as_ref()).await;
    info!(mode = %mode, "Handling authentication callback");

    let flow = flow_for(mode, &ctx.deps);
    let location = flow.handle_callback(&request).await;

    redirect_response(&location)
}

/// Splits a raw query string into the single-valued and multi-valued maps
/// the callback flow inspects. The single-valued map keeps the first
/// occurrence of each key, matching API Gateway's behavior.
fn callback_request_from_query(raw_query: &str) -> CallbackRequest {
    let mut query: HashMap<String, String> = HashMap::new();
    let mut multi_query: HashMap<String, Vec<String>> = HashMap::new();

    for (key, value) in url::form_urlencoded::parse(raw_query.as_bytes()).into_owned() {
        query.entry(key.clone()).or_insert_with(|| value.clone());
        multi_query.entry(key).or_default().push(value);
    }

    CallbackRequest {
        query,
        path_params: HashMap::new(),
        multi_query,
    }
}

fn redirect_response(location: &str) -> Result<Response, ApiError> {
    Response::builder()
        .status(StatusCode::FOUND)
        .header(header::LOCATION, location)
        .header(header::CACHE_CONTROL, "no-cache, no-store, must-revalidate")
        .header(header::PRAGMA, "no-cache")
        .header(header::EXPIRES, "0")
        .body(Body::empty())
        .map_err(|err| ApiError::Internal(format!("Failed to build redirect: {}", err)))
}
