/// Maildest Auth - Authentication Lambda
///
/// This module contains the HTTP surface of the Maildest authentication
/// service: OAuth login initiation, the provider callback, session
/// refresh/logout, and the health/workspace informational endpoints.
pub mod api;
pub mod context;
pub mod error;

pub use context::AuthContext;
pub use error::ApiError;

use axum::{
    Router,
    body::Body as AxumBody,
    http::{HeaderName, Method, Uri, header},
    routing::{get, post},
};
use lambda_http::{Body, Error as LambdaError, Request, Response};
use std::sync::Arc;
use tower::ServiceExt;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

/// CORS headers attached to every response, preflight included.
const ALLOWED_HEADERS: &str =
    "Content-Type,X-Amz-Date,Authorization,X-Api-Key,X-Amz-Security-Token";
const ALLOWED_METHODS: &str = "GET,POST,PUT,DELETE,OPTIONS";

/// Main handler - converts the Lambda HTTP request to an Axum router call
pub async fn handler(ctx: Arc<AuthContext>, event: Request) -> Result<Response<Body>, LambdaError> {
    info!("Processing auth request: {} {}", event.method(), event.uri());

    // Preflight and bare OPTIONS probes are answered before routing; API
    // Gateway forwards them for every path.
    if event.method() == Method::OPTIONS {
        return options_response();
    }

    let app = Router::new()
        .route("/auth/health", get(api::health::handler))
        .route("/auth/google/login", get(api::login::handler))
        .route("/auth/google/callback", get(api::callback::handler))
        .route("/auth/token/refresh", post(api::session::refresh))
        .route("/auth/logout", post(api::session::logout))
        .route("/auth/workspace/domains", get(api::workspace::domains))
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([
                    header::CONTENT_TYPE,
                    header::AUTHORIZATION,
                    HeaderName::from_static("x-amz-date"),
                    HeaderName::from_static("x-api-key"),
                    HeaderName::from_static("x-amz-security-token"),
                ]),
        )
        .with_state(ctx);

    // Convert Lambda HTTP request to Axum request
    let (parts, body) = event.into_parts();
    let body_bytes = body.to_vec();

    let axum_request = http::Request::from_parts(parts, AxumBody::from(body_bytes));

    // Process request with Axum
    match app.oneshot(axum_request).await {
        Ok(response) => {
            let (parts, body) = response.into_parts();

            // Convert Axum response body to Lambda response body
            let body_bytes = axum::body::to_bytes(body, usize::MAX)
                .await
                .unwrap_or_default();

            let lambda_response = Response::from_parts(parts, Body::from(body_bytes.to_vec()));
            Ok(lambda_response)
        }
        Err(err) => {
            error!("Axum router error: {}", err);
            let response = Response::builder()
                .status(500)
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "status": "error",
                        "message": "Internal server error"
                    })
                    .to_string(),
                ))?;
            Ok(response)
        }
    }
}

fn options_response() -> Result<Response<Body>, LambdaError> {
    let response = Response::builder()
        .status(200)
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Headers", ALLOWED_HEADERS)
        .header("Access-Control-Allow-Methods", ALLOWED_METHODS)
        .header("Content-Type", "application/json")
        .body(Body::Empty)?;
    Ok(response)
}

async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("Endpoint not found: {}", uri.path()))
}

async fn method_not_allowed(uri: Uri) -> ApiError {
    ApiError::MethodNotAllowed(format!("Method not allowed for {}", uri.path()))
}
