/// Maildest Core - Shared library for the Maildest admin authentication service
///
/// This crate contains the authentication domain logic, configuration, and
/// service gateways used by the auth Lambda function.
pub mod auth;
pub mod config;
pub mod error;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use auth::{AuthDeps, AuthMode, CallbackRequest, WorkspaceAuthService, detect_mode, flow_for};
pub use config::AuthConfig;
pub use error::AuthError;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
