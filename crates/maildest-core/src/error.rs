/// Error types for the Maildest auth service
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Identity provider error: {0}")]
    Provider(String),

    #[error("Token parse error: {0}")]
    TokenParse(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Secret access error: {0}")]
    SecretAccess(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Lambda runtime error: {0}")]
    Lambda(String),
}

impl AuthError {
    /// Whether this error must surface as a redirect back to the frontend
    /// validation page rather than a bare 5xx. Once the browser is mid-flow
    /// through the OAuth callback, an opaque status code strands the user.
    pub fn redirects_to_frontend(&self) -> bool {
        match self {
            Self::Provider(_) => true,
            Self::TokenParse(_) => true,
            Self::Validation(_) => true,
            Self::Transport(_) => true,
            Self::Config(_) => false,
            Self::SecretAccess(_) => false,
            Self::Lambda(_) => false,
        }
    }
}

// Implement conversions for common error types
impl From<serde_json::Error> for AuthError {
    fn from(err: serde_json::Error) -> Self {
        Self::TokenParse(err.to_string())
    }
}

impl From<std::env::VarError> for AuthError {
    fn from(err: std::env::VarError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() {
            Self::Transport(err.to_string())
        } else {
            Self::Provider(err.to_string())
        }
    }
}
