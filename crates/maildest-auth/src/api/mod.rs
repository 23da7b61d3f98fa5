/// Endpoint handlers for the auth Lambda
pub mod callback;
pub mod health;
pub mod login;
pub mod session;
pub mod workspace;
