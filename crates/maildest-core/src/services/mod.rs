/// Service clients for external collaborators
pub mod cognito;
pub mod oauth;
pub mod secrets;

pub use cognito::{CognitoGateway, CognitoIdpGateway, RefreshedSession, UserLookup};
pub use oauth::{TokenExchanger, TokenSet};
pub use secrets::{SecretStore, SecretsManagerStore};
