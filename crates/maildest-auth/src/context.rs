/// Auth Context - shared state for the auth Lambda handlers
use lambda_http::Error;
use maildest_core::auth::{AuthDeps, WorkspaceAuthService};
use maildest_core::config::AuthConfig;
use maildest_core::services::cognito::{CognitoGateway, CognitoIdpGateway};
use maildest_core::services::secrets::{SecretStore, SecretsManagerStore};
use std::sync::Arc;

/// Auth Context contains the configuration and service clients shared by
/// all endpoint handlers. Built once per process; there is no ambient
/// global client state anywhere else.
#[derive(Clone)]
pub struct AuthContext {
    /// Dependencies injected into the per-mode auth flows
    pub deps: AuthDeps,
}

impl AuthContext {
    /// Create a new auth context
    pub async fn new() -> Result<Arc<Self>, Error> {
        // Load AWS config and service clients
        let aws_config = aws_config::load_from_env().await;
        let secrets_client = aws_sdk_secretsmanager::Client::new(&aws_config);
        let cognito_client = aws_sdk_cognitoidentityprovider::Client::new(&aws_config);

        let config = Arc::new(AuthConfig::from_env());
        let secrets: Arc<dyn SecretStore> = Arc::new(SecretsManagerStore::new(secrets_client));
        let cognito: Arc<dyn CognitoGateway> = Arc::new(CognitoIdpGateway::new(
            cognito_client,
            Arc::clone(&config),
            Arc::clone(&secrets),
        ));

        // Allow-lists load once per warm execution context
        let workspace = Arc::new(WorkspaceAuthService::load(secrets.as_ref(), &config).await);

        Ok(Arc::new(Self {
            deps: AuthDeps {
                config,
                secrets,
                cognito,
                workspace,
            },
        }))
    }

    /// Build a context around externally constructed dependencies (tests).
    pub fn with_deps(deps: AuthDeps) -> Arc<Self> {
        Arc::new(Self { deps })
    }
}
