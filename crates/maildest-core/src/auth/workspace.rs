/// Workspace authentication service
///
/// Wraps the email validator with masked logging so handler code can check
/// access in one call without ever logging a raw address.
use crate::auth::validator::{EmailValidation, EmailValidator, WorkspaceConfig};
use crate::config::AuthConfig;
use crate::services::secrets::SecretStore;
use crate::utils::logging::mask_email;
use tracing::info;

pub struct WorkspaceAuthService {
    validator: EmailValidator,
}

impl WorkspaceAuthService {
    /// Loads the allow-list configuration and builds the service. Logged
    /// once at construction so a warm Lambda's config is visible in traces.
    pub async fn load(secrets: &dyn SecretStore, config: &AuthConfig) -> Self {
        let workspace_config = WorkspaceConfig::load(secrets, config).await;
        let service = Self {
            validator: EmailValidator::new(workspace_config),
        };
        info!(
            summary = %service.configuration_info(),
            "WorkspaceAuthService initialized"
        );
        service
    }

    pub fn with_validator(validator: EmailValidator) -> Self {
        Self { validator }
    }

    /// Checks whether an authenticated email may access the system.
    pub fn validate_user_access(&self, email: &str) -> EmailValidation {
        let masked = mask_email(email);
        info!(email = %masked, "Validating user access");

        let result = self.validator.validate(email);
        if result.is_valid {
            info!(email = %masked, message = %result.message, "Email validation passed");
        } else {
            info!(email = %masked, message = %result.message, "Email validation failed");
        }
        result
    }

    pub fn has_email_restrictions(&self) -> bool {
        self.validator.has_restrictions()
    }

    pub fn configuration_info(&self) -> String {
        self.validator.configuration_summary()
    }
}
