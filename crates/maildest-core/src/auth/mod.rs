/// Authentication domain: mode detection, per-mode flows, token handling,
/// and workspace email validation.
pub mod flow;
pub mod mode;
pub mod tokens;
pub mod validator;
pub mod workspace;

pub use flow::{AuthDeps, AuthFlow, CallbackRequest, InitiateOutcome, flow_for};
pub use mode::{AuthMode, detect_mode};
pub use validator::{EmailValidation, EmailValidator, WorkspaceConfig};
pub use workspace::WorkspaceAuthService;
