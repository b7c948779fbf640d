use crate::platform::PlatformError;
use crate::shared::DomainError;

/// Outcome of a failed sign-in attempt
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignInError {
    #[error("No stored session for account {0}")]
    SessionNotFound(String),

    #[error("Session for account {0} has no cookies, log in again")]
    EmptyCookies(String),

    /// Transport or malformed response while submitting
    #[error(transparent)]
    Platform(#[from] PlatformError),

    /// Platform refused the sign-in; message is verbatim
    #[error("{0}")]
    Rejected(String),

    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl SignInError {
    /// Missing or empty session: re-authenticate rather than resubmit
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            SignInError::SessionNotFound(_) | SignInError::EmptyCookies(_)
        )
    }
}

impl From<DomainError> for SignInError {
    fn from(err: DomainError) -> Self {
        SignInError::Persistence(err.to_string())
    }
}
