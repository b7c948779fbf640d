use crate::shared::DomainError;

/// Failures talking to the attendance platform or the captcha service
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlatformError {
    /// Network, timeout, or non-success HTTP status
    #[error("Transport error: {0}")]
    Transport(String),

    /// Response body did not have the expected shape
    #[error("Malformed response: {0}")]
    Protocol(String),

    /// Login rejected because the captcha guess was wrong
    #[error("Captcha mismatch: {0}")]
    CaptchaMismatch(String),

    /// The captcha solver returned nothing usable
    #[error("Captcha could not be recognized: {0}")]
    CaptchaUnreadable(String),

    /// Platform reported a failure through a normal response; message is verbatim
    #[error("{0}")]
    Rejected(String),

    #[error("Captcha response is missing the Vlis and VK_ cookies")]
    MissingCorrelationCookies,

    #[error("no valid session cookie")]
    MissingSessionCookie,

    #[error("Credential encryption failed: {0}")]
    Encryption(String),
}

impl PlatformError {
    /// Only a captcha mismatch is worth another login attempt
    pub fn is_retryable(&self) -> bool {
        matches!(self, PlatformError::CaptchaMismatch(_))
    }

    /// Classify a failed login message. The platform mentions the
    /// captcha either by its Chinese name or by the form field name.
    pub fn from_login_message(message: &str) -> Self {
        if message.contains("验证码") || message.contains("ValCode") {
            PlatformError::CaptchaMismatch(message.to_string())
        } else {
            PlatformError::Rejected(message.to_string())
        }
    }
}

impl From<PlatformError> for DomainError {
    fn from(err: PlatformError) -> Self {
        match err {
            PlatformError::Transport(msg) => DomainError::Infrastructure(msg),
            PlatformError::Rejected(msg) => DomainError::InvalidCredentials(msg),
            PlatformError::Encryption(msg) => DomainError::Encryption(msg),
            other => DomainError::Infrastructure(other.to_string()),
        }
    }
}
