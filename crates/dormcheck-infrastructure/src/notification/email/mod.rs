mod message_builder;
mod sender;

use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, Tokio1Executor};
use serde::{Deserialize, Serialize};

use crate::config::TimeoutConfig;
use dormcheck_domain::shared::DomainError;

/// SMTP account used for outgoing result mail. Port 465 is implicit TLS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    /// Filled from the environment
    #[serde(skip_serializing)]
    pub password: String,
    pub from_name: String,
}

impl Default for SmtpSettings {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 465,
            username: String::new(),
            password: String::new(),
            from_name: "DormCheck 系统".to_string(),
        }
    }
}

impl SmtpSettings {
    /// Host and username are both required to send anything
    pub fn is_configured(&self) -> bool {
        !self.host.trim().is_empty() && !self.username.trim().is_empty()
    }
}

/// Sends sign-in results as HTML mail over SMTPS
pub struct EmailSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl EmailSender {
    pub fn new(settings: &SmtpSettings, timeouts: &TimeoutConfig) -> Result<Self, DomainError> {
        if !settings.is_configured() {
            return Err(DomainError::Validation(
                "SMTP host and username are required".to_string(),
            ));
        }

        let address: Address = settings.username.trim().parse().map_err(|e| {
            DomainError::Validation(format!("Invalid SMTP sender address: {}", e))
        })?;
        let from = Mailbox::new(Some(settings.from_name.clone()), address);

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(settings.host.trim())
            .map_err(|e| {
                DomainError::Infrastructure(format!("Failed to create SMTP transport: {}", e))
            })?
            .port(settings.port)
            .credentials(Credentials::new(
                settings.username.trim().to_string(),
                settings.password.clone(),
            ))
            .timeout(Some(timeouts.smtp))
            .build();

        Ok(Self { transport, from })
    }
}
