use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::{AsyncTransport, Message};
use tracing::info;

use super::message_builder::build_html_body;
use dormcheck_domain::notification::{NotificationMessage, NotificationSender};
use dormcheck_domain::shared::DomainError;

impl super::EmailSender {
    fn build_email(&self, recipient: &str, message: &NotificationMessage) -> Result<Message, DomainError> {
        let to: Mailbox = recipient.trim().parse().map_err(|e| {
            DomainError::Validation(format!("Invalid recipient address '{}': {}", recipient, e))
        })?;

        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(message.title.as_str())
            .header(ContentType::TEXT_HTML)
            .body(build_html_body(message))
            .map_err(|e| DomainError::Infrastructure(format!("Failed to build email: {}", e)))
    }
}

#[async_trait]
impl NotificationSender for super::EmailSender {
    async fn send(&self, recipient: &str, message: &NotificationMessage) -> Result<(), DomainError> {
        let email = self.build_email(recipient, message)?;

        self.transport.send(email).await.map_err(|e| {
            DomainError::Infrastructure(format!("Failed to send email to {}: {}", recipient, e))
        })?;

        info!("Notification email sent to {}", recipient);
        Ok(())
    }
}
