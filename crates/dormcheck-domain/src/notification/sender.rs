use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::shared::DomainError;

/// Notification message to be sent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationMessage {
    /// Message title
    pub title: String,
    /// Plain-text body, one paragraph per line
    pub content: String,
    /// Optional link URL
    pub link: Option<String>,
}

impl NotificationMessage {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            link: None,
        }
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }
}

/// Delivers a message to one recipient address
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, recipient: &str, message: &NotificationMessage) -> Result<(), DomainError>;
}
