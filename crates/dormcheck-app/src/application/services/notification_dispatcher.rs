use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use dormcheck_domain::notification::{NotificationSender, SignResultNotice};

/// Fire-and-forget delivery of sign-in result notices.
///
/// `dispatch` only enqueues. A worker drains the queue with at most
/// `MAX_CONCURRENT_SENDS` deliveries in flight; failures end up in the log.
#[derive(Clone)]
pub struct NotificationDispatcher {
    queue: Option<mpsc::UnboundedSender<SignResultNotice>>,
}

impl NotificationDispatcher {
    pub const MAX_CONCURRENT_SENDS: usize = 4;

    /// Start the delivery worker. It exits once every dispatcher clone is dropped
    /// and the in-flight sends have finished.
    pub fn spawn(sender: Arc<dyn NotificationSender>) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run_worker(rx, sender));
        (Self { queue: Some(tx) }, handle)
    }

    /// Drops every notice. Used when no SMTP account is configured.
    pub fn disabled() -> Self {
        Self { queue: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.queue.is_some()
    }

    pub fn dispatch(&self, notice: SignResultNotice) {
        match &self.queue {
            Some(queue) => {
                if let Err(e) = queue.send(notice) {
                    error!(
                        "Notification worker stopped, dropping notice for {}",
                        e.0.recipient
                    );
                }
            }
            None => debug!(
                "Notifications disabled, dropping notice for {}",
                notice.recipient
            ),
        }
    }
}

async fn run_worker(
    mut rx: mpsc::UnboundedReceiver<SignResultNotice>,
    sender: Arc<dyn NotificationSender>,
) {
    let permits = Arc::new(Semaphore::new(NotificationDispatcher::MAX_CONCURRENT_SENDS));

    while let Some(notice) = rx.recv().await {
        let permit = match Arc::clone(&permits).acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => break,
        };
        let sender = Arc::clone(&sender);

        tokio::spawn(async move {
            let _permit = permit;
            let message = notice.to_message();
            match sender.send(&notice.recipient, &message).await {
                Ok(()) => debug!("Result notice delivered to {}", notice.recipient),
                Err(e) => error!(
                    "Failed to deliver result notice to {}: {}",
                    notice.recipient, e
                ),
            }
        });
    }

    // Wait for in-flight deliveries
    let all = NotificationDispatcher::MAX_CONCURRENT_SENDS as u32;
    let _ = permits.acquire_many(all).await;
    info!("Notification worker stopped");
}
