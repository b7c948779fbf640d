use std::sync::Arc;
use tracing::{error, info};

use dormcheck_domain::task::SignTaskRepository;
use dormcheck_domain::DomainError;

/// Daily bulk reset that makes every task eligible for its next trigger
pub struct DailyReset {
    task_repo: Arc<dyn SignTaskRepository>,
}

impl DailyReset {
    pub fn new(task_repo: Arc<dyn SignTaskRepository>) -> Self {
        Self { task_repo }
    }

    pub async fn run_once(&self) -> Result<u64, DomainError> {
        match self.task_repo.reset_all().await {
            Ok(count) => {
                info!("[DAILY RESET] Reset {} task(s)", count);
                Ok(count)
            }
            Err(e) => {
                error!("❌ [DAILY RESET] Failed: {}", e);
                Err(e)
            }
        }
    }
}
