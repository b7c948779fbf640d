use chrono::{Local, Utc};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use super::{AccountLocks, NotificationDispatcher};
use dormcheck_domain::check_in::{SignInDomainService, SignInError};
use dormcheck_domain::notification::SignResultNotice;
use dormcheck_domain::platform::{PlatformClient, SignInForm};
use dormcheck_domain::session::SessionRepository;
use dormcheck_domain::task::{ExecStatus, SignTask, SignTaskRepository};

/// Submits one task's sign-in and records the outcome on the task
pub struct SignInExecutor {
    task_repo: Arc<dyn SignTaskRepository>,
    session_repo: Arc<dyn SessionRepository>,
    platform: Arc<dyn PlatformClient>,
    locks: Arc<AccountLocks>,
    notifier: NotificationDispatcher,
}

impl SignInExecutor {
    pub fn new(
        task_repo: Arc<dyn SignTaskRepository>,
        session_repo: Arc<dyn SessionRepository>,
        platform: Arc<dyn PlatformClient>,
        locks: Arc<AccountLocks>,
        notifier: NotificationDispatcher,
    ) -> Self {
        Self {
            task_repo,
            session_repo,
            platform,
            locks,
            notifier,
        }
    }

    /// Run one attempt. Whatever the outcome, the retry count goes up,
    /// `executed_at` is stamped and the task is persisted before returning.
    #[instrument(skip(self, task), fields(account_id = %task.account_id(), activity_id = %task.activity_id()))]
    pub async fn execute(&self, task: &mut SignTask) -> Result<(), SignInError> {
        let outcome = {
            let _guard = self.locks.lock(task.account_id()).await;
            self.submit(task).await
        };

        let now = Utc::now();
        match &outcome {
            Ok(()) => {
                task.record_success(now);
                info!("Sign-in succeeded for activity {}", task.activity_name());
            }
            Err(e) => {
                task.record_failure(now, e.to_string());
                if e.is_precondition() {
                    warn!("Sign-in skipped, account needs to log in again: {}", e);
                } else {
                    warn!("Sign-in failed: {}", e);
                }
            }
        }

        let persisted = self.task_repo.update_execution(task).await;
        if let Err(e) = &persisted {
            error!("Failed to persist task {} execution state: {}", task.id(), e);
        }

        self.notify(task);

        match (outcome, persisted) {
            (Err(e), _) => Err(e),
            (Ok(()), Err(e)) => Err(e.into()),
            (Ok(()), Ok(())) => Ok(()),
        }
    }

    async fn submit(&self, task: &SignTask) -> Result<(), SignInError> {
        let session = self
            .session_repo
            .find_by_account_id(task.account_id())
            .await?;
        let session = SignInDomainService::require_usable_session(task.account_id(), session)?;

        let form = SignInForm {
            activity_id: task.activity_id().to_string(),
            location: task.location().clone(),
        };
        let reply = self.platform.submit_sign_in(session.cookies(), &form).await?;
        debug!("Platform replied isok={} msg={}", reply.is_ok, reply.message);

        SignInDomainService::classify(&reply)
    }

    fn notify(&self, task: &SignTask) {
        let Some(recipient) = task.notify_email() else {
            return;
        };

        let display_name = if task.display_name().is_empty() {
            task.account_id().to_string()
        } else {
            task.display_name().to_string()
        };

        self.notifier.dispatch(SignResultNotice {
            recipient: recipient.to_string(),
            display_name,
            activity_name: task.activity_name().to_string(),
            success: task.status() == ExecStatus::Success,
            error: task.last_error().to_string(),
            sent_at: Local::now(),
        });
    }
}
