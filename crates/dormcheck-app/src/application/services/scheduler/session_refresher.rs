use std::sync::Arc;
use tracing::{error, info, warn};

use crate::application::services::SessionService;
use dormcheck_domain::session::SessionRepository;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RefreshSummary {
    pub refreshed: usize,
    pub failed: usize,
}

/// Daily re-login of every stored session with its saved secret
pub struct SessionRefresher {
    session_repo: Arc<dyn SessionRepository>,
    sessions: Arc<SessionService>,
}

impl SessionRefresher {
    pub fn new(session_repo: Arc<dyn SessionRepository>, sessions: Arc<SessionService>) -> Self {
        Self {
            session_repo,
            sessions,
        }
    }

    /// One pass over all sessions. A failing account keeps its old cookies
    /// and is not retried until the next cycle.
    pub async fn run_cycle(&self) -> RefreshSummary {
        let accounts = match self.session_repo.find_all().await {
            Ok(sessions) => sessions
                .into_iter()
                .map(|s| s.account_id().clone())
                .collect::<Vec<_>>(),
            Err(e) => {
                error!("❌ [SESSION REFRESH] Failed to load sessions: {}", e);
                return RefreshSummary::default();
            }
        };

        info!("[SESSION REFRESH] Refreshing {} session(s)", accounts.len());

        let mut summary = RefreshSummary::default();
        for account_id in &accounts {
            match self.sessions.refresh(account_id).await {
                Ok(()) => {
                    info!("✅ [SESSION REFRESH] {} refreshed", account_id);
                    summary.refreshed += 1;
                }
                Err(e) => {
                    warn!("❌ [SESSION REFRESH] {} failed: {}", account_id, e);
                    summary.failed += 1;
                }
            }
        }

        info!(
            "[SESSION REFRESH] Done: {} refreshed, {} failed",
            summary.refreshed, summary.failed
        );
        summary
    }
}
