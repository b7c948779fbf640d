//! Background loops: the per-minute sign-in poll, the daily session
//! refresh and the daily reset. Each runs as its own tokio task and stops
//! at its next wait point once shutdown is signalled.

mod daily_reset;
mod polling;
mod session_refresher;
mod wall_clock;

pub use daily_reset::DailyReset;
pub use polling::PollingScheduler;
pub use session_refresher::{RefreshSummary, SessionRefresher};
pub use wall_clock::next_daily_run;

use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::application::config::ScheduleConfig;

pub struct BackgroundLoops {
    shutdown: watch::Sender<bool>,
    handles: Vec<(&'static str, JoinHandle<()>)>,
}

impl BackgroundLoops {
    pub fn start(
        schedule: &ScheduleConfig,
        polling: Arc<PollingScheduler>,
        refresher: Arc<SessionRefresher>,
        reset: Arc<DailyReset>,
    ) -> Self {
        let (shutdown, rx) = watch::channel(false);
        let mut handles = Vec::with_capacity(3);

        handles.push((
            "polling",
            tokio::spawn(polling.run(schedule.poll_interval(), rx.clone())),
        ));

        handles.push((
            "session refresh",
            tokio::spawn(wall_clock::run_daily(
                "session refresh",
                schedule.session_refresh_at,
                rx.clone(),
                move || {
                    let refresher = refresher.clone();
                    async move {
                        refresher.run_cycle().await;
                    }
                },
            )),
        ));

        handles.push((
            "daily reset",
            tokio::spawn(wall_clock::run_daily(
                "daily reset",
                schedule.daily_reset_at,
                rx,
                move || {
                    let reset = reset.clone();
                    async move {
                        // Already logged inside
                        let _ = reset.run_once().await;
                    }
                },
            )),
        ));

        info!(
            "✅ Background loops started (refresh at {}, reset at {})",
            schedule.session_refresh_at, schedule.daily_reset_at
        );

        Self { shutdown, handles }
    }

    /// Signal every loop and wait for the in-flight tick or cycle to finish
    pub async fn shutdown(self) {
        info!("Stopping background loops");
        if self.shutdown.send(true).is_err() {
            warn!("All background loops had already exited");
        }

        let (names, handles): (Vec<_>, Vec<_>) = self.handles.into_iter().unzip();
        for (name, result) in names.into_iter().zip(join_all(handles).await) {
            if let Err(e) = result {
                warn!("{} loop ended abnormally: {}", name, e);
            }
        }
    }
}
