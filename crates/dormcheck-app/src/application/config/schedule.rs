use serde::{Deserialize, Serialize};
use std::time::Duration;

use dormcheck_domain::task::SignTime;

/// Upper bounds for configured intervals
const MAX_RETRY_COOLDOWN_MINUTES: i64 = 24 * 60;
const MAX_POLL_INTERVAL_SECS: u64 = 24 * 60 * 60;

/// Timing of the three background loops. Wall-clock times are server local time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub poll_interval_secs: u64,
    pub retry_cooldown_minutes: i64,
    pub session_refresh_at: SignTime,
    pub daily_reset_at: SignTime,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 60,
            retry_cooldown_minutes: 5,
            session_refresh_at: SignTime::new(18, 0).unwrap_or_default(),
            daily_reset_at: SignTime::new(0, 3).unwrap_or_default(),
        }
    }
}

impl ScheduleConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.clamp(1, MAX_POLL_INTERVAL_SECS))
    }

    pub fn retry_cooldown(&self) -> chrono::Duration {
        let minutes = self.retry_cooldown_minutes.clamp(0, MAX_RETRY_COOLDOWN_MINUTES);
        chrono::Duration::try_minutes(minutes).unwrap_or_else(chrono::Duration::zero)
    }
}
