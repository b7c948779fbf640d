use chrono::{DateTime, Local, TimeZone};
use std::future::Future;
use tokio::sync::watch;
use tokio::time::Duration;
use tracing::{error, info, warn};

use dormcheck_domain::task::SignTime;

/// How many calendar days ahead to look before giving up on a wall-clock time
const MAX_DAYS_AHEAD: u64 = 3;

/// Next instant strictly after `now` at which the local clock reads `at`.
///
/// A day on which `at` falls into a DST gap is skipped. On a repeated hour
/// the earlier of the two instants is used.
pub fn next_daily_run<Tz: TimeZone>(now: &DateTime<Tz>, at: SignTime) -> Option<DateTime<Tz>> {
    let today = now.date_naive();

    for offset in 0..MAX_DAYS_AHEAD {
        let date = today.checked_add_days(chrono::Days::new(offset))?;
        let naive = at.on(date);

        match naive.and_local_timezone(now.timezone()).earliest() {
            Some(next) if next > *now => return Some(next),
            Some(_) => continue,
            None => {
                warn!("⚠️  {} does not exist on {} (DST gap), skipping that day", at, date);
            }
        }
    }

    None
}

/// Sleep until `at` local time, run `job`, repeat. Returns on shutdown.
pub(super) async fn run_daily<F, Fut>(
    name: &'static str,
    at: SignTime,
    mut shutdown: watch::Receiver<bool>,
    mut job: F,
) where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    loop {
        let now = Local::now();
        let Some(next_run) = next_daily_run(&now, at) else {
            error!("❌ Failed to calculate next {} time for {}. Loop will exit.", name, at);
            return;
        };

        let wait = (next_run - now).to_std().unwrap_or(Duration::from_secs(60));
        info!(
            "Next {}: {} (in {} seconds)",
            name,
            next_run.format("%Y-%m-%d %H:%M:%S"),
            wait.as_secs()
        );

        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = shutdown.changed() => {
                info!("{} loop stopped", name);
                return;
            }
        }

        job().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, NaiveDate, Utc};

    fn time(h: u32, m: u32) -> SignTime {
        SignTime::new(h, m).unwrap()
    }

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn test_later_today() {
        let now = utc(2025, 3, 10, 12, 0, 0);

        let next = next_daily_run(&now, time(18, 0)).unwrap();

        assert_eq!(next, utc(2025, 3, 10, 18, 0, 0));
    }

    #[test]
    fn test_already_passed_rolls_to_tomorrow() {
        let now = utc(2025, 3, 10, 0, 3, 0);

        let next = next_daily_run(&now, time(0, 3)).unwrap();

        assert_eq!(next, utc(2025, 3, 11, 0, 3, 0));
    }

    #[test]
    fn test_month_boundary() {
        let now = utc(2025, 2, 28, 23, 59, 30);

        let next = next_daily_run(&now, time(0, 3)).unwrap();

        assert_eq!(next.date_naive(), NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
    }

    #[test]
    fn test_fixed_offset_uses_local_wall_clock() {
        let shanghai = FixedOffset::east_opt(8 * 3600).unwrap();
        let now = shanghai.with_ymd_and_hms(2025, 3, 10, 17, 59, 0).unwrap();

        let next = next_daily_run(&now, time(18, 0)).unwrap();

        assert_eq!(next.to_rfc3339(), "2025-03-10T18:00:00+08:00");
        assert_eq!(next - now, chrono::Duration::minutes(1));
    }
}
