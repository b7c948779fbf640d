use chrono::{DateTime, Local};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{Duration, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::application::services::SignInExecutor;
use dormcheck_domain::task::SignTaskRepository;

/// Fixed-period loop that runs every due task once per tick
pub struct PollingScheduler {
    task_repo: Arc<dyn SignTaskRepository>,
    executor: Arc<SignInExecutor>,
    cooldown: chrono::Duration,
    /// Due count seen on the previous tick
    last_due: AtomicUsize,
}

impl PollingScheduler {
    pub fn new(
        task_repo: Arc<dyn SignTaskRepository>,
        executor: Arc<SignInExecutor>,
        cooldown: chrono::Duration,
    ) -> Self {
        Self {
            task_repo,
            executor,
            cooldown,
            last_due: AtomicUsize::new(0),
        }
    }

    /// One tick: execute every due task in store order, one after another.
    /// Returns the number of tasks attempted.
    pub async fn tick_at(&self, now: DateTime<Local>) -> usize {
        let due = match self.task_repo.find_due(now, self.cooldown).await {
            Ok(tasks) => tasks,
            Err(e) => {
                error!("❌ Failed to load due tasks: {}", e);
                return 0;
            }
        };

        let attempted = due.len();
        if self.record_due_count(attempted) {
            info!("Due tasks: {}", attempted);
        }

        for mut task in due {
            if let Err(e) = self.executor.execute(&mut task).await {
                debug!("Task {} attempt ended with: {}", task.id(), e);
            }
        }

        attempted
    }

    /// Stores the count and reports whether it differs from the last tick
    fn record_due_count(&self, count: usize) -> bool {
        self.last_due.swap(count, Ordering::Relaxed) != count
    }

    pub async fn run(self: Arc<Self>, period: Duration, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("✅ Polling scheduler started (every {} seconds)", period.as_secs());

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.tick_at(Local::now()).await;
                }
                _ = shutdown.changed() => {
                    break;
                }
            }
        }

        warn!("Polling scheduler stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::testing::{
        session, FakePlatform, InMemorySessionRepository, InMemoryTaskRepository,
    };
    use crate::application::services::{AccountLocks, NotificationDispatcher};
    use dormcheck_domain::platform::{PlatformError, SignInReply};
    use dormcheck_domain::task::{ExecStatus, GeoLocation, SignTask, SignTime, TaskDetails};
    use dormcheck_domain::{AccountId, OwnerId};

    struct Fixture {
        tasks: Arc<InMemoryTaskRepository>,
        platform: Arc<FakePlatform>,
        scheduler: PollingScheduler,
    }

    async fn fixture() -> Fixture {
        let tasks = Arc::new(InMemoryTaskRepository::new());
        let sessions = Arc::new(InMemorySessionRepository::new());
        sessions.insert(session("2023001")).await;
        sessions.insert(session("2023002")).await;
        let platform = Arc::new(FakePlatform::new());
        let executor = Arc::new(SignInExecutor::new(
            tasks.clone(),
            sessions,
            platform.clone(),
            Arc::new(AccountLocks::new()),
            NotificationDispatcher::disabled(),
        ));
        let scheduler = PollingScheduler::new(tasks.clone(), executor, chrono::Duration::minutes(5));
        Fixture {
            tasks,
            platform,
            scheduler,
        }
    }

    async fn add_task(tasks: &InMemoryTaskRepository, account: &str, activity: &str) -> SignTask {
        let details = TaskDetails {
            display_name: "张三".to_string(),
            activity_name: "晚归签到".to_string(),
            location: GeoLocation::new("忠山校区", 105.443352, 28.91341).unwrap(),
            sign_time: SignTime::new(0, 0).unwrap(),
            max_retry: 2,
            notify_email: None,
        };
        let task = SignTask::new(
            OwnerId::new(1),
            AccountId::new(account).unwrap(),
            activity,
            details,
        )
        .unwrap();
        tasks.save(&task).await.unwrap();
        task
    }

    #[tokio::test]
    async fn test_tick_runs_every_due_task() {
        let fx = fixture().await;
        let a = add_task(&fx.tasks, "2023001", "1").await;
        let b = add_task(&fx.tasks, "2023002", "2").await;

        let attempted = fx.scheduler.tick_at(Local::now()).await;

        assert_eq!(attempted, 2);
        assert_eq!(fx.tasks.get(a.id()).await.unwrap().status(), ExecStatus::Success);
        assert_eq!(fx.tasks.get(b.id()).await.unwrap().status(), ExecStatus::Success);
        assert_eq!(fx.platform.sign_ins().len(), 2);
    }

    #[tokio::test]
    async fn test_one_failure_does_not_stop_the_tick() {
        let fx = fixture().await;
        let a = add_task(&fx.tasks, "2023001", "1").await;
        let b = add_task(&fx.tasks, "2023002", "2").await;
        fx.platform
            .push_sign_in(Err(PlatformError::Transport("Sign-in timed out".to_string())));

        fx.scheduler.tick_at(Local::now()).await;

        let statuses = [
            fx.tasks.get(a.id()).await.unwrap().status(),
            fx.tasks.get(b.id()).await.unwrap().status(),
        ];
        assert!(statuses.contains(&ExecStatus::Failed));
        assert!(statuses.contains(&ExecStatus::Success));
    }

    #[tokio::test]
    async fn test_cooldown_and_retry_ceiling() {
        let fx = fixture().await;
        let task = add_task(&fx.tasks, "2023001", "1").await;
        let failure = || {
            Ok(SignInReply {
                is_ok: false,
                message: "不在签到时间内".to_string(),
            })
        };
        fx.platform.push_sign_in(failure());
        fx.platform.push_sign_in(failure());

        let start = Local::now();
        assert_eq!(fx.scheduler.tick_at(start).await, 1);

        // Inside the cooldown window
        assert_eq!(fx.scheduler.tick_at(start + chrono::Duration::minutes(2)).await, 0);

        // Cooldown elapsed, second and last attempt
        assert_eq!(fx.scheduler.tick_at(start + chrono::Duration::minutes(6)).await, 1);

        // max_retry reached
        assert_eq!(fx.scheduler.tick_at(start + chrono::Duration::minutes(20)).await, 0);

        let stored = fx.tasks.get(task.id()).await.unwrap();
        assert_eq!(stored.retry_count(), 2);
        assert_eq!(stored.last_error(), "不在签到时间内");
    }

    #[tokio::test]
    async fn test_succeeded_task_not_selected_again() {
        let fx = fixture().await;
        add_task(&fx.tasks, "2023001", "1").await;
        let now = Local::now();

        assert_eq!(fx.scheduler.tick_at(now).await, 1);
        assert_eq!(fx.scheduler.tick_at(now + chrono::Duration::minutes(10)).await, 0);
        assert_eq!(fx.platform.sign_ins().len(), 1);
    }

    #[tokio::test]
    async fn test_due_count_reported_only_on_change() {
        let fx = fixture().await;

        // An idle first tick is not a change
        assert!(!fx.scheduler.record_due_count(0));
        assert!(fx.scheduler.record_due_count(2));
        assert!(!fx.scheduler.record_due_count(2));
        assert!(fx.scheduler.record_due_count(0));
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let fx = fixture().await;
        let scheduler = Arc::new(fx.scheduler);
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(scheduler.run(Duration::from_secs(3600), rx));
        tx.send(true).unwrap();

        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("loop did not stop")
            .unwrap();
    }
}
