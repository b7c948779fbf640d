use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::application::config::AppConfig;
use crate::application::services::{
    DailyReset, NotificationDispatcher, PollingScheduler, SessionRefresher,
    SessionService, SignInExecutor, TaskService,
};
use dormcheck_domain::session::SessionRepository;
use dormcheck_domain::task::SignTaskRepository;
use dormcheck_infrastructure::persistence::Database;

pub struct Runtime {
    pub config: AppConfig,
    pub db: Arc<Database>,
}

pub struct Repositories {
    pub task: Arc<dyn SignTaskRepository>,
    pub session: Arc<dyn SessionRepository>,
}

pub struct Services {
    pub tasks: Arc<TaskService>,
    pub sessions: Arc<SessionService>,
    pub executor: Arc<SignInExecutor>,
    pub notifications: NotificationDispatcher,
}

/// The three background jobs, built but not yet running
pub struct Loops {
    pub polling: Arc<PollingScheduler>,
    pub refresher: Arc<SessionRefresher>,
    pub reset: Arc<DailyReset>,
}

pub struct AppState {
    pub runtime: Runtime,
    pub repositories: Repositories,
    pub services: Services,
    pub loops: Loops,
    /// Present when SMTP is configured; finishes after every dispatcher is dropped
    pub notification_worker: Option<JoinHandle<()>>,
}
