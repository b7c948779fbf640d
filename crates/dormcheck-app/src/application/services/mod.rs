mod account_locks;
mod notification_dispatcher;
mod session_authenticator;
mod session_service;
mod sign_in_executor;
mod task_service;

pub mod scheduler;

#[cfg(test)]
pub(crate) mod testing;

pub use account_locks::AccountLocks;
pub use notification_dispatcher::NotificationDispatcher;
pub use scheduler::{BackgroundLoops, DailyReset, PollingScheduler, SessionRefresher};
pub use session_authenticator::SessionAuthenticator;
pub use session_service::SessionService;
pub use sign_in_executor::SignInExecutor;
pub use task_service::TaskService;
