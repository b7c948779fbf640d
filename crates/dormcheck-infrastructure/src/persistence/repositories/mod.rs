pub mod session_repo;
pub mod task_repo;

pub use session_repo::SqliteSessionRepository;
pub use task_repo::SqliteSignTaskRepository;
