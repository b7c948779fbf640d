mod session_dto;
mod task_dto;

pub use session_dto::SessionDto;
pub use task_dto::{SaveTaskInput, TaskDto};
