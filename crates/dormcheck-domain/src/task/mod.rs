mod aggregate;
mod repository;
mod value_objects;


pub use aggregate::{ExecutionState, SignTask, TaskDetails};
pub use repository::SignTaskRepository;
pub use value_objects::{ExecStatus, GeoLocation, SignTime};
