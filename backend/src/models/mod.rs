pub mod task;

pub use task::{NewTaskRequest, Quadrant, Task, TaskStatus};
