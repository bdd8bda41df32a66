pub mod task;

pub use task::{Task, TaskError, DATE_FORMAT, REMINDER_FORMAT};
