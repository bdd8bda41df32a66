use crate::domain::Task;
use anyhow::{Context, Result};

/// Encode a task list as the JSON interchange format, preserving order
pub fn encode_tasks(tasks: &[Task]) -> Result<String> {
    serde_json::to_string_pretty(tasks).context("Failed to encode task list")
}

/// Parse a task list from the JSON interchange format
pub fn decode_tasks(data: &str) -> Result<Vec<Task>> {
    let mut tasks: Vec<Task> =
        serde_json::from_str(data).context("Failed to parse task list")?;
    for task in &mut tasks {
        task.reconcile_subtask_states();
    }
    Ok(tasks)
}
