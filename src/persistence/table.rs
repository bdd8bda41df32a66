use crate::domain::Task;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

fn first_id() -> i64 {
    1
}

/// On-disk task table stored in tasks.json: the records plus the id counter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskTable {
    #[serde(default = "first_id")]
    pub next_id: i64,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl Default for TaskTable {
    fn default() -> Self {
        Self {
            next_id: first_id(),
            tasks: Vec::new(),
        }
    }
}

impl TaskTable {
    /// Repair invariants after loading: subtask arrays back in lock-step,
    /// id counter past every assigned id.
    pub fn reconcile(&mut self) {
        for task in &mut self.tasks {
            task.reconcile_subtask_states();
        }
        let max_id = self.tasks.iter().map(|t| t.id).max().unwrap_or(0);
        if self.next_id <= max_id {
            self.next_id = max_id + 1;
        }
    }
}

/// Load the task table; a missing file yields an empty table
pub fn load_table<P: AsRef<Path>>(path: P) -> Result<TaskTable> {
    let path = path.as_ref();

    if !path.exists() {
        return Ok(TaskTable::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read task table: {}", path.display()))?;
    let mut table: TaskTable = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse task table: {}", path.display()))?;
    table.reconcile();
    Ok(table)
}

/// Save the task table atomically as pretty-printed JSON
pub fn save_table<P: AsRef<Path>>(path: P, table: &TaskTable) -> Result<()> {
    let json = serde_json::to_string_pretty(table).context("Failed to encode task table")?;
    crate::persistence::atomic_write(path, &json)?;
    Ok(())
}
