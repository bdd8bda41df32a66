use chrono::{NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reminder timestamp format, e.g. "2024-06-01 09:30"
pub const REMINDER_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Date-only format used for calendar lookups, e.g. "2024-06-01"
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Errors raised by checked task mutations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TaskError {
    #[error("subtask index {index} out of range for task {task_id} ({len} subtasks)")]
    SubtaskIndexOutOfRange {
        task_id: i64,
        index: usize,
        len: usize,
    },
}

/// A user-created to-do item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique id assigned by the store on first insert (0 = not yet assigned)
    #[serde(default)]
    pub id: i64,
    /// Task label
    pub content: String,
    /// Completion flag
    #[serde(default)]
    pub is_done: bool,
    /// Optional reminder in "YYYY-MM-DD HH:MM" format
    #[serde(default)]
    pub reminder_date: Option<String>,
    /// Subtask labels, insertion order significant
    #[serde(default)]
    pub subtasks: Vec<String>,
    /// Completion flags parallel to `subtasks` by index
    #[serde(default)]
    pub subtask_states: Vec<bool>,
    /// Creation instant in epoch milliseconds, the sole sort key
    #[serde(default)]
    pub timestamp: i64,
}

impl Task {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            id: 0,
            content: content.into(),
            is_done: false,
            reminder_date: None,
            subtasks: Vec::new(),
            subtask_states: Vec::new(),
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    /// Set a reminder timestamp ("YYYY-MM-DD HH:MM")
    pub fn with_reminder(mut self, reminder: impl Into<String>) -> Self {
        self.reminder_date = Some(reminder.into());
        self
    }

    /// Return a copy with the completion flag flipped
    pub fn toggled(&self) -> Self {
        let mut task = self.clone();
        task.is_done = !task.is_done;
        task
    }

    /// Append a subtask, keeping both arrays in lock-step
    pub fn add_subtask(&mut self, content: impl Into<String>) {
        self.subtasks.push(content.into());
        self.subtask_states.push(false);
    }

    /// Set the completion flag of the subtask at `index`
    pub fn set_subtask_state(&mut self, index: usize, done: bool) -> Result<(), TaskError> {
        self.check_subtask_index(index)?;
        self.subtask_states[index] = done;
        Ok(())
    }

    /// Replace the label of the subtask at `index`
    pub fn set_subtask_content(
        &mut self,
        index: usize,
        content: impl Into<String>,
    ) -> Result<(), TaskError> {
        self.check_subtask_index(index)?;
        self.subtasks[index] = content.into();
        Ok(())
    }

    /// Remove the subtask at `index` from both arrays in lock-step
    pub fn remove_subtask(&mut self, index: usize) -> Result<(), TaskError> {
        self.check_subtask_index(index)?;
        self.subtasks.remove(index);
        self.subtask_states.remove(index);
        Ok(())
    }

    fn check_subtask_index(&self, index: usize) -> Result<(), TaskError> {
        if index >= self.subtasks.len() || index >= self.subtask_states.len() {
            return Err(TaskError::SubtaskIndexOutOfRange {
                task_id: self.id,
                index,
                len: self.subtasks.len().min(self.subtask_states.len()),
            });
        }
        Ok(())
    }

    /// Number of completed subtasks
    pub fn subtasks_done(&self) -> usize {
        self.subtask_states.iter().filter(|done| **done).count()
    }

    /// Whether the two subtask arrays have equal length
    pub fn states_in_sync(&self) -> bool {
        self.subtasks.len() == self.subtask_states.len()
    }

    /// Force the state array back into lock-step with the labels.
    /// Extra flags are dropped, missing flags default to false.
    pub fn reconcile_subtask_states(&mut self) {
        self.subtask_states.resize(self.subtasks.len(), false);
    }

    /// Parse the reminder text; None when absent or malformed
    pub fn reminder_datetime(&self) -> Option<NaiveDateTime> {
        let text = self.reminder_date.as_deref()?;
        NaiveDateTime::parse_from_str(text, REMINDER_FORMAT).ok()
    }

    /// The reminder's date portion; None when absent or malformed
    pub fn reminder_day(&self) -> Option<NaiveDate> {
        self.reminder_datetime().map(|dt| dt.date())
    }

    /// Whether the reminder falls on the given "YYYY-MM-DD" day.
    /// Tasks with no reminder, or an unparsable one, never match.
    pub fn is_due_on(&self, date: &str) -> bool {
        match self.reminder_day() {
            Some(day) => day.format(DATE_FORMAT).to_string() == date,
            None => false,
        }
    }
}
