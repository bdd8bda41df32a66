use crate::domain::Task;

/// Aggregate statistics over the task list
#[derive(Debug, PartialEq)]
pub struct TaskStats {
    pub total: usize,
    pub done: usize,
    pub pending: usize,
    pub completion_percent: f64,
    pub subtasks_total: usize,
    pub subtasks_done: usize,
    pub with_reminder: usize,
}

/// Calculate statistics across the whole task list
pub fn calculate_stats(tasks: &[Task]) -> TaskStats {
    let total = tasks.len();
    let done = tasks.iter().filter(|t| t.is_done).count();
    let pending = total - done;

    let completion_percent = if total > 0 {
        (done as f64 / total as f64) * 100.0
    } else {
        0.0
    };

    let subtasks_total = tasks.iter().map(|t| t.subtasks.len()).sum();
    let subtasks_done = tasks.iter().map(|t| t.subtasks_done()).sum();
    let with_reminder = tasks.iter().filter(|t| t.reminder_date.is_some()).count();

    TaskStats {
        total,
        done,
        pending,
        completion_percent,
        subtasks_total,
        subtasks_done,
        with_reminder,
    }
}

/// Completed tasks, in view order
pub fn done_tasks(tasks: &[Task]) -> Vec<&Task> {
    tasks.iter().filter(|t| t.is_done).collect()
}

/// Unfinished tasks, in view order
pub fn pending_tasks(tasks: &[Task]) -> Vec<&Task> {
    tasks.iter().filter(|t| !t.is_done).collect()
}
