use crate::domain::Task;
use crate::persistence::{decode_tasks, encode_tasks};
use crate::store::{Snapshot, TaskFeed, TaskStore};
use anyhow::Result;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// Messages shown once when a task is completed
const MOTIVATION_MESSAGES: &[&str] = &[
    "Nice work! Keep the momentum going 💪",
    "One more thing done - that's a win ✨",
    "Another task checked off. On a roll! 🔥",
];

/// Pick a message off the wall clock's nanoseconds
fn pick_message() -> &'static str {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    MOTIVATION_MESSAGES[nanos as usize % MOTIVATION_MESSAGES.len()]
}

/// Single-slot mailbox for the one-shot motivation message.
/// Setting overwrites any unread message; taking clears the slot,
/// so a message is delivered at most once.
#[derive(Default)]
struct MotivationSlot {
    slot: Mutex<Option<String>>,
}

impl MotivationSlot {
    fn set(&self, message: String) {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = Some(message);
        }
    }

    fn take(&self) -> Option<String> {
        self.slot.lock().ok()?.take()
    }

    fn clear(&self) {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = None;
        }
    }
}

/// The single mediator between the outer surface and the task store.
///
/// Owns the live task view, the one-shot motivation slot, and the
/// in-memory focus counter. Never holds a record as the source of truth:
/// every mutation re-fetches the stored record first.
pub struct App {
    store: TaskStore,
    feed: TaskFeed,
    motivation: MotivationSlot,
    focus_count: u32,
}

impl App {
    pub fn new(store: TaskStore) -> Result<Self> {
        let feed = store.subscribe()?;
        Ok(Self {
            store,
            feed,
            motivation: MotivationSlot::default(),
            focus_count: 0,
        })
    }

    /// The latest committed task list, newest first
    pub fn tasks(&self) -> Snapshot {
        self.feed.latest()
    }

    /// Drain pending view publications; newest wins
    pub fn poll_tasks(&self) -> Option<Snapshot> {
        self.feed.poll()
    }

    /// Add a task; returns the store-assigned id
    pub fn add_task(&self, task: Task) -> Result<i64> {
        self.store.upsert(task)
    }

    pub fn delete_task(&self, task: &Task) -> Result<()> {
        self.store.delete(task)
    }

    pub fn clear_all_tasks(&self) -> Result<()> {
        self.store.delete_all()
    }

    /// Point lookup by id
    pub fn get_task(&self, id: i64) -> Result<Option<Task>> {
        self.store.get_by_id(id)
    }

    /// Flip a task's completion flag and persist the full record.
    /// Completing a task (false to true) leaves one motivation message
    /// in the slot; un-completing produces none.
    pub fn toggle_task_done(&self, task: &Task) -> Result<Task> {
        // Prefer the stored record over the caller's possibly stale copy
        let current = self
            .store
            .get_by_id(task.id)?
            .unwrap_or_else(|| task.clone());
        let updated = current.toggled();
        self.store.upsert(updated.clone())?;

        if updated.is_done {
            self.motivation.set(pick_message().to_string());
        }
        Ok(updated)
    }

    /// Take the pending motivation message, clearing the slot
    pub fn take_motivation(&self) -> Option<String> {
        self.motivation.take()
    }

    /// Drop any pending motivation message without reading it
    pub fn clear_motivation(&self) {
        self.motivation.clear();
    }

    /// Tasks whose reminder falls on the given "YYYY-MM-DD" day.
    /// Pure in-memory filter over the latest snapshot; tasks with no
    /// reminder or an unparsable one are excluded.
    pub fn get_tasks_by_date(&self, date: &str) -> Vec<Task> {
        self.feed
            .latest()
            .iter()
            .filter(|task| task.is_due_on(date))
            .cloned()
            .collect()
    }

    /// Set the completion flag of one subtask. Unknown task ids are a
    /// silent no-op; an out-of-range index is an error.
    pub fn update_subtask_state(&self, task_id: i64, index: usize, done: bool) -> Result<()> {
        let Some(mut task) = self.store.get_by_id(task_id)? else {
            return Ok(());
        };
        task.set_subtask_state(index, done)?;
        self.store.update(task)
    }

    /// Replace the label of one subtask; same failure semantics as
    /// `update_subtask_state`
    pub fn update_subtask_content(&self, task_id: i64, index: usize, content: &str) -> Result<()> {
        let Some(mut task) = self.store.get_by_id(task_id)? else {
            return Ok(());
        };
        task.set_subtask_content(index, content)?;
        self.store.update(task)
    }

    /// Remove one subtask from both parallel arrays in lock-step
    pub fn remove_subtask(&self, task_id: i64, index: usize) -> Result<()> {
        let Some(mut task) = self.store.get_by_id(task_id)? else {
            return Ok(());
        };
        task.remove_subtask(index)?;
        self.store.update(task)
    }

    /// Completed focus sessions this run; never persisted
    pub fn focus_count(&self) -> u32 {
        self.focus_count
    }

    pub fn record_focus(&mut self) {
        self.focus_count += 1;
    }

    pub fn reset_focus_count(&mut self) {
        self.focus_count = 0;
    }

    /// Serialize the current task list to the interchange format
    pub fn export_tasks(&self) -> Result<String> {
        encode_tasks(&self.tasks())
    }

    /// Replace the store contents with the given interchange data.
    /// Returns the number of imported tasks.
    pub fn import_tasks(&self, data: &str) -> Result<usize> {
        let tasks = decode_tasks(data)?;
        self.store.delete_all()?;
        let count = tasks.len();
        for task in tasks {
            self.store.upsert(task)?;
        }
        Ok(count)
    }
}
