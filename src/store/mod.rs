use crate::domain::Task;
use crate::persistence::{load_table, save_table, TaskTable};
use anyhow::{anyhow, Result};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, RwLock};
use std::thread::{self, JoinHandle};

/// A full, ordered view of the task table (timestamp descending)
pub type Snapshot = Arc<Vec<Task>>;

/// Commands processed by the store worker, strictly in arrival order
enum Command {
    Upsert(Task, Sender<Result<i64>>),
    Update(Task, Sender<Result<()>>),
    Delete(i64, Sender<Result<()>>),
    DeleteAll(Sender<Result<()>>),
    GetById(i64, Sender<Option<Task>>),
    Subscribe(Sender<Receiver<Snapshot>>),
    Shutdown,
}

/// A live subscription to the task table.
///
/// Every committed mutation pushes the full re-sorted snapshot; `poll`
/// drains whatever is pending and keeps only the newest, and `latest`
/// always returns the current committed state, so a subscriber that was
/// away resumes from where the table is now rather than replaying history.
pub struct TaskFeed {
    rx: Receiver<Snapshot>,
    latest: Arc<RwLock<Snapshot>>,
}

impl TaskFeed {
    /// The latest committed snapshot
    pub fn latest(&self) -> Snapshot {
        match self.latest.read() {
            Ok(guard) => guard.clone(),
            Err(_) => Arc::new(Vec::new()),
        }
    }

    /// Non-blocking poll for pending publications; newest wins
    pub fn poll(&self) -> Option<Snapshot> {
        let mut newest = None;
        while let Ok(snapshot) = self.rx.try_recv() {
            newest = Some(snapshot);
        }
        newest
    }
}

/// Durable keyed storage of Task records with a live ordered view.
///
/// All mutations are funneled through a single background worker thread
/// and applied in arrival order; each call blocks until its mutation is
/// committed (applied, persisted, and published). The store owns the
/// records - callers only ever hold point-in-time copies.
pub struct TaskStore {
    tx: Sender<Command>,
    latest: Arc<RwLock<Snapshot>>,
    worker: Option<JoinHandle<()>>,
}

impl TaskStore {
    /// Open the store backed by the given tasks.json path and start its worker
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let table = load_table(&path)?;

        let latest = Arc::new(RwLock::new(sorted_snapshot(&table.tasks)));
        let (tx, rx) = mpsc::channel();

        let worker_latest = latest.clone();
        let worker = thread::spawn(move || {
            Worker {
                path,
                table,
                subscribers: Vec::new(),
                latest: worker_latest,
            }
            .run(rx);
        });

        Ok(Self {
            tx,
            latest,
            worker: Some(worker),
        })
    }

    /// Insert-or-replace. An id of 0 gets a fresh unique id assigned;
    /// an existing id overwrites that record. Returns the record's id.
    pub fn upsert(&self, task: Task) -> Result<i64> {
        self.request(|reply| Command::Upsert(task, reply))?
    }

    /// Replace the record matching `task.id`; silent no-op when absent
    pub fn update(&self, task: Task) -> Result<()> {
        self.request(|reply| Command::Update(task, reply))?
    }

    /// Remove the record matching `task.id`
    pub fn delete(&self, task: &Task) -> Result<()> {
        self.request(|reply| Command::Delete(task.id, reply))?
    }

    /// Remove every record
    pub fn delete_all(&self) -> Result<()> {
        self.request(|reply| Command::DeleteAll(reply))?
    }

    /// Point lookup by id
    pub fn get_by_id(&self, id: i64) -> Result<Option<Task>> {
        self.request(|reply| Command::GetById(id, reply))
    }

    /// Register a live subscription starting from the current snapshot
    pub fn subscribe(&self) -> Result<TaskFeed> {
        let rx = self.request(Command::Subscribe)?;
        Ok(TaskFeed {
            rx,
            latest: self.latest.clone(),
        })
    }

    /// The latest committed snapshot, without subscribing
    pub fn tasks(&self) -> Snapshot {
        match self.latest.read() {
            Ok(guard) => guard.clone(),
            Err(_) => Arc::new(Vec::new()),
        }
    }

    fn request<T>(&self, command: impl FnOnce(Sender<T>) -> Command) -> Result<T> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.tx
            .send(command(reply_tx))
            .map_err(|_| anyhow!("task store worker is not running"))?;
        reply_rx
            .recv()
            .map_err(|_| anyhow!("task store worker dropped the request"))
    }
}

impl Drop for TaskStore {
    fn drop(&mut self) {
        let _ = self.tx.send(Command::Shutdown);
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}

/// Worker-side state: the table, its file, and the subscriber list
struct Worker {
    path: PathBuf,
    table: TaskTable,
    subscribers: Vec<Sender<Snapshot>>,
    latest: Arc<RwLock<Snapshot>>,
}

impl Worker {
    fn run(mut self, rx: Receiver<Command>) {
        while let Ok(command) = rx.recv() {
            match command {
                Command::Upsert(task, reply) => {
                    let _ = reply.send(self.upsert(task));
                }
                Command::Update(task, reply) => {
                    let _ = reply.send(self.update(task));
                }
                Command::Delete(id, reply) => {
                    let _ = reply.send(self.delete(id));
                }
                Command::DeleteAll(reply) => {
                    let _ = reply.send(self.delete_all());
                }
                Command::GetById(id, reply) => {
                    let found = self.table.tasks.iter().find(|t| t.id == id).cloned();
                    let _ = reply.send(found);
                }
                Command::Subscribe(reply) => {
                    let (feed_tx, feed_rx) = mpsc::channel();
                    // Seed the channel so the first poll already has data
                    let _ = feed_tx.send(sorted_snapshot(&self.table.tasks));
                    self.subscribers.push(feed_tx);
                    let _ = reply.send(feed_rx);
                }
                Command::Shutdown => break,
            }
        }
    }

    fn upsert(&mut self, mut task: Task) -> Result<i64> {
        task.reconcile_subtask_states();
        if task.id == 0 {
            task.id = self.table.next_id;
            self.table.next_id += 1;
        } else if task.id >= self.table.next_id {
            // Imported records keep their ids; the counter moves past them
            self.table.next_id = task.id + 1;
        }
        let id = task.id;

        match self.table.tasks.iter_mut().find(|t| t.id == id) {
            Some(existing) => *existing = task,
            None => self.table.tasks.push(task),
        }

        self.commit()?;
        Ok(id)
    }

    fn update(&mut self, mut task: Task) -> Result<()> {
        task.reconcile_subtask_states();
        let Some(existing) = self.table.tasks.iter_mut().find(|t| t.id == task.id) else {
            // Unknown id: callers pre-check with get_by_id when they care
            return Ok(());
        };
        *existing = task;
        self.commit()
    }

    fn delete(&mut self, id: i64) -> Result<()> {
        let before = self.table.tasks.len();
        self.table.tasks.retain(|t| t.id != id);
        if self.table.tasks.len() == before {
            return Ok(());
        }
        self.commit()
    }

    fn delete_all(&mut self) -> Result<()> {
        self.table.tasks.clear();
        self.commit()
    }

    /// Persist, then publish. A failed save returns the error to the
    /// caller and leaves the previous snapshot published.
    fn commit(&mut self) -> Result<()> {
        save_table(&self.path, &self.table)?;
        self.publish();
        Ok(())
    }

    fn publish(&mut self) {
        let snapshot = sorted_snapshot(&self.table.tasks);
        if let Ok(mut latest) = self.latest.write() {
            *latest = snapshot.clone();
        }
        // Prune subscribers whose feed has been dropped
        self.subscribers
            .retain(|tx| tx.send(snapshot.clone()).is_ok());
    }
}

/// Order the view: newest creation first, ties broken by id descending
fn sorted_snapshot(tasks: &[Task]) -> Snapshot {
    let mut sorted = tasks.to_vec();
    sorted.sort_by(|a, b| {
        b.timestamp
            .cmp(&a.timestamp)
            .then_with(|| b.id.cmp(&a.id))
    });
    Arc::new(sorted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn task_at(content: &str, timestamp: i64) -> Task {
        let mut task = Task::new(content);
        task.timestamp = timestamp;
        task
    }

    #[test]
    fn test_open_empty_store() {
        let dir = tempdir().unwrap();
        let store = TaskStore::open(dir.path().join("tasks.json")).unwrap();
        assert!(store.tasks().is_empty());
    }

    #[test]
    fn test_upsert_assigns_sequential_ids() {
        let dir = tempdir().unwrap();
        let store = TaskStore::open(dir.path().join("tasks.json")).unwrap();

        let first = store.upsert(Task::new("First")).unwrap();
        let second = store.upsert(Task::new("Second")).unwrap();

        assert_eq!(first, 1);
        assert_eq!(second, 2);
        assert_eq!(store.tasks().len(), 2);
    }

    #[test]
    fn test_upsert_existing_id_replaces() {
        let dir = tempdir().unwrap();
        let store = TaskStore::open(dir.path().join("tasks.json")).unwrap();

        let id = store.upsert(task_at("Original", 100)).unwrap();
        let mut replacement = task_at("Replaced", 100);
        replacement.id = id;
        store.upsert(replacement).unwrap();

        let tasks = store.tasks();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].content, "Replaced");
    }

    #[test]
    fn test_get_all_ordered_by_timestamp_descending() {
        let dir = tempdir().unwrap();
        let store = TaskStore::open(dir.path().join("tasks.json")).unwrap();

        store.upsert(task_at("Oldest", 100)).unwrap();
        store.upsert(task_at("Newest", 300)).unwrap();
        store.upsert(task_at("Middle", 200)).unwrap();

        let snapshot = store.tasks();
        let contents: Vec<&str> = snapshot.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["Newest", "Middle", "Oldest"]);
    }

    #[test]
    fn test_equal_timestamps_order_by_id_descending() {
        let dir = tempdir().unwrap();
        let store = TaskStore::open(dir.path().join("tasks.json")).unwrap();

        store.upsert(task_at("A", 100)).unwrap();
        store.upsert(task_at("B", 100)).unwrap();

        let snapshot = store.tasks();
        let contents: Vec<&str> = snapshot.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["B", "A"]);
    }

    #[test]
    fn test_get_by_id() {
        let dir = tempdir().unwrap();
        let store = TaskStore::open(dir.path().join("tasks.json")).unwrap();

        let id = store.upsert(Task::new("Find me")).unwrap();

        let found = store.get_by_id(id).unwrap().unwrap();
        assert_eq!(found.content, "Find me");
        assert!(store.get_by_id(999).unwrap().is_none());
    }

    #[test]
    fn test_update_replaces_record() {
        let dir = tempdir().unwrap();
        let store = TaskStore::open(dir.path().join("tasks.json")).unwrap();

        let id = store.upsert(Task::new("Before")).unwrap();
        let mut updated = store.get_by_id(id).unwrap().unwrap();
        updated.content = "After".to_string();
        updated.is_done = true;
        store.update(updated).unwrap();

        let task = store.get_by_id(id).unwrap().unwrap();
        assert_eq!(task.content, "After");
        assert!(task.is_done);
    }

    #[test]
    fn test_update_unknown_id_is_a_no_op() {
        let dir = tempdir().unwrap();
        let store = TaskStore::open(dir.path().join("tasks.json")).unwrap();

        store.upsert(Task::new("Only task")).unwrap();
        let mut ghost = Task::new("Ghost");
        ghost.id = 42;
        store.update(ghost).unwrap();

        let tasks = store.tasks();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].content, "Only task");
    }

    #[test]
    fn test_delete() {
        let dir = tempdir().unwrap();
        let store = TaskStore::open(dir.path().join("tasks.json")).unwrap();

        let id = store.upsert(Task::new("Doomed")).unwrap();
        let task = store.get_by_id(id).unwrap().unwrap();
        store.delete(&task).unwrap();

        assert!(store.tasks().is_empty());
        assert!(store.get_by_id(id).unwrap().is_none());
    }

    #[test]
    fn test_delete_all_yields_empty_view() {
        let dir = tempdir().unwrap();
        let store = TaskStore::open(dir.path().join("tasks.json")).unwrap();

        store.upsert(Task::new("One")).unwrap();
        store.upsert(Task::new("Two")).unwrap();
        store.delete_all().unwrap();

        assert!(store.tasks().is_empty());
    }

    #[test]
    fn test_each_task_appears_exactly_once() {
        let dir = tempdir().unwrap();
        let store = TaskStore::open(dir.path().join("tasks.json")).unwrap();

        let id = store.upsert(Task::new("Once")).unwrap();
        let task = store.get_by_id(id).unwrap().unwrap();
        store.upsert(task).unwrap();

        let count = store
            .tasks()
            .iter()
            .filter(|t| t.content == "Once")
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_subscription_receives_latest_state() {
        let dir = tempdir().unwrap();
        let store = TaskStore::open(dir.path().join("tasks.json")).unwrap();

        let feed = store.subscribe().unwrap();
        store.upsert(task_at("First", 100)).unwrap();
        store.upsert(task_at("Second", 200)).unwrap();

        // Latest-value-wins: drain everything pending, keep the newest
        let snapshot = feed.poll().unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].content, "Second");

        // Nothing pending after the drain
        assert!(feed.poll().is_none());

        // latest() resumes from the current state without new publications
        assert_eq!(feed.latest().len(), 2);
    }

    #[test]
    fn test_new_subscriber_starts_from_current_snapshot() {
        let dir = tempdir().unwrap();
        let store = TaskStore::open(dir.path().join("tasks.json")).unwrap();

        store.upsert(Task::new("Existing")).unwrap();

        let feed = store.subscribe().unwrap();
        let snapshot = feed.poll().unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].content, "Existing");
    }

    #[test]
    fn test_data_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tasks.json");

        {
            let store = TaskStore::open(&path).unwrap();
            store
                .upsert(Task::new("Persistent").with_reminder("2024-06-01 09:30"))
                .unwrap();
        }

        let store = TaskStore::open(&path).unwrap();
        let tasks = store.tasks();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].content, "Persistent");
        assert_eq!(tasks[0].reminder_date.as_deref(), Some("2024-06-01 09:30"));

        // The id counter also survives
        let next = store.upsert(Task::new("Next")).unwrap();
        assert_eq!(next, 2);
    }

    #[test]
    fn test_upsert_reconciles_subtask_arrays() {
        let dir = tempdir().unwrap();
        let store = TaskStore::open(dir.path().join("tasks.json")).unwrap();

        let mut task = Task::new("Lopsided");
        task.subtasks = vec!["A".to_string(), "B".to_string()];
        task.subtask_states = vec![true];
        let id = store.upsert(task).unwrap();

        let stored = store.get_by_id(id).unwrap().unwrap();
        assert!(stored.states_in_sync());
        assert_eq!(stored.subtask_states, vec![true, false]);
    }
}
