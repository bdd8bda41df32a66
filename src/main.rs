mod app;
mod domain;
mod notifications;
mod persistence;
mod pomodoro;
mod report;
mod store;
mod ticker;

use anyhow::Result;
use app::App;
use clap::{Parser, Subcommand};
use domain::{Task, DATE_FORMAT, REMINDER_FORMAT};
use pomodoro::PomodoroTimer;
use std::io::{self, Write};
use std::path::PathBuf;
use store::TaskStore;

#[derive(Parser)]
#[command(name = "doit")]
#[command(about = "A personal task manager with reminders, subtasks, and a Pomodoro focus timer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a local .doit directory in the current directory
    Init,
    /// Add a task
    Add {
        /// Task label
        content: String,
        /// Reminder timestamp ("YYYY-MM-DD HH:MM")
        #[arg(short, long)]
        reminder: Option<String>,
        /// Subtask label (repeatable)
        #[arg(short, long = "subtask")]
        subtasks: Vec<String>,
    },
    /// List tasks, newest first
    List {
        /// Only tasks whose reminder falls on this day (YYYY-MM-DD)
        #[arg(short, long)]
        date: Option<String>,
    },
    /// Toggle a task's completion flag
    Toggle {
        /// Task id
        id: i64,
    },
    /// Delete a task
    Rm {
        /// Task id
        id: i64,
    },
    /// Delete every task
    Clear,
    /// Work with a task's subtasks
    Sub {
        #[command(subcommand)]
        command: SubCommands,
    },
    /// Export all tasks to a JSON file
    Export {
        /// Output file path. Defaults to an export file in the doit directory.
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Import tasks from a JSON file, replacing the current list
    Import {
        /// File to import
        file: String,
    },
    /// Generate a daily achievements report
    Report {
        /// Date to generate the report for (YYYY-MM-DD). Defaults to today.
        #[arg(short, long)]
        date: Option<String>,
        /// Output file path. Defaults to report-YYYY-MM-DD.md in the doit directory.
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Run the Pomodoro focus timer
    Focus {
        /// Work phase length in minutes
        #[arg(long, default_value_t = 25)]
        work_mins: u32,
        /// Break phase length in minutes
        #[arg(long, default_value_t = 5)]
        break_mins: u32,
        /// Stop after this many completed focus sessions
        #[arg(long, default_value_t = 1)]
        sessions: u32,
    },
}

#[derive(Subcommand)]
enum SubCommands {
    /// Mark a subtask done (or not done with --undo)
    Check {
        /// Task id
        id: i64,
        /// Subtask index, starting at 0
        index: usize,
        /// Mark as not done instead
        #[arg(long)]
        undo: bool,
    },
    /// Replace a subtask's label
    Edit {
        /// Task id
        id: i64,
        /// Subtask index, starting at 0
        index: usize,
        /// New label
        content: String,
    },
    /// Remove a subtask
    Rm {
        /// Task id
        id: i64,
        /// Subtask index, starting at 0
        index: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            let data_dir = persistence::init_local_dir()?;
            println!("Initialized doit directory: {}", data_dir.display());
            println!();
            println!("doit will now use this local directory for task storage.");
            Ok(())
        }
        Commands::Focus {
            work_mins,
            break_mins,
            sessions,
        } => run_focus(work_mins, break_mins, sessions),
        Commands::Add {
            content,
            reminder,
            subtasks,
        } => {
            let app = open_app()?;
            if let Some(text) = &reminder {
                chrono::NaiveDateTime::parse_from_str(text, REMINDER_FORMAT).map_err(|e| {
                    anyhow::anyhow!("Invalid reminder format. Use \"YYYY-MM-DD HH:MM\": {}", e)
                })?;
            }

            let mut task = Task::new(content);
            task.reminder_date = reminder;
            for subtask in subtasks {
                task.add_subtask(subtask);
            }

            let id = app.add_task(task)?;
            println!("Added task #{}", id);
            Ok(())
        }
        Commands::List { date } => {
            let app = open_app()?;
            let tasks: Vec<Task> = match date {
                Some(date_text) => {
                    chrono::NaiveDate::parse_from_str(&date_text, DATE_FORMAT).map_err(|e| {
                        anyhow::anyhow!("Invalid date format. Use YYYY-MM-DD: {}", e)
                    })?;
                    app.get_tasks_by_date(&date_text)
                }
                None => app.tasks().to_vec(),
            };

            if tasks.is_empty() {
                println!("No tasks.");
            } else {
                for task in &tasks {
                    print_task(task);
                }
            }
            Ok(())
        }
        Commands::Toggle { id } => {
            let app = open_app()?;
            let Some(task) = app.get_task(id)? else {
                anyhow::bail!("No task with id {}", id);
            };

            let updated = app.toggle_task_done(&task)?;
            if updated.is_done {
                println!("Done: {}", updated.content);
                notifications::notify_task_done(&updated.content);
                if let Some(message) = app.take_motivation() {
                    println!("{}", message);
                }
            } else {
                println!("Reopened: {}", updated.content);
            }
            Ok(())
        }
        Commands::Rm { id } => {
            let app = open_app()?;
            let Some(task) = app.get_task(id)? else {
                anyhow::bail!("No task with id {}", id);
            };
            app.delete_task(&task)?;
            println!("Deleted: {}", task.content);
            Ok(())
        }
        Commands::Clear => {
            let app = open_app()?;
            app.clear_all_tasks()?;
            println!("Cleared all tasks.");
            Ok(())
        }
        Commands::Sub { command } => {
            let app = open_app()?;
            match command {
                SubCommands::Check { id, index, undo } => {
                    require_task(&app, id)?;
                    app.update_subtask_state(id, index, !undo)?;
                    println!("Subtask {} of task #{} {}", index, id, if undo { "reopened" } else { "done" });
                }
                SubCommands::Edit { id, index, content } => {
                    require_task(&app, id)?;
                    app.update_subtask_content(id, index, &content)?;
                    println!("Subtask {} of task #{} updated", index, id);
                }
                SubCommands::Rm { id, index } => {
                    require_task(&app, id)?;
                    app.remove_subtask(id, index)?;
                    println!("Subtask {} of task #{} removed", index, id);
                }
            }
            Ok(())
        }
        Commands::Export { output } => {
            let app = open_app()?;
            let data = app.export_tasks()?;
            let path = match output {
                Some(path) => PathBuf::from(path),
                None => persistence::export_file()?,
            };
            persistence::atomic_write(&path, &data)?;
            println!("Exported {} tasks to {}", app.tasks().len(), path.display());
            Ok(())
        }
        Commands::Import { file } => {
            let app = open_app()?;
            let content = persistence::read_file(&file)?;
            if content.is_empty() {
                anyhow::bail!("Nothing to import: {}", file);
            }
            let count = app.import_tasks(&content)?;
            println!("Imported {} tasks from {}", count, file);
            Ok(())
        }
        Commands::Report { date, output } => {
            let app = open_app()?;
            let report_date = match date {
                Some(date_text) => Some(
                    chrono::NaiveDate::parse_from_str(&date_text, DATE_FORMAT).map_err(|e| {
                        anyhow::anyhow!("Invalid date format. Use YYYY-MM-DD: {}", e)
                    })?,
                ),
                None => None,
            };
            let output_path = output.map(PathBuf::from);

            let report_path = report::generate_report(&app.tasks(), report_date, output_path)?;
            println!("Report generated: {}", report_path.display());
            Ok(())
        }
    }
}

/// Open the store at the resolved data directory and wrap it in the app
fn open_app() -> Result<App> {
    let data_dir = persistence::ensure_data_dir()?;
    eprintln!("Using doit directory: {}", data_dir.display());

    let store = TaskStore::open(persistence::tasks_file()?)?;
    App::new(store)
}

/// Bail when the task id does not exist, so subtask commands report
/// instead of silently doing nothing
fn require_task(app: &App, id: i64) -> Result<()> {
    if app.get_task(id)?.is_none() {
        anyhow::bail!("No task with id {}", id);
    }
    Ok(())
}

fn print_task(task: &Task) {
    let mark = if task.is_done { "x" } else { " " };
    let reminder = task
        .reminder_date
        .as_deref()
        .map(|r| format!("  (due {})", r))
        .unwrap_or_default();
    println!("{:>4} [{}] {}{}", task.id, mark, task.content, reminder);

    let count = task.subtasks.len();
    for (index, subtask) in task.subtasks.iter().enumerate() {
        let submark = if task.subtask_states.get(index).copied().unwrap_or(false) {
            "x"
        } else {
            " "
        };
        let connector = if index + 1 == count { "└─" } else { "├─" };
        println!("       {} [{}] {}", connector, submark, subtask);
    }
}

/// Run the Pomodoro loop: one tick per second while running, with a
/// completion cue (bell + notification) on every phase flip
fn run_focus(work_mins: u32, break_mins: u32, sessions: u32) -> Result<()> {
    let mut timer = PomodoroTimer::with_durations(work_mins * 60, break_mins * 60);
    println!(
        "Pomodoro: {} min work / {} min break, stopping after {} focus session(s). Ctrl-C to quit.",
        work_mins, break_mins, sessions
    );

    timer.start();
    let tick = ticker::tick_duration();

    loop {
        std::thread::sleep(tick);

        if let Some(completed) = timer.tick() {
            let message = format!(
                "{} phase finished - {} is next",
                completed.finished.name(),
                completed.next.name()
            );
            print!("\x07"); // terminal bell
            println!("\n{}", message);
            notifications::notify_phase_complete(&message);

            if timer.focus_count() >= sessions {
                println!("Completed {} focus session(s).", timer.focus_count());
                return Ok(());
            }
            timer.start();
        } else {
            print!(
                "\r[{}] {}  (focus sessions: {})  ",
                timer.phase().name(),
                timer.format_remaining(),
                timer.focus_count()
            );
            let _ = io::stdout().flush();
        }
    }
}
