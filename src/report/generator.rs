use crate::domain::Task;
use crate::persistence::{atomic_write, report_file};
use crate::report::stats::{calculate_stats, done_tasks, pending_tasks};
use anyhow::Result;
use chrono::{Local, NaiveDate};
use std::path::PathBuf;

/// Format percentage with 1 decimal place
fn format_percent(value: f64) -> String {
    format!("{:.1}%", value)
}

/// Subtask progress like "2/3" for a task line, empty when there are none
fn subtask_progress(task: &Task) -> String {
    if task.subtasks.is_empty() {
        String::new()
    } else {
        format!(" ({}/{} subtasks)", task.subtasks_done(), task.subtasks.len())
    }
}

/// Render the achievements report for the given task list
pub fn render_report(tasks: &[Task], date: NaiveDate) -> String {
    let stats = calculate_stats(tasks);
    let mut report = String::new();

    // Header
    report.push_str(&format!("# Daily Report - {}\n\n", date.format("%Y-%m-%d")));

    // Summary section
    report.push_str("## Summary\n\n");
    report.push_str(&format!(
        "- **Total Tasks:** {} (Done: {}, Pending: {})\n",
        stats.total, stats.done, stats.pending
    ));
    report.push_str(&format!(
        "- **Completion:** {}\n",
        format_percent(stats.completion_percent)
    ));
    if stats.subtasks_total > 0 {
        report.push_str(&format!(
            "- **Subtasks:** {}/{} done\n",
            stats.subtasks_done, stats.subtasks_total
        ));
    }
    report.push_str(&format!(
        "- **With Reminders:** {}\n\n",
        stats.with_reminder
    ));

    // Achievements section
    report.push_str("## Achievements\n\n");
    let done = done_tasks(tasks);
    if done.is_empty() {
        report.push_str("Nothing completed yet.\n\n");
    } else {
        for task in &done {
            report.push_str(&format!("- [x] {}{}\n", task.content, subtask_progress(task)));
        }
        report.push('\n');
    }

    // Remaining section
    let pending = pending_tasks(tasks);
    if !pending.is_empty() {
        report.push_str("## Remaining\n\n");
        for task in &pending {
            report.push_str(&format!("- [ ] {}{}\n", task.content, subtask_progress(task)));
        }
        report.push('\n');
    }

    // Reminders due that day
    let date_text = date.format("%Y-%m-%d").to_string();
    let due: Vec<&Task> = tasks.iter().filter(|t| t.is_due_on(&date_text)).collect();
    if !due.is_empty() {
        report.push_str(&format!("## Reminders for {}\n\n", date_text));
        for task in &due {
            let time = task
                .reminder_datetime()
                .map(|dt| dt.format("%H:%M").to_string())
                .unwrap_or_default();
            report.push_str(&format!("- {} - {}\n", time, task.content));
        }
        report.push('\n');
    }

    report
}

/// Generate the report for the specified date and write it to disk.
/// Returns the path written.
pub fn generate_report(
    tasks: &[Task],
    date: Option<NaiveDate>,
    output_path: Option<PathBuf>,
) -> Result<PathBuf> {
    let report_date = date.unwrap_or_else(|| Local::now().date_naive());
    let content = render_report(tasks, report_date);

    let path = match output_path {
        Some(path) => path,
        None => report_file(report_date)?,
    };
    atomic_write(&path, &content)?;

    Ok(path)
}
