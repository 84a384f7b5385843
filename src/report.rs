// Result reporter: fetches the finished task's statistics and prints a
// summary. Display-only and best-effort: a missing field is simply
// left out, and nothing here can fail the run.

use crate::api::{ApiClient, Transport};
use crate::decode;

/// Backup statistics from the task detail endpoint. The server may
/// omit any of them. Values stay as the server's own text since they
/// are only ever displayed.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct TaskSummary {
    pub total_files: Option<String>,
    pub completed_files: Option<String>,
    pub failed_files: Option<String>,
    pub total_bytes: Option<String>,
}

impl TaskSummary {
    pub fn from_body(body: &str) -> Self {
        let field = |key| decode::extract(body, key).ok().flatten();
        TaskSummary {
            total_files: field("totalFiles"),
            completed_files: field("totalCompletedFiles"),
            failed_files: field("totalFailedFiles"),
            total_bytes: field("totalBytes"),
        }
    }
}

/// Fetch the task detail and print the completion summary. Invoked
/// only after the poller reports success.
pub fn fetch_and_report<T: Transport>(client: &ApiClient<T>, session_id: &str, task_id: &str) {
    let summary = match client.task_detail(session_id, task_id) {
        Ok(body) => TaskSummary::from_body(&body),
        Err(e) => {
            eprintln!("Warning: could not fetch backup statistics: {}", e);
            TaskSummary::default()
        }
    };
    print_summary(task_id, &summary);
}

fn print_summary(task_id: &str, summary: &TaskSummary) {
    println!();
    println!("{}", crate::run::BANNER);
    println!("  BACKUP COMPLETED SUCCESSFULLY");
    println!("{}", crate::run::BANNER);

    if let (Some(completed), Some(total)) = (&summary.completed_files, &summary.total_files) {
        println!("Files processed: {}/{}", completed, total);
    }
    if let Some(failed) = &summary.failed_files {
        println!("Files failed: {}", failed);
    }
    if let Some(bytes) = &summary.total_bytes {
        println!("Total size: {} bytes", bytes);
    }
    println!("Task ID: {}", task_id);
}
