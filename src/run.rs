// Orchestrator: drives one backup run end to end: scan, sign on,
// submit, wait, report, sign off. Generic over the transport so the
// whole sequence can be driven by a scripted server in tests.
//
// The one hard rule here: once a session is opened it is closed on
// every exit path, exactly once.

use chrono::Local;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;

use crate::api::{ApiClient, Transport};
use crate::config::Config;
use crate::poll::{self, PollPolicy, WaitOutcome};
use crate::report;
use crate::scan;

pub const BANNER: &str =
    "======================================================================";

fn banner(title: &str) {
    println!();
    println!("{}", BANNER);
    println!("  {}", title);
    println!("{}", BANNER);
}

/// Spinner shown while a blocking request is in flight.
fn spinner(msg: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg);
    pb
}

/// Wait budget for display: whole minutes rounded up, or seconds when
/// the budget is under a minute.
fn human_wait(max_wait: std::time::Duration) -> String {
    let secs = max_wait.as_secs();
    if secs < 60 {
        format!("{} seconds", secs)
    } else {
        format!("{} minutes", (secs + 59) / 60)
    }
}

/// Run one backup session against the configured server. Returns the
/// process exit code: 0 for success or nothing-to-do, 1 for any
/// authentication, submission, or completion failure.
pub fn run<T: Transport>(config: &Config, client: &ApiClient<T>, policy: &PollPolicy) -> u8 {
    println!("{}", BANNER);
    println!("  STORAGE PROTECT UPLOADER");
    println!("{}", BANNER);

    // Enumerate files before touching the network. No files means
    // nothing to do, which is not an error.
    println!();
    println!("Scanning directory: {}", config.download_dir.display());
    let files = match scan::scan_directory(&config.download_dir) {
        Ok(files) => files,
        Err(e) => {
            eprintln!(
                "WARNING: Cannot read directory '{}': {}",
                config.download_dir.display(),
                e
            );
            return 0;
        }
    };
    if files.is_empty() {
        eprintln!(
            "WARNING: No .txt files found in {}",
            config.download_dir.display()
        );
        return 0;
    }

    println!("Found {} file(s) to backup:", files.len());
    for file in &files {
        let size = fs::metadata(file).map(|m| m.len()).unwrap_or(0);
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| file.display().to_string());
        println!("  - {} ({} bytes)", name, size);
    }

    banner("SIGNING ON");
    println!("Server: {}", config.server_url);
    println!("Node: {}", config.node_id);
    println!();

    let sp = spinner("Signing on...");
    let signon = client.sign_on(&config.node_id, &config.password);
    sp.finish_and_clear();

    let signon = match signon {
        Ok(s) => s,
        Err(e) => {
            eprintln!("✗ {}", e);
            eprintln!("Failed to sign on");
            return 1;
        }
    };
    println!("✓ Sign-on successful");
    println!("Session ID: {}", signon.session_id);
    if let Some(task_id) = &signon.task_id {
        println!("Task ID: {}", task_id);
    }
    let session_id = signon.session_id;

    // Timestamped name, lexicographically sortable on the server side.
    let backup_name = format!(
        "ceph_downloads_{}",
        Local::now().format("%Y%m%d_%H%M%S")
    );

    banner(&format!("STARTING BACKUP: {}", backup_name));
    println!("Source directory: {}", config.download_dir.display());
    println!("Files to backup: {}", files.len());

    let sp = spinner("Submitting backup job...");
    let submitted = client.start_backup(
        &session_id,
        &config.backup_directory,
        &backup_name,
        &files,
    );
    sp.finish_and_clear();

    let task_id = match submitted {
        Ok(id) => id,
        Err(e) => {
            eprintln!("✗ {}", e);
            eprintln!("Failed to start backup");
            client.sign_off(&session_id);
            return 1;
        }
    };
    println!("✓ Backup started successfully");
    println!("Backup task ID: {}", task_id);

    println!();
    println!(
        "Waiting for backup to complete (max {})...",
        human_wait(policy.max_wait)
    );
    let outcome = poll::wait_for_task(client, &session_id, &task_id, policy);

    if outcome == WaitOutcome::Completed {
        report::fetch_and_report(client, &session_id, &task_id);
    }

    println!();
    println!("Signing off...");
    client.sign_off(&session_id);

    match outcome {
        WaitOutcome::Completed => 0,
        WaitOutcome::Failed(_) | WaitOutcome::TimedOut => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::ScriptedTransport;
    use crate::api::{ApiResponse, TransportError};
    use std::fs::File;
    use std::io::Write;
    use std::path::Path;
    use std::time::Duration;

    fn test_config(dir: &Path) -> Config {
        Config {
            server_url: "http://spserver:1580".into(),
            node_id: "APPLEBEES".into(),
            password: "secret".into(),
            backup_directory: "/sp_backups/ceph_downloads".into(),
            download_dir: dir.to_path_buf(),
        }
    }

    fn fast_policy(max_attempts: u32) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(1),
            max_wait: Duration::from_millis(max_attempts as u64),
            report_every: 6,
        }
    }

    fn dir_with_files(names: &[&str]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for name in names {
            let mut f = File::create(dir.path().join(name)).unwrap();
            f.write_all(b"data").unwrap();
        }
        dir
    }

    fn status(state: &str) -> Result<ApiResponse, TransportError> {
        ScriptedTransport::ok(200, &format!(r#"{{"taskState":"{}"}}"#, state))
    }

    fn count(paths: &[String], needle: &str) -> usize {
        paths.iter().filter(|p| p.as_str() == needle).count()
    }

    #[test]
    fn full_run_reports_once_and_signs_off_once() {
        let dir = dir_with_files(&["a.txt", "b.txt"]);
        let transport = ScriptedTransport::new(vec![
            ScriptedTransport::ok(200, r#"{"sessionId":"s-1"}"#),
            ScriptedTransport::ok(202, r#"{"taskId":"t-1"}"#),
            status("Running"),
            status("Running"),
            status("Success"),
            ScriptedTransport::ok(200, r#"{"totalFiles":2,"totalCompletedFiles":2}"#),
            ScriptedTransport::ok(200, "{}"),
        ]);
        let client = ApiClient::new(transport);

        let code = run(&test_config(dir.path()), &client, &fast_policy(10));
        assert_eq!(code, 0);

        let paths = client.transport().paths();
        assert_eq!(count(&paths, "/api/baclient/task/t-1"), 1);
        assert_eq!(count(&paths, "/api/baclient/signoff"), 1);
        assert_eq!(count(&paths, "/api/baclient/task/t-1/status"), 3);
        // Sign-off is the very last call.
        assert_eq!(paths.last().unwrap(), "/api/baclient/signoff");
    }

    #[test]
    fn submit_failure_still_signs_off_once() {
        let dir = dir_with_files(&["a.txt"]);
        let transport = ScriptedTransport::new(vec![
            ScriptedTransport::ok(200, r#"{"sessionId":"s-1"}"#),
            ScriptedTransport::ok(500, r#"{"error":"no space"}"#),
            ScriptedTransport::ok(200, "{}"),
        ]);
        let client = ApiClient::new(transport);

        let code = run(&test_config(dir.path()), &client, &fast_policy(10));
        assert_eq!(code, 1);

        let paths = client.transport().paths();
        assert_eq!(count(&paths, "/api/baclient/signoff"), 1);
        // No polling, no reporting after a failed submit.
        assert!(!paths.iter().any(|p| p.contains("/status")));
    }

    #[test]
    fn sign_on_failure_exits_without_sign_off() {
        let dir = dir_with_files(&["a.txt"]);
        let transport = ScriptedTransport::new(vec![ScriptedTransport::ok(
            401,
            r#"{"error":"denied"}"#,
        )]);
        let client = ApiClient::new(transport);

        let code = run(&test_config(dir.path()), &client, &fast_policy(10));
        assert_eq!(code, 1);

        // Only the sign-on attempt; no session was opened, none closed.
        assert_eq!(client.transport().paths(), vec!["/api/baclient/signon"]);
    }

    #[test]
    fn timeout_exits_nonzero_but_signs_off() {
        let dir = dir_with_files(&["a.txt"]);
        let mut steps = vec![
            ScriptedTransport::ok(200, r#"{"sessionId":"s-1"}"#),
            ScriptedTransport::ok(200, r#"{"taskId":"t-1"}"#),
        ];
        steps.extend((0..3).map(|_| status("Running")));
        steps.push(ScriptedTransport::ok(200, "{}"));
        let client = ApiClient::new(ScriptedTransport::new(steps));

        let code = run(&test_config(dir.path()), &client, &fast_policy(3));
        assert_eq!(code, 1);

        let paths = client.transport().paths();
        assert_eq!(count(&paths, "/api/baclient/task/t-1/status"), 3);
        assert_eq!(count(&paths, "/api/baclient/signoff"), 1);
        // The detail endpoint is only hit after success.
        assert_eq!(count(&paths, "/api/baclient/task/t-1"), 0);
    }

    #[test]
    fn terminal_failure_skips_report_but_signs_off() {
        let dir = dir_with_files(&["a.txt"]);
        let client = ApiClient::new(ScriptedTransport::new(vec![
            ScriptedTransport::ok(200, r#"{"sessionId":"s-1"}"#),
            ScriptedTransport::ok(200, r#"{"taskId":"t-1"}"#),
            status("Failed"),
            ScriptedTransport::ok(200, "{}"),
        ]));

        let code = run(&test_config(dir.path()), &client, &fast_policy(10));
        assert_eq!(code, 1);

        let paths = client.transport().paths();
        assert_eq!(count(&paths, "/api/baclient/task/t-1"), 0);
        assert_eq!(count(&paths, "/api/baclient/signoff"), 1);
    }

    #[test]
    fn wait_budget_display_never_says_zero_minutes() {
        assert_eq!(human_wait(Duration::from_secs(30)), "30 seconds");
        assert_eq!(human_wait(Duration::from_secs(60)), "1 minutes");
        assert_eq!(human_wait(Duration::from_secs(90)), "2 minutes");
        assert_eq!(human_wait(Duration::from_secs(600)), "10 minutes");
    }

    #[test]
    fn empty_directory_makes_no_network_calls() {
        let dir = tempfile::tempdir().unwrap();
        let client = ApiClient::new(ScriptedTransport::new(vec![]));

        let code = run(&test_config(dir.path()), &client, &fast_policy(10));
        assert_eq!(code, 0);
        assert!(client.transport().requests().is_empty());
    }

    #[test]
    fn unreadable_directory_is_nothing_to_do() {
        let dir = tempfile::tempdir().unwrap();
        let gone = dir.path().join("missing");
        let client = ApiClient::new(ScriptedTransport::new(vec![]));

        let code = run(&test_config(&gone), &client, &fast_policy(10));
        assert_eq!(code, 0);
        assert!(client.transport().requests().is_empty());
    }
}
