// Task poller: the completion-tracking state machine. Polls the status
// endpoint at a fixed interval until the server reports a terminal
// state or the attempt budget runs out. A failed status check is not a
// failed backup; the loop just tries again next round.

use std::thread;
use std::time::Duration;

use crate::api::{ApiClient, Transport};

/// Server-reported task states. Anything the server sends that we do
/// not recognize maps to `Unknown`, which keeps the wait alive but is
/// surfaced distinctly so a stuck or misbehaving server is visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    Running,
    Success,
    Failed,
    Error,
    Unknown,
}

impl TaskState {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "Pending" => TaskState::Pending,
            "Running" => TaskState::Running,
            "Success" => TaskState::Success,
            "Failed" => TaskState::Failed,
            "Error" => TaskState::Error,
            _ => TaskState::Unknown,
        }
    }
}

/// How the wait ended. `TimedOut` means the attempt budget ran out with
/// no terminal state ever observed; it is deliberately distinct from a
/// server-reported failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Completed,
    Failed(TaskState),
    TimedOut,
}

/// Polling cadence. The interval is fixed (no backoff): backup jobs are
/// long and bounded, so a constant 5 seconds keeps the code and the
/// server load predictable.
#[derive(Debug, Clone)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_wait: Duration,
    /// Print a non-terminal progress line only every nth poll.
    pub report_every: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        PollPolicy {
            interval: Duration::from_secs(5),
            max_wait: Duration::from_secs(10 * 60),
            report_every: 6,
        }
    }
}

impl PollPolicy {
    /// Attempt budget, fixed once before the loop starts.
    pub fn max_attempts(&self) -> u32 {
        let interval_ms = self.interval.as_millis().max(1);
        (self.max_wait.as_millis() / interval_ms).max(1) as u32
    }
}

/// Poll until the task reaches a terminal state or the budget is spent.
///
/// Per round: one status query. A transport failure or a response with
/// no readable state counts as "no status this round" and the loop
/// continues; transient network blips must not abort a long backup.
/// Terminal transitions are reported immediately; everything else is
/// throttled to every `report_every`th poll.
pub fn wait_for_task<T: Transport>(
    client: &ApiClient<T>,
    session_id: &str,
    task_id: &str,
    policy: &PollPolicy,
) -> WaitOutcome {
    let max_attempts = policy.max_attempts();
    let interval_secs = policy.interval.as_secs();
    let report_every = policy.report_every.max(1);

    for attempt in 0..max_attempts {
        match client.task_status(session_id, task_id) {
            Ok(Some(raw)) => {
                let state = TaskState::parse(&raw);
                match state {
                    TaskState::Success => {
                        println!("✓ Backup completed successfully");
                        return WaitOutcome::Completed;
                    }
                    TaskState::Failed | TaskState::Error => {
                        eprintln!("✗ Backup failed with state: {}", raw);
                        return WaitOutcome::Failed(state);
                    }
                    TaskState::Pending | TaskState::Running | TaskState::Unknown => {
                        report_nonterminal(&raw, state, attempt, report_every, interval_secs);
                    }
                }
            }
            // No state in the response this round; keep waiting.
            Ok(None) => {}
            Err(e) => {
                eprintln!("  Status check failed ({}), will retry", e);
            }
        }

        if attempt + 1 < max_attempts {
            thread::sleep(policy.interval);
        }
    }

    eprintln!("✗ Timeout waiting for backup to complete");
    WaitOutcome::TimedOut
}

/// Print the progress line for a non-terminal observation, throttled
/// to every `report_every`th poll. Unrecognized states get a distinct
/// line on stderr but share the same throttle, so a server stuck in a
/// strange state cannot flood the log. Returns whether a line was
/// emitted.
fn report_nonterminal(
    raw: &str,
    state: TaskState,
    attempt: u32,
    report_every: u32,
    interval_secs: u64,
) -> bool {
    if attempt % report_every != 0 {
        return false;
    }
    if state == TaskState::Unknown {
        eprintln!("  Status \"{}\" not recognized, continuing to poll", raw);
    } else {
        println!("  Status: {}... (checking again in {}s)", raw, interval_secs);
    }
    true
}
