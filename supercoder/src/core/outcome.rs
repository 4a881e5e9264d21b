//! Execution outcome classification.
//!
//! Success detection scans stdout for a literal marker line agreed between
//! the standing generation instruction and this classifier. The marker is a
//! configuration value; this module is the only place it is compared against
//! program output.

use serde::{Deserialize, Serialize};

/// Failure reason reported when a clean exit did not confirm the tests.
pub const TESTS_NOT_CONFIRMED_REASON: &str = "tests did not pass";

/// Raw observation from one sandbox run, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxRun {
    /// Exit code, `None` when the process was killed by a signal.
    pub exit_code: Option<i32>,
    /// Whether the process terminated normally with a zero status.
    pub exit_success: bool,
    pub stdout: String,
    pub stderr: String,
    /// The run was killed after exceeding its wall-clock budget.
    pub timed_out: bool,
    /// Wall-clock duration measured around spawn and wait only.
    pub elapsed_ms: u64,
}

/// Classified result of executing an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    /// True iff the process exited cleanly AND stdout contains the success
    /// marker. Never inferred from the exit status alone.
    pub passed: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
    pub elapsed_ms: u64,
}

impl ExecutionOutcome {
    /// Failing outcome for an adapter fault (spawn error, missing
    /// interpreter). The fault text stands in for stderr so the repair
    /// prompt can embed it.
    pub fn from_fault(fault: &str) -> Self {
        Self {
            passed: false,
            exit_code: None,
            stdout: String::new(),
            stderr: fault.to_string(),
            timed_out: false,
            elapsed_ms: 0,
        }
    }

    /// Human-readable reason for a failed run, used verbatim in repair
    /// prompts. `None` when the run passed.
    pub fn failure_reason(&self) -> Option<String> {
        if self.passed {
            return None;
        }
        if self.timed_out {
            return Some(format!("execution timed out after {} ms", self.elapsed_ms));
        }
        if !self.stderr.trim().is_empty() {
            return Some(self.stderr.clone());
        }
        if !self.exit_success() {
            return Some(match self.exit_code {
                Some(code) => format!("process exited with status {code}"),
                None => "process terminated by signal".to_string(),
            });
        }
        Some(TESTS_NOT_CONFIRMED_REASON.to_string())
    }

    fn exit_success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Classify a sandbox run against the configured success marker.
pub fn classify_run(run: SandboxRun, marker: &str) -> ExecutionOutcome {
    let passed = !run.timed_out && run.exit_success && run.stdout.contains(marker);
    ExecutionOutcome {
        passed,
        exit_code: run.exit_code,
        stdout: run.stdout,
        stderr: run.stderr,
        timed_out: run.timed_out,
        elapsed_ms: run.elapsed_ms,
    }
}
