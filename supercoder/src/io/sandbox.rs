//! Sandbox adapter that runs a generated program under an interpreter.
//!
//! The [`Sandbox`] trait decouples the pipeline from the actual execution
//! backend. Tests use scripted sandboxes that return predetermined runs
//! without spawning processes.

use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

use anyhow::{Result, anyhow};
use tracing::{instrument, warn};

use crate::config::SandboxConfig;
use crate::core::outcome::{ExecutionOutcome, SandboxRun, classify_run};
use crate::io::process::run_command_with_timeout;

/// Parameters for one program execution.
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// Path of the program file to execute.
    pub program: PathBuf,
    /// Maximum time to wait before killing the run.
    pub timeout: Duration,
    /// Truncate captured stdout/stderr beyond this many bytes.
    pub output_limit_bytes: usize,
}

/// Abstraction over program execution backends.
pub trait Sandbox {
    /// Spawn the program once and report the raw observation.
    fn run(&self, request: &RunRequest) -> Result<SandboxRun>;
}

/// Sandbox that spawns the configured interpreter on the program file.
pub struct InterpreterSandbox {
    command: Vec<String>,
}

impl InterpreterSandbox {
    pub fn from_config(cfg: &SandboxConfig) -> Self {
        Self {
            command: cfg.command.clone(),
        }
    }
}

impl Sandbox for InterpreterSandbox {
    #[instrument(skip_all, fields(program = %request.program.display(), timeout_secs = request.timeout.as_secs()))]
    fn run(&self, request: &RunRequest) -> Result<SandboxRun> {
        if self.command.is_empty() {
            return Err(anyhow!("sandbox command is empty"));
        }
        let mut cmd = Command::new(&self.command[0]);
        cmd.args(&self.command[1..]).arg(&request.program);

        let output = run_command_with_timeout(cmd, request.timeout, request.output_limit_bytes)?;
        Ok(SandboxRun {
            exit_code: output.status.code(),
            exit_success: !output.timed_out && output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            timed_out: output.timed_out,
            elapsed_ms: output.elapsed.as_millis() as u64,
        })
    }
}

/// Execute a program and classify the result against the success marker.
///
/// Never raises past this boundary: adapter faults (missing interpreter,
/// spawn error) become a failing [`ExecutionOutcome`] with the fault text
/// standing in for stderr. Duration is measured for failing and passing runs
/// alike.
pub fn execute_program<S: Sandbox>(
    sandbox: &S,
    request: &RunRequest,
    marker: &str,
) -> ExecutionOutcome {
    match sandbox.run(request) {
        Ok(run) => classify_run(run, marker),
        Err(err) => {
            warn!(err = %err, "sandbox fault treated as failing run");
            ExecutionOutcome::from_fault(&format!("{err:#}"))
        }
    }
}
