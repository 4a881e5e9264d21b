//! Test-only scripted adapters for driving the pipeline without network or
//! subprocess access.

use std::cell::RefCell;
use std::collections::VecDeque;

use anyhow::{Result, anyhow};

use crate::core::outcome::SandboxRun;
use crate::io::analyzer::{Analyzer, LintReport, LintRequest};
use crate::io::generator::{GenerateRequest, Generator};
use crate::io::sandbox::{RunRequest, Sandbox};

/// Generator that replays a fixed sequence of responses and records every
/// prompt it was asked.
pub struct ScriptedGenerator {
    responses: RefCell<VecDeque<Result<String>>>,
    prompts: RefCell<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new(responses: Vec<Result<String>>) -> Self {
        Self {
            responses: RefCell::new(responses.into()),
            prompts: RefCell::new(Vec::new()),
        }
    }

    /// Prompts seen so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.borrow().clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts.borrow().len()
    }
}

impl Generator for ScriptedGenerator {
    fn generate(&self, request: &GenerateRequest) -> Result<String> {
        self.prompts.borrow_mut().push(request.prompt.clone());
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(anyhow!("no scripted response left")))
    }
}

/// One scripted sandbox observation.
pub enum ScriptedRun {
    Run(SandboxRun),
    Fault(String),
}

/// Sandbox that replays a fixed sequence of runs.
pub struct ScriptedSandbox {
    runs: RefCell<VecDeque<ScriptedRun>>,
}

impl ScriptedSandbox {
    pub fn new(runs: Vec<ScriptedRun>) -> Self {
        Self {
            runs: RefCell::new(runs.into()),
        }
    }
}

impl Sandbox for ScriptedSandbox {
    fn run(&self, _request: &RunRequest) -> Result<SandboxRun> {
        match self.runs.borrow_mut().pop_front() {
            Some(ScriptedRun::Run(run)) => Ok(run),
            Some(ScriptedRun::Fault(msg)) => Err(anyhow!(msg)),
            None => Err(anyhow!("no scripted run left")),
        }
    }
}

/// Analyzer that replays a fixed sequence of reports.
pub struct ScriptedAnalyzer {
    reports: RefCell<VecDeque<Result<LintReport>>>,
    calls: RefCell<usize>,
}

impl ScriptedAnalyzer {
    pub fn new(reports: Vec<Result<LintReport>>) -> Self {
        Self {
            reports: RefCell::new(reports.into()),
            calls: RefCell::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.borrow()
    }
}

impl Analyzer for ScriptedAnalyzer {
    fn analyze(&self, _request: &LintRequest) -> Result<LintReport> {
        *self.calls.borrow_mut() += 1;
        self.reports
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(anyhow!("no scripted report left")))
    }
}

/// A run that exited cleanly and printed the marker.
pub fn passing_run(marker: &str, elapsed_ms: u64) -> SandboxRun {
    SandboxRun {
        exit_code: Some(0),
        exit_success: true,
        stdout: format!("{marker}\n"),
        stderr: String::new(),
        timed_out: false,
        elapsed_ms,
    }
}

/// A run that crashed with the given stderr text.
pub fn crashing_run(stderr: &str) -> SandboxRun {
    SandboxRun {
        exit_code: Some(1),
        exit_success: false,
        stdout: String::new(),
        stderr: stderr.to_string(),
        timed_out: false,
        elapsed_ms: 5,
    }
}

/// A run that exited cleanly without printing the marker.
pub fn silent_run() -> SandboxRun {
    SandboxRun {
        exit_code: Some(0),
        exit_success: true,
        stdout: String::new(),
        stderr: String::new(),
        timed_out: false,
        elapsed_ms: 5,
    }
}

/// A clean lint report.
pub fn clean_report() -> LintReport {
    LintReport {
        findings: "Your code has been rated at 10.00/10\n".to_string(),
        clean: true,
    }
}

/// A lint report with findings.
pub fn dirty_report(findings: &str) -> LintReport {
    LintReport {
        findings: findings.to_string(),
        clean: false,
    }
}
