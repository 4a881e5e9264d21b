//! Static analysis adapter keyed off a maximum-score phrase.
//!
//! The production backend is `pylint`; a report is clean when the analyzer
//! prints the configured maximum-score phrase or produces no findings at
//! all. Tests use scripted analyzers that return predetermined reports.

use std::path::PathBuf;
use std::process::Command;
use std::sync::LazyLock;
use std::time::Duration;

use anyhow::{Result, anyhow};
use tracing::{debug, instrument};

use crate::config::AnalyzerConfig;
use crate::io::process::run_command_with_timeout;

/// Parameters for one analysis run.
#[derive(Debug, Clone)]
pub struct LintRequest {
    /// Path of the program file to analyze.
    pub program: PathBuf,
    /// Maximum time to wait before killing the analyzer.
    pub timeout: Duration,
    /// Truncate captured analyzer output beyond this many bytes.
    pub output_limit_bytes: usize,
}

/// Findings report from one analysis run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintReport {
    /// Raw findings text, embedded verbatim in fix prompts.
    pub findings: String,
    /// True iff the maximum quality score was reported or there were no
    /// findings.
    pub clean: bool,
}

/// Abstraction over static analysis backends.
pub trait Analyzer {
    fn analyze(&self, request: &LintRequest) -> Result<LintReport>;
}

/// Analyzer that spawns the configured lint command on the program file.
pub struct PylintAnalyzer {
    command: Vec<String>,
    clean_phrase: String,
}

impl PylintAnalyzer {
    pub fn from_config(cfg: &AnalyzerConfig) -> Self {
        Self {
            command: cfg.command.clone(),
            clean_phrase: cfg.clean_phrase.clone(),
        }
    }
}

impl Analyzer for PylintAnalyzer {
    #[instrument(skip_all, fields(program = %request.program.display()))]
    fn analyze(&self, request: &LintRequest) -> Result<LintReport> {
        if self.command.is_empty() {
            return Err(anyhow!("analyzer command is empty"));
        }
        let mut cmd = Command::new(&self.command[0]);
        cmd.args(&self.command[1..]).arg(&request.program);

        let output = run_command_with_timeout(cmd, request.timeout, request.output_limit_bytes)?;
        if output.timed_out {
            return Err(anyhow!(
                "analysis timed out after {:?}",
                request.timeout
            ));
        }

        let findings = format!(
            "{}{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        let report = classify_report(&findings, output.status.success(), &self.clean_phrase);
        if let Some(score) = extract_score(&findings) {
            debug!(score, clean = report.clean, "analysis completed");
        }
        Ok(report)
    }
}

/// Classify raw analyzer output into a [`LintReport`].
///
/// Clean iff the output contains the maximum-score phrase, or the analyzer
/// exited successfully without printing any findings.
pub fn classify_report(findings: &str, exit_success: bool, clean_phrase: &str) -> LintReport {
    let clean = findings.contains(clean_phrase) || (exit_success && findings.trim().is_empty());
    LintReport {
        findings: findings.to_string(),
        clean,
    }
}

/// Extract the numeric quality score from a pylint-style rating line.
fn extract_score(findings: &str) -> Option<f64> {
    static SCORE_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
        regex::Regex::new(r"rated at (-?\d+(?:\.\d+)?)/10").unwrap()
    });
    SCORE_RE
        .captures(findings)?
        .get(1)?
        .as_str()
        .parse()
        .ok()
}
