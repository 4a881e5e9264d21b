//! Full pipeline driver: solve → optimize → lint, strictly sequential.
//!
//! Each phase fully completes (including its blocking service call or
//! sandbox run) before the next begins; no two external calls are ever in
//! flight at once. Overall success is the solve phase's success; the later
//! phases improve the accepted program best-effort, and their resource
//! faults are logged and folded into neutral outcomes. Whatever the pipeline
//! reached stays on disk, even on overall failure.

use tracing::{error, info, instrument, warn};

use crate::config::PipelineConfig;
use crate::io::analyzer::Analyzer;
use crate::io::artifact::ArtifactStore;
use crate::io::generator::Generator;
use crate::io::sandbox::Sandbox;
use crate::lint::run_lint_repair;
use crate::optimize::run_optimize;
use crate::prompt::PromptSet;
use crate::solve::{SolveStop, run_solve};

/// Final report for one pipeline invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    /// The solve phase produced a passing program.
    pub solved: bool,
    /// Attempts consumed by the solve phase.
    pub attempts: u32,
    /// Duration of the first passing run.
    pub baseline_ms: Option<u64>,
    /// An optimization candidate was accepted.
    pub optimized: bool,
    /// Best measured duration after optimization.
    pub best_ms: Option<u64>,
    /// Lint verdict, `None` when the solve phase failed.
    pub lint_clean: Option<bool>,
}

impl PipelineReport {
    fn unsolved(attempts: u32) -> Self {
        Self {
            solved: false,
            attempts,
            baseline_ms: None,
            optimized: false,
            best_ms: None,
            lint_clean: None,
        }
    }
}

/// Run all phases for one problem statement.
#[instrument(skip_all)]
pub fn run_pipeline<G: Generator, S: Sandbox, A: Analyzer>(
    generator: &G,
    sandbox: &S,
    analyzer: &A,
    store: &ArtifactStore,
    cfg: &PipelineConfig,
    problem: &str,
) -> PipelineReport {
    let prompts = PromptSet::new();

    let solve_outcome = match run_solve(generator, sandbox, store, &prompts, cfg, problem) {
        Ok(outcome) => outcome,
        Err(err) => {
            error!(err = %err, "solve phase aborted by resource fault");
            return PipelineReport::unsolved(0);
        }
    };

    let baseline_ms = match solve_outcome.stop {
        SolveStop::Solved { baseline_ms } => baseline_ms,
        SolveStop::Exhausted => {
            info!(attempts = solve_outcome.attempts, "attempt budget exhausted");
            return PipelineReport::unsolved(solve_outcome.attempts);
        }
    };

    let optimize_outcome = match run_optimize(
        generator, sandbox, store, &prompts, cfg, problem, baseline_ms,
    ) {
        Ok(outcome) => outcome,
        Err(err) => {
            warn!(err = %err, "optimization phase aborted, keeping baseline");
            crate::optimize::OptimizeOutcome {
                accepted: false,
                candidate_ms: None,
                best_ms: baseline_ms,
            }
        }
    };

    let lint_clean = match run_lint_repair(
        generator, sandbox, analyzer, store, &prompts, cfg, problem,
    ) {
        Ok(clean) => clean,
        Err(err) => {
            warn!(err = %err, "lint phase aborted, findings unresolved");
            false
        }
    };

    PipelineReport {
        solved: true,
        attempts: solve_outcome.attempts,
        baseline_ms: Some(baseline_ms),
        optimized: optimize_outcome.accepted,
        best_ms: Some(optimize_outcome.best_ms),
        lint_clean: Some(lint_clean),
    }
}
