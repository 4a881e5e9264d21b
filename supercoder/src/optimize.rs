//! Faster-candidate trial for an accepted program.
//!
//! Runs only after the solve loop succeeded. The candidate is trialed under
//! a disposable artifact identity and never touches the accepted program
//! until it has independently passed and measured strictly faster. A failing
//! or slower candidate is a neutral outcome, not an error, and never
//! re-enters the repair path.

use anyhow::Result;
use tracing::{info, instrument, warn};

use crate::config::PipelineConfig;
use crate::core::extract::extract_code;
use crate::core::outcome::ExecutionOutcome;
use crate::io::artifact::ArtifactStore;
use crate::io::generator::{GenerateRequest, Generator};
use crate::io::sandbox::{RunRequest, Sandbox, execute_program};
use crate::prompt::{PromptSet, SYSTEM_INSTRUCTION};

/// Result of one optimization trial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimizeOutcome {
    /// The candidate replaced the accepted program.
    pub accepted: bool,
    /// Measured candidate duration, when a candidate was executed.
    pub candidate_ms: Option<u64>,
    /// Best known duration after the trial (baseline unless accepted).
    pub best_ms: u64,
}

impl OptimizeOutcome {
    fn rejected(baseline_ms: u64, candidate_ms: Option<u64>) -> Self {
        Self {
            accepted: false,
            candidate_ms,
            best_ms: baseline_ms,
        }
    }
}

/// Request a faster variant and accept it only on strict improvement.
///
/// Acceptance requires the candidate to pass the same marker check as the
/// solve loop AND measure strictly under the baseline; ties are rejected.
/// The disposable slot is removed on every path before returning.
#[instrument(skip_all, fields(baseline_ms))]
pub fn run_optimize<G: Generator, S: Sandbox>(
    generator: &G,
    sandbox: &S,
    store: &ArtifactStore,
    prompts: &PromptSet,
    cfg: &PipelineConfig,
    problem: &str,
    baseline_ms: u64,
) -> Result<OptimizeOutcome> {
    let baseline_code = store.read(&cfg.artifact)?;
    let prompt = prompts.optimize(problem, &baseline_code, baseline_ms, &cfg.success_marker);

    let raw = match generator.generate(&GenerateRequest {
        system_instruction: SYSTEM_INSTRUCTION.to_string(),
        prompt,
    }) {
        Ok(raw) => raw,
        Err(err) => {
            info!(err = %err, "no optimization candidate, keeping baseline");
            return Ok(OptimizeOutcome::rejected(baseline_ms, None));
        }
    };
    let candidate = extract_code(&raw);

    let trial = (|| -> Result<ExecutionOutcome> {
        let program = store.write(&cfg.candidate_artifact, &candidate)?;
        Ok(execute_program(
            sandbox,
            &RunRequest {
                program,
                timeout: cfg.execution_timeout(),
                output_limit_bytes: cfg.output_limit_bytes,
            },
            &cfg.success_marker,
        ))
    })();
    // The disposable slot is cleaned up before the trial result is even
    // inspected, so no path leaks it.
    store.remove(&cfg.candidate_artifact)?;

    let outcome = match trial {
        Ok(outcome) => outcome,
        Err(err) => {
            warn!(err = %err, "candidate trial aborted, keeping baseline");
            return Ok(OptimizeOutcome::rejected(baseline_ms, None));
        }
    };

    if outcome.passed && outcome.elapsed_ms < baseline_ms {
        store.write(&cfg.artifact, &candidate)?;
        info!(
            candidate_ms = outcome.elapsed_ms,
            "candidate accepted, program replaced"
        );
        return Ok(OptimizeOutcome {
            accepted: true,
            candidate_ms: Some(outcome.elapsed_ms),
            best_ms: outcome.elapsed_ms,
        });
    }

    info!(
        candidate_ms = outcome.elapsed_ms,
        passed = outcome.passed,
        "candidate rejected, keeping baseline"
    );
    Ok(OptimizeOutcome::rejected(
        baseline_ms,
        Some(outcome.elapsed_ms),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ScriptedGenerator, ScriptedRun, ScriptedSandbox, passing_run};

    fn setup(baseline_code: &str) -> (tempfile::TempDir, ArtifactStore, PipelineConfig) {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = ArtifactStore::new(temp.path());
        let cfg = PipelineConfig::default();
        store.write(&cfg.artifact, baseline_code).expect("seed");
        (temp, store, cfg)
    }

    #[test]
    fn faster_passing_candidate_is_accepted() {
        let (_temp, store, cfg) = setup("slow = True");
        let generator = ScriptedGenerator::new(vec![Ok("fast = True".to_string())]);
        let sandbox = ScriptedSandbox::new(vec![ScriptedRun::Run(passing_run(
            "ALL TESTS PASSED",
            95,
        ))]);
        let prompts = PromptSet::new();

        let outcome = run_optimize(&generator, &sandbox, &store, &prompts, &cfg, "problem", 120)
            .expect("optimize");

        assert!(outcome.accepted);
        assert_eq!(outcome.best_ms, 95);
        assert!(store.read(&cfg.artifact).expect("read").contains("fast"));
        assert!(!store.exists(&cfg.candidate_artifact));
    }

    #[test]
    fn slower_candidate_is_rejected_and_baseline_kept() {
        let (_temp, store, cfg) = setup("slow = True");
        let generator = ScriptedGenerator::new(vec![Ok("slower = True".to_string())]);
        let sandbox = ScriptedSandbox::new(vec![ScriptedRun::Run(passing_run(
            "ALL TESTS PASSED",
            130,
        ))]);
        let prompts = PromptSet::new();

        let outcome = run_optimize(&generator, &sandbox, &store, &prompts, &cfg, "problem", 120)
            .expect("optimize");

        assert!(!outcome.accepted);
        assert_eq!(outcome.best_ms, 120);
        assert_eq!(outcome.candidate_ms, Some(130));
        assert!(store.read(&cfg.artifact).expect("read").contains("slow"));
        assert!(!store.exists(&cfg.candidate_artifact));
    }

    #[test]
    fn equal_duration_is_rejected() {
        let (_temp, store, cfg) = setup("slow = True");
        let generator = ScriptedGenerator::new(vec![Ok("same = True".to_string())]);
        let sandbox = ScriptedSandbox::new(vec![ScriptedRun::Run(passing_run(
            "ALL TESTS PASSED",
            120,
        ))]);
        let prompts = PromptSet::new();

        let outcome = run_optimize(&generator, &sandbox, &store, &prompts, &cfg, "problem", 120)
            .expect("optimize");

        assert!(!outcome.accepted);
        assert!(store.read(&cfg.artifact).expect("read").contains("slow"));
    }

    #[test]
    fn failing_candidate_is_rejected_even_if_faster() {
        let (_temp, store, cfg) = setup("slow = True");
        let generator = ScriptedGenerator::new(vec![Ok("broken = True".to_string())]);
        let sandbox = ScriptedSandbox::new(vec![ScriptedRun::Run(
            crate::test_support::crashing_run("Traceback: boom"),
        )]);
        let prompts = PromptSet::new();

        let outcome = run_optimize(&generator, &sandbox, &store, &prompts, &cfg, "problem", 120)
            .expect("optimize");

        assert!(!outcome.accepted);
        assert!(store.read(&cfg.artifact).expect("read").contains("slow"));
    }

    #[test]
    fn generation_failure_keeps_baseline_without_executing() {
        let (_temp, store, cfg) = setup("slow = True");
        let generator = ScriptedGenerator::new(vec![Err(anyhow::anyhow!("timeout"))]);
        let sandbox = ScriptedSandbox::new(vec![]);
        let prompts = PromptSet::new();

        let outcome = run_optimize(&generator, &sandbox, &store, &prompts, &cfg, "problem", 120)
            .expect("optimize");

        assert!(!outcome.accepted);
        assert_eq!(outcome.candidate_ms, None);
        assert!(store.read(&cfg.artifact).expect("read").contains("slow"));
    }

    #[test]
    fn disposable_slot_is_removed_even_on_sandbox_fault() {
        let (_temp, store, cfg) = setup("slow = True");
        let generator = ScriptedGenerator::new(vec![Ok("candidate = True".to_string())]);
        let sandbox = ScriptedSandbox::new(vec![ScriptedRun::Fault("sandbox gone".to_string())]);
        let prompts = PromptSet::new();

        let outcome = run_optimize(&generator, &sandbox, &store, &prompts, &cfg, "problem", 120)
            .expect("optimize");

        // A sandbox fault classifies as a failing run, so the candidate is
        // simply rejected and the slot cleaned up.
        assert!(!outcome.accepted);
        assert!(!store.exists(&cfg.candidate_artifact));
    }
}
