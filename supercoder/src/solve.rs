//! Bounded generate → execute → repair loop.
//!
//! Each attempt asks the generation service for a program, persists it to
//! the main artifact slot, runs it in the sandbox, and classifies the
//! result. Failures never escape an attempt: they become the feedback
//! embedded in the next repair prompt. Only the latest attempt's code and
//! failure reason are retained, which bounds memory and defines the feedback
//! signal precisely.

use anyhow::Result;
use tracing::{info, instrument, warn};

use crate::config::PipelineConfig;
use crate::core::extract::extract_code;
use crate::core::outcome::TESTS_NOT_CONFIRMED_REASON;
use crate::io::artifact::ArtifactStore;
use crate::io::generator::{GenerateRequest, Generator};
use crate::io::sandbox::{RunRequest, Sandbox, execute_program};
use crate::prompt::{PromptSet, SYSTEM_INSTRUCTION};

/// Failure reason recorded when the generation service returns nothing.
pub const GENERATION_FAILURE_REASON: &str = "Failed to get response from GPT";

/// Reason why the solve loop stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveStop {
    /// The program exited cleanly and printed the success marker.
    Solved {
        /// Measured duration of the passing run, the optimization baseline.
        baseline_ms: u64,
    },
    /// The attempt budget was exhausted without a passing run.
    Exhausted,
}

/// Summary of a solve invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolveOutcome {
    /// Generation calls performed (one per attempt consumed).
    pub attempts: u32,
    pub stop: SolveStop,
}

/// The latest attempt's code and failure reason. This is the entire context
/// carried into the next repair prompt; earlier attempts are discarded.
#[derive(Debug, Clone)]
struct Feedback {
    code: Option<String>,
    reason: String,
}

/// Run the attempt loop until a program passes or the budget is exhausted.
///
/// The first prompt carries the standing self-test instruction; every retry
/// uses a repair prompt embedding the previous code and failure instead. A
/// generation failure consumes an attempt like any other failure. Resource
/// faults (artifact writes) propagate as `Err`.
#[instrument(skip_all, fields(max_attempts = cfg.max_attempts))]
pub fn run_solve<G: Generator, S: Sandbox>(
    generator: &G,
    sandbox: &S,
    store: &ArtifactStore,
    prompts: &PromptSet,
    cfg: &PipelineConfig,
    problem: &str,
) -> Result<SolveOutcome> {
    let mut feedback: Option<Feedback> = None;

    for attempt in 1..=cfg.max_attempts {
        let prompt = match &feedback {
            None => prompts.initial(problem, &cfg.success_marker),
            Some(fb) => prompts.repair(
                problem,
                fb.code.as_deref(),
                &fb.reason,
                &cfg.success_marker,
            ),
        };
        info!(attempt, retry = feedback.is_some(), "requesting program");

        let response = generator.generate(&GenerateRequest {
            system_instruction: SYSTEM_INSTRUCTION.to_string(),
            prompt,
        });
        let raw = match response {
            Ok(raw) => raw,
            Err(err) => {
                warn!(attempt, err = %err, "generation failed, consuming attempt");
                // Carry the previous code forward so the next repair prompt
                // still embeds the last program we actually saw.
                let code = feedback.take().and_then(|fb| fb.code);
                feedback = Some(Feedback {
                    code,
                    reason: GENERATION_FAILURE_REASON.to_string(),
                });
                continue;
            }
        };

        let code = extract_code(&raw);
        let program = store.write(&cfg.artifact, &code)?;
        let outcome = execute_program(
            sandbox,
            &RunRequest {
                program,
                timeout: cfg.execution_timeout(),
                output_limit_bytes: cfg.output_limit_bytes,
            },
            &cfg.success_marker,
        );

        if outcome.passed {
            info!(attempt, elapsed_ms = outcome.elapsed_ms, "program passed its tests");
            return Ok(SolveOutcome {
                attempts: attempt,
                stop: SolveStop::Solved {
                    baseline_ms: outcome.elapsed_ms,
                },
            });
        }

        let reason = outcome
            .failure_reason()
            .unwrap_or_else(|| TESTS_NOT_CONFIRMED_REASON.to_string());
        warn!(attempt, exit_code = ?outcome.exit_code, "attempt failed");
        feedback = Some(Feedback {
            code: Some(code),
            reason,
        });
    }

    Ok(SolveOutcome {
        attempts: cfg.max_attempts,
        stop: SolveStop::Exhausted,
    })
}
