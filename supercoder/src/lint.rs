//! Iterative lint repair for an accepted program.
//!
//! Runs strictly after optimization. Each cycle analyzes the current
//! program; findings are embedded in a fix prompt and the fixed source is
//! trialed before being promoted. The loop stops on the first clean report,
//! when the fix budget is exhausted, or as soon as the generation service
//! fails to return a fix.

use anyhow::Result;
use tracing::{info, instrument, warn};

use crate::config::PipelineConfig;
use crate::core::extract::extract_code;
use crate::core::outcome::ExecutionOutcome;
use crate::io::analyzer::{Analyzer, LintRequest};
use crate::io::artifact::ArtifactStore;
use crate::io::generator::{GenerateRequest, Generator};
use crate::io::sandbox::{RunRequest, Sandbox, execute_program};
use crate::prompt::{PromptSet, SYSTEM_INSTRUCTION};

/// Drive the analyze → fix → re-check cycle until clean or exhausted.
///
/// Returns true iff the last observed report was clean. Every fix is
/// re-verified by executing it in the disposable slot before promotion; a
/// fix that no longer passes its tests is discarded and the loop stops with
/// the accepted program untouched.
#[instrument(skip_all, fields(fix_budget = cfg.lint_fix_attempts))]
pub fn run_lint_repair<G: Generator, S: Sandbox, A: Analyzer>(
    generator: &G,
    sandbox: &S,
    analyzer: &A,
    store: &ArtifactStore,
    prompts: &PromptSet,
    cfg: &PipelineConfig,
    problem: &str,
) -> Result<bool> {
    let mut fixes_used = 0u32;

    loop {
        let report = analyzer.analyze(&LintRequest {
            program: store.path(&cfg.artifact),
            timeout: cfg.analysis_timeout(),
            output_limit_bytes: cfg.output_limit_bytes,
        })?;
        if report.clean {
            info!(fixes_used, "analysis clean");
            return Ok(true);
        }
        if fixes_used == cfg.lint_fix_attempts {
            warn!(fixes_used, "fix budget exhausted with findings remaining");
            return Ok(false);
        }

        let code = store.read(&cfg.artifact)?;
        let prompt = prompts.lint_fix(problem, &code, &report.findings, &cfg.success_marker);
        fixes_used += 1;
        info!(fixes_used, "requesting lint fix");

        let raw = match generator.generate(&GenerateRequest {
            system_instruction: SYSTEM_INSTRUCTION.to_string(),
            prompt,
        }) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(err = %err, "no fix from generation service, stopping");
                return Ok(false);
            }
        };
        let fixed = extract_code(&raw);

        let trial = (|| -> Result<ExecutionOutcome> {
            let program = store.write(&cfg.candidate_artifact, &fixed)?;
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
        store.remove(&cfg.candidate_artifact)?;
        let outcome = trial?;

        if !outcome.passed {
            warn!("lint fix no longer passes its tests, discarding");
            return Ok(false);
        }
        store.write(&cfg.artifact, &fixed)?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        ScriptedAnalyzer, ScriptedGenerator, ScriptedRun, ScriptedSandbox, clean_report,
        crashing_run, dirty_report, passing_run,
    };

    fn setup(code: &str) -> (tempfile::TempDir, ArtifactStore, PipelineConfig) {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = ArtifactStore::new(temp.path());
        let cfg = PipelineConfig::default();
        store.write(&cfg.artifact, code).expect("seed");
        (temp, store, cfg)
    }

    #[test]
    fn clean_first_check_requests_no_fix() {
        let (_temp, store, cfg) = setup("x = 1");
        let generator = ScriptedGenerator::new(vec![]);
        let sandbox = ScriptedSandbox::new(vec![]);
        let analyzer = ScriptedAnalyzer::new(vec![Ok(clean_report())]);
        let prompts = PromptSet::new();

        let clean = run_lint_repair(
            &generator, &sandbox, &analyzer, &store, &prompts, &cfg, "problem",
        )
        .expect("lint");

        assert!(clean);
        assert_eq!(generator.calls(), 0);
        assert_eq!(analyzer.calls(), 1);
    }

    #[test]
    fn fix_is_verified_promoted_and_rechecked() {
        let (_temp, store, cfg) = setup("x=1");
        let generator = ScriptedGenerator::new(vec![Ok("x = 1".to_string())]);
        let sandbox = ScriptedSandbox::new(vec![ScriptedRun::Run(passing_run(
            "ALL TESTS PASSED",
            10,
        ))]);
        let analyzer = ScriptedAnalyzer::new(vec![
            Ok(dirty_report("C0326: bad whitespace")),
            Ok(clean_report()),
        ]);
        let prompts = PromptSet::new();

        let clean = run_lint_repair(
            &generator, &sandbox, &analyzer, &store, &prompts, &cfg, "problem",
        )
        .expect("lint");

        assert!(clean);
        assert_eq!(generator.calls(), 1);
        assert_eq!(analyzer.calls(), 2);
        assert!(generator.prompts()[0].contains("C0326"));
        assert_eq!(store.read(&cfg.artifact).expect("read"), "x = 1\n");
        assert!(!store.exists(&cfg.candidate_artifact));
    }

    #[test]
    fn generation_failure_stops_immediately() {
        let (_temp, store, cfg) = setup("x=1");
        let generator = ScriptedGenerator::new(vec![Err(anyhow::anyhow!("unavailable"))]);
        let sandbox = ScriptedSandbox::new(vec![]);
        let analyzer = ScriptedAnalyzer::new(vec![Ok(dirty_report("C0114"))]);
        let prompts = PromptSet::new();

        let clean = run_lint_repair(
            &generator, &sandbox, &analyzer, &store, &prompts, &cfg, "problem",
        )
        .expect("lint");

        assert!(!clean);
        assert_eq!(analyzer.calls(), 1);
        assert_eq!(generator.calls(), 1);
    }

    #[test]
    fn fix_that_breaks_tests_is_discarded() {
        let (_temp, store, cfg) = setup("original = True");
        let generator = ScriptedGenerator::new(vec![Ok("broken = True".to_string())]);
        let sandbox = ScriptedSandbox::new(vec![ScriptedRun::Run(crashing_run(
            "AssertionError",
        ))]);
        let analyzer = ScriptedAnalyzer::new(vec![Ok(dirty_report("C0114"))]);
        let prompts = PromptSet::new();

        let clean = run_lint_repair(
            &generator, &sandbox, &analyzer, &store, &prompts, &cfg, "problem",
        )
        .expect("lint");

        assert!(!clean);
        assert!(store.read(&cfg.artifact).expect("read").contains("original"));
        assert!(!store.exists(&cfg.candidate_artifact));
    }

    #[test]
    fn fix_budget_bounds_the_loop() {
        let (_temp, store, cfg) = setup("x=1");
        let generator = ScriptedGenerator::new(vec![
            Ok("x =1".to_string()),
            Ok("x= 1".to_string()),
            Ok("x=1 ".to_string()),
        ]);
        let sandbox = ScriptedSandbox::new(vec![
            ScriptedRun::Run(passing_run("ALL TESTS PASSED", 10)),
            ScriptedRun::Run(passing_run("ALL TESTS PASSED", 10)),
            ScriptedRun::Run(passing_run("ALL TESTS PASSED", 10)),
        ]);
        let analyzer = ScriptedAnalyzer::new(vec![
            Ok(dirty_report("finding 1")),
            Ok(dirty_report("finding 2")),
            Ok(dirty_report("finding 3")),
            Ok(dirty_report("finding 4")),
        ]);
        let prompts = PromptSet::new();

        let clean = run_lint_repair(
            &generator, &sandbox, &analyzer, &store, &prompts, &cfg, "problem",
        )
        .expect("lint");

        assert!(!clean);
        // Three fix requests, four analysis runs: the budget bounds fixes,
        // not checks.
        assert_eq!(generator.calls(), 3);
        assert_eq!(analyzer.calls(), 4);
    }
}
