//! Prompt construction for every pipeline phase.
//!
//! Templates are embedded at compile time and rendered with minijinja. The
//! standing self-test instruction (unit tests + success marker) appears only
//! in the initial template; retry prompts replace it with the previous code
//! and failure reason.

use minijinja::{Environment, context};

const INITIAL_TEMPLATE: &str = include_str!("prompts/initial.md");
const REPAIR_TEMPLATE: &str = include_str!("prompts/repair.md");
const OPTIMIZE_TEMPLATE: &str = include_str!("prompts/optimize.md");
const LINT_FIX_TEMPLATE: &str = include_str!("prompts/lint_fix.md");

/// Fixed role instruction sent with every generation call.
pub const SYSTEM_INSTRUCTION: &str = "You are a python programmer who can create a python program \
     to solve a problem. Do not write any explanations, just show me the code itself.";

/// Template engine wrapper around minijinja.
pub struct PromptSet {
    env: Environment<'static>,
}

impl PromptSet {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.add_template("initial", INITIAL_TEMPLATE)
            .expect("initial template should be valid");
        env.add_template("repair", REPAIR_TEMPLATE)
            .expect("repair template should be valid");
        env.add_template("optimize", OPTIMIZE_TEMPLATE)
            .expect("optimize template should be valid");
        env.add_template("lint_fix", LINT_FIX_TEMPLATE)
            .expect("lint_fix template should be valid");
        Self { env }
    }

    /// First-attempt prompt: problem plus the standing self-test instruction.
    pub fn initial(&self, problem: &str, marker: &str) -> String {
        self.render("initial", context! { problem, marker })
    }

    /// Retry prompt embedding the immediately preceding code and failure
    /// reason. The code section is omitted when no code was ever produced
    /// (generation failed on the very first attempt).
    pub fn repair(&self, problem: &str, code: Option<&str>, failure: &str, marker: &str) -> String {
        self.render("repair", context! { problem, code, failure, marker })
    }

    /// Optimization prompt embedding the baseline source and its measured
    /// duration.
    pub fn optimize(&self, problem: &str, code: &str, baseline_ms: u64, marker: &str) -> String {
        self.render("optimize", context! { problem, code, baseline_ms, marker })
    }

    /// Lint fix prompt embedding the findings and the current source.
    pub fn lint_fix(&self, problem: &str, code: &str, findings: &str, marker: &str) -> String {
        self.render("lint_fix", context! { problem, code, findings, marker })
    }

    fn render(&self, name: &str, ctx: minijinja::Value) -> String {
        let template = self
            .env
            .get_template(name)
            .expect("embedded template should be registered");
        template
            .render(ctx)
            .expect("template rendering should not fail")
    }
}

impl Default for PromptSet {
    fn default() -> Self {
        Self::new()
    }
}
