//! Self-testing code generation pipeline CLI.
//!
//! Turns a natural-language problem statement into a working, progressively
//! improved program: generate → execute → repair until the embedded tests
//! pass, then trial a faster variant, then iterate on lint findings.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};

use supercoder::config::{PipelineConfig, load_config, write_config};
use supercoder::exit_codes;
use supercoder::io::analyzer::PylintAnalyzer;
use supercoder::io::artifact::ArtifactStore;
use supercoder::io::generator::OpenAiGenerator;
use supercoder::io::sandbox::InterpreterSandbox;
use supercoder::pipeline::{PipelineReport, run_pipeline};
use supercoder::problems::random_problem;

#[derive(Parser)]
#[command(
    name = "supercoder",
    version,
    about = "Self-testing code generation pipeline"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write the default config file.
    Init {
        /// Overwrite an existing config file.
        #[arg(short, long)]
        force: bool,
        /// Config path.
        #[arg(long, default_value = "supercoder.toml")]
        config: PathBuf,
    },
    /// Generate, test, and progressively improve a program.
    Run {
        /// Problem statement. A random built-in sample is used when omitted.
        problem: Option<String>,
        /// Read the problem statement from a file instead.
        #[arg(long, conflicts_with = "problem")]
        problem_file: Option<PathBuf>,
        /// Directory holding the generated artifacts.
        #[arg(long, default_value = ".")]
        workdir: PathBuf,
        /// Config path.
        #[arg(long, default_value = "supercoder.toml")]
        config: PathBuf,
        /// Override the configured attempt budget.
        #[arg(long)]
        max_attempts: Option<u32>,
    },
}

fn main() {
    supercoder::logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{err:#}");
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Init { force, config } => cmd_init(force, &config),
        Command::Run {
            problem,
            problem_file,
            workdir,
            config,
            max_attempts,
        } => cmd_run(problem, problem_file, &workdir, &config, max_attempts),
    }
}

fn cmd_init(force: bool, path: &Path) -> Result<i32> {
    if path.exists() && !force {
        return Err(anyhow!(
            "{} already exists (use --force to overwrite)",
            path.display()
        ));
    }
    write_config(path, &PipelineConfig::default())?;
    println!("wrote {}", path.display());
    Ok(exit_codes::OK)
}

fn cmd_run(
    problem: Option<String>,
    problem_file: Option<PathBuf>,
    workdir: &Path,
    config: &Path,
    max_attempts: Option<u32>,
) -> Result<i32> {
    let mut cfg = load_config(config)?;
    if let Some(n) = max_attempts {
        cfg.max_attempts = n;
        cfg.validate()?;
    }
    let problem = resolve_problem(problem, problem_file)?;

    let generator = OpenAiGenerator::from_config(&cfg.generator)?;
    let sandbox = InterpreterSandbox::from_config(&cfg.sandbox);
    let analyzer = PylintAnalyzer::from_config(&cfg.analyzer);
    let store = ArtifactStore::new(workdir);

    println!("Solving:\n{problem}\n");
    let report = run_pipeline(&generator, &sandbox, &analyzer, &store, &cfg, &problem);
    print_report(&report, &store.path(&cfg.artifact));

    if report.solved {
        Ok(exit_codes::OK)
    } else {
        Ok(exit_codes::UNSOLVED)
    }
}

fn resolve_problem(problem: Option<String>, problem_file: Option<PathBuf>) -> Result<String> {
    if let Some(text) = problem {
        let text = text.trim().to_string();
        if text.is_empty() {
            return Err(anyhow!("problem statement is empty"));
        }
        return Ok(text);
    }
    if let Some(path) = problem_file {
        let text = fs::read_to_string(&path)
            .with_context(|| format!("read problem file {}", path.display()))?;
        let text = text.trim().to_string();
        if text.is_empty() {
            return Err(anyhow!("problem file {} is empty", path.display()));
        }
        return Ok(text);
    }
    println!("No problem given, picking a built-in one.");
    Ok(random_problem().to_string())
}

fn print_report(report: &PipelineReport, artifact_path: &Path) {
    if !report.solved {
        println!(
            "No passing program after {} attempt(s). Last attempt kept at {}.",
            report.attempts,
            artifact_path.display()
        );
        return;
    }

    println!(
        "Passing program after {} attempt(s), baseline {} ms.",
        report.attempts,
        report.baseline_ms.unwrap_or(0)
    );
    if report.optimized {
        println!(
            "Optimization accepted: now {} ms.",
            report.best_ms.unwrap_or(0)
        );
    } else {
        println!("Optimization kept the baseline.");
    }
    match report.lint_clean {
        Some(true) => println!("Lint report clean."),
        _ => println!("Lint findings remain."),
    }
    println!("Program written to {}.", artifact_path.display());
}
