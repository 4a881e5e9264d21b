//! Pipeline configuration stored as a TOML file (default `supercoder.toml`).

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Pipeline configuration (TOML).
///
/// This file is intended to be edited by humans and must remain stable and
/// automatable. Missing fields default to sensible values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PipelineConfig {
    /// Maximum generate/execute attempts before giving up on the problem.
    pub max_attempts: u32,

    /// Maximum lint fix requests before giving up on a clean report.
    pub lint_fix_attempts: u32,

    /// Literal line the generated program must print when its embedded tests
    /// pass. This string is the success protocol between the standing prompt
    /// instruction and the outcome classifier; it must not collide with
    /// ordinary program output.
    pub success_marker: String,

    /// Name of the artifact slot holding the accepted program.
    pub artifact: String,

    /// Name of the disposable slot used to trial candidates.
    pub candidate_artifact: String,

    /// Truncate captured process stdout/stderr beyond this many bytes.
    pub output_limit_bytes: usize,

    pub generator: GeneratorConfig,
    pub sandbox: SandboxConfig,
    pub analyzer: AnalyzerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Model identifier sent with every request.
    pub model: String,

    /// Base URL of the OpenAI-compatible chat completions endpoint.
    pub base_url: String,

    /// Environment variable holding the API key.
    pub api_key_env: String,

    /// Wall-clock budget for a single generation request in seconds.
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SandboxConfig {
    /// Interpreter command the generated program is run with
    /// (e.g. `["python3"]`).
    pub command: Vec<String>,

    /// Wall-clock budget for a single program execution in seconds.
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Lint command run against the program (e.g. `["pylint"]`).
    pub command: Vec<String>,

    /// Phrase the analyzer prints when the maximum quality score is reached.
    pub clean_phrase: String,

    /// Wall-clock budget for a single analysis run in seconds.
    pub timeout_secs: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 120,
        }
    }
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            command: vec!["python3".to_string()],
            timeout_secs: 60,
        }
    }
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            command: vec!["pylint".to_string()],
            clean_phrase: "rated at 10.00/10".to_string(),
            timeout_secs: 60,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            lint_fix_attempts: 3,
            success_marker: "ALL TESTS PASSED".to_string(),
            artifact: "generatedcode.py".to_string(),
            candidate_artifact: "candidate.py".to_string(),
            output_limit_bytes: 100_000,
            generator: GeneratorConfig::default(),
            sandbox: SandboxConfig::default(),
            analyzer: AnalyzerConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(anyhow!("max_attempts must be > 0"));
        }
        if self.success_marker.trim().is_empty() {
            return Err(anyhow!("success_marker must be non-empty"));
        }
        if self.artifact.trim().is_empty() || self.candidate_artifact.trim().is_empty() {
            return Err(anyhow!("artifact names must be non-empty"));
        }
        if self.artifact == self.candidate_artifact {
            return Err(anyhow!(
                "artifact and candidate_artifact must name distinct slots"
            ));
        }
        if self.output_limit_bytes == 0 {
            return Err(anyhow!("output_limit_bytes must be > 0"));
        }
        if self.generator.timeout_secs == 0
            || self.sandbox.timeout_secs == 0
            || self.analyzer.timeout_secs == 0
        {
            return Err(anyhow!("timeouts must be > 0"));
        }
        if self.sandbox.command.is_empty() || self.sandbox.command[0].trim().is_empty() {
            return Err(anyhow!("sandbox.command must be a non-empty array"));
        }
        if self.analyzer.command.is_empty() || self.analyzer.command[0].trim().is_empty() {
            return Err(anyhow!("analyzer.command must be a non-empty array"));
        }
        Ok(())
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generator.timeout_secs)
    }

    pub fn execution_timeout(&self) -> Duration {
        Duration::from_secs(self.sandbox.timeout_secs)
    }

    pub fn analysis_timeout(&self) -> Duration {
        Duration::from_secs(self.analyzer.timeout_secs)
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `PipelineConfig::default()`.
pub fn load_config(path: &Path) -> Result<PipelineConfig> {
    if !path.exists() {
        let cfg = PipelineConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: PipelineConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &PipelineConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, PipelineConfig::default());
    }

    #[test]
    fn write_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("supercoder.toml");
        let cfg = PipelineConfig::default();
        write_config(&path, &cfg).expect("write");
        let loaded = load_config(&path).expect("load");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn validate_rejects_shared_artifact_slot() {
        let cfg = PipelineConfig {
            candidate_artifact: "generatedcode.py".to_string(),
            ..PipelineConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_attempts() {
        let cfg = PipelineConfig {
            max_attempts: 0,
            ..PipelineConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
