use crate::error::BenchError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const DEFAULT_CONFIG_FILE: &str = "frbench.toml";
pub const DEFAULT_ATTEMPTS: u32 = 3;

/// How the model is asked to deliver its changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptMode {
    /// Whole files in one fenced block with start/end markers.
    #[default]
    Write,
    /// A unified diff applied with the patch tool.
    Patch,
}

impl fmt::Display for PromptMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Write => "write",
            Self::Patch => "patch",
        })
    }
}

impl FromStr for PromptMode {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "write" => Ok(Self::Write),
            "patch" => Ok(Self::Patch),
            other => Err(BenchError::Setup(format!("unknown prompt mode '{}'", other))),
        }
    }
}

/// Settings of one benchmark run, usually read from `frbench.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    pub models: Vec<String>,
    /// Template directory names. Empty means every template found.
    pub projects: Vec<String>,
    /// Attempt budget per requirement.
    pub k: u32,
    pub temperature: f64,
    pub use_cache: bool,
    pub use_history: bool,
    pub mode: PromptMode,
    pub templates_dir: PathBuf,
    pub workspace_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub out_dir: PathBuf,
    /// Wait for a key press between attempts.
    pub interactive: bool,
    /// Copy the final workspace of every (model, project) pair into the run directory.
    pub snapshots: bool,
    /// Test command, run inside the workspace. Exit code 0 means pass.
    pub oracle: Vec<String>,
    pub trace_dir: Option<PathBuf>,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            models: Vec::new(),
            projects: Vec::new(),
            k: DEFAULT_ATTEMPTS,
            temperature: 0.0,
            use_cache: true,
            use_history: false,
            mode: PromptMode::Write,
            templates_dir: PathBuf::from("templates"),
            workspace_dir: PathBuf::from("app"),
            cache_dir: PathBuf::from("cache"),
            out_dir: PathBuf::from("out"),
            interactive: false,
            snapshots: false,
            oracle: vec!["go".into(), "test".into(), "./...".into()],
            trace_dir: None,
        }
    }
}

impl BenchConfig {
    pub fn load(path: &Path) -> Result<Self, BenchError> {
        let content = std::fs::read_to_string(path)?;
        let config: BenchConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read `path` when it exists, defaults otherwise.
    pub fn load_or_default(path: &Path) -> Result<Self, BenchError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), BenchError> {
        if self.k == 0 {
            return Err(BenchError::Setup("k must be at least 1".into()));
        }
        if self.oracle.is_empty() {
            return Err(BenchError::Setup("oracle command is empty".into()));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(BenchError::Setup(format!(
                "temperature {} outside 0.0..=2.0",
                self.temperature
            )));
        }
        Ok(())
    }
}
