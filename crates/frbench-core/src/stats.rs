use crate::error::CoreError;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Timestamp format used for run directories and the stats header.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Outcome of one requirement for one (model, project) pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequirementStats {
    /// Accumulated USD spent on fresh (non-cached) responses.
    pub cost: f64,
    pub completed: bool,
    pub max_score: u32,
    /// Number of attempts made so far. Only ever grows.
    pub attempts: u32,
    /// Accumulated provider latency in milliseconds.
    pub duration_ms: u64,
}

impl RequirementStats {
    pub fn new(max_score: u32) -> Self {
        Self {
            max_score,
            ..Default::default()
        }
    }

    /// Start a new attempt and return its 1-based number.
    pub fn begin_attempt(&mut self) -> u32 {
        self.attempts += 1;
        self.attempts
    }

    /// Mark the current attempt as the one that passed verification.
    pub fn complete(&mut self) {
        self.completed = true;
    }

    /// Add the spend and latency of one fresh provider response.
    pub fn accrue(&mut self, cost: f64, latency: Duration) {
        self.cost += cost;
        self.duration_ms += latency.as_millis() as u64;
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

/// Per-requirement stats, index-aligned with the project's requirement list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectStats {
    pub requirements: Vec<RequirementStats>,
}

impl ProjectStats {
    /// One fresh entry per requirement, seeded with its max score.
    pub fn with_max_scores(scores: impl IntoIterator<Item = u32>) -> Self {
        Self {
            requirements: scores.into_iter().map(RequirementStats::new).collect(),
        }
    }

    pub fn completed_count(&self) -> usize {
        self.requirements.iter().filter(|r| r.completed).count()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelStats {
    pub projects: BTreeMap<String, ProjectStats>,
}

/// Root of the results tree written to `stats.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkStats {
    pub timestamp: String,
    pub models: BTreeMap<String, ModelStats>,
}

impl BenchmarkStats {
    pub fn new() -> Self {
        Self {
            timestamp: Utc::now().format(TIMESTAMP_FORMAT).to_string(),
            models: BTreeMap::new(),
        }
    }

    /// Store (or replace) the stats of one (model, project) pair.
    pub fn record(&mut self, model: &str, project: &str, stats: ProjectStats) {
        self.models
            .entry(model.to_string())
            .or_default()
            .projects
            .insert(project.to_string(), stats);
    }

    pub fn project(&self, model: &str, project: &str) -> Option<&ProjectStats> {
        self.models.get(model)?.projects.get(project)
    }
}

impl Default for BenchmarkStats {
    fn default() -> Self {
        Self::new()
    }
}

/// How completed requirements are turned into a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScoreMode {
    /// Full `max_score` for every completed requirement.
    ScoreK,
    /// `max_score / attempts` for every completed requirement.
    WeightedScoreK,
}

impl ScoreMode {
    pub const ALL: [ScoreMode; 2] = [ScoreMode::ScoreK, ScoreMode::WeightedScoreK];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ScoreK => "score-k",
            Self::WeightedScoreK => "weighted-score-k",
        }
    }

    /// Score contributed by one requirement under this mode.
    pub fn requirement_score(&self, stats: &RequirementStats) -> f64 {
        if !stats.completed || stats.attempts == 0 {
            return 0.0;
        }
        match self {
            Self::ScoreK => stats.max_score as f64,
            Self::WeightedScoreK => stats.max_score as f64 / stats.attempts as f64,
        }
    }
}

impl fmt::Display for ScoreMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScoreMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "score-k" => Ok(Self::ScoreK),
            "weighted-score-k" => Ok(Self::WeightedScoreK),
            other => Err(CoreError::UnknownScoreMode(other.to_string())),
        }
    }
}
