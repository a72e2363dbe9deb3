//! Data model shared by the frbench crates: cache keys, pricing, the
//! benchmark stats tree and project definitions.

pub mod cost;
pub mod error;
pub mod hash;
pub mod project;
pub mod serialize;
pub mod stats;

pub use cost::{ModelCost, TokenUsage};
pub use error::CoreError;
pub use hash::CacheKey;
pub use project::{Project, ProjectKind, Requirement};
pub use stats::{BenchmarkStats, ModelStats, ProjectStats, RequirementStats, ScoreMode};
