pub mod cache;
pub mod eval;
pub mod init;
pub mod list;
pub mod run;

use anyhow::{Context, Result};
use frbench_bench::BenchConfig;
use std::path::Path;

/// The config file when present, built-in defaults otherwise.
pub fn load_config(path: &Path) -> Result<BenchConfig> {
    BenchConfig::load_or_default(path)
        .with_context(|| format!("failed to load config {}", path.display()))
}
