use anyhow::{Context, Result};
use frbench_bench::{evaluate, report};
use frbench_core::ScoreMode;
use std::path::Path;

pub fn run(run_dir: &Path, mode: Option<ScoreMode>) -> Result<()> {
    let stats = report::read_stats(run_dir)
        .with_context(|| format!("cannot read stats from {}", run_dir.display()))?;

    let modes = match mode {
        Some(m) => vec![m],
        None => ScoreMode::ALL.to_vec(),
    };
    for mode in modes {
        report::write_reports(run_dir, &stats, mode)?;
        report::print_eval(&evaluate(&stats, mode), mode);
    }
    Ok(())
}
