use crate::error::BenchError;
use crate::eval::{self, EvalTable, ProjectEval, ProjectSummary};
use frbench_core::serialize::write_json_file;
use frbench_core::{BenchmarkStats, ScoreMode};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const STATS_FILE: &str = "stats.json";

/// Write `eval-<mode>.json` plus the score, cost and response-time CSVs
/// into `dir`. Returns the written paths.
pub fn write_reports(
    dir: &Path,
    stats: &BenchmarkStats,
    mode: ScoreMode,
) -> Result<Vec<PathBuf>, BenchError> {
    let table = eval::evaluate(stats, mode);
    fs::create_dir_all(dir)?;

    let eval_path = dir.join(format!("eval-{}.json", mode));
    write_json_file(&eval_path, &table)?;
    let mut written = vec![eval_path];

    let tables: [(&str, fn(&ProjectEval) -> String); 3] = [
        ("scores", eval::score_cell),
        ("costs", eval::cost_cell),
        ("resp_times", eval::resp_time_cell),
    ];
    for (name, cell) in tables {
        let path = dir.join(format!("{}-{}.csv", name, mode));
        fs::write(&path, eval::render_table(&table, cell)?)?;
        written.push(path);
    }

    info!(dir = %dir.display(), mode = %mode, files = written.len(), "evaluation written");
    Ok(written)
}

pub fn read_stats(run_dir: &Path) -> Result<BenchmarkStats, BenchError> {
    Ok(frbench_core::serialize::read_json_file(run_dir.join(STATS_FILE))?)
}

pub fn print_eval(table: &EvalTable, mode: ScoreMode) {
    println!("\n=== {} ===", mode);
    println!(
        "{:<28} {:<24} {:>8} {:>10} {:>10}",
        "Model", "Project", "Score", "Cost $", "Time s"
    );
    for (model, projects) in table {
        for (project, e) in projects {
            println!(
                "{:<28} {:<24} {:>8.1} {:>10.5} {:>10.2}",
                model,
                project,
                e.score,
                e.cost,
                e.duration().as_secs_f64()
            );
        }
    }
}

/// One line per (model, project) with completed requirements and score out of max.
pub fn print_summary(stats: &BenchmarkStats, mode: ScoreMode) {
    for (model, model_stats) in &stats.models {
        for (project, project_stats) in &model_stats.projects {
            let summary = ProjectSummary::new(project_stats, mode);
            println!(
                "{} / {}: {}/{} requirements, score {:.1}/{:.1}, cost ${:.5}, {:.1}s",
                model,
                project,
                project_stats.completed_count(),
                project_stats.requirements.len(),
                summary.score,
                summary.max_score,
                summary.cost,
                summary.duration_ms as f64 / 1000.0
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frbench_core::{ProjectStats, RequirementStats};

    fn stats() -> BenchmarkStats {
        let mut bench = BenchmarkStats::new();
        bench.record(
            "gpt-4o-mini",
            "functions",
            ProjectStats {
                requirements: vec![RequirementStats {
                    cost: 0.00042,
                    completed: true,
                    max_score: 2,
                    attempts: 2,
                    duration_ms: 2500,
                }],
            },
        );
        bench
    }

    #[test]
    fn writes_all_outputs_for_mode() {
        let dir = tempfile::tempdir().unwrap();
        let written = write_reports(dir.path(), &stats(), ScoreMode::WeightedScoreK).unwrap();

        let names: Vec<_> = written
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "eval-weighted-score-k.json",
                "scores-weighted-score-k.csv",
                "costs-weighted-score-k.csv",
                "resp_times-weighted-score-k.csv",
            ]
        );

        let scores = fs::read_to_string(dir.path().join("scores-weighted-score-k.csv")).unwrap();
        assert_eq!(scores, "project/model,gpt-4o-mini\nfunctions,1.0\n");
        let times = fs::read_to_string(dir.path().join("resp_times-weighted-score-k.csv")).unwrap();
        assert_eq!(times, "project/model,gpt-4o-mini\nfunctions,2.50000\n");

        let eval: EvalTable = frbench_core::serialize::read_json_file(&written[0]).unwrap();
        assert_eq!(eval["gpt-4o-mini"]["functions"].score, 1.0);
    }

    #[test]
    fn stats_round_trip_through_run_dir() {
        let dir = tempfile::tempdir().unwrap();
        let original = stats();
        write_json_file(dir.path().join(STATS_FILE), &original).unwrap();
        assert_eq!(read_stats(dir.path()).unwrap(), original);
    }
}
