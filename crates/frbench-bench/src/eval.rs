//! Aggregate a stats tree into per-(model, project) scores.

use crate::error::BenchError;
use frbench_core::{BenchmarkStats, ProjectStats, ScoreMode};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectEval {
    pub score: f64,
    /// USD over all attempts, completed or not.
    pub cost: f64,
    pub duration_ms: u64,
}

impl ProjectEval {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

/// model -> project -> aggregate. Ordered so exports are reproducible.
pub type EvalTable = BTreeMap<String, BTreeMap<String, ProjectEval>>;

pub fn evaluate_project(stats: &ProjectStats, mode: ScoreMode) -> ProjectEval {
    stats
        .requirements
        .iter()
        .fold(ProjectEval::default(), |mut acc, req| {
            acc.cost += req.cost;
            acc.duration_ms += req.duration_ms;
            acc.score += mode.requirement_score(req);
            acc
        })
}

pub fn evaluate(stats: &BenchmarkStats, mode: ScoreMode) -> EvalTable {
    stats
        .models
        .iter()
        .map(|(model, model_stats)| {
            let projects = model_stats
                .projects
                .iter()
                .map(|(project, p)| (project.clone(), evaluate_project(p, mode)))
                .collect();
            (model.clone(), projects)
        })
        .collect()
}

/// Console summary of one (model, project) pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub score: f64,
    pub max_score: f64,
    pub cost: f64,
    pub duration_ms: u64,
}

impl ProjectSummary {
    pub fn new(stats: &ProjectStats, mode: ScoreMode) -> Self {
        let eval = evaluate_project(stats, mode);
        Self {
            score: eval.score,
            max_score: stats.requirements.iter().map(|r| r.max_score as f64).sum(),
            cost: eval.cost,
            duration_ms: eval.duration_ms,
        }
    }
}

/// CSV with one row per project and one column per model, both sorted.
/// Cells for pairs that were never run are left empty.
pub fn render_table(
    table: &EvalTable,
    value: impl Fn(&ProjectEval) -> String,
) -> Result<String, BenchError> {
    let projects: BTreeSet<&String> = table.values().flat_map(|p| p.keys()).collect();
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header = vec!["project/model".to_string()];
    header.extend(table.keys().cloned());
    wtr.write_record(&header)?;

    for project in projects {
        let mut row = vec![project.clone()];
        row.extend(table.values().map(|p| p.get(project).map(&value).unwrap_or_default()));
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    let bytes = wtr.into_inner().map_err(|e| BenchError::Io(e.into_error()))?;
    String::from_utf8(bytes)
        .map_err(|e| BenchError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

pub fn score_cell(e: &ProjectEval) -> String {
    format!("{:.1}", e.score)
}

pub fn cost_cell(e: &ProjectEval) -> String {
    format!("{:.5}", e.cost)
}

pub fn resp_time_cell(e: &ProjectEval) -> String {
    format!("{:.5}", e.duration().as_secs_f64())
}

#[cfg(test)]
mod tests {
    use super::*;
    use frbench_core::RequirementStats;

    fn req(max_score: u32, attempts: u32, completed: bool, cost: f64, ms: u64) -> RequirementStats {
        RequirementStats {
            cost,
            completed,
            max_score,
            attempts,
            duration_ms: ms,
        }
    }

    fn sample() -> BenchmarkStats {
        let mut bench = BenchmarkStats::new();
        bench.record(
            "gpt-4o",
            "simple-todo",
            ProjectStats {
                requirements: vec![
                    req(10, 1, true, 0.01, 1000),
                    req(10, 3, true, 0.03, 3000),
                    req(5, 3, false, 0.02, 500),
                    req(5, 0, false, 0.0, 0),
                ],
            },
        );
        bench.record(
            "claude-3-5-haiku-20241022",
            "functions",
            ProjectStats {
                requirements: vec![req(1, 2, true, 0.5, 250)],
            },
        );
        bench
    }

    #[test]
    fn score_k_ignores_attempts() {
        let table = evaluate(&sample(), ScoreMode::ScoreK);
        let todo = table["gpt-4o"]["simple-todo"];
        assert_eq!(todo.score, 20.0);
        assert!((todo.cost - 0.06).abs() < 1e-12);
        assert_eq!(todo.duration_ms, 4500);
    }

    #[test]
    fn weighted_divides_by_attempts() {
        let table = evaluate(&sample(), ScoreMode::WeightedScoreK);
        let todo = table["gpt-4o"]["simple-todo"];
        assert!((todo.score - (10.0 + 10.0 / 3.0)).abs() < 1e-9);
        assert_eq!(table["claude-3-5-haiku-20241022"]["functions"].score, 0.5);
    }

    #[test]
    fn evaluation_is_deterministic() {
        let stats = sample();
        assert_eq!(
            evaluate(&stats, ScoreMode::WeightedScoreK),
            evaluate(&stats, ScoreMode::WeightedScoreK)
        );
    }

    #[test]
    fn summary_includes_max_score() {
        let stats = sample();
        let summary = ProjectSummary::new(
            stats.project("gpt-4o", "simple-todo").unwrap(),
            ScoreMode::ScoreK,
        );
        assert_eq!(summary.max_score, 30.0);
        assert_eq!(summary.score, 20.0);
    }

    #[test]
    fn table_sorted_with_models_as_columns() {
        let table = evaluate(&sample(), ScoreMode::ScoreK);
        let csv = render_table(&table, score_cell).unwrap();
        assert_eq!(
            csv,
            "project/model,claude-3-5-haiku-20241022,gpt-4o\n\
             functions,1.0,\n\
             simple-todo,,20.0\n"
        );
    }

    #[test]
    fn names_with_commas_are_quoted() {
        let mut table = EvalTable::new();
        table
            .entry("m".into())
            .or_default()
            .insert("todo, v2".into(), ProjectEval::default());
        let csv = render_table(&table, score_cell).unwrap();
        assert_eq!(csv, "project/model,m\n\"todo, v2\",0.0\n");

        let mut reader = csv::Reader::from_reader(csv.as_bytes());
        let row = reader.records().next().unwrap().unwrap();
        assert_eq!(row.len(), 2);
        assert_eq!(&row[0], "todo, v2");
    }

    #[test]
    fn cell_formats() {
        let e = ProjectEval {
            score: 3.3333,
            cost: 0.000123456,
            duration_ms: 1500,
        };
        assert_eq!(score_cell(&e), "3.3");
        assert_eq!(cost_cell(&e), "0.00012");
        assert_eq!(resp_time_cell(&e), "1.50000");
    }

    #[test]
    fn empty_stats_render_header_only() {
        let csv = render_table(&EvalTable::new(), score_cell).unwrap();
        assert_eq!(csv, "project/model\n");
    }
}
