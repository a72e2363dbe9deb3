//! Benchmark engine: project templates, prompt construction, response
//! parsing, the attempt loop and evaluation of the resulting stats.

pub mod config;
pub mod confirm;
pub mod error;
pub mod eval;
pub mod oracle;
pub mod parse;
pub mod prompt;
pub mod report;
pub mod runner;
pub mod template;

pub use config::{BenchConfig, PromptMode, DEFAULT_ATTEMPTS, DEFAULT_CONFIG_FILE};
pub use confirm::{Confirm, NoConfirm, StdinConfirm};
pub use error::BenchError;
pub use eval::{evaluate, EvalTable, ProjectEval, ProjectSummary};
pub use oracle::{CommandOracle, PatchCommand, Patcher, TestOracle, TestOutcome};
pub use runner::BenchmarkRunner;
pub use template::ProjectTemplate;
