use frbench_connect::ConnectError;
use frbench_core::CoreError;
use frbench_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BenchError {
    #[error("parse error: {0}")]
    Parse(String),

    #[error("setup error: {0}")]
    Setup(String),

    #[error("tests already pass before requirement {requirement} of project '{project}'")]
    AlreadyPassing { project: String, requirement: usize },

    #[error("test oracle failed to run: {0}")]
    Oracle(String),

    #[error("patch did not apply: {0}")]
    Patch(String),

    #[error("connector error: {0}")]
    Connect(#[from] ConnectError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("core error: {0}")]
    Core(#[from] CoreError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("config error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl BenchError {
    /// Whether the error invalidates the whole run rather than one attempt.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Parse(_) | Self::Patch(_) | Self::Connect(_))
    }
}
