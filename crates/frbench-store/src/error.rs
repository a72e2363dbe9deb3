use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("core error: {0}")]
    Core(#[from] frbench_core::error::CoreError),

    #[error("cache entry not found: {0}")]
    CacheEntryNotFound(String),

    #[error("template directory not found: {0}")]
    TemplateNotFound(String),

    #[error("unsafe workspace path '{0}': must be relative and stay inside the workspace")]
    UnsafePath(String),
}
