use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("invalid role '{role}' for provider {provider}")]
    InvalidRole { role: String, provider: String },

    #[error("rate limited: no response after {attempts} attempts within the {window:?} quota window")]
    RateLimitExhausted { attempts: u32, window: Duration },

    #[error("provider error: status={status}, type={kind}, msg={message}")]
    Provider {
        status: u16,
        kind: String,
        message: String,
    },

    #[error("provider returned no content")]
    EmptyResponse,

    #[error("missing API key: set {0}")]
    MissingApiKey(&'static str),

    #[error("prompt is not valid UTF-8: {0}")]
    NonUtf8Prompt(#[from] std::str::Utf8Error),

    #[error("unknown model: {0}")]
    UnknownModel(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cache error: {0}")]
    Cache(#[from] frbench_store::StoreError),
}
