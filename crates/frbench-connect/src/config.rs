use crate::error::ConnectError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_MAX_TOKENS: u32 = 2048;
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(5);
pub const DEFAULT_QUOTA_WINDOW: Duration = Duration::from_secs(60);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// The model vendors the harness can talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Anthropic,
    OpenAi,
    Google,
}

impl Provider {
    /// Directory name of the provider's cache partition.
    pub fn cache_dir(&self) -> &'static str {
        match self {
            Self::Anthropic => "anth",
            Self::OpenAi => "openai",
            Self::Google => "google",
        }
    }

    pub fn api_key_var(&self) -> &'static str {
        match self {
            Self::Anthropic => "ANTHROPIC_API_KEY",
            Self::OpenAi => "OPENAI_API_KEY",
            Self::Google => "GOOGLE_API_KEY",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::Anthropic => "https://api.anthropic.com",
            Self::OpenAi => "https://api.openai.com",
            Self::Google => "https://generativelanguage.googleapis.com",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Anthropic => "anthropic",
            Self::OpenAi => "openai",
            Self::Google => "google",
        })
    }
}

/// API keys per provider. Only the providers actually used need one.
#[derive(Clone, Default)]
pub struct ApiKeys {
    pub anthropic: Option<String>,
    pub openai: Option<String>,
    pub google: Option<String>,
}

impl ApiKeys {
    pub fn from_env() -> Self {
        let read = |p: Provider| {
            std::env::var(p.api_key_var())
                .ok()
                .filter(|v| !v.trim().is_empty())
        };
        Self {
            anthropic: read(Provider::Anthropic),
            openai: read(Provider::OpenAi),
            google: read(Provider::Google),
        }
    }

    pub fn with(mut self, provider: Provider, key: impl Into<String>) -> Self {
        let key = Some(key.into());
        match provider {
            Provider::Anthropic => self.anthropic = key,
            Provider::OpenAi => self.openai = key,
            Provider::Google => self.google = key,
        }
        self
    }

    pub fn get(&self, provider: Provider) -> Result<&str, ConnectError> {
        let key = match provider {
            Provider::Anthropic => &self.anthropic,
            Provider::OpenAi => &self.openai,
            Provider::Google => &self.google,
        };
        key.as_deref()
            .ok_or(ConnectError::MissingApiKey(provider.api_key_var()))
    }
}

impl fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mask = |k: &Option<String>| k.as_ref().map(|_| "***");
        f.debug_struct("ApiKeys")
            .field("anthropic", &mask(&self.anthropic))
            .field("openai", &mask(&self.openai))
            .field("google", &mask(&self.google))
            .finish()
    }
}

/// How long to wait after a 429 and how long the provider quota window is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub backoff: Duration,
    pub quota_window: Duration,
}

impl RetryPolicy {
    pub fn new(backoff: Duration, quota_window: Duration) -> Self {
        Self {
            backoff,
            quota_window,
        }
    }

    /// `floor(quota_window / backoff)` send attempts, never fewer than one.
    pub fn max_attempts(&self) -> u32 {
        if self.backoff.is_zero() {
            return 1;
        }
        let n = self.quota_window.as_nanos() / self.backoff.as_nanos();
        u32::try_from(n).unwrap_or(u32::MAX).max(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_BACKOFF, DEFAULT_QUOTA_WINDOW)
    }
}

/// Everything a connector needs besides the model identifier.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub api_keys: ApiKeys,
    pub anthropic_url: String,
    pub openai_url: String,
    pub google_url: String,
    pub max_tokens: u32,
    pub retry: RetryPolicy,
    pub request_timeout: Duration,
    /// When set, every outgoing request body is dumped here for debugging.
    pub trace_dir: Option<PathBuf>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_keys: ApiKeys::default(),
            anthropic_url: Provider::Anthropic.default_base_url().to_string(),
            openai_url: Provider::OpenAi.default_base_url().to_string(),
            google_url: Provider::Google.default_base_url().to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            retry: RetryPolicy::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            trace_dir: None,
        }
    }
}

impl ProviderConfig {
    pub fn with_api_keys(mut self, keys: ApiKeys) -> Self {
        self.api_keys = keys;
        self
    }

    pub fn with_base_url(mut self, provider: Provider, url: impl Into<String>) -> Self {
        let url = url.into().trim_end_matches('/').to_string();
        match provider {
            Provider::Anthropic => self.anthropic_url = url,
            Provider::OpenAi => self.openai_url = url,
            Provider::Google => self.google_url = url,
        }
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_trace_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.trace_dir = Some(dir.into());
        self
    }

    pub fn base_url(&self, provider: Provider) -> &str {
        match provider {
            Provider::Anthropic => &self.anthropic_url,
            Provider::OpenAi => &self.openai_url,
            Provider::Google => &self.google_url,
        }
    }
}
