use crate::error::ConnectError;
use frbench_core::{CacheKey, ModelCost, TokenUsage};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Provider-agnostic message role. Each wire format maps it to its own vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Model => "model",
            Self::System => "system",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One prompt to send to a model.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptRequest {
    pub role: Role,
    pub prompt: Vec<u8>,
    /// Raw PNG bytes; encoded to base64 by the wire format.
    pub image: Option<Vec<u8>>,
    /// Identifies the requirement the prompt belongs to; part of the cache key.
    pub sequence: usize,
    pub temperature: f64,
    pub use_cache: bool,
    pub use_history: bool,
}

impl PromptRequest {
    pub fn user(prompt: impl Into<Vec<u8>>, sequence: usize, temperature: f64) -> Self {
        Self {
            role: Role::User,
            prompt: prompt.into(),
            image: None,
            sequence,
            temperature,
            use_cache: false,
            use_history: false,
        }
    }

    pub fn with_image(mut self, image: Option<Vec<u8>>) -> Self {
        self.image = image;
        self
    }

    pub fn with_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }

    pub fn with_history(mut self, use_history: bool) -> Self {
        self.use_history = use_history;
        self
    }

    pub fn cache_key(&self) -> CacheKey {
        CacheKey::compute(self.sequence, &self.prompt)
    }

    /// The prompt as sent on the wire. Fails rather than alter bytes the
    /// cache key was computed from.
    pub fn prompt_text(&self) -> Result<&str, ConnectError> {
        Ok(std::str::from_utf8(&self.prompt)?)
    }
}

/// Normalized answer of a provider call.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptResult {
    /// Raw response body exactly as received (or as read from the cache).
    pub raw: Vec<u8>,
    pub content: String,
    pub usage: TokenUsage,
    pub cache_hit: bool,
    pub cache_key: CacheKey,
    pub latency: Duration,
}

impl PromptResult {
    /// USD spent on this call. Cache hits are free.
    pub fn cost(&self, pricing: &ModelCost) -> f64 {
        if self.cache_hit {
            0.0
        } else {
            pricing.price(&self.usage)
        }
    }
}
