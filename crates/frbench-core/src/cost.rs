use serde::{Deserialize, Serialize};

/// Provider price of a model in USD per million tokens.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ModelCost {
    pub usd_mtok_in: f64,
    pub usd_mtok_out: f64,
}

impl ModelCost {
    pub const fn new(usd_mtok_in: f64, usd_mtok_out: f64) -> Self {
        Self {
            usd_mtok_in,
            usd_mtok_out,
        }
    }

    /// Price a single call from its token usage.
    pub fn price(&self, usage: &TokenUsage) -> f64 {
        (self.usd_mtok_in * usage.input_tokens as f64
            + self.usd_mtok_out * usage.output_tokens as f64)
            / 1_000_000.0
    }
}

/// Input/output token counts reported by a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenUsage {
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}
