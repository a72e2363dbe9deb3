//! Known models, their pricing, and connector construction by model name.

use crate::config::{Provider, ProviderConfig};
use crate::connector::{Connector, ProviderConnector};
use crate::error::ConnectError;
use crate::wire::{AnthropicWire, GeminiWire, OpenAiWire};
use frbench_core::ModelCost;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelSpec {
    pub id: &'static str,
    pub provider: Provider,
    pub cost: ModelCost,
}

const fn spec(id: &'static str, provider: Provider, usd_in: f64, usd_out: f64) -> ModelSpec {
    ModelSpec {
        id,
        provider,
        cost: ModelCost::new(usd_in, usd_out),
    }
}

pub const MODELS: &[ModelSpec] = &[
    spec("claude-3-5-haiku-20241022", Provider::Anthropic, 0.8, 4.0),
    spec("claude-3-haiku-20240307", Provider::Anthropic, 0.25, 1.25),
    spec("claude-3-5-sonnet-20241022", Provider::Anthropic, 3.0, 15.0),
    spec("gpt-4o-mini", Provider::OpenAi, 0.15, 0.6),
    spec("gpt-4o", Provider::OpenAi, 2.5, 10.0),
    spec("o1-mini", Provider::OpenAi, 3.0, 12.0),
    spec("o1-preview", Provider::OpenAi, 15.0, 60.0),
    spec("gemini-1.5-flash-latest", Provider::Google, 0.5, 1.5),
    spec("gemini-1.5-flash-8b-001", Provider::Google, 0.5, 1.5),
    spec("gemini-1.0-pro-001", Provider::Google, 0.5, 1.5),
    spec("gemini-1.5-pro-001", Provider::Google, 1.46, 5.87),
];

pub fn lookup(model: &str) -> Option<&'static ModelSpec> {
    MODELS.iter().find(|m| m.id == model)
}

/// Build a fresh connector (empty history) for `model`.
///
/// Only the selected model's provider needs an API key.
pub fn connector_for(
    model: &str,
    config: &ProviderConfig,
    cache_root: &Path,
    system_prompt: &str,
) -> Result<Box<dyn Connector>, ConnectError> {
    let spec = lookup(model).ok_or_else(|| ConnectError::UnknownModel(model.to_string()))?;
    let key = config.api_keys.get(spec.provider)?;
    let base_url = config.base_url(spec.provider);

    let connector: Box<dyn Connector> = match spec.provider {
        Provider::Anthropic => Box::new(ProviderConnector::new(
            AnthropicWire::new(spec.id, key, base_url),
            spec.id,
            spec.cost,
            system_prompt,
            config,
            cache_root,
        )?),
        Provider::OpenAi => Box::new(ProviderConnector::new(
            OpenAiWire::new(spec.id, key, base_url),
            spec.id,
            spec.cost,
            system_prompt,
            config,
            cache_root,
        )?),
        Provider::Google => Box::new(ProviderConnector::new(
            GeminiWire::new(spec.id, key, base_url),
            spec.id,
            spec.cost,
            system_prompt,
            config,
            cache_root,
        )?),
    };
    Ok(connector)
}
