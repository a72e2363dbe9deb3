//! Uniform prompt/response contract over the provider wire formats.

use crate::config::{ProviderConfig, RetryPolicy};
use crate::error::ConnectError;
use crate::http::post_with_backoff;
use crate::request::{PromptRequest, PromptResult};
use crate::wire::{
    AnthropicWire, GeminiWire, HistoryPolicy, OpenAiWire, RequestSettings, WireFormat,
};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use frbench_core::{CacheKey, ModelCost, TokenUsage};
use frbench_store::ResponseCache;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// A model the benchmark can prompt.
#[async_trait]
pub trait Connector: Send {
    /// Send one prompt, consulting the response cache first when the request
    /// allows it. The prompt is appended to the connector's history whether
    /// the answer came from the cache or the network.
    async fn send_prompt(&mut self, request: &PromptRequest) -> Result<PromptResult, ConnectError>;

    fn model_name(&self) -> &str;

    fn cost(&self) -> ModelCost;

    /// Persist a verified raw response under `key`.
    fn cache_response(&self, key: &CacheKey, raw: &[u8]) -> Result<(), ConnectError>;

    /// Drop a cached response that turned out not to satisfy verification.
    fn invalidate_cached(&self, key: &CacheKey) -> Result<(), ConnectError>;
}

pub type AnthropicConnector = ProviderConnector<AnthropicWire>;
pub type OpenAiConnector = ProviderConnector<OpenAiWire>;
pub type GeminiConnector = ProviderConnector<GeminiWire>;

/// Connector for one model of one provider. Owns its conversation history;
/// build a fresh instance per model per run.
pub struct ProviderConnector<W: WireFormat> {
    wire: W,
    model: String,
    cost: ModelCost,
    system_prompt: String,
    max_tokens: u32,
    retry: RetryPolicy,
    trace_dir: Option<PathBuf>,
    cache: ResponseCache,
    client: reqwest::Client,
    history: Vec<W::Message>,
}

impl<W: WireFormat> ProviderConnector<W> {
    pub fn new(
        wire: W,
        model: impl Into<String>,
        cost: ModelCost,
        system_prompt: impl Into<String>,
        config: &ProviderConfig,
        cache_root: impl AsRef<Path>,
    ) -> Result<Self, ConnectError> {
        let model = model.into();
        let cache = ResponseCache::for_model(cache_root, wire.provider().cache_dir(), &model);
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            wire,
            model,
            cost,
            system_prompt: system_prompt.into(),
            max_tokens: config.max_tokens,
            retry: config.retry,
            trace_dir: config.trace_dir.clone(),
            cache,
            client,
            history: Vec::new(),
        })
    }

    pub fn history(&self) -> &[W::Message] {
        &self.history
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    fn remember(&mut self, prompt: W::Message, reply: W::Message) {
        self.history.push(prompt);
        if self.wire.history_policy() == HistoryPolicy::UserAndReply {
            self.history.push(reply);
        }
    }

    fn trace_request(&self, sequence: usize, body: &[u8]) {
        let Some(dir) = &self.trace_dir else {
            return;
        };
        let path = dir.join(format!("{}-req-{}.json", self.wire.provider(), sequence));
        let written = std::fs::create_dir_all(dir).and_then(|_| std::fs::write(&path, body));
        if let Err(e) = written {
            warn!(path = %path.display(), error = %e, "failed to write request trace");
        }
    }
}

#[async_trait]
impl<W: WireFormat> Connector for ProviderConnector<W> {
    async fn send_prompt(&mut self, request: &PromptRequest) -> Result<PromptResult, ConnectError> {
        let image = request.image.as_deref().map(|bytes| BASE64.encode(bytes));
        let message = self
            .wire
            .prompt_message(request.role, request.prompt_text()?, image.as_deref())?;
        let key = request.cache_key();

        if request.use_cache {
            if let Some(raw) = self.cache.get(&key) {
                match self.wire.decode_response(&raw) {
                    Ok(decoded) => {
                        debug!(model = %self.model, cache_key = %key.short(), "cache hit");
                        self.remember(message, decoded.reply);
                        return Ok(PromptResult {
                            raw,
                            content: decoded.text,
                            usage: TokenUsage::default(),
                            cache_hit: true,
                            cache_key: key,
                            latency: Duration::ZERO,
                        });
                    }
                    Err(e) => {
                        warn!(model = %self.model, cache_key = %key.short(), error = %e, "discarding undecodable cache entry");
                        if let Err(e) = self.cache.delete(&key) {
                            debug!(error = %e, "cache entry already gone");
                        }
                    }
                }
            }
        }

        let mut messages = if request.use_history {
            self.history.clone()
        } else {
            Vec::new()
        };
        messages.push(message.clone());

        let settings = RequestSettings {
            system: &self.system_prompt,
            temperature: request.temperature,
            max_tokens: self.max_tokens,
        };
        let body = self.wire.encode_request(&settings, &messages)?;
        self.trace_request(request.sequence, &body);

        info!(
            model = %self.model,
            sequence = request.sequence,
            messages = messages.len(),
            bytes = body.len(),
            "sending prompt"
        );

        let started = Instant::now();
        let raw = {
            let wire = &self.wire;
            let client = &self.client;
            post_with_backoff(
                self.retry,
                || wire.build_request(client, body.clone()),
                |status, bytes| wire.decode_error(status, bytes),
            )
            .await?
        };
        let latency = started.elapsed();

        let decoded = self.wire.decode_response(&raw)?;
        self.remember(message, decoded.reply);

        debug!(
            model = %self.model,
            input_tokens = decoded.usage.input_tokens,
            output_tokens = decoded.usage.output_tokens,
            latency_ms = latency.as_millis() as u64,
            "prompt answered"
        );

        Ok(PromptResult {
            raw,
            content: decoded.text,
            usage: decoded.usage,
            cache_hit: false,
            cache_key: key,
            latency,
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn cost(&self) -> ModelCost {
        self.cost
    }

    fn cache_response(&self, key: &CacheKey, raw: &[u8]) -> Result<(), ConnectError> {
        self.cache.put(key, raw)?;
        Ok(())
    }

    fn invalidate_cached(&self, key: &CacheKey) -> Result<(), ConnectError> {
        self.cache.delete(key)?;
        Ok(())
    }
}
