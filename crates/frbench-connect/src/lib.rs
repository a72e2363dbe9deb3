//! Provider connectors: one prompt/response contract over the Anthropic,
//! OpenAI and Gemini HTTP APIs, with response caching and 429 backoff.

pub mod config;
pub mod connector;
pub mod error;
mod http;
pub mod registry;
pub mod request;
pub mod wire;

pub use config::{ApiKeys, Provider, ProviderConfig, RetryPolicy};
pub use connector::{AnthropicConnector, Connector, GeminiConnector, OpenAiConnector, ProviderConnector};
pub use error::ConnectError;
pub use registry::{connector_for, lookup, ModelSpec, MODELS};
pub use request::{PromptRequest, PromptResult, Role};
