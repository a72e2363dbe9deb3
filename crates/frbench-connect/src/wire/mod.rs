//! Provider-native request/response envelopes.
//!
//! Each submodule owns the exact field names and nesting of one provider's
//! JSON API. The connector only talks to them through [`WireFormat`].

pub mod anthropic;
pub mod google;
pub mod openai;

use crate::config::Provider;
use crate::error::ConnectError;
use crate::request::Role;
use frbench_core::TokenUsage;
use serde::Serialize;

pub use anthropic::AnthropicWire;
pub use google::GeminiWire;
pub use openai::OpenAiWire;

pub const PNG_MEDIA_TYPE: &str = "image/png";

/// Generation settings shared by every envelope.
#[derive(Debug, Clone, Copy)]
pub struct RequestSettings<'a> {
    pub system: &'a str,
    pub temperature: f64,
    pub max_tokens: u32,
}

/// Which turns a connector keeps in its conversation history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryPolicy {
    /// Only the prompts sent by the harness.
    UserOnly,
    /// The prompts and the model's replies, in turn order.
    UserAndReply,
}

/// First content item of a successful response.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded<M> {
    pub text: String,
    pub usage: TokenUsage,
    /// The reply re-expressed as a native history message.
    pub reply: M,
}

pub trait WireFormat: Send + Sync {
    type Message: Clone + Serialize + Send + Sync;

    fn provider(&self) -> Provider;

    fn history_policy(&self) -> HistoryPolicy;

    /// Build the native message for a prompt. Fails with `InvalidRole` when
    /// the provider has no equivalent of `role`.
    fn prompt_message(
        &self,
        role: Role,
        text: &str,
        image_b64: Option<&str>,
    ) -> Result<Self::Message, ConnectError>;

    fn encode_request(
        &self,
        settings: &RequestSettings<'_>,
        messages: &[Self::Message],
    ) -> Result<Vec<u8>, ConnectError>;

    /// Endpoint, auth headers and body of one POST.
    fn build_request(&self, client: &reqwest::Client, body: Vec<u8>) -> reqwest::RequestBuilder;

    fn decode_response(&self, bytes: &[u8]) -> Result<Decoded<Self::Message>, ConnectError>;

    fn decode_error(&self, status: u16, body: &[u8]) -> ConnectError;
}

pub(crate) fn invalid_role(role: Role, provider: Provider) -> ConnectError {
    ConnectError::InvalidRole {
        role: role.to_string(),
        provider: provider.to_string(),
    }
}
