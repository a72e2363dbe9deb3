//! OpenAI Chat Completions API (`POST /v1/chat/completions`).

use super::{invalid_role, Decoded, HistoryPolicy, RequestSettings, WireFormat, PNG_MEDIA_TYPE};
use crate::config::Provider;
use crate::error::ConnectError;
use crate::http::undecoded_error;
use crate::request::Role;
use frbench_core::TokenUsage;
use serde::{Deserialize, Serialize};

/// Reasoning models reject system messages and any temperature but 1.
const REASONING_PREFIX: &str = "o1";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenAiMessage {
    pub role: String,
    pub content: Vec<OpenAiContent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenAiContent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<OpenAiImageUrl>,
}

impl OpenAiContent {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: "text".into(),
            text: Some(text.into()),
            image_url: None,
        }
    }

    pub fn png(data_b64: &str) -> Self {
        Self {
            kind: "image_url".into(),
            text: None,
            image_url: Some(OpenAiImageUrl {
                url: format!("data:{};base64,{}", PNG_MEDIA_TYPE, data_b64),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenAiImageUrl {
    pub url: String,
}

#[derive(Debug, Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: Vec<&'a OpenAiMessage>,
    max_completion_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    usage: OpenAiUsage,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiReply,
}

#[derive(Debug, Deserialize)]
struct OpenAiReply {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct OpenAiUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorResponse {
    error: OpenAiErrorBody,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorBody {
    message: String,
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OpenAiWire {
    model: String,
    api_key: String,
    base_url: String,
}

impl OpenAiWire {
    pub fn new(model: impl Into<String>, api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }

    fn is_reasoning_model(&self) -> bool {
        self.model.starts_with(REASONING_PREFIX)
    }
}

impl WireFormat for OpenAiWire {
    type Message = OpenAiMessage;

    fn provider(&self) -> Provider {
        Provider::OpenAi
    }

    fn history_policy(&self) -> HistoryPolicy {
        HistoryPolicy::UserOnly
    }

    fn prompt_message(
        &self,
        role: Role,
        text: &str,
        image_b64: Option<&str>,
    ) -> Result<OpenAiMessage, ConnectError> {
        let role = match role {
            Role::User => "user",
            Role::Model => "assistant",
            Role::System if !self.is_reasoning_model() => "system",
            Role::System => return Err(invalid_role(role, self.provider())),
        };
        let mut content = vec![OpenAiContent::text(text)];
        if let Some(data) = image_b64 {
            content.push(OpenAiContent::png(data));
        }
        Ok(OpenAiMessage {
            role: role.into(),
            content,
        })
    }

    fn encode_request(
        &self,
        settings: &RequestSettings<'_>,
        messages: &[OpenAiMessage],
    ) -> Result<Vec<u8>, ConnectError> {
        let system = (!settings.system.is_empty() && !self.is_reasoning_model()).then(|| OpenAiMessage {
            role: "system".into(),
            content: vec![OpenAiContent::text(settings.system)],
        });
        let temperature = if self.is_reasoning_model() {
            1.0
        } else {
            settings.temperature
        };
        let request = OpenAiRequest {
            model: &self.model,
            messages: system.iter().chain(messages.iter()).collect(),
            max_completion_tokens: settings.max_tokens,
            temperature,
        };
        Ok(serde_json::to_vec(&request)?)
    }

    fn build_request(&self, client: &reqwest::Client, body: Vec<u8>) -> reqwest::RequestBuilder {
        client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
            .body(body)
    }

    fn decode_response(&self, bytes: &[u8]) -> Result<Decoded<OpenAiMessage>, ConnectError> {
        let response: OpenAiResponse = serde_json::from_slice(bytes)?;
        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(ConnectError::EmptyResponse)?;
        Ok(Decoded {
            reply: OpenAiMessage {
                role: "assistant".into(),
                content: vec![OpenAiContent::text(text.clone())],
            },
            text,
            usage: TokenUsage::new(response.usage.prompt_tokens, response.usage.completion_tokens),
        })
    }

    fn decode_error(&self, status: u16, body: &[u8]) -> ConnectError {
        match serde_json::from_slice::<OpenAiErrorResponse>(body) {
            Ok(envelope) => ConnectError::Provider {
                status,
                kind: envelope.error.kind.unwrap_or_else(|| "unknown".into()),
                message: envelope.error.message,
            },
            Err(_) => undecoded_error(status, body),
        }
    }
}
