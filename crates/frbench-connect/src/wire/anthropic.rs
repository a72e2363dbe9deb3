//! Anthropic Messages API (`POST /v1/messages`).

use super::{invalid_role, Decoded, HistoryPolicy, RequestSettings, WireFormat, PNG_MEDIA_TYPE};
use crate::config::Provider;
use crate::error::ConnectError;
use crate::http::undecoded_error;
use crate::request::Role;
use frbench_core::TokenUsage;
use serde::{Deserialize, Serialize};

pub const API_VERSION: &str = "2023-06-01";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnthMessage {
    pub role: String,
    pub content: Vec<AnthContent>,
}

/// A content block: either `text` or an image `source`, never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnthContent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<AnthImageSource>,
}

impl AnthContent {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: "text".into(),
            text: Some(text.into()),
            source: None,
        }
    }

    pub fn png(data_b64: impl Into<String>) -> Self {
        Self {
            kind: "image".into(),
            text: None,
            source: Some(AnthImageSource {
                kind: "base64".into(),
                media_type: PNG_MEDIA_TYPE.into(),
                data: data_b64.into(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnthImageSource {
    #[serde(rename = "type")]
    pub kind: String,
    pub media_type: String,
    pub data: String,
}

#[derive(Debug, Serialize)]
struct AnthRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "str::is_empty")]
    system: &'a str,
    temperature: f64,
    messages: &'a [AnthMessage],
}

#[derive(Debug, Deserialize)]
struct AnthResponse {
    #[serde(default)]
    content: Vec<AnthResponseContent>,
    #[serde(default)]
    usage: AnthUsage,
}

#[derive(Debug, Deserialize)]
struct AnthResponseContent {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Default, Deserialize)]
struct AnthUsage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct AnthErrorResponse {
    error: AnthErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthErrorBody {
    #[serde(rename = "type")]
    kind: String,
    message: String,
}

/// Wire format of one Anthropic model.
///
/// History keeps only the user turns; replies are not fed back.
#[derive(Debug, Clone)]
pub struct AnthropicWire {
    model: String,
    api_key: String,
    base_url: String,
}

impl AnthropicWire {
    pub fn new(model: impl Into<String>, api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }

    fn native_role(role: Role) -> Option<&'static str> {
        match role {
            Role::User => Some("user"),
            Role::Model => Some("assistant"),
            Role::System => None,
        }
    }
}

impl WireFormat for AnthropicWire {
    type Message = AnthMessage;

    fn provider(&self) -> Provider {
        Provider::Anthropic
    }

    fn history_policy(&self) -> HistoryPolicy {
        HistoryPolicy::UserOnly
    }

    fn prompt_message(
        &self,
        role: Role,
        text: &str,
        image_b64: Option<&str>,
    ) -> Result<AnthMessage, ConnectError> {
        let role = Self::native_role(role).ok_or_else(|| invalid_role(role, self.provider()))?;
        let mut content = vec![AnthContent::text(text)];
        if let Some(data) = image_b64 {
            content.push(AnthContent::png(data));
        }
        Ok(AnthMessage {
            role: role.into(),
            content,
        })
    }

    fn encode_request(
        &self,
        settings: &RequestSettings<'_>,
        messages: &[AnthMessage],
    ) -> Result<Vec<u8>, ConnectError> {
        let request = AnthRequest {
            model: &self.model,
            max_tokens: settings.max_tokens,
            system: settings.system,
            temperature: settings.temperature,
            messages,
        };
        Ok(serde_json::to_vec(&request)?)
    }

    fn build_request(&self, client: &reqwest::Client, body: Vec<u8>) -> reqwest::RequestBuilder {
        client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .body(body)
    }

    fn decode_response(&self, bytes: &[u8]) -> Result<Decoded<AnthMessage>, ConnectError> {
        let response: AnthResponse = serde_json::from_slice(bytes)?;
        let first = response
            .content
            .into_iter()
            .next()
            .ok_or(ConnectError::EmptyResponse)?;
        Ok(Decoded {
            reply: AnthMessage {
                role: "assistant".into(),
                content: vec![AnthContent::text(first.text.clone())],
            },
            text: first.text,
            usage: TokenUsage::new(response.usage.input_tokens, response.usage.output_tokens),
        })
    }

    fn decode_error(&self, status: u16, body: &[u8]) -> ConnectError {
        match serde_json::from_slice::<AnthErrorResponse>(body) {
            Ok(envelope) => ConnectError::Provider {
                status,
                kind: envelope.error.kind,
                message: envelope.error.message,
            },
            Err(_) => undecoded_error(status, body),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn wire() -> AnthropicWire {
        AnthropicWire::new("claude-3-haiku-20240307", "key", "http://localhost")
    }

    #[test]
    fn maps_roles() {
        let w = wire();
        assert_eq!(w.prompt_message(Role::User, "hi", None).unwrap().role, "user");
        assert_eq!(w.prompt_message(Role::Model, "hi", None).unwrap().role, "assistant");
        let err = w.prompt_message(Role::System, "hi", None).unwrap_err();
        assert!(matches!(err, ConnectError::InvalidRole { .. }));
    }

    #[test]
    fn encodes_request_envelope() {
        let w = wire();
        let msg = w.prompt_message(Role::User, "build it", Some("aGVsbG8=")).unwrap();
        let settings = RequestSettings {
            system: "be terse",
            temperature: 0.2,
            max_tokens: 2048,
        };
        let body: Value = serde_json::from_slice(&w.encode_request(&settings, &[msg]).unwrap()).unwrap();

        assert_eq!(
            body,
            json!({
                "model": "claude-3-haiku-20240307",
                "max_tokens": 2048,
                "system": "be terse",
                "temperature": 0.2,
                "messages": [{
                    "role": "user",
                    "content": [
                        {"type": "text", "text": "build it"},
                        {"type": "image", "source": {"type": "base64", "media_type": "image/png", "data": "aGVsbG8="}}
                    ]
                }]
            })
        );
    }

    #[test]
    fn empty_system_is_omitted() {
        let w = wire();
        let settings = RequestSettings {
            system: "",
            temperature: 0.0,
            max_tokens: 16,
        };
        let body: Value = serde_json::from_slice(&w.encode_request(&settings, &[]).unwrap()).unwrap();
        assert!(body.get("system").is_none());
    }

    #[test]
    fn decodes_first_content_block() {
        let raw = json!({
            "id": "msg_1",
            "role": "assistant",
            "content": [{"type": "text", "text": "first"}, {"type": "text", "text": "second"}],
            "usage": {"input_tokens": 12, "output_tokens": 34}
        });
        let decoded = wire().decode_response(raw.to_string().as_bytes()).unwrap();
        assert_eq!(decoded.text, "first");
        assert_eq!(decoded.usage, TokenUsage::new(12, 34));
        assert_eq!(decoded.reply.role, "assistant");
    }

    #[test]
    fn zero_content_is_empty_response() {
        let raw = json!({"content": [], "usage": {"input_tokens": 1, "output_tokens": 0}});
        let err = wire().decode_response(raw.to_string().as_bytes()).unwrap_err();
        assert!(matches!(err, ConnectError::EmptyResponse));
    }

    #[test]
    fn decodes_error_envelope() {
        let raw = json!({"type": "error", "error": {"type": "overloaded_error", "message": "Overloaded"}});
        match wire().decode_error(529, raw.to_string().as_bytes()) {
            ConnectError::Provider {
                status,
                kind,
                message,
            } => {
                assert_eq!(status, 529);
                assert_eq!(kind, "overloaded_error");
                assert_eq!(message, "Overloaded");
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
