//! Gemini `generateContent` API.

use super::{invalid_role, Decoded, HistoryPolicy, RequestSettings, WireFormat, PNG_MEDIA_TYPE};
use crate::config::Provider;
use crate::error::ConnectError;
use crate::http::undecoded_error;
use crate::request::Role;
use frbench_core::TokenUsage;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeminiContent {
    pub role: String,
    pub parts: Vec<GeminiPart>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GeminiPart {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub inline_data: Option<GeminiBlob>,
}

impl GeminiPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeminiBlob {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Serialize)]
struct GeminiSystem {
    parts: [GeminiPart; 1],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    max_output_tokens: u32,
}

#[derive(Debug, Serialize)]
struct GeminiRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiSystem>,
    #[serde(rename = "safetySettings")]
    safety_settings: [SafetySetting; 1],
    contents: &'a [GeminiContent],
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    usage_metadata: GeminiUsage,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsage {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

/// Wire format of one Gemini model.
///
/// Unlike the other providers, Gemini's history carries the model's replies,
/// so follow-up prompts see the previous answers.
#[derive(Debug, Clone)]
pub struct GeminiWire {
    model: String,
    api_key: String,
    base_url: String,
}

impl GeminiWire {
    pub fn new(model: impl Into<String>, api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }
}

impl WireFormat for GeminiWire {
    type Message = GeminiContent;

    fn provider(&self) -> Provider {
        Provider::Google
    }

    fn history_policy(&self) -> HistoryPolicy {
        HistoryPolicy::UserAndReply
    }

    fn prompt_message(
        &self,
        role: Role,
        text: &str,
        image_b64: Option<&str>,
    ) -> Result<GeminiContent, ConnectError> {
        let role = match role {
            Role::User => "user",
            Role::Model => "model",
            Role::System => return Err(invalid_role(role, self.provider())),
        };
        let mut parts = vec![GeminiPart::text(text)];
        if let Some(data) = image_b64 {
            parts.push(GeminiPart {
                text: None,
                inline_data: Some(GeminiBlob {
                    mime_type: PNG_MEDIA_TYPE.into(),
                    data: data.into(),
                }),
            });
        }
        Ok(GeminiContent {
            role: role.into(),
            parts,
        })
    }

    fn encode_request(
        &self,
        settings: &RequestSettings<'_>,
        messages: &[GeminiContent],
    ) -> Result<Vec<u8>, ConnectError> {
        let system_instruction = (!settings.system.is_empty()).then(|| GeminiSystem {
            parts: [GeminiPart::text(settings.system)],
        });
        let request = GeminiRequest {
            system_instruction,
            safety_settings: [SafetySetting {
                category: "HARM_CATEGORY_DANGEROUS_CONTENT",
                threshold: "BLOCK_ONLY_HIGH",
            }],
            contents: messages,
            generation_config: GenerationConfig {
                temperature: settings.temperature,
                max_output_tokens: settings.max_tokens,
            },
        };
        Ok(serde_json::to_vec(&request)?)
    }

    fn build_request(&self, client: &reqwest::Client, body: Vec<u8>) -> reqwest::RequestBuilder {
        client
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.base_url, self.model
            ))
            .query(&[("key", self.api_key.as_str())])
            .header("content-type", "application/json")
            .body(body)
    }

    fn decode_response(&self, bytes: &[u8]) -> Result<Decoded<GeminiContent>, ConnectError> {
        let response: GeminiResponse = serde_json::from_slice(bytes)?;
        let content = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .ok_or(ConnectError::EmptyResponse)?;
        let text = content
            .parts
            .first()
            .and_then(|p| p.text.clone())
            .ok_or(ConnectError::EmptyResponse)?;
        Ok(Decoded {
            reply: GeminiContent {
                role: "model".into(),
                parts: vec![GeminiPart::text(text.clone())],
            },
            text,
            usage: TokenUsage::new(
                response.usage_metadata.prompt_token_count,
                response.usage_metadata.candidates_token_count,
            ),
        })
    }

    fn decode_error(&self, status: u16, body: &[u8]) -> ConnectError {
        match serde_json::from_slice::<GeminiErrorResponse>(body) {
            Ok(envelope) => ConnectError::Provider {
                status,
                kind: if envelope.error.status.is_empty() {
                    "unknown".into()
                } else {
                    envelope.error.status
                },
                message: envelope.error.message,
            },
            Err(_) => undecoded_error(status, body),
        }
    }
}
