use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{GenerationParams, ModelConfig};
use crate::error::{ComplianceError, Result};
use crate::types::TokenUsage;

/// Role of a message in the conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A single message in the conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

/// Request to the model.
#[derive(Debug, Clone)]
pub struct ModelRequest {
    /// System instructions. Empty means none are sent.
    pub system: String,
    pub messages: Vec<Message>,
    pub max_tokens: u32,
    pub temperature: f64,
}

impl ModelRequest {
    /// Single-turn request with the given sampling parameters.
    pub fn single_turn(
        system: impl Into<String>,
        user: impl Into<String>,
        params: GenerationParams,
    ) -> Self {
        Self {
            system: system.into(),
            messages: vec![Message {
                role: Role::User,
                content: user.into(),
            }],
            max_tokens: params.max_tokens,
            temperature: params.temperature,
        }
    }
}

/// Raw text returned by the model.
#[derive(Debug, Clone)]
pub struct ModelResponse {
    pub content: String,
    pub usage: TokenUsage,
}

/// Seam to the hosted text-generation service.
///
/// Implementations do not retry; failures propagate to the caller.
#[async_trait]
pub trait ModelInvoker: Send + Sync {
    async fn invoke(&self, request: &ModelRequest) -> Result<ModelResponse>;
}

/// Anthropic Messages API envelope, shared with Bedrock's Anthropic models.
#[derive(Serialize)]
pub struct MessagesBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anthropic_version: Option<&'a str>,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "is_blank")]
    pub system: &'a str,
    pub messages: &'a [Message],
    pub temperature: f64,
}

fn is_blank(s: &&str) -> bool {
    s.is_empty()
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct ContentBlock {
    text: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    input_tokens: u64,
    output_tokens: u64,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: Option<ErrorDetail>,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Parse a Messages API response body into text and usage.
///
/// Text blocks are concatenated in order. A reply without any text block
/// is an error; text blocks that are all empty yield empty content.
pub fn parse_messages_response(body: &[u8]) -> Result<ModelResponse> {
    let parsed: MessagesResponse = serde_json::from_slice(body)
        .map_err(|e| ComplianceError::ModelResponseParse(e.to_string()))?;

    let texts = parsed
        .content
        .into_iter()
        .filter_map(|block| block.text)
        .collect::<Vec<_>>();

    if texts.is_empty() {
        return Err(ComplianceError::ModelEmptyResponse);
    }
    let content = texts.join("");

    let usage = parsed
        .usage
        .map(|u| TokenUsage {
            input_tokens: u.input_tokens,
            output_tokens: u.output_tokens,
        })
        .unwrap_or_default();

    Ok(ModelResponse { content, usage })
}

/// Anthropic API client implementation.
///
/// NOTE: Do NOT derive `Debug` on this struct: `api_key` would be exposed.
pub struct AnthropicClient {
    http: reqwest::Client,
    api_key: String,
    api_base_url: String,
    model: String,
    timeout_secs: u64,
}

impl AnthropicClient {
    pub fn new(config: &ModelConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| ComplianceError::Config("MODEL_API_KEY not set".into()))?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(ComplianceError::ModelApiRequest)?;

        Ok(Self {
            http,
            api_key,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            model: config.model_id.clone(),
            timeout_secs: config.timeout_secs,
        })
    }
}

#[async_trait]
impl ModelInvoker for AnthropicClient {
    async fn invoke(&self, request: &ModelRequest) -> Result<ModelResponse> {
        let url = format!("{}/v1/messages", self.api_base_url);

        let body = MessagesBody {
            model: Some(&self.model),
            anthropic_version: None,
            max_tokens: request.max_tokens,
            system: &request.system,
            messages: &request.messages,
            temperature: request.temperature,
        };

        debug!(model = %self.model, max_tokens = request.max_tokens, "sending model request");

        let resp = self
            .http
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ComplianceError::ModelTimeout {
                        secs: self.timeout_secs,
                    }
                } else {
                    ComplianceError::ModelApiRequest(e)
                }
            })?;

        let status = resp.status().as_u16();

        if status != 200 {
            let body_text = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body_text)
                .ok()
                .and_then(|r| r.error)
                .map(|e| e.message)
                .unwrap_or(body_text);
            warn!(status, message = %message, "model API returned an error");
            return Err(ComplianceError::ModelApiError { status, message });
        }

        let bytes = resp.bytes().await?;
        parse_messages_response(&bytes)
    }
}

/// Test utilities for the model seam.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_support {
    use super::*;
    use std::sync::Mutex;

    /// Mock model that returns pre-configured responses in order and
    /// records every request it receives.
    pub struct MockModelInvoker {
        responses: Mutex<Vec<Result<ModelResponse>>>,
        requests: Mutex<Vec<ModelRequest>>,
    }

    impl MockModelInvoker {
        pub fn new(responses: Vec<Result<ModelResponse>>) -> Self {
            // Reverse so we can pop from the end
            let mut responses = responses;
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn with_response(content: &str) -> Self {
            Self::with_responses(vec![content])
        }

        pub fn with_responses(contents: Vec<&str>) -> Self {
            Self::new(
                contents
                    .into_iter()
                    .map(|c| {
                        Ok(ModelResponse {
                            content: c.to_string(),
                            usage: TokenUsage {
                                input_tokens: 100,
                                output_tokens: 200,
                            },
                        })
                    })
                    .collect(),
            )
        }

        pub fn with_error(error: ComplianceError) -> Self {
            Self::new(vec![Err(error)])
        }

        /// Requests seen so far, oldest first.
        pub fn requests(&self) -> Vec<ModelRequest> {
            self.requests
                .lock()
                .map(|r| r.clone())
                .unwrap_or_default()
        }
    }

    #[async_trait]
    impl ModelInvoker for MockModelInvoker {
        async fn invoke(&self, request: &ModelRequest) -> Result<ModelResponse> {
            if let Ok(mut seen) = self.requests.lock() {
                seen.push(request.clone());
            }
            let mut responses = self.responses.lock().map_err(|e| {
                ComplianceError::ModelResponseParse(format!("mock lock poisoned: {e}"))
            })?;
            responses
                .pop()
                .unwrap_or(Err(ComplianceError::ModelEmptyResponse))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_joins_text_blocks() {
        let body = serde_json::json!({
            "content": [
                {"type": "text", "text": "Hello, "},
                {"type": "tool_use"},
                {"type": "text", "text": "world"}
            ],
            "usage": {"input_tokens": 12, "output_tokens": 3}
        });
        let resp = parse_messages_response(body.to_string().as_bytes()).expect("parse");
        assert_eq!(resp.content, "Hello, world");
        assert_eq!(resp.usage.input_tokens, 12);
        assert_eq!(resp.usage.output_tokens, 3);
    }

    #[test]
    fn parse_rejects_empty_content() {
        let body = br#"{"content": []}"#;
        assert!(matches!(
            parse_messages_response(body),
            Err(ComplianceError::ModelEmptyResponse)
        ));
    }

    #[test]
    fn parse_accepts_empty_text_block() {
        let body = br#"{"content": [{"type": "text", "text": ""}]}"#;
        let resp = parse_messages_response(body).expect("parse");
        assert_eq!(resp.content, "");
        assert_eq!(resp.usage, TokenUsage::default());
    }

    #[test]
    fn parse_rejects_reply_without_text_blocks() {
        let body = br#"{"content": [{"type": "tool_use"}]}"#;
        assert!(matches!(
            parse_messages_response(body),
            Err(ComplianceError::ModelEmptyResponse)
        ));
    }

    #[test]
    fn body_omits_empty_system() {
        let messages = vec![Message {
            role: Role::User,
            content: "hi".into(),
        }];
        let body = MessagesBody {
            model: None,
            anthropic_version: Some("bedrock-2023-05-31"),
            max_tokens: 1000,
            system: "",
            messages: &messages,
            temperature: 0.7,
        };
        let value = serde_json::to_value(&body).expect("serialize");
        assert!(value.get("system").is_none());
        assert!(value.get("model").is_none());
        assert_eq!(value["anthropic_version"], "bedrock-2023-05-31");
        assert_eq!(value["messages"][0]["role"], "user");
    }
}
