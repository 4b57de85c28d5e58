//! Model invocation through Amazon Bedrock.

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_bedrockruntime::error::DisplayErrorContext;
use aws_sdk_bedrockruntime::primitives::Blob;
use fairlist_compliance::model::{parse_messages_response, MessagesBody};
use fairlist_compliance::{ComplianceError, ModelConfig, ModelInvoker, ModelRequest, ModelResponse};
use tracing::debug;

/// Envelope version Bedrock expects for Anthropic models.
pub const BEDROCK_ANTHROPIC_VERSION: &str = "bedrock-2023-05-31";

const PROVIDER: &str = "bedrock";

pub struct BedrockInvoker {
    client: aws_sdk_bedrockruntime::Client,
    model_id: String,
    timeout: Duration,
}

impl BedrockInvoker {
    pub fn new(client: aws_sdk_bedrockruntime::Client, config: &ModelConfig) -> Self {
        Self {
            client,
            model_id: config.model_id.clone(),
            timeout: config.timeout(),
        }
    }
}

/// Serialize a request into Bedrock's Anthropic envelope.
pub fn encode_request(request: &ModelRequest) -> fairlist_compliance::Result<Vec<u8>> {
    let body = MessagesBody {
        model: None,
        anthropic_version: Some(BEDROCK_ANTHROPIC_VERSION),
        max_tokens: request.max_tokens,
        system: &request.system,
        messages: &request.messages,
        temperature: request.temperature,
    };
    serde_json::to_vec(&body).map_err(|e| ComplianceError::ModelService {
        provider: PROVIDER.into(),
        message: format!("failed to encode request: {e}"),
    })
}

#[async_trait]
impl ModelInvoker for BedrockInvoker {
    async fn invoke(&self, request: &ModelRequest) -> fairlist_compliance::Result<ModelResponse> {
        let payload = encode_request(request)?;

        debug!(model = %self.model_id, max_tokens = request.max_tokens, "invoking bedrock model");

        let call = self
            .client
            .invoke_model()
            .model_id(&self.model_id)
            .content_type("application/json")
            .accept("application/json")
            .body(Blob::new(payload))
            .send();

        let output = tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| ComplianceError::ModelTimeout {
                secs: self.timeout.as_secs(),
            })?
            .map_err(|e| ComplianceError::ModelService {
                provider: PROVIDER.into(),
                message: DisplayErrorContext(e).to_string(),
            })?;

        parse_messages_response(output.body().as_ref())
    }
}
