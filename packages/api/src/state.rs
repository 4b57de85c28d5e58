use std::sync::Arc;

use fairlist_compliance::{
    AnthropicClient, AuditPipeline, JurisdictionRules, ListingWriter, ModelInvoker, ModelProvider,
};

use crate::bedrock::BedrockInvoker;
use crate::config::AppConfig;
use crate::error::Result;
use crate::speech::{PollySynthesizer, SpeechSynthesizer};
use crate::storage::{S3UploadSigner, UploadSigner};

#[derive(Clone)]
pub struct AppState {
    pub audit: Arc<AuditPipeline>,
    pub writer: Arc<ListingWriter>,
    pub uploads: Arc<dyn UploadSigner>,
    pub speech: Arc<dyn SpeechSynthesizer>,
}

impl AppState {
    /// Build AWS clients and the model seam from `config`.
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let rules = match &config.rules_path {
            Some(path) => {
                let rules = JurisdictionRules::from_yaml_file(path)?;
                tracing::info!(
                    path = %path.display(),
                    jurisdictions = ?rules.jurisdictions().collect::<Vec<_>>(),
                    "loaded disclosure rules"
                );
                rules
            }
            None => JurisdictionRules::default(),
        };

        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()))
            .load()
            .await;

        let model: Arc<dyn ModelInvoker> = match config.model.provider {
            ModelProvider::Bedrock => Arc::new(BedrockInvoker::new(
                aws_sdk_bedrockruntime::Client::new(&sdk_config),
                &config.model,
            )),
            ModelProvider::Anthropic => Arc::new(AnthropicClient::new(&config.model)?),
        };
        tracing::info!(
            provider = ?config.model.provider,
            model = %config.model.model_id,
            "model client ready"
        );

        let uploads = S3UploadSigner::new(
            aws_sdk_s3::Client::new(&sdk_config),
            config.bucket.clone(),
            config.upload_prefix.clone(),
            config.upload_url_ttl,
        );
        let speech = PollySynthesizer::new(aws_sdk_polly::Client::new(&sdk_config));

        Ok(Self {
            audit: Arc::new(AuditPipeline::new(
                model.clone(),
                config.model.audit,
                config.model.unparsed_status,
                rules,
            )),
            writer: Arc::new(ListingWriter::new(model, config.model.draft)),
            uploads: Arc::new(uploads),
            speech: Arc::new(speech),
        })
    }
}
