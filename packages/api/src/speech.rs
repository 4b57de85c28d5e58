use async_trait::async_trait;
use aws_sdk_polly::error::DisplayErrorContext;
use aws_sdk_polly::types::{Engine, LanguageCode, OutputFormat, VoiceId};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tracing::info;

use crate::error::{ApiError, Result};

/// Text-to-speech seam. Returns encoded audio bytes.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<Vec<u8>>;
}

/// Amazon Polly, neural engine, US English, mp3.
pub struct PollySynthesizer {
    client: aws_sdk_polly::Client,
}

impl PollySynthesizer {
    pub fn new(client: aws_sdk_polly::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SpeechSynthesizer for PollySynthesizer {
    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<Vec<u8>> {
        let output = self
            .client
            .synthesize_speech()
            .engine(Engine::Neural)
            .language_code(LanguageCode::EnUs)
            .output_format(OutputFormat::Mp3)
            .text(text)
            .voice_id(VoiceId::from(voice_id))
            .send()
            .await
            .map_err(|e| ApiError::Speech(DisplayErrorContext(e).to_string()))?;

        let audio = output
            .audio_stream
            .collect()
            .await
            .map_err(|e| ApiError::Speech(e.to_string()))?
            .into_bytes();

        info!(voice_id, bytes = audio.len(), "synthesized speech");
        Ok(audio.to_vec())
    }
}

pub fn encode_audio(audio: &[u8]) -> String {
    STANDARD.encode(audio)
}
