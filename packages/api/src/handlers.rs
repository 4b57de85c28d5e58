use axum::extract::State;
use axum::Json;
use fairlist_compliance::{AuditRequest, AuditResult, ListingBrief};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ApiError, Result};
use crate::speech::encode_audio;
use crate::state::AppState;
use crate::storage::UploadTicket;

#[derive(Deserialize)]
pub struct AudioRequest {
    pub text: String,
    pub voice_id: String,
}

#[derive(Deserialize)]
pub struct UploadRequest {
    pub filename: String,
    pub file_type: String,
}

#[derive(Serialize)]
pub struct DraftResponse {
    pub draft: String,
}

#[derive(Serialize)]
pub struct AudioResponse {
    pub audio_base64: String,
}

pub async fn health() -> Json<Value> {
    Json(serde_json::json!({
        "status": "Fairlist API is online",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn audit(
    State(state): State<AppState>,
    Json(payload): Json<AuditRequest>,
) -> Result<Json<AuditResult>> {
    let result = state.audit.run(&payload).await?;
    Ok(Json(result))
}

pub async fn generate(
    State(state): State<AppState>,
    Json(payload): Json<ListingBrief>,
) -> Result<Json<DraftResponse>> {
    let draft = state.writer.write(&payload).await?;
    Ok(Json(DraftResponse { draft }))
}

pub async fn audio(
    State(state): State<AppState>,
    Json(payload): Json<AudioRequest>,
) -> Result<Json<AudioResponse>> {
    if payload.text.trim().is_empty() {
        return Err(ApiError::Validation("text must not be empty".into()));
    }
    if payload.voice_id.trim().is_empty() {
        return Err(ApiError::Validation("voice_id must not be empty".into()));
    }

    let audio = state
        .speech
        .synthesize(&payload.text, &payload.voice_id)
        .await?;

    Ok(Json(AudioResponse {
        audio_base64: encode_audio(&audio),
    }))
}

pub async fn upload_url(
    State(state): State<AppState>,
    Json(payload): Json<UploadRequest>,
) -> Result<Json<UploadTicket>> {
    let ticket = state
        .uploads
        .presign_upload(&payload.filename, &payload.file_type)
        .await?;
    Ok(Json(ticket))
}
