use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use fairlist_api::error::{ApiError, Result};
use fairlist_api::speech::SpeechSynthesizer;
use fairlist_api::storage::{object_key, validate_filename, UploadSigner, UploadTicket};
use fairlist_api::{cors_layer, router, AppState};
use fairlist_compliance::{
    AuditPipeline, AuditStatus, ComplianceError, GenerationParams, JurisdictionRules,
    ListingWriter, MockModelInvoker,
};
use http_body_util::BodyExt;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::ServiceExt;

struct FixedUploads;

#[async_trait]
impl UploadSigner for FixedUploads {
    async fn presign_upload(&self, filename: &str, _content_type: &str) -> Result<UploadTicket> {
        validate_filename(filename)?;
        let file_key = object_key("uploads", 1_700_000_000, filename);
        Ok(UploadTicket {
            upload_url: format!("https://bucket.s3.amazonaws.com/{file_key}?X-Amz-Expires=60"),
            file_key,
        })
    }
}

#[derive(Default)]
struct RecordingSpeech {
    calls: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl SpeechSynthesizer for RecordingSpeech {
    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<Vec<u8>> {
        if voice_id == "Nobody" {
            return Err(ApiError::Speech("voice Nobody does not exist".into()));
        }
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((text.to_string(), voice_id.to_string()));
        }
        Ok(b"ID3\x04".to_vec())
    }
}

fn app_with(model: MockModelInvoker, speech: Arc<RecordingSpeech>) -> Router {
    let model = Arc::new(model);
    let state = AppState {
        audit: Arc::new(AuditPipeline::new(
            model.clone(),
            GenerationParams::AUDIT,
            AuditStatus::Pass,
            JurisdictionRules::default(),
        )),
        writer: Arc::new(ListingWriter::new(model, GenerationParams::DRAFT)),
        uploads: Arc::new(FixedUploads),
        speech,
    };
    router(state, cors_layer(&[]))
}

fn app(model: MockModelInvoker) -> Router {
    app_with(model, Arc::new(RecordingSpeech::default()))
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

fn audit_body(state: &str, is_owner: bool) -> Value {
    json!({
        "text": "Great house, no kids.",
        "state": state,
        "brokerage": "Desert Sun Realty",
        "rules": "Flag familial status.",
        "is_owner": is_owner
    })
}

#[tokio::test]
async fn health_reports_online() {
    let (status, body) = send(
        app(MockModelInvoker::with_responses(vec![])),
        Request::builder().uri("/").body(Body::empty()).expect("request"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Fairlist API is online");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn audit_returns_verdict_with_disclosure() {
    let model = MockModelInvoker::with_response(
        r#"{"status":"FAIL","violations":[{"phrase":"no kids","citation":"familial status","reason":"excludes families"}],"final_text":"Great house."}"#,
    );

    let (status, body) = send(app(model), post_json("/api/audit", audit_body("AZ", true))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "status": "FAIL",
            "violations": [{"phrase": "no kids", "citation": "familial status", "reason": "excludes families"}],
            "final_text": "Great house. (Owner/Agent)"
        })
    );
}

#[tokio::test]
async fn audit_falls_back_for_unparsed_output() {
    let model = MockModelInvoker::with_response("I cannot comply with this request.");

    let (status, body) = send(app(model), post_json("/api/audit", audit_body("CA", true))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "status": "PASS",
            "violations": [],
            "final_text": "I cannot comply with this request."
        })
    );
}

#[tokio::test]
async fn audit_upstream_error_is_500_with_detail() {
    let model = MockModelInvoker::with_error(ComplianceError::ModelService {
        provider: "bedrock".into(),
        message: "ThrottlingException".into(),
    });

    let (status, body) = send(app(model), post_json("/api/audit", audit_body("AZ", true))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let detail = body["detail"].as_str().expect("detail");
    assert!(detail.contains("ThrottlingException"), "{detail}");
}

#[tokio::test]
async fn audit_missing_field_is_client_error() {
    let response = app(MockModelInvoker::with_responses(vec![]))
        .oneshot(post_json("/api/audit", json!({"text": "hi", "state": "AZ"})))
        .await
        .expect("response");

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn generate_returns_draft() {
    let model = MockModelInvoker::with_response("Sun-drenched retreat.\n");

    let (status, body) = send(
        app(model),
        post_json(
            "/api/generate",
            json!({
                "address": "12 Saguaro Way",
                "specs": "3 bed / 2 bath",
                "features": "pool",
                "tone": "warm"
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"draft": "Sun-drenched retreat."}));
}

#[tokio::test]
async fn audio_returns_base64() {
    let speech = Arc::new(RecordingSpeech::default());
    let (status, body) = send(
        app_with(MockModelInvoker::with_responses(vec![]), speech.clone()),
        post_json("/api/audio", json!({"text": "Welcome home.", "voice_id": "Joanna"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"audio_base64": "SUQzBA=="}));
    let calls = speech.calls.lock().expect("lock").clone();
    assert_eq!(calls, vec![("Welcome home.".to_string(), "Joanna".to_string())]);
}

#[tokio::test]
async fn audio_rejects_empty_text() {
    let (status, body) = send(
        app(MockModelInvoker::with_responses(vec![])),
        post_json("/api/audio", json!({"text": "  ", "voice_id": "Joanna"})),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["detail"], "invalid request: text must not be empty");
}

#[tokio::test]
async fn audio_upstream_error_is_500() {
    let (status, body) = send(
        app(MockModelInvoker::with_responses(vec![])),
        post_json("/api/audio", json!({"text": "Hello", "voice_id": "Nobody"})),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body["detail"],
        "speech service error: voice Nobody does not exist"
    );
}

#[tokio::test]
async fn upload_url_returns_ticket() {
    let (status, body) = send(
        app(MockModelInvoker::with_responses(vec![])),
        post_json(
            "/api/upload-url",
            json!({"filename": "kitchen.jpg", "file_type": "image/jpeg"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["file_key"], "uploads/1700000000_kitchen.jpg");
    assert!(body["upload_url"]
        .as_str()
        .expect("url")
        .contains("uploads/1700000000_kitchen.jpg"));
}

#[tokio::test]
async fn upload_url_rejects_path_traversal() {
    let (status, _) = send(
        app(MockModelInvoker::with_responses(vec![])),
        post_json(
            "/api/upload-url",
            json!({"filename": "../secrets.txt", "file_type": "text/plain"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn cors_preflight_is_allowed() {
    let response = app(MockModelInvoker::with_responses(vec![]))
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/audit")
                .header("origin", "http://localhost:5173")
                .header("access-control-request-method", "POST")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .expect("allow-origin header"),
        "*"
    );
}
