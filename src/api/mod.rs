pub mod error;
pub mod handlers;

use std::sync::Arc;

use anyhow::Result;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::analysis::{ProfileProvider, SkinAnalyzer};
use crate::storage::ObjectStorage;

// Room for multipart boundaries and the user_id field on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub struct ApiState<P> {
    pub analyzer: Arc<SkinAnalyzer<P>>,
    pub storage: Option<ObjectStorage>,
    pub max_upload_bytes: usize,
}

impl<P> Clone for ApiState<P> {
    fn clone(&self) -> Self {
        ApiState {
            analyzer: Arc::clone(&self.analyzer),
            storage: self.storage.clone(),
            max_upload_bytes: self.max_upload_bytes,
        }
    }
}

pub fn router<P: ProfileProvider + 'static>(state: ApiState<P>) -> Router {
    let body_limit = state.max_upload_bytes + MULTIPART_OVERHEAD_BYTES;
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/analyze", post(handlers::analyze::<P>))
        .route("/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(bind_addr: &str, app: Router) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!("Analysis API listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Analysis API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::http::StatusCode;
    use axum_test::multipart::{MultipartForm, Part};
    use axum_test::TestServer;
    use serde_json::{json, Value};

    use super::*;
    use crate::analysis::testing::{
        black_photo, model_profile, oily_rules, well_lit_photo, ChattyProvider, StaticProvider,
    };
    use crate::analysis::AnalysisPayload;
    use crate::config::StorageSettings;

    const TEST_UPLOAD_LIMIT: usize = 1024 * 1024;

    fn server_with<P: ProfileProvider + 'static>(provider: P, max_upload_bytes: usize) -> TestServer {
        let analyzer = SkinAnalyzer::new(provider, oily_rules(), Duration::from_secs(5));
        let state = ApiState {
            analyzer: Arc::new(analyzer),
            storage: None,
            max_upload_bytes,
        };
        TestServer::new(router(state)).unwrap()
    }

    fn server() -> TestServer {
        server_with(
            StaticProvider::returning(model_profile("oily")),
            TEST_UPLOAD_LIMIT,
        )
    }

    fn photo_form(bytes: Vec<u8>) -> MultipartForm {
        MultipartForm::new().add_part(
            "file",
            Part::bytes(bytes).file_name("face.png").mime_type("image/png"),
        )
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let response = server().get("/health").await;
        response.assert_status_ok();
        response.assert_json(&json!({ "ok": true }));
    }

    #[tokio::test]
    async fn analyze_returns_merged_profile() {
        let form = photo_form(well_lit_photo()).add_text("user_id", "12345");
        let response = server().post("/analyze").multipart(form).await;

        response.assert_status_ok();
        let payload: AnalysisPayload = response.json();
        assert_eq!(payload.user_id, "12345");
        assert_eq!(payload.profile.skin_type, "oily");
        assert_eq!(
            payload.profile.ingredients,
            vec!["salicylic acid".to_string(), "niacinamide".to_string()]
        );
        assert!(payload.image_url.is_none());

        let raw: Value = response.json();
        assert!(raw["id"].is_string());
        assert!(raw["routine"]["morning"].is_array());
        assert_eq!(raw["metrics"].as_object().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn missing_user_id_defaults_to_anonymous() {
        let response = server()
            .post("/analyze")
            .multipart(photo_form(well_lit_photo()))
            .await;

        response.assert_status_ok();
        let payload: AnalysisPayload = response.json();
        assert_eq!(payload.user_id, "anon");
    }

    #[tokio::test]
    async fn dark_photo_is_unprocessable() {
        let response = server()
            .post("/analyze")
            .multipart(photo_form(black_photo()).add_text("user_id", "7"))
            .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        response.assert_json(&json!({ "detail": "bad_quality" }));
    }

    #[tokio::test]
    async fn missing_file_is_bad_request() {
        let form = MultipartForm::new().add_text("user_id", "7");
        let response = server().post("/analyze").multipart(form).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["detail"], "Missing file field");
    }

    #[tokio::test]
    async fn undecodable_file_is_bad_request() {
        let response = server()
            .post("/analyze")
            .multipart(photo_form(b"not an image at all".to_vec()))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn oversized_file_is_bad_request() {
        let server = server_with(StaticProvider::returning(model_profile("oily")), 16);
        let response = server
            .post("/analyze")
            .multipart(photo_form(well_lit_photo()))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert!(body["detail"].as_str().unwrap().starts_with("File too large"));
    }

    #[tokio::test]
    async fn model_failure_is_bad_gateway() {
        let server = server_with(ChattyProvider, TEST_UPLOAD_LIMIT);
        let response = server
            .post("/analyze")
            .multipart(photo_form(well_lit_photo()))
            .await;

        response.assert_status(StatusCode::BAD_GATEWAY);
        response.assert_json(&json!({ "detail": "model_error" }));
    }

    #[tokio::test]
    async fn failed_upload_still_returns_payload_without_image_url() {
        let storage = ObjectStorage::new(&StorageSettings {
            bucket: "skin".to_string(),
            endpoint_url: Some("http://127.0.0.1:1".to_string()),
            access_key: "minio".to_string(),
            secret_key: "minio-secret".to_string(),
            region: "us-east-1".to_string(),
            public_base_url: None,
            use_path_style: true,
        });
        let analyzer = SkinAnalyzer::new(
            StaticProvider::returning(model_profile("oily")),
            oily_rules(),
            Duration::from_secs(5),
        );
        let state = ApiState {
            analyzer: Arc::new(analyzer),
            storage: Some(storage),
            max_upload_bytes: TEST_UPLOAD_LIMIT,
        };
        let server = TestServer::new(router(state)).unwrap();

        let response = server
            .post("/analyze")
            .multipart(photo_form(well_lit_photo()).add_text("user_id", "12345"))
            .await;

        response.assert_status_ok();
        let raw: Value = response.json();
        assert!(raw.get("image_url").is_none());
        assert_eq!(raw["user_id"], "12345");
        assert_eq!(raw["skin_type"], "oily");
    }
}
