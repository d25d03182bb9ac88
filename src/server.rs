use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::services::ServeDir;

use crate::error::AnalysisError;
use crate::handlers::FoodAnalyzer;
use crate::models::NutritionReport;

const UPLOAD_FIELD: &str = "file";

pub struct AppState {
    pub analyzer: Arc<FoodAnalyzer>,
}

pub fn create_router(analyzer: Arc<FoodAnalyzer>, max_upload_bytes: usize) -> Router {
    let state = Arc::new(AppState { analyzer });

    Router::new()
        .route("/", get(index_page))
        .route("/analyze", post(analyze_handler))
        .route("/health", get(health_check))
        .nest_service("/static", ServeDir::new("static"))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}

impl IntoResponse for AnalysisError {
    fn into_response(self) -> Response {
        if self.is_client_error() {
            log::warn!("⚠️ Rejected upload: {}", self);
            return error_response(StatusCode::BAD_REQUEST, self.to_string());
        }

        log::error!("❌ Analysis failed: {:?}", self);
        error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Analysis failed: {}", self),
        )
    }
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// POST /analyze - multipart upload with the photo in field `file`
async fn analyze_handler(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<NutritionReport>, Response> {
    let mut multipart = match multipart {
        Ok(m) => m,
        Err(e) => {
            log::debug!("Request is not a multipart upload: {}", e);
            return Err(AnalysisError::MissingUpload.into_response());
        }
    };

    let upload = read_upload(&mut multipart).await?;
    let report = state
        .analyzer
        .analyze(upload)
        .await
        .map_err(IntoResponse::into_response)?;

    Ok(Json(report))
}

async fn read_upload(multipart: &mut Multipart) -> Result<Vec<u8>, Response> {
    loop {
        let field = multipart.next_field().await.map_err(|e| {
            log::warn!("⚠️ Failed to read multipart field: {}", e);
            error_response(e.status(), format!("Failed to read upload: {}", e))
        })?;

        let Some(field) = field else {
            return Err(AnalysisError::MissingUpload.into_response());
        };

        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        // A part without a filename is a form value, not a file
        match field.file_name() {
            None => continue,
            Some("") => return Err(AnalysisError::EmptyUpload.into_response()),
            Some(_) => {}
        }

        let bytes = field.bytes().await.map_err(|e| {
            log::warn!("⚠️ Failed to read uploaded file: {}", e);
            error_response(e.status(), format!("Failed to read upload: {}", e))
        })?;

        log::info!("📥 Received upload: {} bytes", bytes.len());
        return Ok(bytes.to_vec());
    }
}

async fn index_page() -> Html<&'static str> {
    Html(include_str!("../static/index.html"))
}

async fn health_check() -> &'static str {
    "OK"
}
