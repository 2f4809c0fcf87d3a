//! HTTP transport: multipart request in, outcome JSON out. The analysis
//! core never surfaces a transport-level error; failures ride in the
//! response body with a success status.

use crate::core::dispatch::Analyst;
use crate::domain::model::{AnalysisOutcome, AnalysisRequest, Attachment};
use crate::utils::error::{AgentError, Result};
use axum::extract::multipart::MultipartError;
use axum::extract::{DefaultBodyLimit, Multipart};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

pub fn router(analyst: Arc<Analyst>) -> Router {
    Router::new()
        .route("/api/", post(analyze))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .layer(Extension(analyst))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn analyze(
    Extension(analyst): Extension<Arc<Analyst>>,
    multipart: Multipart,
) -> Json<AnalysisOutcome> {
    let request = match read_request(multipart).await {
        Ok(request) => request,
        Err(e) => {
            return Json(AnalysisOutcome::Failure {
                error: e.to_string(),
            })
        }
    };
    Json(analyst.handle(&request).await)
}

/// Field `file` carries the question text; every `other_files` field is
/// an attachment. Other fields are ignored.
async fn read_request(mut multipart: Multipart) -> Result<AnalysisRequest> {
    let mut question_text = None;
    let mut attachments = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(upload_err)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let bytes = field.bytes().await.map_err(upload_err)?;
                question_text = Some(String::from_utf8_lossy(&bytes).trim().to_string());
            }
            "other_files" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(upload_err)?;
                attachments.push(Attachment {
                    filename,
                    bytes: bytes.to_vec(),
                });
            }
            other => tracing::debug!("Ignoring unknown multipart field: {}", other),
        }
    }

    let question_text = question_text.ok_or_else(|| AgentError::UploadError {
        message: "missing question field 'file'".to_string(),
    })?;
    Ok(AnalysisRequest {
        question_text,
        attachments,
    })
}

fn upload_err(e: MultipartError) -> AgentError {
    AgentError::UploadError {
        message: e.to_string(),
    }
}
