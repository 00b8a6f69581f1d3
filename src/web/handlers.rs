//! Request handlers.

use std::path::Path;
use std::sync::Arc;

use askama::Template;
use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use log::{error, warn};
use serde::Serialize;

use crate::error::KagamiError;
use crate::indexer::has_image_extension;
use crate::searcher::similarity_scores;
use crate::web::pages::{AboutTemplate, IndexTemplate, ResultItem, ResultsTemplate};
use crate::web::upload::save_upload;
use crate::web::{ensure_searcher, AppState};

/// Error type returned by handlers, mapped to an HTTP response.
#[derive(Debug)]
pub struct WebError {
    status: StatusCode,
    message: String,
}

impl From<KagamiError> for WebError {
    fn from(e: KagamiError) -> Self {
        WebError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: e.to_string(),
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        error!("Request failed: {}", self.message);
        (self.status, self.message).into_response()
    }
}

fn render_page<T: Template>(template: &T) -> Result<Html<String>, WebError> {
    template.render().map(Html).map_err(|e| WebError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        message: format!("Template render failed: {e}"),
    })
}

/// Re-render the upload form with a message about the rejected request.
fn flash_page<S: Into<String>>(message: S) -> Result<Html<String>, WebError> {
    render_page(&IndexTemplate {
        flash: Some(message.into()),
    })
}

/// Message shown when reading the upload fails. A failed body read is almost
/// always the size cap kicking in.
fn upload_error_message(state: &AppState, e: &MultipartError) -> String {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        format!(
            "File too large. Maximum size is {} MiB.",
            state.config.max_upload_bytes / (1024 * 1024)
        )
    } else {
        format!("Upload failed: {e}")
    }
}

/// Handler for `GET /`.
pub async fn index_page() -> Result<Html<String>, WebError> {
    render_page(&IndexTemplate { flash: None })
}

/// Handler for `GET /about`.
pub async fn about_page() -> Result<Html<String>, WebError> {
    render_page(&AboutTemplate)
}

/// Handler for `POST /search`: accept an uploaded image and render the
/// closest dataset images.
pub async fn search(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Html<String>, WebError> {
    let mut upload: Option<(String, axum::body::Bytes)> = None;
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return flash_page(upload_error_message(&state, &e)),
        };
        if field.name() == Some("file") {
            let file_name = field.file_name().unwrap_or("").to_string();
            match field.bytes().await {
                Ok(bytes) => upload = Some((file_name, bytes)),
                Err(e) => return flash_page(upload_error_message(&state, &e)),
            }
        }
    }

    let Some((file_name, bytes)) = upload else {
        return flash_page("No file part in the request");
    };
    if file_name.is_empty() || bytes.is_empty() {
        return flash_page("No selected file");
    }
    if !has_image_extension(&file_name) {
        return flash_page("Invalid file type. Please upload a PNG or JPEG image.");
    }

    let saved = save_upload(&state.config.upload_dir, &file_name, &bytes)?;
    let saved_str = saved.to_string_lossy().to_string();

    let searcher = ensure_searcher(&state).await?;
    let hits = match searcher.search(&saved_str, state.config.top_k).await {
        Ok(hits) => hits,
        Err(e) => {
            warn!("Search for {saved_str} failed: {e}");
            return flash_page(format!("Could not search with that image: {e}"));
        }
    };

    let scores = similarity_scores(&hits);
    let results = hits
        .iter()
        .zip(scores)
        .map(|(hit, score)| ResultItem {
            web_path: web_path(&state, &hit.path),
            file_name: file_name_of(&hit.path),
            similarity: format!("{score:.1}"),
            distance: format!("{:.4}", hit.distance),
        })
        .collect();

    render_page(&ResultsTemplate {
        query_image: web_path(&state, &saved_str),
        results,
    })
}

/// Health check response body.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"` when the service is up.
    pub status: String,
    /// Number of indexed images, 0 until the index is first loaded.
    pub indexed_images: usize,
}

/// Handler for `GET /health`.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let indexed_images = state
        .searcher
        .read()
        .await
        .as_ref()
        .map(|searcher| searcher.store().len())
        .unwrap_or(0);

    Json(HealthResponse {
        status: "ok".to_string(),
        indexed_images,
    })
}

/// Map a file-system path into the `/static/` URL space.
fn web_path(state: &AppState, fs_path: &str) -> String {
    let path = Path::new(fs_path);
    if let Ok(rel) = path.strip_prefix(&state.config.dataset_dir) {
        return format!("/static/dataset/{}", to_url(rel));
    }
    if let Ok(rel) = path.strip_prefix(&state.config.upload_dir) {
        return format!("/static/uploads/{}", to_url(rel));
    }
    fs_path.to_string()
}

fn to_url(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect::<Vec<_>>()
        .join("/")
}

fn file_name_of(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string())
}
