//! Thin HTTP surface over the capture pipeline
//!
//! Two endpoints: submit a link for capture, and download the stored
//! artifacts. The pipeline is awaited synchronously — the response only says
//! success once the artifacts are on disk.

use crate::{ArtifactKind, CaptureError, CaptureRequest, CaptureService, ValidityChecker};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

/// The web UI drives one capture at a time and downloads "the" artifact, so
/// captures submitted over HTTP all share this identifier. Each new capture
/// overwrites the previous pair.
pub const WEB_ARTIFACT_ID: &str = "clone";

#[derive(Clone)]
struct AppState {
    service: Arc<CaptureService>,
}

#[derive(Deserialize)]
struct LinkRequest {
    link: String,
}

#[derive(Deserialize, Default)]
struct DownloadRequest {
    #[serde(default)]
    html: bool,
    #[serde(default)]
    img: bool,
}

/// Serve the HTTP surface until the process is stopped.
pub async fn serve(service: Arc<CaptureService>, port: u16) -> anyhow::Result<()> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/api/website-link", post(handle_website_link))
        .route("/api/profanity-download", post(handle_profanity_download))
        .layer(cors)
        .with_state(AppState { service });

    let addr = format!("0.0.0.0:{port}");
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on port {port}");

    axum::serve(listener, app).await?;
    Ok(())
}

async fn handle_website_link(
    State(state): State<AppState>,
    Json(req): Json<LinkRequest>,
) -> Response {
    info!("Link: {}", req.link);

    if state.service.config().precheck_validity {
        let status = state.service.check_validity(&req.link).await;
        if !ValidityChecker::is_reachable(status) {
            warn!("Rejecting unreachable link {} (probe: {})", req.link, status);
            return failure(
                StatusCode::BAD_GATEWAY,
                format!("link is not reachable (status {status})"),
            );
        }
    }

    let request = CaptureRequest::new(req.link, WEB_ARTIFACT_ID);
    match state.service.capture(request).await {
        Ok(outcome) => {
            info!("Profanity processing completed");
            Json(serde_json::json!({
                "status": "success",
                "wordCount": outcome.stats.word_count,
                "profanityCount": outcome.stats.profanity_count,
                "profanityMakeup": nan_safe(outcome.stats.profanity_makeup),
            }))
            .into_response()
        }
        Err(e) => {
            warn!("Capture failed: {e}");
            failure(error_status(&e), e.to_string())
        }
    }
}

async fn handle_profanity_download(
    State(state): State<AppState>,
    Json(req): Json<DownloadRequest>,
) -> Response {
    // html wins when both flags are set
    let kind = if req.html {
        ArtifactKind::Markup
    } else if req.img {
        ArtifactKind::Screenshot
    } else {
        return failure(StatusCode::NOT_FOUND, "no artifact kind requested".into());
    };

    let path = match state.service.store().fetch(WEB_ARTIFACT_ID, kind).await {
        Ok(path) => path,
        Err(e) => return failure(StatusCode::NOT_FOUND, e.to_string()),
    };

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            // Artifact vanished between fetch and read (retention sweep)
            warn!("Download read failed for {}: {}", path.display(), e);
            return failure(StatusCode::NOT_FOUND, "artifact no longer available".into());
        }
    };

    let filename = format!("{}.{}", WEB_ARTIFACT_ID, kind.extension());
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, kind.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response()
}

fn failure(status: StatusCode, message: String) -> Response {
    (
        status,
        Json(serde_json::json!({
            "status": "failure",
            "error": message,
        })),
    )
        .into_response()
}

fn error_status(error: &CaptureError) -> StatusCode {
    match error {
        CaptureError::InvalidUrl(_) => StatusCode::BAD_REQUEST,
        CaptureError::ArtifactNotFound(_) => StatusCode::NOT_FOUND,
        CaptureError::NavigationTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
        CaptureError::NavigationFailed { .. } => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// JSON has no NaN; a zero-word page reports null makeup.
fn nan_safe(value: f64) -> serde_json::Value {
    if value.is_nan() {
        serde_json::Value::Null
    } else {
        serde_json::json!(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn download_kind_precedence() {
        // Mirrors the handler's flag logic: html wins, neither is an error
        let pick = |html: bool, img: bool| -> Option<ArtifactKind> {
            if html {
                Some(ArtifactKind::Markup)
            } else if img {
                Some(ArtifactKind::Screenshot)
            } else {
                None
            }
        };

        assert_eq!(pick(true, true), Some(ArtifactKind::Markup));
        assert_eq!(pick(false, true), Some(ArtifactKind::Screenshot));
        assert_eq!(pick(false, false), None);
    }

    #[test]
    fn nan_makeup_serializes_as_null() {
        assert_eq!(nan_safe(f64::NAN), serde_json::Value::Null);
        assert_eq!(nan_safe(25.0), serde_json::json!(25.0));
    }

    #[test]
    fn error_statuses_distinguish_client_and_upstream_failures() {
        assert_eq!(
            error_status(&CaptureError::InvalidUrl("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            error_status(&CaptureError::NavigationTimeout(
                std::time::Duration::from_secs(1)
            )),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            error_status(&CaptureError::BrowserUnavailable),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
