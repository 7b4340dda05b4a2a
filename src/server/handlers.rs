use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::AppState;
use crate::captions::CaptionDocument;
use crate::extractors::VideoId;
use crate::normalize::normalize;
use crate::CaptionError;

pub const VIDEO_ID_REQUIRED: &str = "videoId is required";
pub const INVALID_VIDEO_ID: &str = "Invalid videoId";
pub const CAPTIONS_UNAVAILABLE: &str = "Captions are unavailable for this video";
pub const INVALID_INPUT: &str = "Invalid input";

#[derive(Debug, Deserialize)]
pub struct CaptionQuery {
    #[serde(rename = "videoId")]
    pub video_id: Option<String>,

    /// `cues` returns timed cue objects instead of joined text
    pub format: Option<String>,
}

#[derive(Serialize)]
pub struct CaptionTextResponse {
    pub captions: String,
}

#[derive(Serialize)]
pub struct CaptionCuesResponse<'a> {
    pub captions: &'a CaptionDocument,
}

#[derive(Serialize)]
pub struct FixCaptionsResponse {
    pub result: String,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

pub async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// `GET /api/youtube-caption?videoId=...[&format=cues]`
pub async fn caption_handler(
    State(state): State<AppState>,
    query: Result<Query<CaptionQuery>, QueryRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => {
            tracing::warn!(error = %rejection, "Rejected caption query string");
            return error_response(StatusCode::BAD_REQUEST, INVALID_VIDEO_ID);
        }
    };

    let raw_id = match query.video_id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => id,
        _ => return error_response(StatusCode::BAD_REQUEST, VIDEO_ID_REQUIRED),
    };

    let video_id = match VideoId::parse(raw_id) {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!(error = %e, "Rejected caption request");
            return error_response(StatusCode::BAD_REQUEST, INVALID_VIDEO_ID);
        }
    };

    match state.pipeline.retrieve_captions(&video_id).await {
        Ok(captions) => {
            if query.format.as_deref() == Some("cues") {
                (
                    StatusCode::OK,
                    Json(CaptionCuesResponse {
                        captions: &captions.document,
                    }),
                )
                    .into_response()
            } else {
                (
                    StatusCode::OK,
                    Json(CaptionTextResponse {
                        captions: captions.raw_text(),
                    }),
                )
                    .into_response()
            }
        }
        Err(CaptionError::ExtractionFailed(failures)) => {
            tracing::error!(
                video_id = %video_id,
                attempts = failures.len(),
                "Every caption strategy failed"
            );
            error_response(StatusCode::INTERNAL_SERVER_ERROR, CAPTIONS_UNAVAILABLE)
        }
        Err(e) => {
            tracing::error!(video_id = %video_id, error = %e, "Caption retrieval failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, CAPTIONS_UNAVAILABLE)
        }
    }
}

/// `POST /api/fix-captions` with `{ "caption": "..." }`
pub async fn fix_captions_handler(body: Bytes) -> Response {
    let payload: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(error = %e, "fix-captions body is not JSON");
            return error_response(StatusCode::BAD_REQUEST, INVALID_INPUT);
        }
    };

    let caption = match payload.get("caption").and_then(Value::as_str) {
        Some(text) if !text.is_empty() => text,
        _ => {
            tracing::warn!("fix-captions called without a caption string");
            return error_response(StatusCode::BAD_REQUEST, INVALID_INPUT);
        }
    };

    let normalized = normalize(caption);
    tracing::debug!(sentences = normalized.len(), "Normalized caption text");

    (
        StatusCode::OK,
        Json(FixCaptionsResponse {
            result: normalized.joined(),
        }),
    )
        .into_response()
}
