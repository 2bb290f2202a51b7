//! Captioned video serving for the hearing track.

use axum::{
    extract::{Path, Request, State},
    response::{IntoResponse, Response},
};
use std::{io::ErrorKind, path::PathBuf, sync::Arc};
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tracing::{debug, warn};

use crate::{handlers::ApiError, state::AppState};

const VIDEO_NOT_FOUND: &str = "Video not found";

/// Location of a topic's video: `{video_dir}/{course}_{index}.mp4`.
pub fn video_path(state: &AppState, course_name: &str, topic_index: usize) -> PathBuf {
    state
        .config
        .video_dir
        .join(format!("{course_name}_{topic_index}.mp4"))
}

fn not_found() -> ApiError {
    ApiError::NotFound(VIDEO_NOT_FOUND.to_string())
}

/// Streams the video for one hearing-track topic, honouring `Range` requests.
#[utoipa::path(
    get,
    path = "/video/{course_name}/{topic_index}",
    params(
        ("course_name" = String, Path, description = "Hearing track course name"),
        ("topic_index" = usize, Path, description = "Zero-based topic position")
    ),
    responses(
        (status = 200, description = "MP4 video", body = Vec<u8>, content_type = "video/mp4"),
        (status = 206, description = "Requested byte range of the video", body = Vec<u8>, content_type = "video/mp4"),
        (status = 404, description = "Unknown topic or missing file", body = crate::models::ErrorResponse)
    )
)]
pub async fn video(
    State(state): State<Arc<AppState>>,
    Path((course_name, topic_index)): Path<(String, String)>,
    request: Request,
) -> Result<Response, ApiError> {
    // Anything that is not a topic position is simply not a video.
    let topic_index: usize = topic_index.parse().map_err(|_| not_found())?;
    let topic = state
        .hearing_catalog
        .topic(&course_name, topic_index)
        .ok_or_else(not_found)?;

    let path = video_path(&state, &course_name, topic_index);
    match tokio::fs::metadata(&path).await {
        Ok(metadata) if metadata.is_file() => {}
        Ok(_) => return Err(not_found()),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!(path = %path.display(), "Video file missing");
            return Err(not_found());
        }
        Err(e) => return Err(e.into()),
    }

    let response = ServeFile::new(&path).oneshot(request).await?;
    debug!(
        course = %course_name,
        index = topic_index,
        status = %response.status(),
        "Serving video"
    );

    if state.config.caption_playback && !topic.summary.is_empty() {
        let speech = state.speech.clone();
        let summary = topic.summary.clone();
        tokio::spawn(async move { speech.speak(&summary).await });
    }

    Ok(response.into_response())
}
