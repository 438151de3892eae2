use super::single_upload;
use crate::error::{ServerError, ServerResult};
use crate::middleware::AuthenticatedUser;
use crate::state::ServerState;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::Extension;
use axum::Json;
use filegate::{persist_upload, FileKind};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Transcription response
#[derive(Debug, Serialize, Deserialize)]
pub struct TranscriptResponse {
    pub text: String,
}

/// Transcribe an uploaded MP3 (multipart part `file`).
///
/// Once the upload is stored the answer is always 200: transcription
/// failures are reported inside `text` rather than as an error status.
/// Failing to store the upload locally is a 500.
pub async fn audio_to_text(
    State(state): State<Arc<ServerState>>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ServerResult<Json<TranscriptResponse>> {
    let file = single_upload(multipart, FileKind::Audio, state.config.max_body_size_mb).await?;

    let upload = persist_upload(&state.config.upload_dir, &file.filename, &file.data)
        .await
        .map_err(|e| ServerError::conversion("Failed to store audio upload", e.into()))?;

    let result = state.transcriber.transcribe(&upload).await;
    drop(upload);

    let text = match result {
        Ok(text) => {
            tracing::info!(user = %user, bytes = file.data.len(), "Audio transcribed");
            metrics::counter!("filegate_conversions_total", "kind" => "audio", "outcome" => "ok")
                .increment(1);
            text
        }
        Err(e) => {
            tracing::error!(user = %user, error = %e, "Transcription failed");
            metrics::counter!("filegate_conversions_total", "kind" => "audio", "outcome" => "error")
                .increment(1);
            format!("API request failed: {e}")
        }
    };

    Ok(Json(TranscriptResponse { text }))
}
