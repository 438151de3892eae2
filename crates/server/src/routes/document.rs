use super::{pdf_attachment, single_upload};
use crate::error::{ServerError, ServerResult};
use crate::middleware::AuthenticatedUser;
use crate::state::ServerState;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::response::Response;
use axum::Extension;
use filegate::{persist_upload, FileKind};
use std::sync::Arc;

const CONTEXT: &str = "Failed to convert Docx to PDF";

/// Convert an uploaded `.doc`/`.docx` (multipart part `file`) to PDF.
///
/// The upload is written under the configured upload directory for the
/// converter and removed again on every exit path.
pub async fn word_to_pdf(
    State(state): State<Arc<ServerState>>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ServerResult<Response> {
    let file = single_upload(multipart, FileKind::Document, state.config.max_body_size_mb).await?;

    let upload = persist_upload(&state.config.upload_dir, &file.filename, &file.data)
        .await
        .map_err(|e| ServerError::conversion(CONTEXT, e.into()))?;

    let converted = state
        .documents
        .convert(&upload, state.config.converter.timeout())
        .await;
    drop(upload);

    match converted {
        Ok(pdf) => {
            tracing::info!(user = %user, bytes = pdf.len(), "Document converted to PDF");
            metrics::counter!("filegate_conversions_total", "kind" => "document", "outcome" => "ok")
                .increment(1);
            Ok(pdf_attachment(pdf))
        }
        Err(e) => {
            metrics::counter!("filegate_conversions_total", "kind" => "document", "outcome" => "error")
                .increment(1);
            Err(ServerError::conversion(CONTEXT, e))
        }
    }
}
