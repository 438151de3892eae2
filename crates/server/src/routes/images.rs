use super::{accept_multipart, pdf_attachment, read_files, validate_file};
use crate::error::{ServerError, ServerResult};
use crate::middleware::AuthenticatedUser;
use crate::state::ServerState;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::response::Response;
use axum::Extension;
use bytes::Bytes;
use filegate::FileKind;
use std::sync::Arc;

/// Pack uploaded images into one PDF, one page per image in upload order.
///
/// Expects every image as a multipart part named `files`. A single invalid
/// file rejects the whole batch.
pub async fn images_to_pdf(
    State(state): State<Arc<ServerState>>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ServerResult<Response> {
    let mut multipart = accept_multipart(multipart)?;
    let files = read_files(&mut multipart, "files", false, state.config.max_body_size_mb).await?;

    if files.is_empty() {
        return Err(ServerError::BadRequest("No files uploaded".to_string()));
    }
    for file in &files {
        validate_file(file, FileKind::Image)?;
    }

    let count = files.len();
    let images: Vec<Bytes> = files.into_iter().map(|f| f.data).collect();
    let packer = state.images.clone();
    let packed = tokio::task::spawn_blocking(move || packer.pack(&images)).await?;

    match packed {
        Ok(pdf) => {
            tracing::info!(user = %user, files = count, bytes = pdf.len(), "Images packed into PDF");
            metrics::counter!("filegate_conversions_total", "kind" => "images", "outcome" => "ok")
                .increment(1);
            Ok(pdf_attachment(pdf))
        }
        Err(e) => {
            metrics::counter!("filegate_conversions_total", "kind" => "images", "outcome" => "error")
                .increment(1);
            Err(ServerError::conversion("Failed to convert images to PDF", e))
        }
    }
}
