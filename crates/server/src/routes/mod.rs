//! API route handlers
//!
//! - `health`: liveness and Prometheus metrics
//! - `images`: image set -> PDF
//! - `document`: Word document -> PDF
//! - `audio`: MP3 -> transcript
//!
//! The helpers below pull file parts out of multipart bodies and apply the
//! shared filename checks.

pub mod audio;
pub mod document;
pub mod health;
pub mod images;

use crate::error::{ServerError, ServerResult};
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::Multipart;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use filegate::{FileKind, UploadedFile};

/// 404 Not Found handler
///
/// Returns a standardized error response for undefined routes.
pub async fn not_found() -> ServerError {
    ServerError::NotFound
}

/// 200 response carrying a PDF attachment named `output.pdf`.
pub(crate) fn pdf_attachment(bytes: Vec<u8>) -> Response {
    (
        StatusCode::OK,
        [
            (CONTENT_TYPE, "application/pdf"),
            (CONTENT_DISPOSITION, "attachment; filename=\"output.pdf\""),
        ],
        bytes,
    )
        .into_response()
}

/// Unwrap the multipart extractor, mapping a malformed request to 400.
pub(crate) fn accept_multipart(
    multipart: Result<Multipart, MultipartRejection>,
) -> ServerResult<Multipart> {
    multipart.map_err(|rejection| ServerError::BadRequest(rejection.body_text()))
}

fn multipart_error(err: MultipartError, max_body_size_mb: usize) -> ServerError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ServerError::PayloadTooLarge(max_body_size_mb)
    } else {
        ServerError::BadRequest(err.body_text())
    }
}

/// Read every file part named `field`, in body order.
///
/// Parts without a `filename` parameter are plain form values and are skipped.
/// With `first_only` the body is not read past the first match.
pub(crate) async fn read_files(
    multipart: &mut Multipart,
    field: &str,
    first_only: bool,
    max_body_size_mb: usize,
) -> ServerResult<Vec<UploadedFile>> {
    let mut files = Vec::new();

    while let Some(part) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_body_size_mb))?
    {
        if part.name() != Some(field) {
            continue;
        }
        let Some(filename) = part.file_name().map(str::to_string) else {
            continue;
        };

        let data = part
            .bytes()
            .await
            .map_err(|e| multipart_error(e, max_body_size_mb))?;
        files.push(UploadedFile::new(filename, data));

        if first_only {
            break;
        }
    }

    Ok(files)
}

/// Check one upload: non-empty filename with an allowed extension.
pub(crate) fn validate_file(file: &UploadedFile, kind: FileKind) -> ServerResult<()> {
    if file.filename.is_empty() {
        return Err(ServerError::BadRequest("Invalid file".to_string()));
    }
    if !kind.accepts(&file.filename) {
        return Err(ServerError::BadRequest(kind.invalid_format_message()));
    }
    Ok(())
}

/// Read and validate the single `file` part used by the document and audio routes.
pub(crate) async fn single_upload(
    multipart: Result<Multipart, MultipartRejection>,
    kind: FileKind,
    max_body_size_mb: usize,
) -> ServerResult<UploadedFile> {
    let mut multipart = accept_multipart(multipart)?;
    let file = read_files(&mut multipart, "file", true, max_body_size_mb)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| ServerError::BadRequest("No file uploaded".to_string()))?;

    validate_file(&file, kind)?;
    Ok(file)
}
