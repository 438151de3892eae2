use std::io;
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by the conversion collaborators.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// Low-level IO failures while touching upload or output files.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    /// An uploaded image could not be decoded.
    #[error("cannot decode image #{index}: {message}")]
    Image { index: usize, message: String },
    /// The PDF writer rejected the assembled document.
    #[error("pdf encoding failed: {0}")]
    Pdf(String),
    /// The packer was handed an empty image list.
    #[error("no images to convert")]
    NoImages,
    /// The external converter could not be started.
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    /// The external converter exited with a non-zero status.
    #[error("converter exited with {}: {stderr}", exit_label(.code))]
    ProcessFailed { code: Option<i32>, stderr: String },
    /// The converter reported success but left no output behind.
    #[error("converter produced no output at {0}")]
    MissingOutput(String),
    /// A collaborator did not finish within its deadline.
    #[error("timed out after {}s", .0.as_secs_f32())]
    Timeout(Duration),
    /// Transport-level failure talking to a remote API.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    /// The remote API answered with a body that is not JSON.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "a signal".to_string(),
    }
}

/// Errors raised while building a credential store.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("failed to hash password for `{user}`: {message}")]
    Hash { user: String, message: String },
    #[error("invalid argon2 parameters: {0}")]
    Params(String),
}
