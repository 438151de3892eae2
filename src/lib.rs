//! Core of the filegate conversion gateway.
//!
//! This crate holds everything behind the HTTP surface:
//!
//! - **Credentials**: [`CredentialVerifier`] and the Argon2-backed
//!   [`StaticCredentials`] allow-list.
//! - **Daily quota**: [`DailyQuota`], the per-user admission counter that
//!   resets on the calendar-day boundary.
//! - **Uploads**: extension rules ([`FileKind`]), filename sanitation and
//!   [`persist_upload`], which writes a request-scoped file removed on drop.
//! - **Collaborators**: [`ImagePacker`], [`DocumentConverter`] and
//!   [`Transcriber`] with their default implementations.
//!
//! The `filegate-server` crate wires these into axum routes.
//!
//! ```rust
//! use filegate::{DailyQuota, FileKind};
//!
//! let quota = DailyQuota::new(2);
//! assert!(quota.try_admit("owner"));
//! assert!(quota.try_admit("owner"));
//! assert!(!quota.try_admit("owner"));
//!
//! assert!(FileKind::Image.accepts("scan.JPEG"));
//! assert!(!FileKind::Document.accepts("notes.txt"));
//! ```

pub mod config;
pub mod credentials;
pub mod document;
pub mod error;
pub mod images;
pub mod quota;
pub mod transcribe;
pub mod upload;

pub use config::{ConverterConfig, TranscriptionConfig, INPUT_PLACEHOLDER};
pub use credentials::{CredentialVerifier, StaticCredentials};
pub use document::{DocumentConverter, ExternalConverter};
pub use error::{ConversionError, CredentialError};
pub use images::{ImagePacker, PdfImagePacker};
pub use quota::{Clock, DailyQuota, LocalClock, ManualClock, QuotaEntry, DEFAULT_DAILY_LIMIT};
pub use transcribe::{
    extract_transcript, RemoteTranscriber, Transcriber, NO_CHANNELS_MESSAGE,
    NO_TRANSCRIPT_MESSAGE,
};
pub use upload::{persist_upload, sanitize_filename, FileKind, UploadedFile};
