//! filegate server - HTTP gateway for file conversions
//!
//! Exposes the `filegate` collaborators over HTTP:
//!
//! - **Images to PDF**: one page per uploaded image, upload order preserved
//! - **Word to PDF**: `.doc`/`.docx` through an external converter process
//! - **Audio to text**: MP3 through a remote transcription API
//!
//! # Features
//!
//! - **Authentication**: HTTP Basic against an Argon2-hashed allow-list
//! - **Daily quota**: per-user request limit, reset at the calendar-day boundary
//! - **Middleware**: compression, request ID tracking, structured logging, timeouts
//! - **Configuration**: environment variable and file-based configuration
//! - **Metrics**: Prometheus text exposition on `/metrics`
//! - **Graceful Shutdown**: Ctrl+C and SIGTERM
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load()?;
//!     server::start_server(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! # API Endpoints
//!
//! ## Public
//!
//! - `GET /health` - Liveness check
//! - `GET /metrics` - Prometheus metrics
//!
//! ## Protected (Basic auth, counted against the daily quota)
//!
//! - `POST /images-to-pdf` - multipart `files` (png, jpg, jpeg, webp)
//! - `POST /word-to-pdf` - multipart `file` (doc, docx)
//! - `POST /audio-to-text` - multipart `file` (mp3)

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use middleware::AuthenticatedUser;
pub use server::{build_router, start_server};
pub use state::ServerState;
