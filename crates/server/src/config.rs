use filegate::{ConverterConfig, TranscriptionConfig, DEFAULT_DAILY_LIMIT};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Development account installed when no users are configured.
const DEMO_USER: (&str, &str) = ("owner", "owner");

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Server bind address
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Whole-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum request body size in MB
    #[serde(default = "default_max_body_size_mb")]
    pub max_body_size_mb: usize,

    /// Admitted requests per user per calendar day
    #[serde(default = "default_daily_request_limit")]
    pub daily_request_limit: u32,

    /// Basic-auth users: username -> password or argon2 PHC hash
    #[serde(default, skip_serializing)]
    pub users: HashMap<String, String>,

    /// Directory for request-scoped upload files
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Metrics endpoint enabled
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,

    /// Document converter process
    #[serde(default)]
    pub converter: ConverterConfig,

    /// Remote transcription API
    #[serde(default)]
    pub transcription: TranscriptionConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            timeout_secs: default_timeout_secs(),
            max_body_size_mb: default_max_body_size_mb(),
            daily_request_limit: default_daily_request_limit(),
            users: HashMap::new(),
            upload_dir: default_upload_dir(),
            log_level: default_log_level(),
            metrics_enabled: default_true(),
            converter: ConverterConfig::default(),
            transcription: TranscriptionConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from `.env`, an optional `filegate` config file and
    /// `FILEGATE_*` environment variables (nested keys joined with `__`, e.g.
    /// `FILEGATE_CONVERTER__TIMEOUT_SECS`), in increasing precedence.
    pub fn load() -> anyhow::Result<Self> {
        let _ = dotenvy::dotenv();

        let builder = config::Config::builder()
            // Load from file if exists
            .add_source(config::File::with_name("filegate").required(false))
            // Override with environment variables
            .add_source(
                config::Environment::with_prefix("FILEGATE")
                    .prefix_separator("_")
                    .separator("__"),
            );

        let mut config: ServerConfig = builder.build()?.try_deserialize()?;

        // Add demo user if none configured (for development)
        if config.users.is_empty() {
            config.users.insert(DEMO_USER.0.to_string(), DEMO_USER.1.to_string());
        }

        Ok(config)
    }

    /// Configuration problems worth surfacing at startup.
    pub fn startup_warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        let demo_only = self.users.len() == 1
            && self.users.get(DEMO_USER.0).map(String::as_str) == Some(DEMO_USER.1);
        if demo_only {
            warnings.push(format!(
                "No users configured, using demo account '{}'/'{}'",
                DEMO_USER.0, DEMO_USER.1
            ));
        }
        if self.transcription.authorization().is_none() {
            warnings.push(
                "No transcription API key configured; /audio-to-text calls will be rejected upstream"
                    .to_string(),
            );
        }
        warnings
    }

    /// Emit [`startup_warnings`](Self::startup_warnings) through `tracing`.
    ///
    /// Call once the subscriber is installed; `load` runs before it is.
    pub fn log_startup_warnings(&self) {
        for warning in self.startup_warnings() {
            tracing::warn!("{warning}");
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.bind_addr, self.port);
        Ok(addr_str.parse()?)
    }

    /// Get request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Get max body size in bytes
    pub fn max_body_size(&self) -> usize {
        self.max_body_size_mb * 1024 * 1024
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_timeout_secs() -> u64 {
    600
}

fn default_max_body_size_mb() -> usize {
    100
}

fn default_daily_request_limit() -> u32 {
    DEFAULT_DAILY_LIMIT
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}
