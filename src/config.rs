//! Configuration for the conversion collaborators.
//!
//! Both types deserialize from any `serde` source with every field optional,
//! so a deployment only spells out what it changes:
//!
//! ```rust
//! use filegate::{ConverterConfig, TranscriptionConfig};
//!
//! let converter: ConverterConfig = serde_json::from_str(r#"{"timeout_secs": 30}"#).unwrap();
//! assert_eq!(converter.program, "unoconv");
//!
//! let transcription: TranscriptionConfig =
//!     serde_json::from_str(r#"{"api_key": "abc", "model": "nova-2"}"#).unwrap();
//! assert!(transcription.punctuate);
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Argument replaced by the input path when building the converter command.
pub const INPUT_PLACEHOLDER: &str = "{input}";

/// External document converter invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConverterConfig {
    /// Executable to run.
    #[serde(default = "default_converter_program")]
    pub program: String,

    /// Arguments. `{input}` is replaced with the document path; without it the
    /// path is appended last.
    #[serde(default = "default_converter_args")]
    pub args: Vec<String>,

    /// Seconds to wait for the process before killing it.
    #[serde(default = "default_converter_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            program: default_converter_program(),
            args: default_converter_args(),
            timeout_secs: default_converter_timeout_secs(),
        }
    }
}

impl ConverterConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Remote speech-to-text endpoint.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptionConfig {
    #[serde(default = "default_transcription_endpoint")]
    pub endpoint: String,

    /// Value of the `model` query parameter.
    #[serde(default = "default_transcription_model")]
    pub model: String,

    /// Value of the `punctuate` query parameter.
    #[serde(default = "default_true")]
    pub punctuate: bool,

    /// API token. Never serialized back out.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Scheme placed before the token in the `Authorization` header.
    #[serde(default = "default_auth_scheme")]
    pub auth_scheme: String,

    /// Whole-call timeout in seconds.
    #[serde(default = "default_transcription_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            endpoint: default_transcription_endpoint(),
            model: default_transcription_model(),
            punctuate: true,
            api_key: None,
            auth_scheme: default_auth_scheme(),
            timeout_secs: default_transcription_timeout_secs(),
        }
    }
}

impl TranscriptionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// `Authorization` header value, if a key is configured.
    pub fn authorization(&self) -> Option<String> {
        self.api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .map(|key| format!("{} {}", self.auth_scheme, key))
    }
}

impl std::fmt::Debug for TranscriptionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranscriptionConfig")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("punctuate", &self.punctuate)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("auth_scheme", &self.auth_scheme)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn default_converter_program() -> String {
    "unoconv".to_string()
}

fn default_converter_args() -> Vec<String> {
    vec!["-f".to_string(), "pdf".to_string(), INPUT_PLACEHOLDER.to_string()]
}

fn default_converter_timeout_secs() -> u64 {
    120
}

fn default_transcription_endpoint() -> String {
    "https://api.deepgram.com/v1/listen".to_string()
}

fn default_transcription_model() -> String {
    "nova".to_string()
}

fn default_auth_scheme() -> String {
    "Token".to_string()
}

fn default_transcription_timeout_secs() -> u64 {
    300
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converter_defaults() {
        let cfg = ConverterConfig::default();
        assert_eq!(cfg.program, "unoconv");
        assert_eq!(cfg.args, vec!["-f", "pdf", "{input}"]);
        assert_eq!(cfg.timeout(), Duration::from_secs(120));
    }

    #[test]
    fn transcription_defaults() {
        let cfg = TranscriptionConfig::default();
        assert_eq!(cfg.model, "nova");
        assert!(cfg.punctuate);
        assert!(cfg.authorization().is_none());
        assert_eq!(cfg.timeout(), Duration::from_secs(300));
    }

    #[test]
    fn authorization_uses_scheme() {
        let cfg = TranscriptionConfig {
            api_key: Some("abc".into()),
            ..Default::default()
        };
        assert_eq!(cfg.authorization().as_deref(), Some("Token abc"));

        let bearer = TranscriptionConfig {
            api_key: Some("abc".into()),
            auth_scheme: "Bearer".into(),
            ..Default::default()
        };
        assert_eq!(bearer.authorization().as_deref(), Some("Bearer abc"));
    }

    #[test]
    fn empty_key_means_no_authorization() {
        let cfg = TranscriptionConfig {
            api_key: Some(String::new()),
            ..Default::default()
        };
        assert!(cfg.authorization().is_none());
    }

    #[test]
    fn debug_redacts_key() {
        let cfg = TranscriptionConfig {
            api_key: Some("super-secret".into()),
            ..Default::default()
        };
        let debug = format!("{cfg:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn key_is_not_serialized() {
        let cfg = TranscriptionConfig {
            api_key: Some("super-secret".into()),
            ..Default::default()
        };
        let json = serde_json::to_string(&cfg).unwrap();
        assert!(!json.contains("super-secret"));
    }
}
