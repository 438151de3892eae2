//! Word document → PDF through an external converter process.

use crate::config::{ConverterConfig, INPUT_PLACEHOLDER};
use crate::error::ConversionError;
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tempfile::TempPath;
use tokio::process::Command;

/// Longest stderr excerpt carried in an error.
const MAX_STDERR_CHARS: usize = 2048;

/// Capability to convert a document on disk into PDF bytes.
#[async_trait]
pub trait DocumentConverter: Send + Sync {
    async fn convert(&self, input: &Path, timeout: Duration) -> Result<Vec<u8>, ConversionError>;
}

/// Runs a converter executable that writes `<stem>.pdf` next to its input
/// (`unoconv -f pdf <input>` by default).
#[derive(Debug, Clone)]
pub struct ExternalConverter {
    program: String,
    args: Vec<String>,
}

impl ExternalConverter {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn from_config(config: &ConverterConfig) -> Self {
        Self::new(config.program.clone(), config.args.clone())
    }

    fn command(&self, input: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        let mut placed = false;
        for arg in &self.args {
            if arg == INPUT_PLACEHOLDER {
                cmd.arg(input);
                placed = true;
            } else {
                cmd.arg(arg);
            }
        }
        if !placed {
            cmd.arg(input);
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

impl Default for ExternalConverter {
    fn default() -> Self {
        Self::from_config(&ConverterConfig::default())
    }
}

#[async_trait]
impl DocumentConverter for ExternalConverter {
    async fn convert(&self, input: &Path, timeout: Duration) -> Result<Vec<u8>, ConversionError> {
        let output_path = input.with_extension("pdf");
        // Removes the converter's output on every path, including timeouts.
        let output = TempPath::from_path(output_path);

        let child = self
            .command(input)
            .spawn()
            .map_err(|source| ConversionError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let finished = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_) => {
                tracing::warn!(
                    program = %self.program,
                    timeout_secs = timeout.as_secs_f32(),
                    "Converter timed out, killing it"
                );
                return Err(ConversionError::Timeout(timeout));
            }
        };

        if !finished.status.success() {
            let stderr: String = String::from_utf8_lossy(&finished.stderr)
                .trim()
                .chars()
                .take(MAX_STDERR_CHARS)
                .collect();
            tracing::warn!(
                program = %self.program,
                exit_code = ?finished.status.code(),
                stderr = %stderr,
                "Converter failed"
            );
            return Err(ConversionError::ProcessFailed {
                code: finished.status.code(),
                stderr,
            });
        }

        match tokio::fs::read(&output).await {
            Ok(pdf) => {
                tracing::debug!(input = %input.display(), bytes = pdf.len(), "Converted document");
                Ok(pdf)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(
                ConversionError::MissingOutput(output.display().to_string()),
            ),
            Err(e) => Err(e.into()),
        }
    }
}
