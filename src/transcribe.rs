//! Audio → text through a remote speech-to-text API.

use crate::config::TranscriptionConfig;
use crate::error::ConversionError;
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;

/// Returned when the response has no `results.channels[0]`.
pub const NO_CHANNELS_MESSAGE: &str = "No channels or alternatives found in the API response";
/// Returned when the first channel has no `alternatives[0].transcript`.
pub const NO_TRANSCRIPT_MESSAGE: &str = "No transcript found in the API response";

/// Capability to transcribe an audio file on disk.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: &Path) -> Result<String, ConversionError>;
}

/// Posts the raw audio to a Deepgram-style `listen` endpoint.
///
/// A non-success status or a response missing the expected fields yields an
/// explanatory string instead of an error. Transport failures, timeouts and
/// non-JSON bodies are errors.
#[derive(Debug, Clone)]
pub struct RemoteTranscriber {
    client: reqwest::Client,
    config: TranscriptionConfig,
}

impl RemoteTranscriber {
    pub fn new(config: TranscriptionConfig) -> Result<Self, ConversionError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &TranscriptionConfig {
        &self.config
    }
}

#[async_trait]
impl Transcriber for RemoteTranscriber {
    async fn transcribe(&self, audio: &Path) -> Result<String, ConversionError> {
        let file = tokio::fs::File::open(audio).await?;
        let len = file.metadata().await?.len();

        let punctuate = if self.config.punctuate { "true" } else { "false" };
        let mut request = self
            .client
            .post(&self.config.endpoint)
            .query(&[("model", self.config.model.as_str()), ("punctuate", punctuate)])
            .header(CONTENT_TYPE, "audio/mpeg")
            .header(CONTENT_LENGTH, len)
            .body(reqwest::Body::from(file));
        if let Some(authorization) = self.config.authorization() {
            request = request.header(AUTHORIZATION, authorization);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ConversionError::Timeout(self.config.timeout())
            } else {
                ConversionError::Http(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Transcription API returned an error status");
            return Ok(format!(
                "API request failed with status code: {}",
                status.as_u16()
            ));
        }

        let body = response.text().await?;
        let value: Value = serde_json::from_str(&body)
            .map_err(|e| ConversionError::InvalidResponse(e.to_string()))?;

        tracing::debug!(bytes = len, "Transcribed audio");
        Ok(extract_transcript(&value))
    }
}

/// Pull `results.channels[0].alternatives[0].transcript` out of a response.
pub fn extract_transcript(response: &Value) -> String {
    let Some(channel) = response.pointer("/results/channels/0") else {
        return NO_CHANNELS_MESSAGE.to_string();
    };

    channel
        .pointer("/alternatives/0/transcript")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| NO_TRANSCRIPT_MESSAGE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_first_transcript() {
        let response = json!({
            "results": {
                "channels": [
                    { "alternatives": [
                        { "transcript": "hello world", "confidence": 0.98 },
                        { "transcript": "hollow world" }
                    ] },
                    { "alternatives": [ { "transcript": "second channel" } ] }
                ]
            }
        });
        assert_eq!(extract_transcript(&response), "hello world");
    }

    #[test]
    fn missing_results() {
        assert_eq!(extract_transcript(&json!({ "metadata": {} })), NO_CHANNELS_MESSAGE);
    }

    #[test]
    fn empty_channels() {
        let response = json!({ "results": { "channels": [] } });
        assert_eq!(extract_transcript(&response), NO_CHANNELS_MESSAGE);
    }

    #[test]
    fn empty_alternatives() {
        let response = json!({ "results": { "channels": [ { "alternatives": [] } ] } });
        assert_eq!(extract_transcript(&response), NO_TRANSCRIPT_MESSAGE);
    }

    #[test]
    fn alternative_without_transcript() {
        let response = json!({ "results": { "channels": [ { "alternatives": [ {} ] } ] } });
        assert_eq!(extract_transcript(&response), NO_TRANSCRIPT_MESSAGE);
    }

    #[test]
    fn empty_transcript_is_returned_verbatim() {
        let response = json!({
            "results": { "channels": [ { "alternatives": [ { "transcript": "" } ] } ] }
        });
        assert_eq!(extract_transcript(&response), "");
    }
}
