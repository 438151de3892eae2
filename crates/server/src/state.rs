use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use filegate::{
    CredentialVerifier, DailyQuota, DocumentConverter, ExternalConverter, ImagePacker,
    PdfImagePacker, RemoteTranscriber, StaticCredentials, Transcriber,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

/// Shared application state
///
/// Every collaborator sits behind a trait object so tests can swap in fakes
/// through the `with_*` builders.
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// Basic-auth verifier
    pub credentials: Arc<dyn CredentialVerifier>,

    /// Per-user daily admission counter
    pub quota: Arc<DailyQuota>,

    /// Image set -> PDF
    pub images: Arc<dyn ImagePacker>,

    /// Word document -> PDF
    pub documents: Arc<dyn DocumentConverter>,

    /// Audio -> text
    pub transcriber: Arc<dyn Transcriber>,

    /// Prometheus render handle, present once a recorder is installed
    pub metrics: Option<PrometheusHandle>,
}

impl ServerState {
    /// Create new server state with the default collaborators
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        let credentials = StaticCredentials::new(&config.users)?;
        let quota = DailyQuota::new(config.daily_request_limit);
        let documents = ExternalConverter::from_config(&config.converter);
        let transcriber = RemoteTranscriber::new(config.transcription.clone())
            .map_err(|e| ServerError::Config(e.to_string()))?;

        Ok(Self {
            config: Arc::new(config),
            credentials: Arc::new(credentials),
            quota: Arc::new(quota),
            images: Arc::new(PdfImagePacker),
            documents: Arc::new(documents),
            transcriber: Arc::new(transcriber),
            metrics: None,
        })
    }

    pub fn with_credentials(mut self, credentials: Arc<dyn CredentialVerifier>) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_quota(mut self, quota: Arc<DailyQuota>) -> Self {
        self.quota = quota;
        self
    }

    pub fn with_image_packer(mut self, images: Arc<dyn ImagePacker>) -> Self {
        self.images = images;
        self
    }

    pub fn with_document_converter(mut self, documents: Arc<dyn DocumentConverter>) -> Self {
        self.documents = documents;
        self
    }

    pub fn with_transcriber(mut self, transcriber: Arc<dyn Transcriber>) -> Self {
        self.transcriber = transcriber;
        self
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

impl std::fmt::Debug for ServerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerState")
            .field("bind", &format_args!("{}:{}", self.config.bind_addr, self.config.port))
            .field("quota", &self.quota)
            .field("metrics", &self.metrics.is_some())
            .finish_non_exhaustive()
    }
}
