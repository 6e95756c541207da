//! Veo HTTP client.

use std::path::Path;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use tracing::{debug, info, warn};
use uuid::Uuid;

use veo_models::{AssetLocation, VideoHandle};

use crate::config::VeoClientConfig;
use crate::credentials::CredentialSource;
use crate::error::{ProviderError, ProviderResult};
use crate::provider::{GenerationRequest, PollStatus, ProviderHandle, VideoProvider};
use crate::types::{ApiErrorBody, Operation, PredictRequest};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Client for the Veo long-running generation API.
pub struct VeoClient {
    http: Client,
    config: VeoClientConfig,
    credentials: CredentialSource,
}

impl VeoClient {
    /// Create a new Veo client.
    pub fn new(config: VeoClientConfig, credentials: CredentialSource) -> ProviderResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ProviderError::Network)?;

        Ok(Self {
            http,
            config,
            credentials,
        })
    }

    /// Create from environment variables.
    pub fn from_env() -> ProviderResult<Self> {
        Self::new(VeoClientConfig::from_env(), CredentialSource::from_env())
    }

    pub fn config(&self) -> &VeoClientConfig {
        &self.config
    }

    fn model_for(&self, request: &GenerationRequest) -> &str {
        if request.needs_quality_model() {
            &self.config.quality_model
        } else {
            &self.config.fast_model
        }
    }

    /// Map a non-success response onto a local error kind.
    async fn error_from_response(response: Response) -> ProviderError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&body)
            .map(|b| b.error.message)
            .unwrap_or(body);

        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return ProviderError::auth(format!("Veo API returned {}: {}", status, message));
        }

        ProviderError::from_provider_message(format!("Veo API returned {}: {}", status, message))
    }

    /// Download URI with the key attached, as handed to callers that fetch it themselves.
    fn keyed_uri(uri: &str, key: &str) -> String {
        let separator = if uri.contains('?') { '&' } else { '?' };
        format!("{}{}key={}", uri, separator, key)
    }

    async fn download_to(&self, video: &VideoHandle, key: &str, dir: &Path) -> ProviderResult<AssetLocation> {
        let response = self
            .http
            .get(&video.uri)
            .header(API_KEY_HEADER, key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let bytes = response.bytes().await?;
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| ProviderError::provider(format!("Failed to create {}: {}", dir.display(), e)))?;

        let path = dir.join(format!("{}.mp4", Uuid::new_v4()));
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| ProviderError::provider(format!("Failed to write {}: {}", path.display(), e)))?;

        Ok(AssetLocation::Local(path))
    }
}

#[async_trait]
impl VideoProvider for VeoClient {
    async fn submit(&self, request: &GenerationRequest) -> ProviderResult<ProviderHandle> {
        request.validate()?;
        let key = self.credentials.resolve()?;
        let model = self.model_for(request);
        let url = format!("{}/models/{}:predictLongRunning", self.config.base_url, model);

        debug!(model, mode = %request.mode, chained = request.is_chained(), "Submitting generation");

        let response = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, key)
            .json(&PredictRequest::from_request(request))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let operation: Operation = response.json().await?;
        if let Some(error) = operation.error {
            return Err(ProviderError::from_provider_message(error.message));
        }

        info!(operation = %operation.name, model, "Generation submitted");
        Ok(ProviderHandle::new(operation.name))
    }

    async fn poll(&self, handle: &ProviderHandle) -> ProviderResult<PollStatus> {
        let key = self.credentials.resolve()?;
        let url = format!("{}/{}", self.config.base_url, handle.operation_name);

        let response = self
            .http
            .get(&url)
            .header(API_KEY_HEADER, key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let operation: Operation = response.json().await?;
        if let Some(error) = &operation.error {
            return Err(ProviderError::from_provider_message(error.message.clone()));
        }

        if !operation.done {
            return Ok(PollStatus::Pending);
        }

        operation
            .video_uri()
            .map(|uri| PollStatus::Done(VideoHandle::new(uri)))
            .ok_or_else(|| ProviderError::provider("Operation finished without a video link"))
    }

    async fn fetch_asset(&self, video: &VideoHandle) -> AssetLocation {
        let key = match self.credentials.resolve() {
            Ok(key) => key,
            Err(_) => return AssetLocation::Remote(video.uri.clone()),
        };
        let remote = AssetLocation::Remote(Self::keyed_uri(&video.uri, key));

        let Some(dir) = self.config.download_dir.as_deref() else {
            return remote;
        };

        match self.download_to(video, key, dir).await {
            Ok(location) => location,
            Err(e) => {
                warn!(uri = %video.uri, "Falling back to remote video link: {}", e);
                remote
            }
        }
    }
}
