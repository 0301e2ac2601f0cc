//! REST API client for the Meshy image-to-3D endpoints.
//!
//! Wraps job submission (`POST /image-to-3d`) and status retrieval
//! (`GET /image-to-3d/{task_id}`) using [`reqwest`]. Every call is a
//! single request; retry policy belongs to the caller.

use fieldmesh_core::model_status::RemoteStatus;
use serde::Serialize;

use crate::config::MeshyConfig;
use crate::shims;

/// Fallback failure reason when the service gives none.
pub const GENERIC_FAILURE_REASON: &str = "3D model generation failed";

/// HTTP client for the Meshy API.
pub struct MeshyApi {
    client: reqwest::Client,
    config: MeshyConfig,
}

/// Normalized view of one remote generation task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteTask {
    pub task_id: String,
    pub status: RemoteStatus,
    /// Status string exactly as the service sent it.
    pub raw_status: Option<String>,
    /// Primary asset URL; always present when `status` is `Ready`.
    pub model_url: Option<String>,
    pub model_preview_url: Option<String>,
    /// Set when `status` is `Failed`.
    pub failure_reason: Option<String>,
}

/// Errors from the Meshy REST API layer.
#[derive(Debug, thiserror::Error)]
pub enum MeshyApiError {
    /// No API key configured; raised before any network call.
    #[error("Meshy API key is not configured (set MESHY_API_KEY)")]
    MissingCredential,

    /// The HTTP request itself failed (network, DNS, TLS, timeout, body decode).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Meshy returned a non-2xx status code.
    #[error("Meshy API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// A 2xx response that lacks a field we cannot do without.
    #[error("Malformed Meshy response: {0}")]
    MalformedResponse(String),

    /// The configured base URL cannot carry a task path.
    #[error("Invalid Meshy API URL: {0}")]
    InvalidUrl(String),
}

impl MeshyApi {
    /// Create a client from injected configuration.
    pub fn new(config: MeshyConfig) -> Result<Self, MeshyApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { client, config })
    }

    /// Create a client reusing an existing [`reqwest::Client`]
    /// (useful for connection pooling).
    pub fn with_client(client: reqwest::Client, config: MeshyConfig) -> Self {
        Self { client, config }
    }

    /// Whether a credential is configured.
    pub fn is_configured(&self) -> bool {
        self.config.has_credential()
    }

    /// Submit an image-to-3D job for a publicly fetchable photo.
    ///
    /// Returns the remote task id, read through
    /// [`shims::TASK_ID_POINTERS`].
    pub async fn submit(&self, image_url: &str) -> Result<String, MeshyApiError> {
        let key = self.api_key()?;
        let body = serde_json::json!({
            "image_url": image_url,
            "enable_pbr": self.config.enable_pbr,
        });

        let response = self
            .client
            .post(self.endpoint("image-to-3d"))
            .bearer_auth(key)
            .json(&body)
            .send()
            .await?;

        let value: serde_json::Value = Self::parse_response(response).await?;
        let task_id = shims::extract_task_id(&value).ok_or_else(|| {
            MeshyApiError::MalformedResponse(format!("no task id in accept response: {value}"))
        })?;

        tracing::debug!(task_id = %task_id, "Meshy accepted image-to-3D job");
        Ok(task_id)
    }

    /// Fetch and normalize the status of a task.
    pub async fn get_status(&self, task_id: &str) -> Result<RemoteTask, MeshyApiError> {
        let key = self.api_key()?;

        let response = self
            .client
            .get(self.task_endpoint(task_id)?)
            .bearer_auth(key)
            .send()
            .await?;

        let value: serde_json::Value = Self::parse_response(response).await?;
        task_from_response(task_id, &value)
    }

    // ---- private helpers ----

    fn api_key(&self) -> Result<&str, MeshyApiError> {
        self.config
            .api_key
            .as_deref()
            .ok_or(MeshyApiError::MissingCredential)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.api_url.trim_end_matches('/'), path)
    }

    /// Status URL for `task_id`. The id comes from the remote service and
    /// is pushed as one percent-encoded path segment.
    fn task_endpoint(&self, task_id: &str) -> Result<reqwest::Url, MeshyApiError> {
        let mut url = reqwest::Url::parse(&self.endpoint("image-to-3d"))
            .map_err(|e| MeshyApiError::InvalidUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| MeshyApiError::InvalidUrl(self.config.api_url.clone()))?
            .push(task_id);
        Ok(url)
    }

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`MeshyApiError::ApiError`]
    /// containing the status and body text on failure.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, MeshyApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(MeshyApiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, MeshyApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

/// Normalize a status response body into a [`RemoteTask`].
///
/// A `Ready` task without any extractable asset URL is malformed: the
/// caller must not record a ready model it cannot point at.
pub fn task_from_response(
    task_id: &str,
    value: &serde_json::Value,
) -> Result<RemoteTask, MeshyApiError> {
    let raw_status = shims::extract_status(value);
    let status = raw_status
        .as_deref()
        .map(shims::normalize_status)
        .unwrap_or(RemoteStatus::Unknown);

    let mut task = RemoteTask {
        task_id: task_id.to_string(),
        status,
        raw_status,
        model_url: None,
        model_preview_url: None,
        failure_reason: None,
    };

    match status {
        RemoteStatus::Ready => {
            let model_url = shims::extract_model_url(value).ok_or_else(|| {
                MeshyApiError::MalformedResponse(format!(
                    "task {task_id} reported success without a model URL"
                ))
            })?;
            task.model_url = Some(model_url);
            task.model_preview_url = shims::extract_preview_url(value);
        }
        RemoteStatus::Failed => {
            task.failure_reason = Some(
                shims::extract_failure_reason(value)
                    .unwrap_or_else(|| GENERIC_FAILURE_REASON.to_string()),
            );
        }
        RemoteStatus::Queued | RemoteStatus::Processing | RemoteStatus::Unknown => {}
    }

    Ok(task)
}
