//! [`RemoteJobClient`] backed by the Meshy REST client.

use async_trait::async_trait;
use fieldmesh_meshy::api::{MeshyApi, MeshyApiError, RemoteTask};

use crate::collaborators::{RemoteError, RemoteJobClient};

impl From<MeshyApiError> for RemoteError {
    fn from(err: MeshyApiError) -> Self {
        match err {
            MeshyApiError::MissingCredential => Self::NotConfigured,
            MeshyApiError::Request(e) => Self::Transport(e.to_string()),
            MeshyApiError::ApiError { status, body } => Self::Rejected { status, body },
            MeshyApiError::MalformedResponse(message) => Self::Malformed(message),
            MeshyApiError::InvalidUrl(message) => Self::Transport(message),
        }
    }
}

#[async_trait]
impl RemoteJobClient for MeshyApi {
    fn ensure_configured(&self) -> Result<(), RemoteError> {
        if self.is_configured() {
            Ok(())
        } else {
            Err(RemoteError::NotConfigured)
        }
    }

    async fn submit(&self, photo_url: &str) -> Result<String, RemoteError> {
        Ok(MeshyApi::submit(self, photo_url).await?)
    }

    async fn get_status(&self, task_id: &str) -> Result<RemoteTask, RemoteError> {
        Ok(MeshyApi::get_status(self, task_id).await?)
    }
}
