use std::path::PathBuf;

use reqwest::{Client, Response};

use crate::services::image_data::DecodeError;
use crate::services::polling::FailureHint;

/// Shared HTTP client. Per-request timeouts are set by each caller.
pub fn client() -> Result<Client, RemoteError> {
    Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(RemoteError::Http)
}

/// Turn a non-2xx response into `RemoteError::RequestFailed`, keeping the body for the operator.
pub async fn ensure_success(response: Response) -> Result<Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(RemoteError::RequestFailed {
        status: status.as_u16(),
        body,
    })
}

#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("HTTP {status}: {body}")]
    RequestFailed { status: u16, body: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Job failed: {message}")]
    JobFailed {
        message: String,
        hint: Option<FailureHint>,
    },

    #[error("Input image not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RemoteError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, RemoteError::Http(e) if e.is_timeout())
    }
}
