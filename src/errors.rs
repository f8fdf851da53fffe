use crate::length_prefixed::FrameError;
use crate::ui::render_empty;
use axum::http::StatusCode;
use std::path::PathBuf;
use thiserror::Error;

/// Failures of one fetch run. Every variant ends the run; nothing is retried.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl FetchError {
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }
}

impl From<FrameError> for FetchError {
    fn from(err: FrameError) -> Self {
        Self::Parse(format!("session response: {err}"))
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("object store request for {location} failed: {source}")]
    Object {
        location: String,
        #[source]
        source: object_store::Error,
    },
    #[error("{location} is not valid UTF-8 text")]
    NotUtf8 { location: String },
}

/// Error returned from the dashboard handler; always rendered as the empty-state page.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: message.into(),
        }
    }
}

impl From<StorageError> for AppError {
    fn from(_: StorageError) -> Self {
        Self::unavailable("Case data is unavailable right now. Please try again later.")
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, axum::response::Html(render_empty(&self.message))).into_response()
    }
}
