//! Crate-wide error type.

use thiserror::Error as ThisError;
use uuid::Uuid;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid coordinate at index {index}: ({lat}, {lng})")]
    InvalidCoordinate { index: usize, lat: f64, lng: f64 },
    #[error("invalid point coordinates: ({lat}, {lng})")]
    InvalidPoint { lat: f64, lng: f64 },
    #[error("depot index {index} out of range for {len} points")]
    DepotOutOfRange { index: usize, len: usize },
    #[error("tour index {index} out of range for {len} points")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("task {0} not found")]
    TaskNotFound(Uuid),
    #[error("timed out waiting for task {0}")]
    PollTimeout(Uuid),
    #[error("work queue unavailable: {0}")]
    Queue(String),
    #[error("worker fault: {0}")]
    WorkerFault(String),
    #[error("audit log failure: {0}")]
    Audit(String),
    #[error("unexpected response {status}: {body}")]
    UnexpectedResponse { status: u16, body: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }

    /// True for errors caused by the caller's input rather than the service.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput(_)
                | Self::InvalidCoordinate { .. }
                | Self::InvalidPoint { .. }
                | Self::DepotOutOfRange { .. }
                | Self::IndexOutOfRange { .. }
        )
    }
}
