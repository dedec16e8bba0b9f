use thiserror::Error;

use crate::embed::ContainerId;
use crate::window::WindowId;

pub type DeskResult<T> = Result<T, DeskError>;

#[derive(Debug, Error)]
pub enum DeskError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{endpoint} returned {status}")]
    Status { endpoint: String, status: u16 },

    #[error("invalid payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("window {0} already exists")]
    DuplicateWindow(WindowId),

    #[error("window {0} is not on the desktop")]
    MissingWindow(WindowId),

    #[error("chart embed into {container} failed: {reason}")]
    EmbedFailed {
        container: ContainerId,
        reason: String,
    },

    #[error("invalid ticker {0:?}")]
    InvalidTicker(String),

    #[error("worker channel closed")]
    Cancelled,
}
