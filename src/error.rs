//! Error Taxonomy
//!
//! Every fallible operation returns [`SyncError`]. Callers branch on
//! [`SyncError::kind`] instead of matching message text.

use reqwest::StatusCode;
use thiserror::Error;

use crate::network::auth::AuthError;
use crate::network::protocol::ProtocolError;

/// Coarse error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Credential missing, expired or rejected. Not retried.
    Auth,
    /// Connection failure or unexpected server status.
    Transport,
    /// Undecodable frame or response body.
    Protocol,
    /// Move rejected by the server's game rules.
    Domain,
    /// Referenced match does not exist.
    NotFound,
    /// The handle was used after it was closed.
    Closed,
}

/// Errors surfaced by the synchronization engine.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Authentication failure.
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// Transport failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// Protocol failure.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Rejected by game logic, with the server's reason.
    #[error("{0}")]
    Domain(String),

    /// Missing resource.
    #[error("not found: {0}")]
    NotFound(String),

    /// Handle already closed.
    #[error("match sync closed")]
    Closed,
}

impl SyncError {
    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SyncError::Auth(_) => ErrorKind::Auth,
            SyncError::Transport(_) => ErrorKind::Transport,
            SyncError::Protocol(_) => ErrorKind::Protocol,
            SyncError::Domain(_) => ErrorKind::Domain,
            SyncError::NotFound(_) => ErrorKind::NotFound,
            SyncError::Closed => ErrorKind::Closed,
        }
    }

    /// Whether this error should tear down the session.
    pub fn is_auth(&self) -> bool {
        self.kind() == ErrorKind::Auth
    }

    /// Whether retrying the same request cannot succeed.
    pub fn is_permanent(&self) -> bool {
        matches!(self.kind(), ErrorKind::Auth | ErrorKind::NotFound | ErrorKind::Closed)
    }

    /// Map a non-success status to an error.
    pub(crate) fn from_status(status: StatusCode, context: &str) -> Self {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                SyncError::Auth(AuthError::Rejected(status.as_u16()))
            }
            StatusCode::NOT_FOUND => SyncError::NotFound(context.to_string()),
            _ => SyncError::Transport(format!("{}: unexpected status {}", context, status)),
        }
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SyncError::Protocol(ProtocolError::Body(err.to_string()))
        } else {
            SyncError::Transport(err.to_string())
        }
    }
}
