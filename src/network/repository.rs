//! Match Repository
//!
//! Request/response operations against the match API. [`MatchRepository`] is
//! the seam the reconciler depends on; [`HttpMatchRepository`] is the
//! `reqwest` implementation.

use std::future::Future;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::SyncError;
use crate::game::state::{Match, MatchId, Move};

/// Match API operations. All calls carry the caller's bearer credential.
pub trait MatchRepository: Send + Sync + 'static {
    /// Every match visible to the caller.
    fn list_matches(&self, credential: &str) -> impl Future<Output = Result<Vec<Match>, SyncError>> + Send;

    /// Create a match with the caller as player 1.
    fn create_match(&self, credential: &str) -> impl Future<Output = Result<Match, SyncError>> + Send;

    /// Authoritative snapshot of one match.
    fn get_match(&self, id: &MatchId, credential: &str) -> impl Future<Output = Result<Match, SyncError>> + Send;

    /// Submit a move for a turn. `Ok(true)` means the server accepted it.
    fn submit_move(
        &self,
        id: &MatchId,
        turn: usize,
        mv: Move,
        credential: &str,
    ) -> impl Future<Output = Result<bool, SyncError>> + Send;
}

#[derive(Serialize)]
struct MoveRequest {
    #[serde(rename = "move")]
    mv: Move,
}

/// Error body. The reason sits under `turn`, `match` or `message`.
#[derive(Debug, Default, Deserialize)]
struct FailureBody {
    turn: Option<String>,
    #[serde(rename = "match")]
    match_: Option<String>,
    message: Option<String>,
}

impl FailureBody {
    fn reason(self) -> Option<String> {
        self.turn.or(self.match_).or(self.message)
    }
}

/// HTTP implementation.
#[derive(Clone, Debug)]
pub struct HttpMatchRepository {
    http: reqwest::Client,
    config: ClientConfig,
}

impl HttpMatchRepository {
    /// Create a repository.
    pub fn new(config: ClientConfig) -> Result<Self, SyncError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { http, config })
    }

    /// Client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Check the status; on failure read the reason from the body.
    async fn check(response: reqwest::Response, context: &str) -> Result<reqwest::Response, SyncError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status.is_client_error() && !matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND) {
            let reason = response
                .json::<FailureBody>()
                .await
                .ok()
                .and_then(FailureBody::reason);
            if let Some(reason) = reason {
                debug!(status = status.as_u16(), reason = %reason, "{} rejected", context);
                return Err(SyncError::Domain(reason));
            }
        }
        warn!(status = status.as_u16(), "{} failed", context);
        Err(SyncError::from_status(status, context))
    }
}

impl MatchRepository for HttpMatchRepository {
    async fn list_matches(&self, credential: &str) -> Result<Vec<Match>, SyncError> {
        let response = self
            .http
            .get(self.config.endpoint("matches"))
            .bearer_auth(credential)
            .send()
            .await?;
        let response = Self::check(response, "list matches").await?;
        Ok(response.json().await?)
    }

    async fn create_match(&self, credential: &str) -> Result<Match, SyncError> {
        let response = self
            .http
            .post(self.config.endpoint("matches"))
            .bearer_auth(credential)
            .send()
            .await?;
        let response = Self::check(response, "create match").await?;
        Ok(response.json().await?)
    }

    async fn get_match(&self, id: &MatchId, credential: &str) -> Result<Match, SyncError> {
        let response = self
            .http
            .get(self.config.endpoint(&format!("matches/{}", id)))
            .bearer_auth(credential)
            .send()
            .await?;
        let response = Self::check(response, &format!("match {}", id)).await?;
        Ok(response.json().await?)
    }

    async fn submit_move(
        &self,
        id: &MatchId,
        turn: usize,
        mv: Move,
        credential: &str,
    ) -> Result<bool, SyncError> {
        let response = self
            .http
            .post(self.config.endpoint(&format!("matches/{}/turns/{}", id, turn)))
            .bearer_auth(credential)
            .json(&MoveRequest { mv })
            .send()
            .await?;
        let response = Self::check(response, &format!("match {} turn {}", id, turn)).await?;
        Ok(response.status() == StatusCode::ACCEPTED)
    }
}
