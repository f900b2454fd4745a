//! Event Stream Client
//!
//! Long-lived subscription to a match's notification feed.
//!
//! ```text
//! open() ──► GET /matches/{id}/subscribe ──► StreamTask ──mpsc──► Subscription
//!                      ▲                          │
//!                      └──── reconnect_delay ◄────┘ (body error / EOF)
//! ```
//!
//! The initial request is not retried: its failure is returned from
//! [`EventStreamClient::open`]. After that the subscription is infinite until
//! cancelled, or until a reconnect is refused with an auth or not-found status.

use std::pin::{pin, Pin};
use std::task::{Context, Poll};
use std::time::Duration;

use futures_util::{Stream, StreamExt};
use reqwest::header::ACCEPT;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::error::SyncError;
use crate::game::state::MatchId;
use crate::network::protocol::{FrameDecoder, MatchEvent};

/// Item produced by a subscription.
pub type StreamItem = Result<MatchEvent, SyncError>;

/// Opens event subscriptions.
#[derive(Clone, Debug)]
pub struct EventStreamClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl EventStreamClient {
    /// Create a client. The request timeout bounds connection setup only.
    pub fn new(config: ClientConfig) -> Result<Self, SyncError> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.request_timeout)
            .build()?;
        Ok(Self { http, config })
    }

    /// Client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Subscribe to a match's events.
    pub async fn open(&self, match_id: &MatchId, credential: &str) -> Result<Subscription, SyncError> {
        let id = Uuid::new_v4();
        let url = self.config.endpoint(&format!("matches/{}/subscribe", match_id));

        let response = connect(&self.http, &url, credential).await?;
        info!(subscription = %id, match_id = %match_id, "event stream opened");

        let (sender, receiver) = mpsc::channel(self.config.event_channel_capacity.max(1));
        let cancel = CancellationToken::new();
        let task = StreamTask {
            id,
            http: self.http.clone(),
            url,
            credential: credential.to_string(),
            reconnect_delay: self.config.reconnect_delay,
            sender,
            cancel: cancel.clone(),
            decoder: FrameDecoder::new(),
        };
        let handle = tokio::spawn(task.run(response));

        Ok(Subscription {
            id,
            receiver,
            cancel,
            handle: Some(handle),
        })
    }
}

async fn connect(http: &reqwest::Client, url: &str, credential: &str) -> Result<reqwest::Response, SyncError> {
    let response = http
        .get(url)
        .bearer_auth(credential)
        .header(ACCEPT, "text/event-stream")
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(SyncError::from_status(status, url));
    }
    Ok(response)
}

/// How a connection ended.
enum Flow {
    /// Cancelled, or nobody is listening anymore.
    Stop,
    /// Body failed or ended; open a new one.
    Reconnect,
}

/// Background task owning the connection.
struct StreamTask {
    id: Uuid,
    http: reqwest::Client,
    url: String,
    credential: String,
    reconnect_delay: Duration,
    sender: mpsc::Sender<StreamItem>,
    cancel: CancellationToken,
    decoder: FrameDecoder,
}

impl StreamTask {
    async fn run(mut self, mut response: reqwest::Response) {
        loop {
            match self.pump(response).await {
                Flow::Stop => break,
                Flow::Reconnect => {}
            }
            response = match self.reconnect().await {
                Some(response) => response,
                None => break,
            };
        }
        debug!(subscription = %self.id, "event stream task finished");
    }

    /// Read one connection until it ends. Dropping the body releases it.
    async fn pump(&mut self, response: reqwest::Response) -> Flow {
        self.decoder.reset();
        let mut body = pin!(response.bytes_stream());

        loop {
            let chunk = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Flow::Stop,
                chunk = body.next() => chunk,
            };

            match chunk {
                Some(Ok(bytes)) => {
                    for result in self.decoder.push(&bytes) {
                        match result {
                            Ok(event) => {
                                debug!(subscription = %self.id, event = event.event_type().as_str(), "event received");
                                if !self.deliver(Ok(event)).await {
                                    return Flow::Stop;
                                }
                            }
                            Err(e) => warn!(subscription = %self.id, error = %e, "dropping malformed frame"),
                        }
                    }
                }
                Some(Err(e)) => {
                    warn!(subscription = %self.id, error = %e, "event stream interrupted");
                    return Flow::Reconnect;
                }
                None => {
                    info!(subscription = %self.id, "event stream ended by server");
                    return Flow::Reconnect;
                }
            }
        }
    }

    /// Wait, then re-open until it works. `None` means stop.
    async fn reconnect(&mut self) -> Option<reqwest::Response> {
        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return None,
                _ = tokio::time::sleep(self.reconnect_delay) => {}
            }

            let attempt = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return None,
                attempt = connect(&self.http, &self.url, &self.credential) => attempt,
            };

            match attempt {
                Ok(response) => {
                    info!(subscription = %self.id, "event stream reconnected");
                    return Some(response);
                }
                Err(e) if e.is_permanent() => {
                    warn!(subscription = %self.id, error = %e, "reconnect refused, closing subscription");
                    self.deliver(Err(e)).await;
                    return None;
                }
                Err(e) => {
                    warn!(
                        subscription = %self.id,
                        error = %e,
                        retry_in_ms = self.reconnect_delay.as_millis() as u64,
                        "reconnect failed"
                    );
                }
            }
        }
    }

    /// Hand an item to the consumer. False once cancelled or dropped.
    async fn deliver(&self, item: StreamItem) -> bool {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            sent = self.sender.send(item) => sent.is_ok(),
        }
    }
}

/// A live event subscription.
///
/// Yields events in arrival order. Ends (`None`) after [`cancel`](Self::cancel)
/// or after a fatal reconnect error has been yielded. Dropping it cancels.
#[derive(Debug)]
pub struct Subscription {
    id: Uuid,
    receiver: mpsc::Receiver<StreamItem>,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Subscription id, as logged.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Next item. Cancel safe.
    pub async fn recv(&mut self) -> Option<StreamItem> {
        if self.cancel.is_cancelled() {
            return None;
        }
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            item = self.receiver.recv() => item,
        }
    }

    /// Stop the subscription. Idempotent.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Check if cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Cancel and wait for the background task to release the connection.
    pub async fn close(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl Stream for Subscription {
    type Item = StreamItem;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.cancel.is_cancelled() {
            return Poll::Ready(None);
        }
        this.receiver.poll_recv(cx)
    }
}
