//! Match Sync Driver
//!
//! One task per watched match. The task owns the [`MatchStateReconciler`] and
//! the [`Subscription`], so every state change happens on a single task and
//! nothing is locked:
//!
//! ```text
//!  Subscription ──event──►┐
//!  fetches      ──match──►├──► SyncTask ──watch──► MatchSync::view()
//!  submissions  ──result─►│      (reconciler)
//!  MatchSync    ──command►┘
//! ```
//!
//! Snapshot fetches and move submissions run concurrently in
//! `FuturesUnordered` sets while the loop keeps applying events in arrival
//! order. An auth failure from any source ends the task; the error is
//! returned from [`MatchSync::close`].

use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::stream::FuturesUnordered;
use futures_util::{FutureExt, StreamExt};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::SyncError;
use crate::game::phase::MatchView;
use crate::game::state::{Match, MatchId, Move};
use crate::network::auth::IdentityResolver;
use crate::network::protocol::MatchEvent;
use crate::network::repository::MatchRepository;
use crate::network::stream::{EventStreamClient, Subscription};
use crate::sync::reconciler::{MatchStateReconciler, SnapshotOutcome, SnapshotTicket};

/// Pending commands per handle.
const COMMAND_CAPACITY: usize = 32;

/// Commands sent from the handle to the task.
enum Message {
    Submit {
        mv: Move,
        response: oneshot::Sender<Result<bool, SyncError>>,
    },
    Refresh,
}

type Fetch = BoxFuture<'static, (SnapshotTicket, Result<Match, SyncError>)>;
type Submission = BoxFuture<'static, (usize, Result<bool, SyncError>, oneshot::Sender<Result<bool, SyncError>>)>;

/// Handle to a live match.
pub struct MatchSync {
    match_id: MatchId,
    sender: mpsc::Sender<Message>,
    view: watch::Receiver<MatchView>,
    cancel: CancellationToken,
    task: Option<JoinHandle<Result<(), SyncError>>>,
}

impl MatchSync {
    /// Subscribe to a match, load its first snapshot and start syncing.
    ///
    /// The subscription opens first so no event between the fetch and the
    /// first read is lost.
    pub async fn start<R: MatchRepository>(
        repo: Arc<R>,
        streams: &EventStreamClient,
        resolver: &IdentityResolver,
        match_id: MatchId,
        credential: &str,
    ) -> Result<Self, SyncError> {
        let identity = resolver.resolve(credential);
        if identity.is_none() {
            info!(match_id = %match_id, "identity unknown, watching as spectator");
        }

        let subscription = streams.open(&match_id, credential).await?;
        let mut reconciler = MatchStateReconciler::new(repo, match_id.clone(), credential, identity);
        reconciler.load_snapshot().await?;

        let (view_sender, view) = watch::channel(reconciler.view());
        let (sender, receiver) = mpsc::channel(COMMAND_CAPACITY);
        let cancel = CancellationToken::new();

        let task = SyncTask {
            reconciler,
            subscription,
            receiver,
            view: view_sender,
            cancel: cancel.clone(),
            fetches: FuturesUnordered::new(),
            submissions: FuturesUnordered::new(),
        };
        let handle = tokio::spawn(task.run());
        info!(match_id = %match_id, "match sync started");

        Ok(Self {
            match_id,
            sender,
            view,
            cancel,
            task: Some(handle),
        })
    }

    /// Match being synced.
    pub fn match_id(&self) -> &MatchId {
        &self.match_id
    }

    /// Latest published view.
    pub fn view(&self) -> MatchView {
        self.view.borrow().clone()
    }

    /// A receiver that sees every published view.
    pub fn subscribe_view(&self) -> watch::Receiver<MatchView> {
        self.view.clone()
    }

    /// Wait for the next published view.
    pub async fn changed(&mut self) -> Result<MatchView, SyncError> {
        self.view.changed().await.map_err(|_| SyncError::Closed)?;
        Ok(self.view.borrow_and_update().clone())
    }

    /// Whether the local player may move, per the latest view.
    pub fn can_submit(&self) -> bool {
        self.view.borrow().can_submit()
    }

    /// Submit a move for the current turn.
    ///
    /// The gate is checked again on the task, so a stale view cannot cause a
    /// double submission.
    pub async fn submit_move(&self, mv: Move) -> Result<bool, SyncError> {
        let (response, receiver) = oneshot::channel();
        self.sender
            .send(Message::Submit { mv, response })
            .await
            .map_err(|_| SyncError::Closed)?;
        receiver.await.map_err(|_| SyncError::Closed)?
    }

    /// Ask for a fresh snapshot.
    pub async fn refresh(&self) -> Result<(), SyncError> {
        self.sender
            .send(Message::Refresh)
            .await
            .map_err(|_| SyncError::Closed)
    }

    /// Check if the task has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Stop syncing. Idempotent.
    ///
    /// Returns the error that ended the task on its own, if any.
    pub async fn close(&mut self) -> Result<(), SyncError> {
        self.cancel.cancel();
        let Some(task) = self.task.take() else {
            return Ok(());
        };
        match task.await {
            Ok(result) => result,
            Err(e) => Err(SyncError::Transport(format!("sync task failed: {}", e))),
        }
    }
}

impl Drop for MatchSync {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct SyncTask<R> {
    reconciler: MatchStateReconciler<R>,
    subscription: Subscription,
    receiver: mpsc::Receiver<Message>,
    view: watch::Sender<MatchView>,
    cancel: CancellationToken,
    fetches: FuturesUnordered<Fetch>,
    submissions: FuturesUnordered<Submission>,
}

impl<R: MatchRepository> SyncTask<R> {
    async fn run(mut self) -> Result<(), SyncError> {
        let match_id = self.reconciler.match_id().clone();
        let result = loop {
            let step = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break Ok(()),
                Some(message) = self.receiver.recv() => {
                    self.handle_message(message);
                    Ok(())
                }
                item = self.subscription.recv() => match item {
                    Some(Ok(event)) => {
                        self.handle_event(&event);
                        Ok(())
                    }
                    Some(Err(e)) => Err(e),
                    None => break Ok(()),
                },
                Some((ticket, result)) = self.fetches.next(), if !self.fetches.is_empty() => {
                    self.handle_fetch(ticket, result)
                }
                Some((turn, result, response)) = self.submissions.next(), if !self.submissions.is_empty() => {
                    self.handle_submission(turn, result, response)
                }
            };
            self.publish();
            if let Err(e) = step {
                break Err(e);
            }
        };

        self.subscription.cancel();
        match &result {
            Ok(()) => info!(match_id = %match_id, "match sync stopped"),
            Err(e) => warn!(match_id = %match_id, error = %e, "match sync ended"),
        }
        result
    }

    fn handle_message(&mut self, message: Message) {
        match message {
            Message::Submit { mv, response } => match self.reconciler.submit_request(mv) {
                Ok((turn, request)) => {
                    debug!(match_id = %self.reconciler.match_id(), turn, %mv, "submitting move");
                    self.submissions
                        .push(async move { (turn, request.await, response) }.boxed());
                }
                Err(e) => {
                    let _ = response.send(Err(e));
                }
            },
            Message::Refresh => self.spawn_fetch(),
        }
    }

    fn handle_event(&mut self, event: &MatchEvent) {
        let outcome = self.reconciler.on_event(event);
        debug!(
            match_id = %self.reconciler.match_id(),
            event = event.event_type().as_str(),
            applied = outcome.applied,
            "event reconciled"
        );
        if outcome.refresh {
            self.spawn_fetch();
        }
    }

    fn handle_fetch(&mut self, ticket: SnapshotTicket, result: Result<Match, SyncError>) -> Result<(), SyncError> {
        match result {
            Ok(snapshot) => {
                let outcome = self.reconciler.apply_snapshot(ticket, snapshot);
                if outcome != SnapshotOutcome::Applied {
                    debug!(match_id = %self.reconciler.match_id(), ?outcome, "snapshot not applied");
                }
                Ok(())
            }
            Err(e) if e.is_permanent() => Err(e),
            Err(e) => {
                warn!(match_id = %self.reconciler.match_id(), error = %e, "snapshot fetch failed");
                Ok(())
            }
        }
    }

    fn handle_submission(
        &mut self,
        turn: usize,
        result: Result<bool, SyncError>,
        response: oneshot::Sender<Result<bool, SyncError>>,
    ) -> Result<(), SyncError> {
        let fatal = match &result {
            Ok(true) => {
                self.reconciler.submission_accepted(turn);
                self.spawn_fetch();
                None
            }
            Ok(false) => {
                self.reconciler.submission_failed(turn);
                None
            }
            Err(e) => {
                warn!(match_id = %self.reconciler.match_id(), turn, error = %e, "move rejected");
                self.reconciler.submission_failed(turn);
                match e {
                    SyncError::Auth(auth) => Some(SyncError::Auth(auth.clone())),
                    _ => None,
                }
            }
        };

        let _ = response.send(result);
        fatal.map_or(Ok(()), Err)
    }

    fn spawn_fetch(&mut self) {
        let (ticket, request) = self.reconciler.snapshot_request();
        self.fetches.push(async move { (ticket, request.await) }.boxed());
    }

    fn publish(&self) {
        let next = self.reconciler.view();
        self.view.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }
}
