//! Test fixtures: credentials, match builders, an in-memory repository and an
//! in-process match server speaking the HTTP and event stream protocol.

use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use bytes::Bytes;
use futures_util::StreamExt;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::error::SyncError;
use crate::game::state::{Match, MatchId, MatchStatus, Move, Outcome, Player, PlayerId, Role, Turn, Winner};
use crate::network::auth::IdentityResolver;
use crate::network::protocol::MatchEvent;
use crate::network::repository::MatchRepository;

/// Turns played before the fake server ends a match.
pub(crate) const MATCH_TURNS: usize = 3;

/// Unsigned credential carrying `userId`.
pub(crate) fn token_for(user: &str) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let claims = URL_SAFE_NO_PAD.encode(json!({ "userId": user, "iat": 1 }).to_string());
    format!("{}.{}.test-signature", header, claims)
}

/// Match created by alice (`u1`), nobody joined.
pub(crate) fn open_match(id: &str) -> Match {
    Match::new(id, Player::new("u1", "alice"))
}

/// Match between alice (`u1`) and bob (`u2`), no moves yet.
pub(crate) fn joined_match(id: &str) -> Match {
    let mut m = open_match(id);
    m.player2 = Some(Player::new("u2", "bob"));
    m
}

/// Record a move the way the server does.
pub(crate) fn play(m: &mut Match, role: Role, mv: Move) {
    let index = m.live_turn_index();
    if m.turns.len() == index {
        m.turns.push(Turn::new(index));
    }
    let turn = &mut m.turns[index];
    match role {
        Role::Player1 => turn.move1 = Some(mv),
        Role::Player2 => turn.move2 = Some(mv),
    }
    if let (Some(m1), Some(m2)) = (turn.move1, turn.move2) {
        turn.winner = Some(Move::resolve(m1, m2));
    }
}

/// Mark a match finished.
pub(crate) fn finish(m: &mut Match, winner: Winner) {
    m.status = MatchStatus::Finished;
    m.winner = match winner {
        Winner::Draw => None,
        w => Some(w),
    };
}

// =============================================================================
// IN-MEMORY REPOSITORY
// =============================================================================

/// Repository backed by a map. Submissions are recorded, not applied.
#[derive(Default)]
pub(crate) struct FakeRepository {
    matches: Mutex<HashMap<MatchId, Match>>,
    submissions: Mutex<Vec<(MatchId, usize, Move)>>,
    reject_with: Mutex<Option<String>>,
    gets: AtomicUsize,
}

impl FakeRepository {
    pub(crate) fn with_match(m: Match) -> Self {
        let repo = Self::default();
        repo.put(m);
        repo
    }

    pub(crate) fn put(&self, m: Match) {
        self.matches.lock().unwrap().insert(m.id.clone(), m);
    }

    pub(crate) fn reject_moves(&self, reason: &str) {
        *self.reject_with.lock().unwrap() = Some(reason.to_string());
    }

    pub(crate) fn submissions(&self) -> Vec<(MatchId, usize, Move)> {
        self.submissions.lock().unwrap().clone()
    }

    pub(crate) fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }
}

impl MatchRepository for FakeRepository {
    async fn list_matches(&self, _credential: &str) -> Result<Vec<Match>, SyncError> {
        Ok(self.matches.lock().unwrap().values().cloned().collect())
    }

    async fn create_match(&self, _credential: &str) -> Result<Match, SyncError> {
        let m = open_match("created");
        self.put(m.clone());
        Ok(m)
    }

    async fn get_match(&self, id: &MatchId, _credential: &str) -> Result<Match, SyncError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.matches
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| SyncError::NotFound(format!("match {}", id)))
    }

    async fn submit_move(
        &self,
        id: &MatchId,
        turn: usize,
        mv: Move,
        _credential: &str,
    ) -> Result<bool, SyncError> {
        if let Some(reason) = self.reject_with.lock().unwrap().clone() {
            return Err(SyncError::Domain(reason));
        }
        self.submissions.lock().unwrap().push((id.clone(), turn, mv));
        Ok(true)
    }
}

// =============================================================================
// IN-PROCESS SERVER
// =============================================================================

#[derive(Default)]
struct ServerState {
    matches: Mutex<HashMap<String, Match>>,
    feeds: Mutex<HashMap<String, broadcast::Sender<Bytes>>>,
    disconnect: Mutex<CancellationToken>,
    reject_subscribe: Mutex<Option<StatusCode>>,
    subscribes: AtomicUsize,
    gets: AtomicUsize,
    next_id: AtomicUsize,
}

impl ServerState {
    fn feed(&self, id: &str) -> broadcast::Sender<Bytes> {
        self.feeds
            .lock()
            .unwrap()
            .entry(id.to_string())
            .or_insert_with(|| broadcast::channel(64).0)
            .clone()
    }

    fn emit(&self, id: &str, event: &MatchEvent) {
        let _ = self.feed(id).send(Bytes::from(event.to_frame()));
    }
}

/// Match server bound to a random local port.
pub(crate) struct FakeServer {
    pub(crate) url: String,
    state: Arc<ServerState>,
    handle: tokio::task::JoinHandle<()>,
}

impl FakeServer {
    pub(crate) async fn start() -> Self {
        let state = Arc::new(ServerState::default());
        let router = Router::new()
            .route("/matches", get(list_matches).post(create_match))
            .route("/matches/:id", get(get_match))
            .route("/matches/:id/turns/:turn", post(play_turn))
            .route("/matches/:id/subscribe", get(subscribe))
            .with_state(state.clone());

        let addr = SocketAddr::from(([127, 0, 0, 1], 0));
        let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            axum::serve(listener, router.into_make_service()).await.unwrap();
        });

        Self { url, state, handle }
    }

    pub(crate) fn insert(&self, m: Match) {
        self.state.matches.lock().unwrap().insert(m.id.as_str().to_string(), m);
    }

    pub(crate) fn snapshot(&self, id: &str) -> Option<Match> {
        self.state.matches.lock().unwrap().get(id).cloned()
    }

    /// Seat a second player and announce it.
    pub(crate) fn join(&self, id: &str, player: Player) {
        if let Some(m) = self.state.matches.lock().unwrap().get_mut(id) {
            m.player2 = Some(player);
        }
        self.state.emit(id, &MatchEvent::PlayerJoined(Role::Player2));
    }

    pub(crate) fn emit(&self, id: &str, event: &MatchEvent) {
        self.state.emit(id, event);
    }

    /// Push raw bytes to every subscriber, as one chunk.
    pub(crate) fn emit_raw(&self, id: &str, bytes: &[u8]) {
        let _ = self.state.feed(id).send(Bytes::copy_from_slice(bytes));
    }

    /// End every open event stream response.
    pub(crate) fn disconnect_all(&self) {
        let old = std::mem::take(&mut *self.state.disconnect.lock().unwrap());
        old.cancel();
    }

    pub(crate) fn reject_subscriptions(&self, status: Option<StatusCode>) {
        *self.state.reject_subscribe.lock().unwrap() = status;
    }

    pub(crate) fn subscribe_count(&self) -> usize {
        self.state.subscribes.load(Ordering::SeqCst)
    }

    pub(crate) fn get_count(&self) -> usize {
        self.state.gets.load(Ordering::SeqCst)
    }

    /// Wait until `n` event stream connections have been accepted in total.
    pub(crate) async fn wait_for_connections(&self, n: usize) {
        for _ in 0..500 {
            if self.subscribe_count() >= n {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("timed out waiting for {} event stream connections", n);
    }
}

impl Drop for FakeServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn caller(headers: &HeaderMap) -> Option<PlayerId> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?;
    IdentityResolver::new().resolve(token)
}

fn rejection(status: StatusCode, key: &str, reason: &str) -> Response {
    (status, Json(json!({ key: reason }))).into_response()
}

async fn list_matches(State(state): State<Arc<ServerState>>, headers: HeaderMap) -> Response {
    if caller(&headers).is_none() {
        return rejection(StatusCode::UNAUTHORIZED, "message", "Unauthorized");
    }
    let matches: Vec<Match> = state.matches.lock().unwrap().values().cloned().collect();
    Json(matches).into_response()
}

async fn create_match(State(state): State<Arc<ServerState>>, headers: HeaderMap) -> Response {
    let Some(user) = caller(&headers) else {
        return rejection(StatusCode::UNAUTHORIZED, "message", "Unauthorized");
    };
    let id = format!("m{}", state.next_id.fetch_add(1, Ordering::SeqCst) + 1);
    let m = Match::new(id.clone(), Player::new(user.as_str(), user.as_str()));
    state.matches.lock().unwrap().insert(id, m.clone());
    (StatusCode::CREATED, Json(m)).into_response()
}

async fn get_match(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if caller(&headers).is_none() {
        return rejection(StatusCode::UNAUTHORIZED, "message", "Unauthorized");
    }
    state.gets.fetch_add(1, Ordering::SeqCst);
    match state.matches.lock().unwrap().get(&id) {
        Some(m) => Json(m.clone()).into_response(),
        None => rejection(StatusCode::NOT_FOUND, "match", "Match not found"),
    }
}

#[derive(Deserialize)]
struct MoveBody {
    #[serde(rename = "move")]
    mv: Move,
}

async fn play_turn(
    State(state): State<Arc<ServerState>>,
    Path((id, turn)): Path<(String, usize)>,
    headers: HeaderMap,
    Json(body): Json<MoveBody>,
) -> Response {
    let Some(user) = caller(&headers) else {
        return rejection(StatusCode::UNAUTHORIZED, "message", "Unauthorized");
    };

    let mut events = Vec::new();
    let response = {
        let mut matches = state.matches.lock().unwrap();
        let Some(m) = matches.get_mut(&id) else {
            return rejection(StatusCode::NOT_FOUND, "match", "Match not found");
        };
        let Some(role) = m.role_of(&user) else {
            return rejection(StatusCode::BAD_REQUEST, "match", "You are not a player of this match");
        };
        if m.is_finished() {
            return rejection(StatusCode::BAD_REQUEST, "match", "Match is finished");
        }
        if m.player2.is_none() {
            return rejection(StatusCode::BAD_REQUEST, "match", "Waiting for opponent");
        }
        if turn != m.live_turn_index() {
            return rejection(StatusCode::BAD_REQUEST, "turn", "Invalid turn");
        }
        if m.turn(turn).and_then(|t| t.move_of(role)).is_some() {
            return rejection(StatusCode::BAD_REQUEST, "turn", "Move already played");
        }

        play(m, role, body.mv);
        events.push(MatchEvent::PlayerMoved(role));

        if m.turn(turn).is_some_and(Turn::is_complete) {
            if m.turns.len() >= MATCH_TURNS {
                let winner = match_winner(m);
                finish(m, winner.clone());
                events.push(MatchEvent::MatchEnded { winner });
            } else {
                events.push(MatchEvent::TurnEnded { new_turn_id: turn + 1 });
            }
        }
        (StatusCode::ACCEPTED, Json(m.clone())).into_response()
    };

    for event in &events {
        state.emit(&id, event);
    }
    response
}

fn match_winner(m: &Match) -> Winner {
    let wins = |role| m.turns.iter().filter(|t| t.winner == Some(Outcome::Won(role))).count();
    let (p1, p2) = (wins(Role::Player1), wins(Role::Player2));
    let leader = if p1 > p2 {
        Role::Player1
    } else if p2 > p1 {
        Role::Player2
    } else {
        return Winner::Draw;
    };
    m.player(leader)
        .map(|p| Winner::Player(p.id.clone()))
        .unwrap_or(Winner::Draw)
}

async fn subscribe(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Some(status) = *state.reject_subscribe.lock().unwrap() {
        return rejection(status, "message", "Subscription refused");
    }
    if caller(&headers).is_none() {
        return rejection(StatusCode::UNAUTHORIZED, "message", "Unauthorized");
    }
    if !state.matches.lock().unwrap().contains_key(&id) {
        return rejection(StatusCode::NOT_FOUND, "match", "Match not found");
    }
    state.subscribes.fetch_add(1, Ordering::SeqCst);

    let receiver = state.feed(&id).subscribe();
    let disconnect = state.disconnect.lock().unwrap().clone();
    let frames = futures_util::stream::unfold(receiver, |mut receiver| async move {
        loop {
            match receiver.recv().await {
                Ok(bytes) => return Some((Ok::<_, Infallible>(bytes), receiver)),
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    })
    .take_until(disconnect.cancelled_owned());

    (
        [(header::CONTENT_TYPE, "text/event-stream")],
        Body::from_stream(frames),
    )
        .into_response()
}
