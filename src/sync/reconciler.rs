//! Match State Reconciler
//!
//! Owns the local view of one match and merges two sources into it:
//! authoritative snapshots fetched from the [`MatchRepository`], and event
//! hints from the stream. Events move the turn pointer and the acted flag and
//! ask for a refresh; snapshots carry the data.
//!
//! Two rules keep the merge monotonic:
//!
//! - Snapshots are applied most-recent-wins by [`SnapshotTicket`] order.
//! - `MatchFinished` is terminal. Once a match end is applied, no event or
//!   snapshot can reopen it or change its winner.

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::SyncError;
use crate::game::gate;
use crate::game::phase::{MatchPhase, MatchView};
use crate::game::state::{Match, MatchId, Move, PlayerId, Role, Turn, Winner};
use crate::network::protocol::MatchEvent;
use crate::network::repository::MatchRepository;

/// Issue order of a snapshot request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnapshotTicket(u64);

/// What happened to a snapshot handed to [`MatchStateReconciler::apply_snapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotOutcome {
    /// Now the current snapshot.
    Applied,
    /// A newer snapshot was already applied.
    Stale,
    /// Still in progress after a match end was applied.
    Contradicted,
    /// Belongs to another match.
    Mismatched,
}

/// Effect of one event.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EventOutcome {
    /// Local state changed.
    pub applied: bool,
    /// A snapshot refresh should follow.
    pub refresh: bool,
}

impl EventOutcome {
    const IGNORED: Self = Self { applied: false, refresh: false };
    const REFRESH: Self = Self { applied: false, refresh: true };
    const CHANGED: Self = Self { applied: true, refresh: true };
}

/// Local match state for one player (or spectator).
pub struct MatchStateReconciler<R> {
    repo: Arc<R>,
    match_id: MatchId,
    credential: String,
    identity: Option<PlayerId>,
    snapshot: Option<Match>,
    turn: usize,
    acted: bool,
    in_flight: Option<usize>,
    finished: Option<Winner>,
    next_ticket: u64,
    applied_ticket: Option<SnapshotTicket>,
}

impl<R: MatchRepository> MatchStateReconciler<R> {
    /// Create a reconciler with no snapshot yet.
    pub fn new(repo: Arc<R>, match_id: MatchId, credential: impl Into<String>, identity: Option<PlayerId>) -> Self {
        Self {
            repo,
            match_id,
            credential: credential.into(),
            identity,
            snapshot: None,
            turn: 0,
            acted: false,
            in_flight: None,
            finished: None,
            next_ticket: 0,
            applied_ticket: None,
        }
    }

    /// Match this reconciler tracks.
    pub fn match_id(&self) -> &MatchId {
        &self.match_id
    }

    /// Replace the local identity (e.g. after a credential refresh).
    pub fn set_identity(&mut self, identity: Option<PlayerId>) {
        self.identity = identity;
    }

    // =========================================================================
    // SNAPSHOTS
    // =========================================================================

    /// Reserve a ticket before starting a fetch.
    pub fn begin_snapshot(&mut self) -> SnapshotTicket {
        self.next_ticket += 1;
        SnapshotTicket(self.next_ticket)
    }

    /// Apply a fetched snapshot.
    pub fn apply_snapshot(&mut self, ticket: SnapshotTicket, snapshot: Match) -> SnapshotOutcome {
        if snapshot.id != self.match_id {
            warn!(expected = %self.match_id, got = %snapshot.id, "snapshot for another match");
            return SnapshotOutcome::Mismatched;
        }
        if self.applied_ticket.is_some_and(|applied| applied >= ticket) {
            debug!(match_id = %self.match_id, ?ticket, "discarding stale snapshot");
            return SnapshotOutcome::Stale;
        }
        if let Some(winner) = &self.finished {
            match snapshot.outcome() {
                None => {
                    debug!(match_id = %self.match_id, ?ticket, "discarding snapshot that contradicts match end");
                    return SnapshotOutcome::Contradicted;
                }
                // Turn data is still wanted; the winner already applied stays.
                Some(reported) if &reported != winner => {
                    debug!(match_id = %self.match_id, %reported, kept = %winner, "snapshot reports another winner");
                }
                Some(_) => {}
            }
        }

        self.applied_ticket = Some(ticket);

        // Catch up on turns whose events were missed.
        let live = snapshot.live_turn_index();
        if live > self.turn {
            debug!(match_id = %self.match_id, from = self.turn, to = live, "snapshot advanced turn pointer");
            self.turn = live;
            self.acted = false;
        }

        if self.acted && snapshot.turn(self.turn).is_some_and(both_moves_recorded) {
            self.acted = false;
        }

        if self.finished.is_none() {
            if let Some(winner) = snapshot.outcome() {
                info!(match_id = %self.match_id, winner = %winner, "match finished");
                self.finished = Some(winner);
                self.acted = false;
            }
        }

        self.snapshot = Some(snapshot);
        SnapshotOutcome::Applied
    }

    /// Fetch and apply a snapshot.
    pub async fn load_snapshot(&mut self) -> Result<SnapshotOutcome, SyncError> {
        let ticket = self.begin_snapshot();
        let snapshot = self.repo.get_match(&self.match_id, &self.credential).await?;
        Ok(self.apply_snapshot(ticket, snapshot))
    }

    /// Reserve a ticket and build a detached fetch for it.
    pub fn snapshot_request(
        &mut self,
    ) -> (SnapshotTicket, impl Future<Output = Result<Match, SyncError>> + Send + 'static) {
        let ticket = self.begin_snapshot();
        let repo = Arc::clone(&self.repo);
        let match_id = self.match_id.clone();
        let credential = self.credential.clone();
        (ticket, async move { repo.get_match(&match_id, &credential).await })
    }

    // =========================================================================
    // EVENTS
    // =========================================================================

    /// Apply one event hint.
    pub fn on_event(&mut self, event: &MatchEvent) -> EventOutcome {
        match event {
            MatchEvent::PlayerJoined(_) => EventOutcome::REFRESH,
            MatchEvent::NewTurn { turn_id } => self.advance_turn(*turn_id),
            MatchEvent::TurnEnded { new_turn_id } => self.advance_turn(*new_turn_id),
            MatchEvent::PlayerMoved(mover) => {
                if self.finished.is_some() {
                    return EventOutcome::IGNORED;
                }
                if self.acted && self.role() == Some(mover.opponent()) {
                    self.acted = false;
                    return EventOutcome::CHANGED;
                }
                EventOutcome::REFRESH
            }
            MatchEvent::MatchEnded { winner } => {
                if self.finished.is_some() {
                    debug!(match_id = %self.match_id, "ignoring duplicate match end");
                    return EventOutcome::IGNORED;
                }
                info!(match_id = %self.match_id, winner = %winner, "match ended");
                self.finished = Some(winner.clone());
                self.acted = false;
                EventOutcome::CHANGED
            }
        }
    }

    fn advance_turn(&mut self, turn: usize) -> EventOutcome {
        if self.finished.is_some() {
            return EventOutcome::IGNORED;
        }
        if turn <= self.turn {
            debug!(match_id = %self.match_id, turn, current = self.turn, "ignoring duplicate turn advance");
            return EventOutcome::IGNORED;
        }
        self.turn = turn;
        self.acted = false;
        EventOutcome::CHANGED
    }

    // =========================================================================
    // SUBMISSIONS
    // =========================================================================

    /// Mark a move as sent for `turn`.
    pub fn record_submission(&mut self, turn: usize) {
        if turn == self.turn && self.finished.is_none() {
            self.acted = true;
        }
    }

    /// The move for `turn` did not go through; reopen the gate.
    pub fn submission_failed(&mut self, turn: usize) {
        if self.in_flight == Some(turn) {
            self.in_flight = None;
        }
        if turn == self.turn {
            self.acted = false;
        }
    }

    /// The server accepted the move for `turn`.
    ///
    /// The acted flag is set again: an opponent move seen while the request
    /// was out may have cleared it, and the snapshot still shows our slot empty.
    pub fn submission_accepted(&mut self, turn: usize) {
        if self.in_flight == Some(turn) {
            self.in_flight = None;
        }
        self.record_submission(turn);
    }

    /// Turn of the submission still waiting for an answer.
    pub fn submission_in_flight(&self) -> Option<usize> {
        self.in_flight
    }

    /// Acted flag, or an unanswered submission for the current turn.
    fn locked(&self) -> bool {
        self.acted || self.in_flight == Some(self.turn)
    }

    /// Check the gate, record the submission and build a detached request.
    ///
    /// Returns the turn the move is for alongside the request.
    pub fn submit_request(
        &mut self,
        mv: Move,
    ) -> Result<(usize, impl Future<Output = Result<bool, SyncError>> + Send + 'static), SyncError> {
        if !self.can_submit() {
            return Err(SyncError::Domain(format!("cannot play {} now", mv)));
        }
        let turn = self.turn;
        self.record_submission(turn);
        self.in_flight = Some(turn);

        let repo = Arc::clone(&self.repo);
        let match_id = self.match_id.clone();
        let credential = self.credential.clone();
        Ok((turn, async move { repo.submit_move(&match_id, turn, mv, &credential).await }))
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// Local seat, if the identity matches a player.
    pub fn role(&self) -> Option<Role> {
        let identity = self.identity.as_ref()?;
        self.snapshot.as_ref()?.role_of(identity)
    }

    /// Current phase.
    pub fn phase(&self) -> MatchPhase {
        MatchPhase::derive(
            self.snapshot.as_ref(),
            self.finished.as_ref(),
            self.turn,
            self.role(),
            self.locked(),
        )
    }

    /// Snapshot of everything readers need.
    pub fn view(&self) -> MatchView {
        MatchView {
            snapshot: self.snapshot.clone(),
            phase: self.phase(),
            turn: self.turn,
            role: self.role(),
            acted: self.locked(),
        }
    }

    /// Whether the local player may move now.
    pub fn can_submit(&self) -> bool {
        gate::can_submit(&self.view(), self.role(), self.locked())
    }

    /// Latest applied snapshot.
    pub fn snapshot(&self) -> Option<&Match> {
        self.snapshot.as_ref()
    }

    /// Turn pointer.
    pub fn current_turn(&self) -> usize {
        self.turn
    }

    /// Optimistic acted flag.
    pub fn has_acted(&self) -> bool {
        self.acted
    }

    /// Check if the match is over.
    pub fn is_finished(&self) -> bool {
        self.phase().is_finished()
    }
}

fn both_moves_recorded(turn: &Turn) -> bool {
    turn.move1.is_some() && turn.move2.is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::{MatchStatus, Outcome};
    use crate::testing::{finish, joined_match, open_match, play, token_for, FakeRepository};

    fn reconciler(repo: &Arc<FakeRepository>, user: &str) -> MatchStateReconciler<FakeRepository> {
        MatchStateReconciler::new(
            Arc::clone(repo),
            MatchId::from("m1"),
            token_for(user),
            Some(PlayerId::new(user)),
        )
    }

    fn apply(r: &mut MatchStateReconciler<FakeRepository>, m: Match) -> SnapshotOutcome {
        let ticket = r.begin_snapshot();
        r.apply_snapshot(ticket, m)
    }

    #[tokio::test]
    async fn test_initial_phase_from_snapshot() {
        let repo = Arc::new(FakeRepository::with_match(open_match("m1")));
        let mut r = reconciler(&repo, "u1");
        assert_eq!(r.phase(), MatchPhase::Pending);

        assert_eq!(r.load_snapshot().await.unwrap(), SnapshotOutcome::Applied);
        assert_eq!(r.phase(), MatchPhase::AwaitingOpponent);
        assert_eq!(r.role(), Some(Role::Player1));
        assert!(!r.can_submit());
    }

    #[tokio::test]
    async fn test_two_player_happy_path() {
        let repo = Arc::new(FakeRepository::with_match(open_match("m1")));
        let mut alice = reconciler(&repo, "u1");
        let mut bob = reconciler(&repo, "u2");
        alice.load_snapshot().await.unwrap();
        assert_eq!(alice.phase(), MatchPhase::AwaitingOpponent);

        // Bob joins.
        let mut server = joined_match("m1");
        repo.put(server.clone());
        for r in [&mut alice, &mut bob] {
            assert!(r.on_event(&MatchEvent::PlayerJoined(Role::Player2)).refresh);
            r.load_snapshot().await.unwrap();
            assert_eq!(r.phase(), MatchPhase::TurnInProgress(0));
            assert!(r.can_submit());
        }

        // Alice plays rock.
        let (turn, request) = alice.submit_request(Move::Rock).unwrap();
        assert_eq!(turn, 0);
        assert!(alice.has_acted());
        assert!(!alice.can_submit());
        assert!(request.await.unwrap());
        play(&mut server, Role::Player1, Move::Rock);
        repo.put(server.clone());

        let moved = MatchEvent::PlayerMoved(Role::Player1);
        alice.on_event(&moved);
        bob.on_event(&moved);
        alice.load_snapshot().await.unwrap();
        bob.load_snapshot().await.unwrap();
        assert!(alice.has_acted());
        assert_eq!(alice.phase(), MatchPhase::TurnAwaitingOpponent(0));
        assert!(!bob.has_acted());
        assert!(bob.can_submit());

        // Bob plays scissors; the turn resolves.
        let (_, request) = bob.submit_request(Move::Scissors).unwrap();
        assert!(request.await.unwrap());
        play(&mut server, Role::Player2, Move::Scissors);
        repo.put(server.clone());

        for r in [&mut alice, &mut bob] {
            r.on_event(&MatchEvent::PlayerMoved(Role::Player2));
            let outcome = r.on_event(&MatchEvent::TurnEnded { new_turn_id: 1 });
            assert!(outcome.applied);
            assert!(!r.has_acted());
            assert_eq!(r.current_turn(), 1);
            r.load_snapshot().await.unwrap();
            assert_eq!(r.phase(), MatchPhase::TurnInProgress(1));
            assert_eq!(r.snapshot().unwrap().turns[0].winner, Some(Outcome::Won(Role::Player1)));
            assert!(r.can_submit());
        }

        assert_eq!(
            repo.submissions(),
            vec![(MatchId::from("m1"), 0, Move::Rock), (MatchId::from("m1"), 0, Move::Scissors)]
        );
    }

    #[test]
    fn test_match_end_is_terminal() {
        let repo = Arc::new(FakeRepository::default());
        let mut r = reconciler(&repo, "u1");
        apply(&mut r, joined_match("m1"));

        let winner = Winner::Player(PlayerId::new("u2"));
        let outcome = r.on_event(&MatchEvent::MatchEnded { winner: winner.clone() });
        assert!(outcome.applied && outcome.refresh);
        assert_eq!(r.phase(), MatchPhase::MatchFinished(winner.clone()));

        for event in [
            MatchEvent::NewTurn { turn_id: 5 },
            MatchEvent::PlayerMoved(Role::Player2),
            MatchEvent::TurnEnded { new_turn_id: 6 },
            MatchEvent::MatchEnded { winner: Winner::Draw },
        ] {
            assert_eq!(r.on_event(&event), EventOutcome::IGNORED);
            assert_eq!(r.phase(), MatchPhase::MatchFinished(winner.clone()));
        }
        assert_eq!(r.current_turn(), 0);
        assert!(!r.can_submit());
    }

    #[test]
    fn test_recorded_move_blocks_without_flag() {
        let repo = Arc::new(FakeRepository::default());
        let mut r = reconciler(&repo, "u2");
        let mut m = joined_match("m1");
        play(&mut m, Role::Player2, Move::Paper);
        apply(&mut r, m);

        assert!(!r.has_acted());
        assert!(!r.can_submit());
        assert!(r.submit_request(Move::Rock).is_err());
        assert_eq!(r.phase(), MatchPhase::TurnAwaitingOpponent(0));
    }

    #[test]
    fn test_duplicate_turn_advance_ignored() {
        let repo = Arc::new(FakeRepository::default());
        let mut r = reconciler(&repo, "u1");
        apply(&mut r, joined_match("m1"));

        assert!(r.on_event(&MatchEvent::NewTurn { turn_id: 1 }).applied);
        r.record_submission(1);
        assert!(r.has_acted());

        // Replayed after a reconnect.
        assert_eq!(r.on_event(&MatchEvent::NewTurn { turn_id: 1 }), EventOutcome::IGNORED);
        assert_eq!(r.on_event(&MatchEvent::TurnEnded { new_turn_id: 0 }), EventOutcome::IGNORED);
        assert!(r.has_acted());
        assert_eq!(r.current_turn(), 1);
    }

    #[test]
    fn test_late_snapshot_discarded_after_match_end() {
        let repo = Arc::new(FakeRepository::default());
        let mut r = reconciler(&repo, "u1");
        apply(&mut r, joined_match("m1"));

        let in_flight = r.begin_snapshot();
        r.on_event(&MatchEvent::MatchEnded { winner: Winner::Draw });

        let outcome = r.apply_snapshot(in_flight, joined_match("m1"));
        assert_eq!(outcome, SnapshotOutcome::Contradicted);
        assert_eq!(r.phase(), MatchPhase::MatchFinished(Winner::Draw));

        let mut agreeing = joined_match("m1");
        play(&mut agreeing, Role::Player1, Move::Rock);
        play(&mut agreeing, Role::Player2, Move::Rock);
        finish(&mut agreeing, Winner::Draw);
        assert_eq!(apply(&mut r, agreeing), SnapshotOutcome::Applied);
        assert_eq!(r.snapshot().unwrap().status, MatchStatus::Finished);
        assert_eq!(r.snapshot().unwrap().turns.len(), 1);
    }

    #[test]
    fn test_finished_snapshot_with_other_winner_keeps_applied_end() {
        let repo = Arc::new(FakeRepository::default());
        let mut r = reconciler(&repo, "u1");
        apply(&mut r, joined_match("m1"));

        let ended = Winner::Player(PlayerId::new("u1"));
        r.on_event(&MatchEvent::MatchEnded { winner: ended.clone() });

        let mut m = joined_match("m1");
        play(&mut m, Role::Player1, Move::Paper);
        play(&mut m, Role::Player2, Move::Rock);
        finish(&mut m, Winner::Player(PlayerId::new(" u1-alias ")));
        assert_eq!(apply(&mut r, m), SnapshotOutcome::Applied);

        // Final turn data shows, the winner from the event stays.
        assert_eq!(r.snapshot().unwrap().turns[0].winner, Some(Outcome::Won(Role::Player1)));
        assert_eq!(r.phase(), MatchPhase::MatchFinished(ended));
    }

    #[test]
    fn test_most_recent_snapshot_wins() {
        let repo = Arc::new(FakeRepository::default());
        let mut r = reconciler(&repo, "u1");

        let older = r.begin_snapshot();
        let newer = r.begin_snapshot();
        let mut fresh = joined_match("m1");
        play(&mut fresh, Role::Player1, Move::Rock);

        assert_eq!(r.apply_snapshot(newer, fresh.clone()), SnapshotOutcome::Applied);
        assert_eq!(r.apply_snapshot(older, open_match("m1")), SnapshotOutcome::Stale);
        assert_eq!(r.snapshot(), Some(&fresh));
        assert_eq!(r.apply_snapshot(newer, fresh), SnapshotOutcome::Stale);
    }

    #[test]
    fn test_foreign_snapshot_rejected() {
        let repo = Arc::new(FakeRepository::default());
        let mut r = reconciler(&repo, "u1");
        assert_eq!(apply(&mut r, joined_match("other")), SnapshotOutcome::Mismatched);
        assert!(r.snapshot().is_none());
    }

    #[test]
    fn test_snapshot_catches_up_missed_turns() {
        let repo = Arc::new(FakeRepository::default());
        let mut r = reconciler(&repo, "u1");
        let mut m = joined_match("m1");
        apply(&mut r, m.clone());
        r.record_submission(0);

        play(&mut m, Role::Player1, Move::Rock);
        play(&mut m, Role::Player2, Move::Rock);
        play(&mut m, Role::Player1, Move::Paper);
        apply(&mut r, m.clone());
        assert_eq!(r.current_turn(), 1);
        assert!(!r.has_acted());
        assert_eq!(r.phase(), MatchPhase::TurnAwaitingOpponent(1));

        // Pointer never moves backward.
        r.on_event(&MatchEvent::NewTurn { turn_id: 4 });
        apply(&mut r, m);
        assert_eq!(r.current_turn(), 4);
    }

    #[test]
    fn test_opponent_move_clears_flag() {
        let repo = Arc::new(FakeRepository::default());
        let mut r = reconciler(&repo, "u1");
        apply(&mut r, joined_match("m1"));
        r.record_submission(0);

        // Own move echo keeps it.
        assert_eq!(r.on_event(&MatchEvent::PlayerMoved(Role::Player1)), EventOutcome::REFRESH);
        assert!(r.has_acted());

        assert!(r.on_event(&MatchEvent::PlayerMoved(Role::Player2)).applied);
        assert!(!r.has_acted());
    }

    #[test]
    fn test_opponent_move_keeps_lock_while_own_move_in_flight() {
        let repo = Arc::new(FakeRepository::default());
        let mut r = reconciler(&repo, "u1");
        let mut m = joined_match("m1");
        apply(&mut r, m.clone());

        let (turn, _request) = r.submit_request(Move::Rock).unwrap();
        assert_eq!(r.submission_in_flight(), Some(0));

        // Opponent moves before our request is answered.
        assert!(r.on_event(&MatchEvent::PlayerMoved(Role::Player2)).applied);
        assert!(!r.has_acted());
        assert!(!r.can_submit());
        assert!(!r.view().can_submit());
        assert!(matches!(r.submit_request(Move::Paper), Err(SyncError::Domain(_))));

        // Accepted: still closed until the snapshot shows the turn resolved.
        r.submission_accepted(turn);
        assert_eq!(r.submission_in_flight(), None);
        assert!(!r.can_submit());

        play(&mut m, Role::Player2, Move::Scissors);
        apply(&mut r, m.clone());
        assert!(!r.can_submit());

        play(&mut m, Role::Player1, Move::Rock);
        apply(&mut r, m);
        assert_eq!(r.current_turn(), 1);
        assert!(r.can_submit());
    }

    #[test]
    fn test_snapshot_with_both_moves_clears_flag() {
        let repo = Arc::new(FakeRepository::default());
        let mut r = reconciler(&repo, "u1");
        let mut m = joined_match("m1");
        apply(&mut r, m.clone());
        r.record_submission(0);

        play(&mut m, Role::Player2, Move::Rock);
        apply(&mut r, m.clone());
        assert!(r.has_acted(), "own move not recorded yet");

        m.turns[0].move1 = Some(Move::Paper);
        apply(&mut r, m);
        assert!(!r.has_acted());
    }

    #[test]
    fn test_failed_submission_reopens_gate() {
        let repo = Arc::new(FakeRepository::default());
        let mut r = reconciler(&repo, "u1");
        apply(&mut r, joined_match("m1"));

        let (turn, _request) = r.submit_request(Move::Rock).unwrap();
        assert!(!r.can_submit());
        r.submission_failed(turn);
        assert!(r.can_submit());

        // A failure for an older turn does not touch the current one.
        r.record_submission(0);
        r.on_event(&MatchEvent::NewTurn { turn_id: 1 });
        r.record_submission(1);
        r.submission_failed(0);
        assert!(r.has_acted());
    }

    #[test]
    fn test_unknown_identity_is_spectator() {
        let repo = Arc::new(FakeRepository::default());
        let mut r = MatchStateReconciler::new(repo, MatchId::from("m1"), "opaque", None);
        apply(&mut r, joined_match("m1"));
        assert_eq!(r.role(), None);
        assert!(!r.can_submit());
        assert_eq!(r.view().status(), gate::StatusLine::Spectating);

        r.set_identity(Some(PlayerId::new("u2")));
        assert_eq!(r.role(), Some(Role::Player2));
        assert!(r.can_submit());
    }

    #[test]
    fn test_snapshot_finish_is_sticky() {
        let repo = Arc::new(FakeRepository::default());
        let mut r = reconciler(&repo, "u1");
        let mut m = joined_match("m1");
        finish(&mut m, Winner::Player(PlayerId::new("u1")));
        apply(&mut r, m);
        assert!(r.is_finished());

        assert_eq!(apply(&mut r, joined_match("m1")), SnapshotOutcome::Contradicted);
        assert_eq!(r.on_event(&MatchEvent::MatchEnded { winner: Winner::Draw }), EventOutcome::IGNORED);
        assert_eq!(r.view().status().to_string(), "alice won the game!");
    }
}
