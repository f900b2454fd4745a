//! Match Phase
//!
//! The client-side state machine derived from a snapshot plus local overlays
//! (turn pointer, acted flag, an already-applied match end).

use crate::game::state::{Match, Role, Turn, Winner};

/// Where the match stands from the local player's point of view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MatchPhase {
    /// No snapshot applied yet.
    Pending,
    /// Player 2 has not joined.
    AwaitingOpponent,
    /// The turn is open for the local player.
    TurnInProgress(usize),
    /// Local move recorded, opponent's move pending.
    TurnAwaitingOpponent(usize),
    /// Terminal.
    MatchFinished(Winner),
}

impl MatchPhase {
    /// Derive the phase.
    ///
    /// `finished` is a match end already applied locally; it wins over
    /// whatever the snapshot says.
    pub fn derive(
        snapshot: Option<&Match>,
        finished: Option<&Winner>,
        turn: usize,
        role: Option<Role>,
        acted: bool,
    ) -> Self {
        if let Some(winner) = finished {
            return MatchPhase::MatchFinished(winner.clone());
        }
        let Some(snapshot) = snapshot else {
            return MatchPhase::Pending;
        };
        if let Some(winner) = snapshot.outcome() {
            return MatchPhase::MatchFinished(winner);
        }
        if snapshot.player2.is_none() {
            return MatchPhase::AwaitingOpponent;
        }

        let Some(role) = role else {
            return MatchPhase::TurnInProgress(turn);
        };
        let current = snapshot.turn(turn);
        let own = current.and_then(|t| t.move_of(role)).is_some();
        let other = current.and_then(|t| t.move_of(role.opponent())).is_some();

        if (own || acted) && !other {
            MatchPhase::TurnAwaitingOpponent(turn)
        } else {
            MatchPhase::TurnInProgress(turn)
        }
    }

    /// Check if this is the terminal phase.
    pub fn is_finished(&self) -> bool {
        matches!(self, MatchPhase::MatchFinished(_))
    }

    /// Turn index for the live phases.
    pub fn turn(&self) -> Option<usize> {
        match self {
            MatchPhase::TurnInProgress(t) | MatchPhase::TurnAwaitingOpponent(t) => Some(*t),
            _ => None,
        }
    }
}

/// Read-only view of one match, as published to readers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchView {
    /// Latest applied snapshot.
    pub snapshot: Option<Match>,
    /// Derived phase.
    pub phase: MatchPhase,
    /// Current turn pointer.
    pub turn: usize,
    /// Local seat, when the identity is known and seated.
    pub role: Option<Role>,
    /// Local "already moved this turn" lock: the optimistic flag, or a
    /// submission for this turn still waiting for an answer.
    pub acted: bool,
}

impl MatchView {
    /// View before any snapshot arrives.
    pub fn pending() -> Self {
        Self {
            snapshot: None,
            phase: MatchPhase::Pending,
            turn: 0,
            role: None,
            acted: false,
        }
    }

    /// Turn data for the current pointer, if the snapshot has it yet.
    pub fn current_turn(&self) -> Option<&Turn> {
        self.snapshot.as_ref().and_then(|m| m.turn(self.turn))
    }

    /// Whether the local player may submit now.
    pub fn can_submit(&self) -> bool {
        crate::game::gate::can_submit(self, self.role, self.acted)
    }

    /// Status line for the local player.
    pub fn status(&self) -> crate::game::gate::StatusLine {
        crate::game::gate::status(self, self.role, self.acted)
    }
}

impl Default for MatchView {
    fn default() -> Self {
        Self::pending()
    }
}
