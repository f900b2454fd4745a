//! Turn Input Gate
//!
//! Pure decisions over a [`MatchView`]: may the local player move now, and
//! what should the status line say.
//!
//! The gate requires both an empty snapshot slot and a cleared acted flag.
//! After a reconnect the server may already hold our move while the flag was
//! never set; between a submit and the next snapshot only the flag knows.

use std::fmt;

use crate::game::phase::{MatchPhase, MatchView};
use crate::game::state::{Role, Winner};

/// Whether `role` may submit a move for the current turn.
pub fn can_submit(view: &MatchView, role: Option<Role>, acted: bool) -> bool {
    if acted {
        return false;
    }
    let Some(role) = role else {
        return false;
    };
    if !matches!(
        view.phase,
        MatchPhase::TurnInProgress(_) | MatchPhase::TurnAwaitingOpponent(_)
    ) {
        return false;
    }
    let Some(snapshot) = view.snapshot.as_ref() else {
        return false;
    };
    if snapshot.player2.is_none() {
        return false;
    }

    // A turn the snapshot does not list yet has both slots open.
    view.current_turn()
        .map(|t| t.move_of(role).is_none())
        .unwrap_or(true)
}

/// Status line shown to the local player.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StatusLine {
    /// No snapshot yet.
    Loading,
    /// Player 2 has not joined.
    WaitingForOpponentToJoin,
    /// The local player may move.
    MakeYourMove,
    /// Local move is in, opponent's is not.
    WaitingForOpponentMove,
    /// Both moves are in for the current turn.
    TurnComplete,
    /// Local identity is not seated in this match.
    Spectating,
    /// The named player won.
    Won(String),
    /// Match ended in a draw.
    Draw,
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusLine::Loading => f.write_str("Loading..."),
            StatusLine::WaitingForOpponentToJoin => f.write_str("Waiting for opponent to join..."),
            StatusLine::MakeYourMove => f.write_str("Make your move!"),
            StatusLine::WaitingForOpponentMove => f.write_str("Waiting for opponent's move..."),
            StatusLine::TurnComplete => f.write_str("Turn complete"),
            StatusLine::Spectating => f.write_str("Watching match"),
            StatusLine::Won(name) => write!(f, "{} won the game!", name),
            StatusLine::Draw => f.write_str("It's a draw!"),
        }
    }
}

/// Derive the status line.
pub fn status(view: &MatchView, role: Option<Role>, acted: bool) -> StatusLine {
    match &view.phase {
        MatchPhase::Pending => return StatusLine::Loading,
        MatchPhase::AwaitingOpponent => return StatusLine::WaitingForOpponentToJoin,
        MatchPhase::MatchFinished(Winner::Draw) => return StatusLine::Draw,
        MatchPhase::MatchFinished(Winner::Player(id)) => {
            let name = view
                .snapshot
                .as_ref()
                .and_then(|m| m.role_of(id).and_then(|r| m.player(r)))
                .map(|p| p.display_name().to_string())
                .unwrap_or_else(|| id.to_string());
            return StatusLine::Won(name);
        }
        MatchPhase::TurnInProgress(_) | MatchPhase::TurnAwaitingOpponent(_) => {}
    }

    let Some(role) = role else {
        return StatusLine::Spectating;
    };
    if acted {
        return StatusLine::WaitingForOpponentMove;
    }

    let turn = view.current_turn();
    let own = turn.and_then(|t| t.move_of(role));
    let other = turn.and_then(|t| t.move_of(role.opponent()));
    match (own, other) {
        (None, _) => StatusLine::MakeYourMove,
        (Some(_), Some(_)) => StatusLine::TurnComplete,
        (Some(_), None) => StatusLine::WaitingForOpponentMove,
    }
}
