//! Game Model
//!
//! Match data as the server reports it, and the pure decisions the client
//! makes over it. No I/O.
//!
//! ## Module Structure
//!
//! - `state`: Match, turns, players, moves
//! - `phase`: Client-side state machine and published view
//! - `gate`: Move legality and status line

pub mod state;
pub mod phase;
pub mod gate;

// Re-export key types
pub use state::{Match, MatchId, MatchStatus, Move, Outcome, Player, PlayerId, Role, Turn, Winner};
pub use phase::{MatchPhase, MatchView};
pub use gate::{can_submit, status, StatusLine};
