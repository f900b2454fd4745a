//! # Chifoumi Sync
//!
//! Client-side live synchronization engine for rock-paper-scissors matches.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      CHIFOUMI SYNC                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  game/             - Match model (pure, no I/O)              │
//! │  ├── state.rs      - Match, turns, players, moves            │
//! │  ├── phase.rs      - Match state machine and view            │
//! │  └── gate.rs       - Move legality and status line           │
//! │                                                              │
//! │  network/          - Server I/O                              │
//! │  ├── auth.rs       - Identity from credentials               │
//! │  ├── protocol.rs   - Event vocabulary and frame decoder      │
//! │  ├── stream.rs     - Reconnecting event subscription         │
//! │  └── repository.rs - Match API (list/create/get/move)        │
//! │                                                              │
//! │  sync/             - Reconciliation                          │
//! │  ├── reconciler.rs - Snapshot + event merge                  │
//! │  └── driver.rs     - One task per match, watch-published     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Consistency Guarantee
//!
//! Snapshots are authoritative and events are hints:
//! - Snapshots apply most-recent-wins
//! - A finished match never reopens and its winner never changes
//! - The turn pointer only moves forward
//!
//! A move is offered only when the snapshot shows the local slot empty
//! **and** no submission is outstanding for the turn.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod game;
pub mod network;
pub mod sync;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use config::ClientConfig;
pub use error::{ErrorKind, SyncError};
pub use game::state::{Match, MatchId, Move, PlayerId, Role, Winner};
pub use game::phase::{MatchPhase, MatchView};
pub use network::{EventStreamClient, HttpMatchRepository, IdentityResolver, MatchRepository};
pub use sync::MatchSync;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
