//! Match Synchronization
//!
//! Keeps a local view of one match consistent with the server.
//!
//! ## Module Structure
//!
//! - `reconciler`: Snapshot + event merge, turn pointer, acted flag
//! - `driver`: Per-match task and the `MatchSync` handle

pub mod reconciler;
pub mod driver;

pub use reconciler::{EventOutcome, MatchStateReconciler, SnapshotOutcome, SnapshotTicket};
pub use driver::MatchSync;
