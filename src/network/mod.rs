//! Network Layer
//!
//! Everything that talks to the match server: credential decoding, the event
//! feed and its wire format, and the request/response API.
//! This layer is **non-authoritative** - decisions are made in `game/` and `sync/`.

pub mod auth;
pub mod protocol;
pub mod repository;
pub mod stream;

pub use auth::{AuthConfig, AuthError, Claims, IdentityResolver, DEFAULT_IDENTITY_CLAIMS};
pub use protocol::{EventType, FrameDecoder, MatchEvent, ProtocolError, DATA_PREFIX, MAX_LINE_LEN};
pub use repository::{HttpMatchRepository, MatchRepository};
pub use stream::{EventStreamClient, StreamItem, Subscription};
