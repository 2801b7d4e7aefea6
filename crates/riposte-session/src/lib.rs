//! Session layer for Riposte.
//!
//! Everything that happens after a match is made lives here:
//!
//! 1. **The engine seam** ([`EngineSession`], [`EngineFactory`]) — the
//!    two traits a game implements. The engine is a pure state machine;
//!    this crate owns all delivery.
//! 2. **The directory** ([`SessionDirectory`]) — join tokens mapped to
//!    seats, resolved idempotently so reconnects are trivial.
//! 3. **The actor** ([`SessionHandle`], [`SessionOutbound`]) — one task
//!    per session owning the engine, serializing commands, and pushing
//!    per-seat projections to whoever currently holds each seat.
//! 4. **The host** ([`SessionHost`]) — the map of live sessions the
//!    server talks to.
//!
//! # How it fits in the stack
//!
//! ```text
//! Lobby layer (above)   ← makes matches, calls SessionHost::open_session
//!     ↕
//! Session layer (this crate)
//!     ↕
//! Protocol layer (below) ← ids, Slot, frame types
//! ```

mod actor;
mod directory;
mod engine;
mod error;
mod host;

pub use actor::{AttachTicket, SeatSender, SessionHandle, SessionOutbound};
pub use directory::{SeatBinding, SessionDirectory};
pub use engine::{EngineFactory, EngineSession};
pub use error::SessionError;
pub use host::{Attached, SessionHost};
