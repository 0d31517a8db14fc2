//! RPC session manager for Roverlink.
//!
//! One [`Session`] per connection. It turns transport events into state and
//! operator commands into frames:
//!
//! 1. **Routing**: every inbound frame is decoded and dispatched to the
//!    [`SessionStore`], the [`DriverArbiter`], the [`IdentityResolver`] or
//!    a pending response callback ([`PendingCallbacks`]).
//! 2. **Identity**: the client learns its own id from `setClientId`. The
//!    resolver settles exactly once, resolved or rejected by deadline,
//!    and anything that needs the id waits on an [`IdentityFuture`].
//! 3. **Driver arbitration**: only one client drives. The arbiter reacts
//!    to who the backend says holds the seat, and re-requests it when the
//!    seat empties while the operator is on the driving view.
//! 4. **Commands**: thin encode-and-send operations over fixed method
//!    names (see `commands.rs`).
//!
//! # How it fits in the stack
//!
//! ```text
//! Client (above)         ← owns the Session on one task, exposes RoverClient
//!     ↕
//! Session (this crate)   ← routing, identity, driver seat, state store
//!     ↕
//! Protocol / Transport   ← envelopes, request ids, the socket
//! ```
//!
//! The session never awaits and never owns a timer. The owner drives it
//! with [`Session::handle_event`] and calls [`Session::on_identity_deadline`]
//! once [`Session::identity_deadline`] passes.

mod arbiter;
mod callbacks;
mod commands;
mod config;
mod error;
mod identity;
mod presenter;
mod router;
mod session;
mod store;

pub use arbiter::{DriverArbiter, DriverDecision, View};
pub use callbacks::{CallbackSlot, PendingCallbacks, ResponseCallback};
pub use commands::UPTIME_UNAVAILABLE_MESSAGE;
pub use config::{ClientInfo, SessionConfig};
pub use error::SessionError;
pub use identity::{IdentityFuture, IdentityResolver, IdentityState};
pub use presenter::{LogPresenter, Notification, NotificationKind, Presenter};
pub use router::BLOCKED_MESSAGE;
pub use session::Session;
pub use store::{BlockTransition, DriverState, RingLog, Roster, SelfBlockStatus, SessionStore};
