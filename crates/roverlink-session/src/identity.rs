//! Identity resolver: learns this client's id from the backend, once.
//!
//! The client does not know who it is until the backend calls
//! `setClientId`. Anything that needs the id waits on an
//! [`IdentityFuture`]. The resolver settles exactly once:
//!
//! ```text
//!              resolve(id)
//!   Pending ──────────────→ Resolved(id)
//!      │
//!      │ reject()  (deadline passed)
//!      └──────────────────→ Rejected
//! ```
//!
//! Whichever edge fires first wins; the other becomes a no-op. The
//! session owner is responsible for calling [`IdentityResolver::reject`]
//! when [`IdentityResolver::deadline`] passes (the client actor sleeps on
//! it in its `select!` loop); `setClientId` calls
//! [`IdentityResolver::resolve`] directly, with no polling.

use std::time::Duration;

use roverlink_protocol::ClientId;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::SessionError;

/// Where identity acquisition stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityState {
    /// Waiting for `setClientId`.
    Pending,
    /// The backend assigned this id in time.
    Resolved(ClientId),
    /// The deadline passed first.
    Rejected,
}

impl IdentityState {
    pub fn is_settled(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Exactly-once settling identity cell.
#[derive(Debug)]
pub struct IdentityResolver {
    state: watch::Sender<IdentityState>,
    deadline: Instant,
}

impl IdentityResolver {
    /// Starts waiting. The deadline is `timeout` from now.
    pub fn new(timeout: Duration) -> Self {
        let (state, _) = watch::channel(IdentityState::Pending);
        Self {
            state,
            deadline: Instant::now() + timeout,
        }
    }

    pub fn state(&self) -> IdentityState {
        *self.state.borrow()
    }

    /// When to reject, or `None` once settled.
    pub fn deadline(&self) -> Option<Instant> {
        (!self.state().is_settled()).then_some(self.deadline)
    }

    /// Settles with the assigned id. Returns `true` if this call settled
    /// the resolver. [`ClientId::UNASSIGNED`] never settles it.
    pub fn resolve(&self, id: ClientId) -> bool {
        if !id.is_assigned() {
            return false;
        }
        self.settle(IdentityState::Resolved(id))
    }

    /// Settles as rejected. Returns `true` if this call settled the
    /// resolver.
    pub fn reject(&self) -> bool {
        self.settle(IdentityState::Rejected)
    }

    /// Returns a future-like handle for the outcome.
    pub fn future(&self) -> IdentityFuture {
        IdentityFuture {
            state: self.state.subscribe(),
        }
    }

    fn settle(&self, outcome: IdentityState) -> bool {
        self.state.send_if_modified(|state| {
            if state.is_settled() {
                return false;
            }
            *state = outcome;
            true
        })
    }
}

/// A cloneable handle on the identity outcome.
#[derive(Debug, Clone)]
pub struct IdentityFuture {
    state: watch::Receiver<IdentityState>,
}

impl IdentityFuture {
    /// The current state, without waiting.
    pub fn state(&self) -> IdentityState {
        *self.state.borrow()
    }

    /// Waits until the resolver settles.
    ///
    /// # Errors
    /// - [`SessionError::IdentityTimeout`] if the resolver rejected.
    /// - [`SessionError::Closed`] if the session went away while pending.
    pub async fn wait(mut self) -> Result<ClientId, SessionError> {
        let outcome = *self
            .state
            .wait_for(|s| s.is_settled())
            .await
            .map_err(|_| SessionError::Closed)?;
        match outcome {
            IdentityState::Resolved(id) => Ok(id),
            _ => Err(SessionError::IdentityTimeout),
        }
    }
}
