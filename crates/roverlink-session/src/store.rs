//! The session state store: the latest known value of everything the
//! backend pushes, plus bounded diagnostic logs.
//!
//! Only inbound handlers (and the outbound path, for the "last sent"
//! slot) mutate the store. UI collaborators read it through a
//! `tokio::sync::watch` channel, so every mutation is visible to them as a
//! change notification.

use std::collections::VecDeque;

use roverlink_protocol::{ClientId, CollisionInformation, RequestId, RpcError, RpcResult};
use serde_json::Value;

use crate::Notification;

// ---------------------------------------------------------------------------
// RingLog
// ---------------------------------------------------------------------------

/// Append-only log that keeps the newest `capacity` entries.
#[derive(Debug, Clone, PartialEq)]
pub struct RingLog<T> {
    entries: VecDeque<T>,
    capacity: usize,
}

impl<T> RingLog<T> {
    /// Creates an empty log. A capacity of 0 is treated as 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity.min(64)),
            capacity,
        }
    }

    /// Appends an entry, evicting the oldest one when full.
    pub fn push(&mut self, entry: T) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Iterates from oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> {
        self.entries.iter()
    }

    pub fn last(&self) -> Option<&T> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

// ---------------------------------------------------------------------------
// Store records
// ---------------------------------------------------------------------------

/// Client-side view of the driver seat and killswitch.
///
/// The backend is the authority on who drives; this is only a projection
/// of what it last told us.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverState {
    /// This client may act as driver.
    pub is_driver_available: bool,
    /// Movement commands are blocked by a developer.
    pub is_killswitch_enabled: bool,
}

impl Default for DriverState {
    fn default() -> Self {
        Self {
            is_driver_available: true,
            is_killswitch_enabled: false,
        }
    }
}

/// Connected and blocked users, in the order the backend sent them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Roster {
    pub connected_users: Vec<Value>,
    pub blocked_users: Vec<Value>,
}

/// Whether this client's own address is blocked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelfBlockStatus {
    pub ip_address: String,
    pub is_blocked: bool,
}

/// What a blocking-state update did to [`SelfBlockStatus::is_blocked`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockTransition {
    Unchanged,
    Blocked,
    Unblocked,
}

// ---------------------------------------------------------------------------
// SessionStore
// ---------------------------------------------------------------------------

/// Everything the console can read about the session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStore {
    connected: bool,
    client_id: ClientId,
    driver: DriverState,
    collisions: CollisionInformation,
    roster: Roster,
    block: SelfBlockStatus,
    notifications: RingLog<Notification>,
    responses: RingLog<RpcResult>,
    errors: RingLog<RpcError>,
    last_error: Option<RpcError>,
    last_sent: Option<String>,
}

impl SessionStore {
    /// Creates an empty store whose logs keep `retention` entries each.
    pub fn new(retention: usize) -> Self {
        Self {
            connected: false,
            client_id: ClientId::UNASSIGNED,
            driver: DriverState::default(),
            collisions: CollisionInformation::default(),
            roster: Roster::default(),
            block: SelfBlockStatus::default(),
            notifications: RingLog::new(retention),
            responses: RingLog::new(retention),
            errors: RingLog::new(retention),
            last_error: None,
            last_sent: None,
        }
    }

    // -- Reads --

    /// Whether the socket was open as of the last lifecycle event.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// The identity the backend assigned, or [`ClientId::UNASSIGNED`].
    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    pub fn driver(&self) -> DriverState {
        self.driver
    }

    pub fn collisions(&self) -> &CollisionInformation {
        &self.collisions
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn block_status(&self) -> &SelfBlockStatus {
        &self.block
    }

    pub fn notifications(&self) -> &RingLog<Notification> {
        &self.notifications
    }

    pub fn responses(&self) -> &RingLog<RpcResult> {
        &self.responses
    }

    pub fn errors(&self) -> &RingLog<RpcError> {
        &self.errors
    }

    /// The most recent error response, even if it has been evicted from
    /// the error log.
    pub fn last_error(&self) -> Option<&RpcError> {
        self.last_error.as_ref()
    }

    /// The text of the most recent frame handed to the transport.
    pub fn last_sent(&self) -> Option<&str> {
        self.last_sent.as_deref()
    }

    /// Finds the retained result for a request.
    pub fn response_for(&self, id: RequestId) -> Option<&RpcResult> {
        self.responses.iter().rev().find(|r| r.id == Some(id))
    }

    /// Finds the retained error for a request.
    pub fn error_for(&self, id: RequestId) -> Option<&RpcError> {
        self.errors.iter().rev().find(|e| e.id == Some(id))
    }

    // -- Writes --

    pub(crate) fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    pub(crate) fn set_client_id(&mut self, id: ClientId) {
        self.client_id = id;
    }

    pub(crate) fn set_driver_available(&mut self, available: bool) {
        self.driver.is_driver_available = available;
    }

    pub(crate) fn set_killswitch(&mut self, enabled: bool) {
        self.driver.is_killswitch_enabled = enabled;
    }

    pub(crate) fn set_collisions(&mut self, info: CollisionInformation) {
        self.collisions = info;
    }

    pub(crate) fn set_roster(&mut self, connected: Vec<Value>, blocked: Vec<Value>) {
        self.roster = Roster {
            connected_users: connected,
            blocked_users: blocked,
        };
    }

    /// Stores the address unconditionally and reports whether the blocked
    /// flag actually changed.
    pub(crate) fn apply_blocking_state(
        &mut self,
        ip_address: String,
        blocked: bool,
    ) -> BlockTransition {
        self.block.ip_address = ip_address;
        let transition = match (self.block.is_blocked, blocked) {
            (false, true) => BlockTransition::Blocked,
            (true, false) => BlockTransition::Unblocked,
            _ => BlockTransition::Unchanged,
        };
        self.block.is_blocked = blocked;
        transition
    }

    pub(crate) fn push_notification(&mut self, notification: Notification) {
        self.notifications.push(notification);
    }

    pub(crate) fn record_result(&mut self, result: RpcResult) {
        self.responses.push(result);
    }

    pub(crate) fn record_error(&mut self, error: RpcError) {
        self.last_error = Some(error.clone());
        self.errors.push(error);
    }

    pub(crate) fn record_sent(&mut self, text: String) {
        self.last_sent = Some(text);
    }
}
