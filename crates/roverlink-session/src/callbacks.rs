//! One-shot response callbacks for snapshot, log entry and uptime
//! requests.
//!
//! Each kind has a single slot. Registering a new callback replaces the
//! old one, which is dropped without ever being called. A callback fires
//! at most once.

use std::fmt;

use serde_json::Value;

/// Receives the payload of a pushed response.
pub type ResponseCallback = Box<dyn FnOnce(Value) + Send + 'static>;

/// Which slot a callback lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackSlot {
    /// `getCameraSnapshot` → `incomingSnapshot`.
    Snapshot,
    /// `getLoggingEntries` → `incomingLogEntries`.
    LogEntries,
    /// `getSystemUpTime` → `incomingSystemUpTime`.
    SystemUpTime,
}

#[derive(Default)]
pub struct PendingCallbacks {
    snapshot: Option<ResponseCallback>,
    log_entries: Option<ResponseCallback>,
    system_up_time: Option<ResponseCallback>,
}

impl PendingCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a callback. Returns `true` if an unfired one was replaced.
    pub fn register(
        &mut self,
        slot: CallbackSlot,
        callback: ResponseCallback,
    ) -> bool {
        self.slot_mut(slot).replace(callback).is_some()
    }

    /// Fires and clears the slot. Returns `false` if the slot was empty.
    pub fn fire(&mut self, slot: CallbackSlot, payload: Value) -> bool {
        match self.slot_mut(slot).take() {
            Some(callback) => {
                callback(payload);
                true
            }
            None => false,
        }
    }

    pub fn is_pending(&self, slot: CallbackSlot) -> bool {
        match slot {
            CallbackSlot::Snapshot => self.snapshot.is_some(),
            CallbackSlot::LogEntries => self.log_entries.is_some(),
            CallbackSlot::SystemUpTime => self.system_up_time.is_some(),
        }
    }

    fn slot_mut(&mut self, slot: CallbackSlot) -> &mut Option<ResponseCallback> {
        match slot {
            CallbackSlot::Snapshot => &mut self.snapshot,
            CallbackSlot::LogEntries => &mut self.log_entries,
            CallbackSlot::SystemUpTime => &mut self.system_up_time,
        }
    }
}

impl fmt::Debug for PendingCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingCallbacks")
            .field("snapshot", &self.snapshot.is_some())
            .field("log_entries", &self.log_entries.is_some())
            .field("system_up_time", &self.system_up_time.is_some())
            .finish()
    }
}
