//! Inbound dispatch: classify each decoded frame and forward it to the
//! state store, the arbiter, the identity resolver or a pending callback.
//!
//! Routing is synchronous. Nothing here returns an error to the caller:
//! malformed frames, unknown methods and bad params are logged and
//! dropped without touching the store.

use roverlink_protocol::{ClientCall, ClientId, Inbound, RoverStateUpdate, ServerCall};
use serde_json::Value;

use crate::{
    BlockTransition, CallbackSlot, DriverDecision, Notification,
    NotificationKind, Session,
};

/// Shown when a developer blocks this client's address.
pub const BLOCKED_MESSAGE: &str =
    "A developer blocked you, no further interaction with the rover possible";

impl Session {
    /// Decodes and routes one text frame.
    pub fn handle_frame(&mut self, text: &str) {
        match self.codec.decode(text) {
            Ok(inbound) => self.route(inbound),
            Err(e) => tracing::debug!(error = %e, "dropping undecodable frame"),
        }
    }

    /// Routes one decoded frame.
    pub fn route(&mut self, inbound: Inbound) {
        match inbound {
            Inbound::Result(result) => {
                tracing::debug!(id = ?result.id, "result");
                self.state.send_modify(|s| s.record_result(result));
            }
            Inbound::Error(error) => {
                tracing::debug!(id = ?error.id, error = %error.error, "error response");
                self.state.send_modify(|s| s.record_error(error));
            }
            Inbound::MethodCall(call) => match ServerCall::parse(call) {
                Ok(call) => self.dispatch(call),
                Err(e) => tracing::debug!(error = %e, "ignoring server call"),
            },
        }
    }

    fn dispatch(&mut self, call: ServerCall) {
        if call.is_bulky() {
            tracing::debug!(method = call.method(), "server call");
        } else {
            tracing::debug!(?call, "server call");
        }

        match call {
            ServerCall::SetClientId(id) => self.on_client_id(id),
            ServerCall::IncomingNotification(msg) => {
                self.notify(Notification::new(NotificationKind::Info, msg));
            }
            ServerCall::ShowAlertNotification(msg) => {
                self.notify(Notification::new(NotificationKind::Alert, msg));
            }
            ServerCall::ShowErrorNotification(msg) => {
                self.notify(Notification::new(NotificationKind::Error, msg));
            }
            ServerCall::UpdateCollisionInformation(info) => {
                self.state.send_modify(|s| s.set_collisions(info));
            }
            ServerCall::UpdateConnectedUsers { connected, blocked } => {
                self.state
                    .send_modify(|s| s.set_roster(connected, blocked));
            }
            ServerCall::UpdateRoverState(update) => self.on_rover_state(update),
            ServerCall::SetMyBlockingState {
                ip_address,
                blocked,
            } => self.on_blocking_state(ip_address, blocked),
            ServerCall::IncomingSnapshot(image) => {
                self.fire(CallbackSlot::Snapshot, image);
            }
            ServerCall::IncomingLogEntries(entries) => {
                self.fire(CallbackSlot::LogEntries, entries);
            }
            ServerCall::IncomingSystemUpTime(uptime) => {
                self.fire(CallbackSlot::SystemUpTime, uptime);
            }
        }
    }

    fn on_client_id(&mut self, id: ClientId) {
        self.state.send_modify(|s| s.set_client_id(id));
        if !id.is_assigned() {
            tracing::debug!("backend sent the unassigned client id");
            return;
        }
        if !self.identity.resolve(id) {
            tracing::info!(client_id = %id, "client id updated after identity settled");
            return;
        }
        tracing::info!(client_id = %id, "client id assigned");

        let info = self.config.client_info.clone();
        self.send_or_log(ClientCall::SetClientInformation {
            client_id: id,
            browser: info.browser,
            os: info.os,
        });

        for _ in 0..self.arbiter.take_deferred_enters() {
            self.send_or_log(ClientCall::EnterDriverMode { client_id: id });
        }
    }

    fn on_rover_state(&mut self, update: RoverStateUpdate) {
        let me = self.client_id();
        match self.arbiter.decide(me, update.current_driver_id) {
            DriverDecision::Acquired => {
                tracing::info!(client_id = %me, "driver seat acquired");
                self.state.send_modify(|s| s.set_driver_available(true));
            }
            DriverDecision::TakenBy(other) => {
                tracing::debug!(driver = other, "driver seat held by another client");
                self.state.send_modify(|s| s.set_driver_available(false));
            }
            DriverDecision::Reacquire => {
                tracing::info!(client_id = %me, "driver seat empty, requesting it");
                self.state.send_modify(|s| s.set_driver_available(false));
                self.send_or_log(ClientCall::EnterDriverMode { client_id: me });
            }
            DriverDecision::Unchanged => {}
        }

        if let Some(enabled) = update.is_killswitch_enabled {
            self.state.send_modify(|s| s.set_killswitch(enabled));
        }
    }

    fn on_blocking_state(&mut self, ip_address: String, blocked: bool) {
        let mut transition = BlockTransition::Unchanged;
        self.state.send_modify(|s| {
            transition = s.apply_blocking_state(ip_address, blocked);
        });
        match transition {
            BlockTransition::Blocked => {
                self.presenter.show_blocked_dialog(BLOCKED_MESSAGE);
            }
            BlockTransition::Unblocked => self.presenter.hide_blocked_dialog(),
            BlockTransition::Unchanged => {}
        }
    }

    fn fire(&mut self, slot: CallbackSlot, payload: Value) {
        if !self.callbacks.fire(slot, payload) {
            tracing::debug!(?slot, "response with no pending callback, dropped");
        }
    }
}
