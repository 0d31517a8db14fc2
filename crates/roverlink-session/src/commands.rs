//! Outbound command surface.
//!
//! Each operation encodes one call with a fixed method name and positional
//! params and hands it to the transport. Every send returns the allocated
//! [`RequestId`] so the caller can look up the reply with
//! [`SessionStore::response_for`](crate::SessionStore::response_for).
//!
//! Only [`Session::get_system_up_time`] and [`Session::heartbeat`] check
//! for an identity first. Everything else sends unconditionally, even with
//! no identity assigned yet.

use roverlink_protocol::{ClientCall, RequestId};

use crate::{
    CallbackSlot, IdentityFuture, IdentityState, Notification,
    NotificationKind, ResponseCallback, Session, SessionError,
};

/// Shown when the uptime is requested before the backend assigned an id.
pub const UPTIME_UNAVAILABLE_MESSAGE: &str =
    "Could not fetch systems uptime because connecting to the rover is still in progress.";

impl Session {
    /// `ping[lastId]`, where `lastId` is the last id allocated before this
    /// call.
    pub fn send_ping(&mut self) -> Result<RequestId, SessionError> {
        let last_id = self.codec.last_id();
        self.send(ClientCall::Ping { last_id })
    }

    /// `heartbeat[clientId]`.
    ///
    /// # Errors
    /// [`SessionError::IdentityUnavailable`] if no id is assigned yet.
    pub fn heartbeat(&mut self) -> Result<RequestId, SessionError> {
        let client_id = self.client_id();
        if !client_id.is_assigned() {
            return Err(SessionError::IdentityUnavailable);
        }
        self.send(ClientCall::Heartbeat { client_id })
    }

    // -- Movement --

    pub fn stop(&mut self) -> Result<RequestId, SessionError> {
        self.send(ClientCall::Stop)
    }

    pub fn drive_forward(&mut self) -> Result<RequestId, SessionError> {
        let speed = self.config.drive_speed;
        self.send(ClientCall::DriveForward { speed })
    }

    pub fn drive_backward(&mut self) -> Result<RequestId, SessionError> {
        let speed = self.config.drive_speed;
        self.send(ClientCall::DriveBackward { speed })
    }

    /// Joystick-style driving: a heading in degrees and a speed.
    pub fn drive_continuously(
        &mut self,
        angle: i32,
        speed: i32,
    ) -> Result<RequestId, SessionError> {
        self.send(ClientCall::DriveContinuously { angle, speed })
    }

    pub fn turn_left(&mut self) -> Result<RequestId, SessionError> {
        let rate = self.config.turn_rate;
        self.send(ClientCall::TurnLeft { rate })
    }

    pub fn turn_right(&mut self) -> Result<RequestId, SessionError> {
        let rate = self.config.turn_rate;
        self.send(ClientCall::TurnRight { rate })
    }

    // -- Camera head --

    pub fn camera_move_up(&mut self) -> Result<RequestId, SessionError> {
        let step = self.config.camera_step;
        self.send(ClientCall::TurnHeadUp { step })
    }

    pub fn camera_move_down(&mut self) -> Result<RequestId, SessionError> {
        let step = self.config.camera_step;
        self.send(ClientCall::TurnHeadDown { step })
    }

    pub fn camera_move_left(&mut self) -> Result<RequestId, SessionError> {
        let step = self.config.camera_step;
        self.send(ClientCall::TurnHeadLeft { step })
    }

    pub fn camera_move_right(&mut self) -> Result<RequestId, SessionError> {
        let step = self.config.camera_step;
        self.send(ClientCall::TurnHeadRight { step })
    }

    pub fn camera_reset_position(&mut self) -> Result<RequestId, SessionError> {
        self.send(ClientCall::ResetHeadPosition)
    }

    // -- Developer controls --

    /// Blocks or unblocks movement for everyone, with a reason shown to
    /// the other operators.
    pub fn set_killswitch(
        &mut self,
        enabled: bool,
        message: impl Into<String>,
    ) -> Result<RequestId, SessionError> {
        self.send(ClientCall::SetKillswitch {
            enabled,
            message: message.into(),
        })
    }

    /// Asks the backend to push the killswitch state again.
    pub fn request_killswitch_state(&mut self) -> Result<RequestId, SessionError> {
        self.send(ClientCall::SendKillswitchState)
    }

    pub fn set_max_speed(&mut self, value: i32) -> Result<RequestId, SessionError> {
        self.send(ClientCall::SetMaxSpeedValue { value })
    }

    pub fn request_max_speed(&mut self) -> Result<RequestId, SessionError> {
        self.send(ClientCall::SendMaxSpeedValue)
    }

    /// Frees the driver seat, whoever holds it. Unlike
    /// [`exit_driver_mode`](Self::exit_driver_mode) this is not tied to
    /// this client's identity.
    pub fn release_driver(&mut self) -> Result<RequestId, SessionError> {
        self.send(ClientCall::ReleaseDriver)
    }

    pub fn block_ip(&mut self, ip: impl Into<String>) -> Result<RequestId, SessionError> {
        self.send(ClientCall::BlockIp { ip: ip.into() })
    }

    pub fn unblock_ip(&mut self, ip: impl Into<String>) -> Result<RequestId, SessionError> {
        self.send(ClientCall::UnblockIp { ip: ip.into() })
    }

    // -- Requests answered by a server push --

    /// Requests a camera frame. `callback` receives the `incomingSnapshot`
    /// payload.
    ///
    /// Only one snapshot callback is kept: a second request before the
    /// first answer arrives replaces the first callback, which is then
    /// never called.
    pub fn get_camera_snapshot(
        &mut self,
        callback: ResponseCallback,
    ) -> Result<RequestId, SessionError> {
        self.register(CallbackSlot::Snapshot, callback);
        let client_id = self.client_id();
        self.send(ClientCall::GetCameraSnapshot { client_id })
    }

    /// Requests log entries after `last_entry`, or all of them for `None`.
    pub fn get_logging_entries(
        &mut self,
        last_entry: Option<String>,
        callback: ResponseCallback,
    ) -> Result<RequestId, SessionError> {
        self.register(CallbackSlot::LogEntries, callback);
        let client_id = self.client_id();
        self.send(ClientCall::GetLoggingEntries {
            client_id,
            last_entry,
        })
    }

    /// Requests the rover's uptime.
    ///
    /// # Errors
    /// With no identity assigned, nothing is sent and the callback is
    /// dropped: an error notification is shown and
    /// [`SessionError::IdentityUnavailable`] is returned.
    pub fn get_system_up_time(
        &mut self,
        callback: ResponseCallback,
    ) -> Result<RequestId, SessionError> {
        let client_id = self.client_id();
        if !client_id.is_assigned() {
            self.notify(Notification::new(
                NotificationKind::Error,
                UPTIME_UNAVAILABLE_MESSAGE,
            ));
            return Err(SessionError::IdentityUnavailable);
        }
        self.register(CallbackSlot::SystemUpTime, callback);
        self.send(ClientCall::GetSystemUpTime { client_id })
    }

    // -- Notifications --

    /// Broadcasts an alert to every connected operator.
    pub fn send_alert_notification(
        &mut self,
        message: impl Into<String>,
    ) -> Result<RequestId, SessionError> {
        self.send(ClientCall::DistributeAlertNotification {
            message: message.into(),
        })
    }

    /// Shows an alert locally. Nothing is sent.
    pub fn show_alert_notification(&mut self, message: impl Into<String>) {
        self.notify(Notification::new(NotificationKind::Alert, message));
    }

    // -- Driver mode --

    /// Asks for the driver seat once the identity is known.
    ///
    /// - Resolved: sends `enterDriverMode` now.
    /// - Pending: sends it when `setClientId` arrives, or drops it with a
    ///   log if the identity is rejected first.
    /// - Rejected: logs and sends nothing.
    ///
    /// Returns the identity future so the caller can observe the outcome.
    ///
    /// # Errors
    /// Only a failed send of an immediate request.
    pub fn enter_driver_mode(&mut self) -> Result<IdentityFuture, SessionError> {
        match self.identity.state() {
            IdentityState::Resolved(client_id) => {
                self.send(ClientCall::EnterDriverMode { client_id })?;
            }
            IdentityState::Pending => {
                tracing::debug!("identity pending, deferring enterDriverMode");
                self.arbiter.defer_enter();
            }
            IdentityState::Rejected => {
                tracing::info!("not entering driver mode because identity was rejected");
            }
        }
        Ok(self.identity.future())
    }

    /// Gives up the driver seat, using whatever identity is held now.
    pub fn exit_driver_mode(&mut self) -> Result<RequestId, SessionError> {
        let client_id = self.client_id();
        self.send(ClientCall::ExitDriverMode { client_id })
    }

    fn register(&mut self, slot: CallbackSlot, callback: ResponseCallback) {
        if self.callbacks.register(slot, callback) {
            tracing::debug!(?slot, "replaced unanswered callback");
        }
    }
}
