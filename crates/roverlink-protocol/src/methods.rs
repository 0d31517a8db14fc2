//! Typed method tables.
//!
//! [`ServerCall`] is every method the backend may call on the client,
//! parsed from a [`MethodCall`](crate::MethodCall). [`ClientCall`] is every
//! method the client may call on the backend, with its positional
//! parameter list.

use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::{
    ClientId, CollisionInformation, MethodCall, ProtocolError, RequestId,
    RoverStateUpdate,
};

// ---------------------------------------------------------------------------
// Inbound
// ---------------------------------------------------------------------------

/// A recognized server → client call.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerCall {
    /// `setClientId[id]`: the backend assigned our identity.
    SetClientId(ClientId),
    /// `incomingNotification[msg]`
    IncomingNotification(String),
    /// `updateCollisionInformation[{...}]`
    UpdateCollisionInformation(CollisionInformation),
    /// `updateConnectedUsers[connected, blocked]`
    UpdateConnectedUsers {
        connected: Vec<Value>,
        blocked: Vec<Value>,
    },
    /// `incomingSnapshot[imageData]`; the image is opaque.
    IncomingSnapshot(Value),
    /// `showAlertNotification[msg]`
    ShowAlertNotification(String),
    /// `showErrorNotification[msg]`
    ShowErrorNotification(String),
    /// `updateRoverState[{currentDriverId?, isKillswitchEnabled?}]`
    UpdateRoverState(RoverStateUpdate),
    /// `setMyBlockingState[ipAddress, blockingState]`
    SetMyBlockingState { ip_address: String, blocked: bool },
    /// `incomingLogEntries[entries]`
    IncomingLogEntries(Value),
    /// `incomingSystemUpTime[uptime]`
    IncomingSystemUpTime(Value),
}

impl ServerCall {
    /// Parses a method call into a typed variant.
    ///
    /// Extra trailing parameters are ignored.
    ///
    /// # Errors
    /// - [`ProtocolError::UnknownMethod`] for a method name not in the table.
    /// - [`ProtocolError::InvalidParams`] for missing or mistyped params.
    pub fn parse(call: MethodCall) -> Result<Self, ProtocolError> {
        let mut p = Params::new(&call.method, call.params);
        let parsed = match call.method.as_str() {
            "setClientId" => Self::SetClientId(p.next("id")?),
            "incomingNotification" => {
                Self::IncomingNotification(p.next("msg")?)
            }
            "updateCollisionInformation" => {
                Self::UpdateCollisionInformation(p.next("collisionState")?)
            }
            "updateConnectedUsers" => Self::UpdateConnectedUsers {
                connected: p.next("connectedList")?,
                blocked: p.next("blockedList")?,
            },
            "incomingSnapshot" => Self::IncomingSnapshot(p.next("imageData")?),
            "showAlertNotification" => {
                Self::ShowAlertNotification(p.next("msg")?)
            }
            "showErrorNotification" => {
                Self::ShowErrorNotification(p.next("msg")?)
            }
            "updateRoverState" => Self::UpdateRoverState(p.next("roverState")?),
            "setMyBlockingState" => Self::SetMyBlockingState {
                ip_address: p.next("ipAddress")?,
                blocked: p.next("blockingState")?,
            },
            "incomingLogEntries" => Self::IncomingLogEntries(p.next("entries")?),
            "incomingSystemUpTime" => {
                Self::IncomingSystemUpTime(p.next("uptime")?)
            }
            _ => return Err(ProtocolError::UnknownMethod(call.method)),
        };
        Ok(parsed)
    }

    /// The wire name of this call.
    pub fn method(&self) -> &'static str {
        match self {
            Self::SetClientId(_) => "setClientId",
            Self::IncomingNotification(_) => "incomingNotification",
            Self::UpdateCollisionInformation(_) => "updateCollisionInformation",
            Self::UpdateConnectedUsers { .. } => "updateConnectedUsers",
            Self::IncomingSnapshot(_) => "incomingSnapshot",
            Self::ShowAlertNotification(_) => "showAlertNotification",
            Self::ShowErrorNotification(_) => "showErrorNotification",
            Self::UpdateRoverState(_) => "updateRoverState",
            Self::SetMyBlockingState { .. } => "setMyBlockingState",
            Self::IncomingLogEntries(_) => "incomingLogEntries",
            Self::IncomingSystemUpTime(_) => "incomingSystemUpTime",
        }
    }

    /// Whether the payload is too large to be worth logging in full.
    pub fn is_bulky(&self) -> bool {
        matches!(
            self,
            Self::IncomingSnapshot(_) | Self::IncomingLogEntries(_)
        )
    }
}

/// Positional parameter reader.
struct Params<'a> {
    method: &'a str,
    values: std::vec::IntoIter<Value>,
}

impl<'a> Params<'a> {
    fn new(method: &'a str, values: Vec<Value>) -> Self {
        Self {
            method,
            values: values.into_iter(),
        }
    }

    fn next<T: DeserializeOwned>(
        &mut self,
        name: &str,
    ) -> Result<T, ProtocolError> {
        let value = self.values.next().ok_or_else(|| {
            ProtocolError::InvalidParams {
                method: self.method.to_string(),
                reason: format!("missing {name}"),
            }
        })?;
        serde_json::from_value(value).map_err(|e| ProtocolError::InvalidParams {
            method: self.method.to_string(),
            reason: format!("{name}: {e}"),
        })
    }
}

// ---------------------------------------------------------------------------
// Outbound
// ---------------------------------------------------------------------------

/// A client → server call.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientCall {
    SetClientInformation {
        client_id: ClientId,
        browser: String,
        os: String,
    },
    /// Carries the last request id allocated before this call.
    Ping { last_id: RequestId },
    Heartbeat { client_id: ClientId },
    Stop,
    DriveForward { speed: i32 },
    DriveBackward { speed: i32 },
    DriveContinuously { angle: i32, speed: i32 },
    TurnLeft { rate: i32 },
    TurnRight { rate: i32 },
    TurnHeadUp { step: i32 },
    TurnHeadDown { step: i32 },
    TurnHeadLeft { step: i32 },
    TurnHeadRight { step: i32 },
    ResetHeadPosition,
    SetKillswitch { enabled: bool, message: String },
    SendKillswitchState,
    SetMaxSpeedValue { value: i32 },
    SendMaxSpeedValue,
    ReleaseDriver,
    BlockIp { ip: String },
    UnblockIp { ip: String },
    GetCameraSnapshot { client_id: ClientId },
    /// `last_entry: None` asks for the whole log.
    GetLoggingEntries {
        client_id: ClientId,
        last_entry: Option<String>,
    },
    GetSystemUpTime { client_id: ClientId },
    DistributeAlertNotification { message: String },
    EnterDriverMode { client_id: ClientId },
    ExitDriverMode { client_id: ClientId },
}

impl ClientCall {
    /// The wire name of this call.
    pub fn method(&self) -> &'static str {
        match self {
            Self::SetClientInformation { .. } => "setClientInformation",
            Self::Ping { .. } => "ping",
            Self::Heartbeat { .. } => "heartbeat",
            Self::Stop => "stop",
            Self::DriveForward { .. } => "driveForward",
            Self::DriveBackward { .. } => "driveBackward",
            Self::DriveContinuously { .. } => "driveContinuously",
            Self::TurnLeft { .. } => "turnLeft",
            Self::TurnRight { .. } => "turnRight",
            Self::TurnHeadUp { .. } => "turnHeadUp",
            Self::TurnHeadDown { .. } => "turnHeadDown",
            Self::TurnHeadLeft { .. } => "turnHeadLeft",
            Self::TurnHeadRight { .. } => "turnHeadRight",
            Self::ResetHeadPosition => "resetHeadPosition",
            Self::SetKillswitch { .. } => "setKillswitch",
            Self::SendKillswitchState => "sendKillswitchState",
            Self::SetMaxSpeedValue { .. } => "setMaxSpeedValue",
            Self::SendMaxSpeedValue => "sendMaxSpeedValue",
            Self::ReleaseDriver => "releaseDriver",
            Self::BlockIp { .. } => "blockIp",
            Self::UnblockIp { .. } => "unblockIp",
            Self::GetCameraSnapshot { .. } => "getCameraSnapshot",
            Self::GetLoggingEntries { .. } => "getLoggingEntries",
            Self::GetSystemUpTime { .. } => "getSystemUpTime",
            Self::DistributeAlertNotification { .. } => {
                "distributeAlertNotification"
            }
            Self::EnterDriverMode { .. } => "enterDriverMode",
            Self::ExitDriverMode { .. } => "exitDriverMode",
        }
    }

    /// The positional parameter list.
    pub fn params(&self) -> Vec<Value> {
        match self {
            Self::SetClientInformation {
                client_id,
                browser,
                os,
            } => vec![json!(client_id), json!(browser), json!(os)],
            Self::Ping { last_id } => vec![json!(last_id)],
            Self::Heartbeat { client_id }
            | Self::GetCameraSnapshot { client_id }
            | Self::GetSystemUpTime { client_id }
            | Self::EnterDriverMode { client_id }
            | Self::ExitDriverMode { client_id } => vec![json!(client_id)],
            Self::DriveForward { speed } | Self::DriveBackward { speed } => {
                vec![json!(speed)]
            }
            Self::DriveContinuously { angle, speed } => {
                vec![json!(angle), json!(speed)]
            }
            Self::TurnLeft { rate } | Self::TurnRight { rate } => {
                vec![json!(rate)]
            }
            Self::TurnHeadUp { step }
            | Self::TurnHeadDown { step }
            | Self::TurnHeadLeft { step }
            | Self::TurnHeadRight { step } => vec![json!(step)],
            Self::SetKillswitch { enabled, message } => {
                vec![json!(enabled), json!(message)]
            }
            Self::SetMaxSpeedValue { value } => vec![json!(value)],
            Self::BlockIp { ip } | Self::UnblockIp { ip } => vec![json!(ip)],
            Self::GetLoggingEntries {
                client_id,
                last_entry,
            } => vec![json!(client_id), json!(last_entry)],
            Self::DistributeAlertNotification { message } => {
                vec![json!(message)]
            }
            Self::Stop
            | Self::ResetHeadPosition
            | Self::SendKillswitchState
            | Self::SendMaxSpeedValue
            | Self::ReleaseDriver => Vec::new(),
        }
    }
}
