//! Core protocol types: identifiers and the structured parameters that
//! travel inside method calls.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Identifier of one outbound request.
///
/// Allocated by [`RequestIds`](crate::RequestIds); serialized as a plain
/// number.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The identifier the backend assigns to this client.
///
/// `0` means "not assigned yet". The backend uses `-1` in rover state
/// updates to say "nobody is driving" (see [`NO_DRIVER`]).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ClientId(pub i64);

impl ClientId {
    /// The placeholder identity before the backend has assigned one.
    pub const UNASSIGNED: ClientId = ClientId(0);

    /// Returns `true` once the backend has assigned a real identifier.
    pub fn is_assigned(self) -> bool {
        self != Self::UNASSIGNED
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C-{}", self.0)
    }
}

/// Driver id the backend sends when the driver seat is empty.
pub const NO_DRIVER: i64 = -1;

// ---------------------------------------------------------------------------
// Structured parameters
// ---------------------------------------------------------------------------

/// Collision sensor readings, replaced whole on every update.
///
/// Readings are the backend's distance levels. They are kept as raw JSON
/// values so new levels show up without a client release.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollisionInformation {
    /// The sensors reported values that should not be trusted.
    pub tainted_readings: bool,
    pub collision_front_left: Value,
    pub collision_front_right: Value,
    pub collision_back_left: Value,
    pub collision_back_right: Value,
}

impl Default for CollisionInformation {
    fn default() -> Self {
        let none = || Value::String("None".into());
        Self {
            tainted_readings: false,
            collision_front_left: none(),
            collision_front_right: none(),
            collision_back_left: none(),
            collision_back_right: none(),
        }
    }
}

/// A partial rover state pushed by the backend. Absent fields are left
/// unchanged on the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoverStateUpdate {
    /// Who holds driver mode now. [`NO_DRIVER`] when nobody does.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_driver_id: Option<i64>,

    /// Whether the killswitch blocks movement commands.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_killswitch_enabled: Option<bool>,
}
