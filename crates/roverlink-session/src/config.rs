//! Session configuration.

use std::time::Duration;

/// Describes this client to the backend in `setClientInformation`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInfo {
    /// User agent or application name.
    pub browser: String,
    /// Operating system name.
    pub os: String,
}

impl Default for ClientInfo {
    fn default() -> Self {
        Self {
            browser: format!("roverlink/{}", env!("CARGO_PKG_VERSION")),
            os: std::env::consts::OS.to_string(),
        }
    }
}

/// Tunables for one session.
///
/// Start from `SessionConfig::default()` and override what you need:
///
/// ```rust
/// use std::time::Duration;
/// use roverlink_session::SessionConfig;
///
/// let config = SessionConfig {
///     drive_speed: 350,
///     identity_timeout: Duration::from_secs(5),
///     ..SessionConfig::default()
/// };
/// assert_eq!(config.turn_rate, 300);
/// ```
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Speed sent with `driveForward` / `driveBackward`. Default: 500.
    pub drive_speed: i32,

    /// Rate sent with `turnLeft` / `turnRight`. Default: 300.
    pub turn_rate: i32,

    /// Step sent with the `turnHead*` calls. Default: 20.
    pub camera_step: i32,

    /// How long to wait for `setClientId` before rejecting the identity
    /// future. Default: 3 seconds.
    pub identity_timeout: Duration,

    /// How many entries each diagnostic log keeps (responses, errors,
    /// notifications). Default: 256. Clamped to at least 1.
    pub retention: usize,

    /// Sent to the backend once the identity is known.
    pub client_info: ClientInfo,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            drive_speed: 500,
            turn_rate: 300,
            camera_step: 20,
            identity_timeout: Duration::from_millis(3000),
            retention: 256,
            client_info: ClientInfo::default(),
        }
    }
}

impl SessionConfig {
    /// Fixes out-of-range values so the config is safe to use.
    ///
    /// Called by [`Session::new`](crate::Session::new).
    pub fn validated(mut self) -> Self {
        if self.retention == 0 {
            tracing::warn!("retention of 0 would drop every entry, using 1");
            self.retention = 1;
        }
        self
    }
}
