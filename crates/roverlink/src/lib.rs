//! # Roverlink
//!
//! Operator-console client for a remotely driven rover.
//!
//! Roverlink keeps one persistent JSON-RPC session with the rover backend:
//! it learns its own client id from the backend, follows who holds the
//! single driver seat, collects telemetry pushes into a readable store and
//! sends driving, camera and moderation commands.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use roverlink::prelude::*;
//!
//! # async fn demo() -> Result<(), RoverError> {
//! let client = RoverClient::builder()
//!     .connect(&Endpoint::new("127.0.0.1", 9000))
//!     .await?;
//!
//! client.set_view(View::Driving).await?;
//! client.enter_driver_mode().await?.wait().await?;
//! client.drive_forward().await?;
//! # Ok(())
//! # }
//! ```

mod client;
mod error;

pub use client::{ClientConfig, RoverClient, RoverClientBuilder};
pub use error::RoverError;

/// Re-exports of the types most embedders need.
pub mod prelude {
    pub use crate::{ClientConfig, RoverClient, RoverClientBuilder, RoverError};
    pub use roverlink_protocol::{ClientId, CollisionInformation, RequestId};
    pub use roverlink_session::{
        ClientInfo, DriverState, IdentityFuture, IdentityState, LogPresenter,
        Notification, NotificationKind, Presenter, SessionConfig, SessionError,
        SessionStore, View,
    };
    pub use roverlink_transport::{
        Endpoint, SecureEndpointPolicy, TransportError,
    };
}
