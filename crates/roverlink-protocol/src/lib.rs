//! Wire protocol for Roverlink.
//!
//! This crate defines what the operator console and the rover backend say
//! to each other:
//!
//! - **Envelopes** ([`OutboundCall`], [`Inbound`]): the JSON-RPC frames
//!   that travel on the socket.
//! - **Method tables** ([`ServerCall`], [`ClientCall`]): every method
//!   each side may call, with typed parameters.
//! - **Codec** ([`Codec`], [`JsonCodec`], [`MessageCodec`]): text frames
//!   in and out, plus request id allocation ([`RequestIds`]).
//! - **Errors** ([`ProtocolError`]).
//!
//! ```text
//! Transport (text) → Protocol (Inbound / ServerCall) → Session (state)
//! ```

mod codec;
mod envelope;
mod error;
mod methods;
mod types;

pub use codec::{Codec, JsonCodec, MessageCodec, RequestIds};
pub use envelope::{
    Inbound, JSONRPC_VERSION, MethodCall, OutboundCall, RpcError, RpcResult,
};
pub use error::ProtocolError;
pub use methods::{ClientCall, ServerCall};
pub use types::{
    ClientId, CollisionInformation, NO_DRIVER, RequestId, RoverStateUpdate,
};
