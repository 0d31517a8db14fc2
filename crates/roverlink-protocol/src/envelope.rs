//! Envelopes: the JSON-RPC message units exchanged over the socket.
//!
//! Outbound, the client only ever sends calls:
//!
//! ```text
//! {"jsonrpc":"2.0","method":"driveForward","params":[500],"id":7}
//! ```
//!
//! Inbound frames come in three shapes, told apart by which key is present:
//!
//! ```text
//! {"method":"setClientId","params":[3]}   → Inbound::MethodCall
//! {"id":7,"result":"pong 8"}              → Inbound::Result
//! {"id":7,"error":{"code":-32601}}        → Inbound::Error
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{ProtocolError, RequestId};

/// The protocol version stamped on every outbound call.
pub const JSONRPC_VERSION: &str = "2.0";

/// A client → server call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundCall {
    pub jsonrpc: String,
    pub method: String,
    pub params: Vec<Value>,
    pub id: RequestId,
}

impl OutboundCall {
    /// Builds a call stamped with [`JSONRPC_VERSION`].
    pub fn new(
        method: impl Into<String>,
        params: Vec<Value>,
        id: RequestId,
    ) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params,
            id,
        }
    }
}

/// A server → client method call. No reply is expected.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodCall {
    pub method: String,
    pub params: Vec<Value>,
}

/// A successful response to one of our calls.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcResult {
    /// The request this answers. `None` if the backend sent no usable id.
    pub id: Option<RequestId>,
    pub result: Value,
}

/// An error response to one of our calls.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcError {
    pub id: Option<RequestId>,
    pub error: Value,
}

/// A decoded inbound frame. Exactly one shape per frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    MethodCall(MethodCall),
    Result(RpcResult),
    Error(RpcError),
}

impl Inbound {
    /// Classifies a parsed JSON value.
    ///
    /// Unknown extra fields are ignored. `params` may be absent (treated as
    /// empty) but must be an array when present.
    ///
    /// # Errors
    /// [`ProtocolError::InvalidMessage`] if the value is not an object, has
    /// none of `method`/`result`/`error`, has more than one of them, or has a
    /// non-string `method` or non-array `params`.
    pub fn from_value(value: Value) -> Result<Self, ProtocolError> {
        let Value::Object(mut obj) = value else {
            return Err(ProtocolError::InvalidMessage(
                "frame is not a JSON object".into(),
            ));
        };

        let present = ["method", "result", "error"]
            .into_iter()
            .filter(|key| obj.contains_key(*key))
            .count();
        match present {
            0 => {
                return Err(ProtocolError::InvalidMessage(
                    "frame has no method, result or error".into(),
                ));
            }
            1 => {}
            _ => {
                return Err(ProtocolError::InvalidMessage(
                    "frame has more than one of method, result, error".into(),
                ));
            }
        }

        if let Some(method) = obj.remove("method") {
            let Value::String(method) = method else {
                return Err(ProtocolError::InvalidMessage(
                    "method must be a string".into(),
                ));
            };
            let params = match obj.remove("params") {
                None | Some(Value::Null) => Vec::new(),
                Some(Value::Array(params)) => params,
                Some(_) => {
                    return Err(ProtocolError::InvalidMessage(format!(
                        "params of {method} must be an array"
                    )));
                }
            };
            return Ok(Inbound::MethodCall(MethodCall { method, params }));
        }

        let id = response_id(&obj);
        if let Some(result) = obj.remove("result") {
            return Ok(Inbound::Result(RpcResult { id, result }));
        }
        let error = obj.remove("error").unwrap_or(Value::Null);
        Ok(Inbound::Error(RpcError { id, error }))
    }
}

fn response_id(obj: &Map<String, Value>) -> Option<RequestId> {
    obj.get("id").and_then(Value::as_u64).map(RequestId)
}
