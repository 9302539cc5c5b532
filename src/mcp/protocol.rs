//! JSON-RPC 2.0 message types for MCP protocol.
//!
//! This module defines the envelope types exchanged with the client and the
//! validation applied to every inbound payload before it is routed.
//!
//! # Message Types
//!
//! - **Request**: A message expecting a response (has a non-null `id`)
//! - **Notification**: A request without `id` (or with `id: null`), never answered
//! - **Response**: A reply to a request, either a result or an error
//!
//! # Validation Order
//!
//! [`parse_message`] short-circuits in this order:
//!
//! 1. The payload must be valid JSON, otherwise `-32700` with `id: null`
//! 2. The payload must carry a non-empty `method`, otherwise `-32600` echoing
//!    whatever `id` could be read
//!
//! Method-specific parameter checks happen later, inside the handlers.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::error::McpError;

/// The MCP protocol version this implementation supports.
pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";

/// Server name for capability negotiation.
pub const SERVER_NAME: &str = "paper-indexer-mcp";

/// The only JSON-RPC version accepted and emitted.
pub const JSONRPC_VERSION: &str = "2.0";

/// A JSON-RPC 2.0 request ID.
///
/// Numbers keep their original `serde_json::Number` representation so that an
/// echoed ID has exactly the type and value the client sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    /// Numeric request ID.
    Number(Number),
    /// String request ID.
    String(String),
}

impl From<i64> for RequestId {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s}"),
        }
    }
}

/// A validated inbound JSON-RPC 2.0 message.
///
/// `id` is `None` for notifications.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// Request identifier, absent for notifications.
    pub id: Option<RequestId>,

    /// The method to invoke. Never empty.
    pub method: String,

    /// Optional parameters for the method.
    pub params: Option<Value>,
}

impl Request {
    /// Returns `true` if no response may be sent for this message.
    #[must_use]
    pub const fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// A successful JSON-RPC 2.0 response.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcResponse {
    /// Always "2.0".
    pub jsonrpc: &'static str,

    /// The request ID this response corresponds to.
    pub id: RequestId,

    /// The result of the method call.
    pub result: Value,
}

impl JsonRpcResponse {
    /// Creates a new success response.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // Value is not const-compatible
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result,
        }
    }
}

/// JSON-RPC 2.0 error codes, standard and server-defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Invalid JSON was received by the server.
    ParseError,
    /// The JSON sent is not a valid Request object.
    InvalidRequest,
    /// The method does not exist or is not available.
    MethodNotFound,
    /// Invalid method parameters.
    InvalidParams,
    /// Internal JSON-RPC error.
    InternalError,
    /// The requested tool is not registered.
    ToolNotFound,
    /// A file or directory does not exist.
    FileNotFound,
    /// Access to a resource was refused.
    PermissionDenied,
    /// An operation timed out. Reserved, nothing raises it yet.
    Timeout,
    /// A tool failed without reporting a typed error.
    ToolExecutionFailed,
}

impl ErrorCode {
    /// Returns the numeric code for this error.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::ParseError => -32700,
            Self::InvalidRequest => -32600,
            Self::MethodNotFound => -32601,
            Self::InvalidParams => -32602,
            Self::InternalError => -32603,
            Self::ToolNotFound => -32000,
            Self::FileNotFound => -32001,
            Self::PermissionDenied => -32002,
            Self::Timeout => -32003,
            Self::ToolExecutionFailed => -32004,
        }
    }
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcErrorData {
    /// The error code.
    pub code: i32,

    /// A short description of the error.
    pub message: String,
}

impl JsonRpcErrorData {
    /// Creates a new error with a custom message.
    #[must_use]
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.code(),
            message: message.into(),
        }
    }
}

/// A JSON-RPC 2.0 error response.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcError {
    /// Always "2.0".
    pub jsonrpc: &'static str,

    /// The request ID this error corresponds to, `null` when unknown.
    pub id: Option<RequestId>,

    /// The error details.
    pub error: JsonRpcErrorData,
}

impl JsonRpcError {
    /// Creates a new error response.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // JsonRpcErrorData contains String
    pub fn new(id: Option<RequestId>, error: JsonRpcErrorData) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            error,
        }
    }

    /// Creates an error response from a typed request failure.
    #[must_use]
    pub fn from_error(id: Option<RequestId>, error: McpError) -> Self {
        Self::new(id, error.into())
    }

    /// Creates a parse error response (ID cannot be determined).
    #[must_use]
    pub fn parse_error(detail: impl std::fmt::Display) -> Self {
        Self::new(
            None,
            JsonRpcErrorData::with_message(
                ErrorCode::ParseError,
                format!("Parse error: {detail}"),
            ),
        )
    }

    /// Creates an invalid request error response.
    #[must_use]
    pub fn invalid_request(id: Option<RequestId>, message: impl Into<String>) -> Self {
        Self::new(
            id,
            JsonRpcErrorData::with_message(ErrorCode::InvalidRequest, message),
        )
    }

    /// Creates an internal error response.
    #[must_use]
    pub fn internal_error(id: Option<RequestId>, message: impl Into<String>) -> Self {
        Self::new(
            id,
            JsonRpcErrorData::with_message(ErrorCode::InternalError, message),
        )
    }
}

/// Anything the server sends back: a result or an error.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum OutgoingMessage {
    /// Successful reply.
    Response(JsonRpcResponse),
    /// Error reply.
    Error(JsonRpcError),
}

impl OutgoingMessage {
    /// Returns the ID this message answers, `None` when it is `null`.
    #[must_use]
    pub const fn id(&self) -> Option<&RequestId> {
        match self {
            Self::Response(resp) => Some(&resp.id),
            Self::Error(err) => err.id.as_ref(),
        }
    }

    /// Serialises the message as single-line JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be serialised.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl From<JsonRpcResponse> for OutgoingMessage {
    fn from(resp: JsonRpcResponse) -> Self {
        Self::Response(resp)
    }
}

impl From<JsonRpcError> for OutgoingMessage {
    fn from(err: JsonRpcError) -> Self {
        Self::Error(err)
    }
}

/// Parses a JSON string into a validated request.
///
/// # Errors
///
/// Returns a `JsonRpcError` if the JSON is malformed or not a valid request
/// envelope. The error always carries the best ID that could be recovered.
pub fn parse_message(json: &str) -> Result<Request, JsonRpcError> {
    let value: Value = serde_json::from_str(json).map_err(JsonRpcError::parse_error)?;

    let Value::Object(mut obj) = value else {
        return Err(JsonRpcError::invalid_request(
            None,
            "Invalid Request: expected a JSON object",
        ));
    };

    let id = take_id(&mut obj)?;

    let method = match obj.remove("method") {
        Some(Value::String(method)) if !method.is_empty() => method,
        _ => {
            return Err(JsonRpcError::invalid_request(
                id,
                "Invalid Request: Method is missing",
            ))
        }
    };

    match obj.get("jsonrpc") {
        None => {}
        Some(Value::String(version)) if version == JSONRPC_VERSION => {}
        Some(_) => {
            return Err(JsonRpcError::invalid_request(
                id,
                "Invalid Request: jsonrpc field must be \"2.0\"",
            ))
        }
    }

    let params = match obj.remove("params") {
        None | Some(Value::Null) => None,
        Some(params) => Some(params),
    };

    Ok(Request { id, method, params })
}

/// Extracts the request ID, treating `null` like an absent member.
fn take_id(obj: &mut Map<String, Value>) -> Result<Option<RequestId>, JsonRpcError> {
    match obj.remove("id") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(Some(RequestId::Number(n))),
        Some(Value::String(s)) => Ok(Some(RequestId::String(s))),
        Some(_) => Err(JsonRpcError::invalid_request(
            None,
            "Invalid Request: id must be a string, a number or null",
        )),
    }
}
