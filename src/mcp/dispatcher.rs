//! Transport-independent JSON-RPC dispatch.
//!
//! The dispatcher turns one raw inbound message into at most one outbound
//! message:
//!
//! ```text
//! raw text ─▶ parse_message ─▶ route table ─▶ handler ─▶ (tool) ─▶ reply
//!                  │                                              │
//!                  └──────── -32700 / -32600 error ───────────────┘
//! ```
//!
//! Nothing is remembered between calls. Clients may skip `initialize`; later
//! methods are served regardless.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::McpError;
use crate::mcp::protocol::{
    parse_message, JsonRpcError, JsonRpcResponse, OutgoingMessage, Request, MCP_PROTOCOL_VERSION,
    SERVER_NAME,
};
use crate::tools::{ToolDefinition, ToolRegistry};

/// Server capabilities advertised during initialisation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ServerCapabilities {
    /// Tool-related capabilities.
    pub tools: ToolCapabilities,
    /// Logging capabilities.
    pub logging: LoggingCapabilities,
}

/// Tool-specific capabilities.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ToolCapabilities {
    /// Whether the tool list can change during the session.
    #[serde(rename = "listChanged", skip_serializing_if = "is_false")]
    pub list_changed: bool,
}

/// Logging capabilities. Serialises as an empty object.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoggingCapabilities {}

#[allow(clippy::trivially_copy_pass_by_ref)] // serde's skip_serializing_if requires a predicate fn(&T) -> bool, so we must take &bool here
const fn is_false(b: &bool) -> bool {
    !*b
}

/// Server information for initialisation response.
#[derive(Debug, Clone, Serialize)]
pub struct ServerInfo {
    /// Server name.
    pub name: String,
    /// Server version.
    pub version: String,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            name: SERVER_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Result of the initialize request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    /// Protocol version spoken by this server.
    pub protocol_version: &'static str,
    /// Name and version of this server.
    pub server_info: ServerInfo,
    /// Advertised capabilities.
    pub capabilities: ServerCapabilities,
}

/// Client information received during initialisation.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientInfo {
    /// Client name.
    pub name: String,
    /// Client version.
    #[serde(default)]
    pub version: Option<String>,
}

/// Parameters for the initialize request. Only used for logging.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    /// Protocol version requested by client.
    #[serde(default)]
    pub protocol_version: Option<String>,
    /// Client information.
    #[serde(default)]
    pub client_info: Option<ClientInfo>,
}

/// Result of the tools/list request.
#[derive(Debug, Clone, Serialize)]
pub struct ToolsListResult {
    /// Registered tools in registration order.
    pub tools: Vec<ToolDefinition>,
}

/// Content item in a tool call response.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    /// Text content.
    Text {
        /// The text content.
        text: String,
    },
}

/// Result of a tool call.
#[derive(Debug, Clone, Serialize)]
pub struct ToolCallResult {
    /// Content returned by the tool.
    pub content: Vec<ToolContent>,
}

impl ToolCallResult {
    /// Creates a successful text result.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
        }
    }
}

type Handler = fn(&Dispatcher, Option<&Value>) -> Result<Value, McpError>;

/// One entry of the method table.
struct Route {
    method: &'static str,
    handler: Handler,
    /// `false` for methods that are never answered, whatever the `id`.
    replies: bool,
}

const ROUTES: &[Route] = &[
    Route {
        method: "initialize",
        handler: Dispatcher::handle_initialize,
        replies: true,
    },
    Route {
        method: "notifications/initialized",
        handler: Dispatcher::handle_initialized,
        replies: false,
    },
    Route {
        method: "tools/list",
        handler: Dispatcher::handle_tools_list,
        replies: true,
    },
    Route {
        method: "tools/call",
        handler: Dispatcher::handle_tools_call,
        replies: true,
    },
    Route {
        method: "ping",
        handler: Dispatcher::handle_ping,
        replies: true,
    },
];

fn find_route(method: &str) -> Option<&'static Route> {
    ROUTES.iter().find(|route| route.method == method)
}

/// Routes JSON-RPC messages to handlers and tools.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
    server_info: ServerInfo,
}

impl Dispatcher {
    /// Creates a dispatcher serving the tools in `registry`.
    #[must_use]
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            server_info: ServerInfo::default(),
        }
    }

    /// Handles one raw message and returns the reply to send, if any.
    ///
    /// Malformed input always yields an error reply. Well-formed
    /// notifications never yield anything.
    #[must_use]
    pub fn handle_message(&self, raw: &str) -> Option<OutgoingMessage> {
        debug!(body = %raw, "Received request");

        match parse_message(raw) {
            Ok(request) => self.handle_request(request),
            Err(error) => {
                warn!(
                    code = error.error.code,
                    message = %error.error.message,
                    "Rejected malformed message"
                );
                Some(error.into())
            }
        }
    }

    /// Handles an already validated request.
    #[must_use]
    pub fn handle_request(&self, request: Request) -> Option<OutgoingMessage> {
        let Request { id, method, params } = request;
        let route = find_route(&method);

        let result = match route {
            Some(route) => {
                panic::catch_unwind(AssertUnwindSafe(|| (route.handler)(self, params.as_ref())))
                    .unwrap_or_else(|payload| {
                        Err(McpError::Internal(format!(
                            "Internal error: {}",
                            panic_message(payload.as_ref())
                        )))
                    })
            }
            None => Err(McpError::MethodNotFound(format!(
                "Method not found: {method}"
            ))),
        };

        if route.is_some_and(|route| !route.replies) {
            debug!(method = %method, "Processed notification, no response sent");
            return None;
        }

        let Some(id) = id else {
            match &result {
                Ok(_) => debug!(method = %method, "Processed notification, no response sent"),
                Err(e) => warn!(
                    method = %method,
                    code = e.code().code(),
                    message = %e,
                    "Notification failed, no response sent"
                ),
            }
            return None;
        };

        match result {
            Ok(value) => {
                debug!(id = %id, method = %method, "Sending result");
                Some(JsonRpcResponse::success(id, value).into())
            }
            Err(e) => {
                warn!(
                    id = %id,
                    method = %method,
                    code = e.code().code(),
                    message = %e,
                    "Request failed"
                );
                Some(JsonRpcError::from_error(Some(id), e).into())
            }
        }
    }

    /// Handles the initialize request.
    fn handle_initialize(&self, params: Option<&Value>) -> Result<Value, McpError> {
        if let Some(params) = params.and_then(|p| InitializeParams::deserialize(p).ok()) {
            let client = params.client_info.as_ref();
            info!(
                client_name = client.map(|c| c.name.as_str()),
                client_version = client.and_then(|c| c.version.as_deref()),
                requested_version = params.protocol_version.as_deref(),
                "Client initialising"
            );
        }

        let result = InitializeResult {
            protocol_version: MCP_PROTOCOL_VERSION,
            server_info: self.server_info.clone(),
            capabilities: ServerCapabilities::default(),
        };

        to_result(&result)
    }

    /// Handles the initialized notification.
    #[allow(clippy::unnecessary_wraps)] // signature fixed by the route table
    fn handle_initialized(&self, _params: Option<&Value>) -> Result<Value, McpError> {
        info!(tools = self.registry.len(), "Client initialised");
        Ok(Value::Null)
    }

    /// Handles the tools/list request.
    fn handle_tools_list(&self, _params: Option<&Value>) -> Result<Value, McpError> {
        to_result(&ToolsListResult {
            tools: self.registry.list(),
        })
    }

    /// Handles the tools/call request.
    fn handle_tools_call(&self, params: Option<&Value>) -> Result<Value, McpError> {
        let params = params.and_then(Value::as_object).ok_or_else(|| {
            McpError::InvalidParams(
                "Invalid params: tools/call requires an object with 'name' and 'arguments'"
                    .to_string(),
            )
        })?;

        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| McpError::InvalidParams("Missing required parameter: name".to_string()))?;

        let tool = self
            .registry
            .lookup(name)
            .ok_or_else(|| McpError::ToolNotFound(format!("Tool not found: {name}")))?;

        let arguments = match params.get("arguments") {
            Some(arguments @ Value::Object(_)) => arguments,
            None | Some(Value::Null) => {
                return Err(McpError::InvalidParams(
                    "Missing required parameter: arguments".to_string(),
                ))
            }
            Some(_) => {
                return Err(McpError::InvalidParams(
                    "Invalid params: arguments must be an object".to_string(),
                ))
            }
        };

        info!(tool = %name, "Calling tool");

        let output = panic::catch_unwind(AssertUnwindSafe(|| tool.execute(arguments)))
            .unwrap_or_else(|payload| {
                Err(McpError::ToolExecutionFailed(format!(
                    "Tool execution failed: {}",
                    panic_message(payload.as_ref())
                )))
            })?;

        to_result(&ToolCallResult::text(output))
    }

    /// Handles the ping request.
    #[allow(clippy::unused_self, clippy::unnecessary_wraps)] // signature fixed by the route table
    fn handle_ping(&self, _params: Option<&Value>) -> Result<Value, McpError> {
        Ok(Value::String("pong".to_string()))
    }
}

fn to_result<T: Serialize>(value: &T) -> Result<Value, McpError> {
    serde_json::to_value(value)
        .map_err(|e| McpError::Internal(format!("Internal error: failed to encode result: {e}")))
}

/// Best-effort text of a panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
