//! Model Context Protocol (MCP) server implementation.
//!
//! This module implements the JSON-RPC 2.0 side of MCP: envelope parsing,
//! method dispatch and the two transports that carry the bytes.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         MCP Server                          │
//! │                                                             │
//! │   ┌─────────────┐    ┌─────────────┐    ┌─────────────┐    │
//! │   │  Transport  │───▶│ Dispatcher  │───▶│  Registry   │    │
//! │   │ (stdio/SSE) │    │  (routing)  │    │   (tools)   │    │
//! │   └─────────────┘    └─────────────┘    └─────────────┘    │
//! │          │                  │                  │            │
//! │          ▼                  ▼                  ▼            │
//! │   ┌─────────────────────────────────────────────────┐      │
//! │   │              JSON-RPC Messages                  │      │
//! │   └─────────────────────────────────────────────────┘      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Protocol Version
//!
//! This implementation targets MCP protocol version 2024-11-05.

pub mod dispatcher;
pub mod protocol;
pub mod server;
pub mod sse;
pub mod transport;

pub use dispatcher::Dispatcher;
pub use protocol::{JsonRpcError, JsonRpcResponse, OutgoingMessage, MCP_PROTOCOL_VERSION};
pub use server::McpServer;
pub use sse::{SseHub, SseServer};
pub use transport::{LineTransport, StdioTransport};
