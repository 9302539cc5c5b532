//! paper-indexer-mcp: MCP server that reads local PDF papers for AI assistants
//!
//! The server exposes a small, fixed set of tools over JSON-RPC 2.0 using the
//! Model Context Protocol handshake. The only tool shipped today is
//! `read_paper`, which returns the plain text of a local PDF.
//!
//! Two transports carry the same protocol:
//!
//! - **stdio**: one JSON-RPC message per line on stdin/stdout
//! - **SSE**: an event stream for replies plus a POST endpoint for requests
//!
//! # Modules
//!
//! - [`config`] : Configuration loading and validation
//! - [`error`] : Error types
//! - [`mcp`] : MCP protocol, dispatcher and transports
//! - [`tools`] : Tool capability, registry and the PDF tool

pub mod config;
pub mod error;
pub mod mcp;
pub mod tools;
