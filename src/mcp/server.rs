//! Line-pipe MCP server loop.
//!
//! Reads one message per line, hands it to the [`Dispatcher`] and writes the
//! reply (if any) before reading the next line. Requests are processed
//! strictly in order; a slow tool blocks the loop for its whole duration.
//!
//! A malformed line never ends the loop: it is answered with a JSON-RPC
//! error and logged to stderr through `tracing`.

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};

use crate::mcp::dispatcher::Dispatcher;
use crate::mcp::protocol::JsonRpcError;
use crate::mcp::transport::{LineTransport, StdioTransport};

/// The MCP server for the line-pipe transport.
pub struct McpServer<R, W> {
    /// Shared request dispatcher.
    dispatcher: Arc<Dispatcher>,
    /// The transport layer.
    transport: LineTransport<R, W>,
}

impl McpServer<tokio::io::Stdin, tokio::io::Stdout> {
    /// Creates a server speaking over stdin/stdout.
    #[must_use]
    pub fn stdio(dispatcher: Arc<Dispatcher>) -> Self {
        Self::new(dispatcher, StdioTransport::stdio())
    }
}

impl<R, W> McpServer<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Creates a server over an arbitrary line transport.
    pub const fn new(dispatcher: Arc<Dispatcher>, transport: LineTransport<R, W>) -> Self {
        Self {
            dispatcher,
            transport,
        }
    }

    /// Runs the MCP server main loop with graceful shutdown handling.
    ///
    /// # Errors
    ///
    /// Returns an error if transport I/O fails.
    pub async fn run(&mut self) -> std::io::Result<()> {
        self.run_with_shutdown().await
    }

    /// Processes messages until the input reaches EOF.
    ///
    /// # Errors
    ///
    /// Returns an error if transport I/O fails.
    pub async fn serve(&mut self) -> std::io::Result<()> {
        loop {
            let line_result = self.transport.read_line().await;
            if self.handle_transport_result(line_result).await? {
                return Ok(());
            }
        }
    }

    /// Runs the main loop and handles shutdown.
    #[cfg(unix)]
    async fn run_with_shutdown(&mut self) -> std::io::Result<()> {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt()).map_err(std::io::Error::other)?;
        let mut sigterm = signal(SignalKind::terminate()).map_err(std::io::Error::other)?;

        loop {
            tokio::select! {
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT, initiating graceful shutdown");
                    return Ok(());
                }

                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM, initiating graceful shutdown");
                    return Ok(());
                }

                line_result = self.transport.read_line() => {
                    if self.handle_transport_result(line_result).await? {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Runs the main loop and handles shutdown.
    #[cfg(windows)]
    async fn run_with_shutdown(&mut self) -> std::io::Result<()> {
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                _ = &mut ctrl_c => {
                    tracing::info!("Received Ctrl+C, initiating graceful shutdown");
                    return Ok(());
                }

                line_result = self.transport.read_line() => {
                    if self.handle_transport_result(line_result).await? {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Handles the result from transport read.
    ///
    /// Returns `true` if the server should shut down.
    async fn handle_transport_result(
        &mut self,
        line_result: std::io::Result<Option<String>>,
    ) -> std::io::Result<bool> {
        let line = match line_result {
            Ok(Some(line)) => line,
            Ok(None) => {
                tracing::info!("Input closed, shutting down");
                return Ok(true);
            }
            Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                // Not UTF-8: the bytes are consumed, framing is intact
                tracing::warn!(error = %e, "Skipping undecodable input line");
                let reply = JsonRpcError::parse_error(e).into();
                self.transport.write_message(&reply).await?;
                return Ok(false);
            }
            Err(e) => return Err(e),
        };

        if line.trim().is_empty() {
            return Ok(false);
        }

        self.handle_line(&line).await?;
        Ok(false)
    }

    /// Handles a single line of input.
    async fn handle_line(&mut self, line: &str) -> std::io::Result<()> {
        if let Some(reply) = self.dispatcher.handle_message(line) {
            self.transport.write_message(&reply).await?;
        }
        Ok(())
    }

    /// Consumes the server and returns the transport's writer.
    pub fn into_writer(self) -> W {
        self.transport.into_writer()
    }
}
