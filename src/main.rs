//! paper-indexer-mcp: MCP server that reads local PDF papers for AI assistants
//!
//! Speaks JSON-RPC 2.0 over stdio (default) or server-sent events.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

use paper_indexer_mcp::config::{self, TransportMode};
use paper_indexer_mcp::mcp::{Dispatcher, McpServer, SseServer};
use paper_indexer_mcp::tools::ToolRegistry;

/// MCP server that reads local PDF papers for AI assistants.
///
/// Exposes a `read_paper` tool returning the plain text of a PDF file.
#[derive(Parser, Debug)]
#[command(name = "paper-indexer-mcp")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(value_name = "CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Transport to serve (overrides the configuration file)
    #[arg(short, long, value_enum)]
    transport: Option<TransportMode>,

    /// Listen address for the SSE transport (overrides the configuration file)
    #[arg(short, long, value_name = "ADDR")]
    bind: Option<String>,

    /// Increase logging verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease logging verbosity (only show errors)
    #[arg(short, long)]
    quiet: bool,
}

/// Determines the log level from CLI arguments.
#[allow(clippy::match_same_arms)] // Explicit "warn" arm for clarity
fn get_log_level(verbose: u8, quiet: bool, config_level: &str) -> Level {
    if quiet {
        return Level::ERROR;
    }

    match verbose {
        0 => match config_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::WARN, // Default to warn for unknown levels
        },
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Initialises the tracing subscriber for logging.
///
/// Logs go to stderr: stdout is reserved for protocol messages.
fn init_tracing(level: Level) {
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Entry point for the paper-indexer-mcp server.
fn main() -> ExitCode {
    let args = Args::parse();

    // Load configuration
    let config_path = args.config.as_deref();
    let mut cfg = match config::load_config(config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Some(mode) = args.transport {
        cfg.transport.mode = mode;
    }
    if let Some(bind) = args.bind {
        cfg.transport.bind = bind;
    }

    // Initialise logging
    let log_level = get_log_level(args.verbose, args.quiet, &cfg.logging.level);
    init_tracing(log_level);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        transport = ?cfg.transport.mode,
        "Starting paper-indexer-mcp server"
    );

    // Build the tool registry once; duplicates are fatal
    let registry = match ToolRegistry::standard(&cfg.papers) {
        Ok(registry) => registry,
        Err(e) => {
            error!(error = %e, "Failed to register tools");
            return ExitCode::FAILURE;
        }
    };

    info!(
        tools = ?registry.names().collect::<Vec<_>>(),
        allowed_paths = ?cfg.papers.allowed_paths,
        "Tools loaded"
    );

    let dispatcher = Arc::new(Dispatcher::new(Arc::new(registry)));

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "Failed to create Tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    let result = match cfg.transport.mode {
        TransportMode::Stdio => {
            info!("MCP server ready, waiting for client connection...");
            let mut server = McpServer::stdio(dispatcher);
            runtime.block_on(server.run())
        }
        TransportMode::Sse => {
            let server = match SseServer::new(dispatcher, &cfg.transport) {
                Ok(server) => server,
                Err(e) => {
                    error!(error = %e, "Invalid SSE transport settings");
                    return ExitCode::FAILURE;
                }
            };
            runtime.block_on(server.run())
        }
    };

    match result {
        Ok(()) => {
            info!("Server shut down gracefully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Server error");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }

    #[test]
    fn transport_flag_parses() {
        let args = Args::parse_from(["paper-indexer-mcp", "--transport", "sse", "-b", "0.0.0.0:1"]);
        assert_eq!(args.transport, Some(TransportMode::Sse));
        assert_eq!(args.bind.as_deref(), Some("0.0.0.0:1"));
    }

    #[test]
    fn log_level_selection() {
        assert_eq!(get_log_level(0, true, "trace"), Level::ERROR);
        assert_eq!(get_log_level(0, false, "debug"), Level::DEBUG);
        assert_eq!(get_log_level(0, false, "bogus"), Level::WARN);
        assert_eq!(get_log_level(2, false, "error"), Level::DEBUG);
        assert_eq!(get_log_level(5, false, "error"), Level::TRACE);
    }
}
