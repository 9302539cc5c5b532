//! Integration tests for MCP protocol handling.
//!
//! These tests drive the public dispatcher and line-pipe server with raw
//! JSON text, the way a client would.

use std::sync::Arc;

use paper_indexer_mcp::config::PaperConfig;
use paper_indexer_mcp::mcp::protocol::{parse_message, RequestId};
use paper_indexer_mcp::mcp::{Dispatcher, LineTransport, McpServer, MCP_PROTOCOL_VERSION};
use paper_indexer_mcp::tools::{ReadPaperTool, Tool, ToolRegistry};
use serde_json::{json, Value};

fn dispatcher() -> Dispatcher {
    let registry = ToolRegistry::standard(&PaperConfig::default()).unwrap();
    Dispatcher::new(Arc::new(registry))
}

fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"))
}

/// Sends one raw message and returns the reply as JSON, if any.
fn send(dispatcher: &Dispatcher, raw: &str) -> Option<Value> {
    dispatcher
        .handle_message(raw)
        .map(|reply| serde_json::from_str(&reply.to_json().unwrap()).unwrap())
}

// =============================================================================
// Protocol Parsing Tests
// =============================================================================

#[test]
fn test_parse_initialize_request() {
    let json = r#"{
        "jsonrpc": "2.0",
        "id": 1,
        "method": "initialize",
        "params": {
            "protocolVersion": "2024-11-05",
            "capabilities": {},
            "clientInfo": {
                "name": "test-client",
                "version": "1.0.0"
            }
        }
    }"#;

    let req = parse_message(json).unwrap();
    assert_eq!(req.method, "initialize");
    assert_eq!(req.id, Some(RequestId::from(1)));
    assert!(!req.is_notification());
}

#[test]
fn test_parse_notification() {
    let json = r#"{"jsonrpc": "2.0", "method": "notifications/initialized"}"#;

    let req = parse_message(json).unwrap();
    assert_eq!(req.method, "notifications/initialized");
    assert!(req.is_notification());
}

#[test]
fn test_parse_invalid_json() {
    let err = parse_message("not valid json").unwrap_err();
    assert_eq!(err.error.code, -32700);
    assert!(err.id.is_none());
}

// =============================================================================
// Dispatch Scenarios
// =============================================================================

#[test]
fn test_ping_exact_reply() {
    let reply = dispatcher()
        .handle_message(r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#)
        .unwrap();

    assert_eq!(
        reply.to_json().unwrap(),
        r#"{"jsonrpc":"2.0","id":1,"result":"pong"}"#
    );
}

#[test]
fn test_read_missing_paper() {
    let reply = send(
        &dispatcher(),
        r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"read_paper","arguments":{"filePath":"/no/such.pdf"}}}"#,
    )
    .unwrap();

    assert_eq!(reply["id"], 2);
    assert_eq!(reply["error"]["code"], -32001);
    assert!(reply.get("result").is_none());
}

#[test]
fn test_read_paper_returns_text_content() {
    let path = fixture("paper.pdf");
    let expected = ReadPaperTool::new(PaperConfig::default())
        .execute(&json!({"filePath": path}))
        .unwrap();
    assert!(expected.contains("See /Encrypt dictionary in section 7.6"));

    let request = json!({
        "jsonrpc": "2.0",
        "id": 7,
        "method": "tools/call",
        "params": {"name": "read_paper", "arguments": {"filePath": path}}
    });
    let reply = send(&dispatcher(), &request.to_string()).unwrap();

    assert_eq!(reply["id"], 7);
    assert_eq!(
        reply["result"],
        json!({"content": [{"type": "text", "text": expected}]})
    );
}

#[test]
fn test_read_paper_summary_only() {
    let config = PaperConfig {
        summary_chars: 8,
        ..PaperConfig::default()
    };
    let dispatcher = Dispatcher::new(Arc::new(ToolRegistry::standard(&config).unwrap()));
    let path = fixture("paper.pdf");

    let call = |summary_only: bool| {
        let request = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "tools/call",
            "params": {
                "name": "read_paper",
                "arguments": {"filePath": path, "summaryOnly": summary_only}
            }
        });
        let reply = send(&dispatcher, &request.to_string()).unwrap();
        reply["result"]["content"][0]["text"]
            .as_str()
            .unwrap()
            .to_string()
    };

    let full = call(false);
    let summary = call(true);
    assert_eq!(summary.chars().count(), 8);
    assert!(full.chars().count() > 8);
    assert!(full.starts_with(&summary));
}

#[test]
fn test_read_encrypted_paper_is_denied() {
    let request = json!({
        "jsonrpc": "2.0",
        "id": 8,
        "method": "tools/call",
        "params": {"name": "read_paper", "arguments": {"filePath": fixture("encrypted.pdf")}}
    });
    let reply = send(&dispatcher(), &request.to_string()).unwrap();

    assert_eq!(reply["error"]["code"], -32002);
}

#[test]
fn test_bad_json_gets_null_id() {
    let reply = send(&dispatcher(), "{bad").unwrap();

    assert_eq!(reply["jsonrpc"], "2.0");
    assert_eq!(reply["id"], Value::Null);
    assert_eq!(reply["error"]["code"], -32700);
}

#[test]
fn test_session_round_trip() {
    let dispatcher = dispatcher();

    let init = send(
        &dispatcher,
        r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2024-11-05","capabilities":{},"clientInfo":{"name":"it","version":"0.0.1"}}}"#,
    )
    .unwrap();
    assert_eq!(init["result"]["protocolVersion"], MCP_PROTOCOL_VERSION);
    assert_eq!(init["result"]["serverInfo"]["name"], "paper-indexer-mcp");
    assert!(init["result"]["capabilities"]["tools"].is_object());

    // Never answered, even with an id attached
    assert!(send(
        &dispatcher,
        r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#
    )
    .is_none());
    assert!(send(
        &dispatcher,
        r#"{"jsonrpc":"2.0","id":9,"method":"notifications/initialized"}"#
    )
    .is_none());

    let list = send(&dispatcher, r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#).unwrap();
    let tools = list["result"]["tools"].as_array().unwrap();
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0]["name"], "read_paper");
    assert!(!tools[0]["description"].as_str().unwrap().is_empty());

    let schema = &tools[0]["inputSchema"];
    assert_eq!(schema["type"], "object");
    assert_eq!(schema["properties"]["filePath"]["type"], "string");
    assert_eq!(schema["properties"]["summaryOnly"]["type"], "boolean");
    assert_eq!(schema["required"], json!(["filePath"]));

    let call = send(
        &dispatcher,
        r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"read_paper","arguments":{"filePath":""}}}"#,
    )
    .unwrap();
    assert_eq!(call["id"], 3);
    assert_eq!(call["error"]["code"], -32602);
}

#[test]
fn test_id_type_is_preserved() {
    let dispatcher = dispatcher();

    let numeric = send(&dispatcher, r#"{"jsonrpc":"2.0","id":42,"method":"ping"}"#).unwrap();
    assert_eq!(numeric["id"], json!(42));

    let text = send(&dispatcher, r#"{"jsonrpc":"2.0","id":"42","method":"ping"}"#).unwrap();
    assert_eq!(text["id"], json!("42"));

    let fraction = send(&dispatcher, r#"{"jsonrpc":"2.0","id":1.5,"method":"ping"}"#).unwrap();
    assert_eq!(fraction["id"], json!(1.5));
}

#[test]
fn test_error_codes() {
    let dispatcher = dispatcher();

    let missing_method = send(&dispatcher, r#"{"jsonrpc":"2.0","id":1}"#).unwrap();
    assert_eq!(missing_method["error"]["code"], -32600);
    assert_eq!(missing_method["id"], 1);

    let unknown = send(&dispatcher, r#"{"jsonrpc":"2.0","id":2,"method":"resources/list"}"#).unwrap();
    assert_eq!(unknown["error"]["code"], -32601);

    let no_tool = send(
        &dispatcher,
        r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"write_paper","arguments":{}}}"#,
    )
    .unwrap();
    assert_eq!(no_tool["error"]["code"], -32000);

    let no_arguments = send(
        &dispatcher,
        r#"{"jsonrpc":"2.0","id":5,"method":"tools/call","params":{"name":"read_paper"}}"#,
    )
    .unwrap();
    assert_eq!(no_arguments["error"]["code"], -32602);

    let no_name = send(
        &dispatcher,
        r#"{"jsonrpc":"2.0","id":4,"method":"tools/call","params":{"arguments":{}}}"#,
    )
    .unwrap();
    assert_eq!(no_name["error"]["code"], -32602);
}

#[test]
fn test_requests_without_id_are_silent() {
    let dispatcher = dispatcher();

    assert!(send(&dispatcher, r#"{"jsonrpc":"2.0","method":"ping"}"#).is_none());
    assert!(send(&dispatcher, r#"{"jsonrpc":"2.0","id":null,"method":"ping"}"#).is_none());
    assert!(send(&dispatcher, r#"{"jsonrpc":"2.0","method":"no/such/method"}"#).is_none());
}

// =============================================================================
// Line-pipe Server Tests
// =============================================================================

#[tokio::test]
async fn test_line_pipe_session() {
    let input = concat!(
        r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
        "\n",
        r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
        "\n",
        "{bad\n",
        r#"{"jsonrpc":"2.0","id":"two","method":"tools/list"}"#,
        "\r\n",
        r#"{"jsonrpc":"2.0","id":3,"method":"ping"}"#,
        "\n",
    );

    let transport = LineTransport::new(input.as_bytes(), Vec::new());
    let mut server = McpServer::new(Arc::new(dispatcher()), transport);
    server.serve().await.unwrap();

    let output = String::from_utf8(server.into_writer()).unwrap();
    let replies: Vec<Value> = output
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    // One reply per request, in order; the notification is silent
    assert_eq!(replies.len(), 4);
    assert_eq!(replies[0]["id"], 1);
    assert!(replies[0]["result"]["protocolVersion"].is_string());
    assert_eq!(replies[1]["id"], Value::Null);
    assert_eq!(replies[1]["error"]["code"], -32700);
    assert_eq!(replies[2]["id"], "two");
    assert_eq!(replies[2]["result"]["tools"][0]["name"], "read_paper");
    assert_eq!(replies[3], json!({"jsonrpc": "2.0", "id": 3, "result": "pong"}));
}
