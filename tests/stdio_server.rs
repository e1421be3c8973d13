//! MCP stdio server integration tests
//!
//! Feeds a scripted client session through `protocol::serve` and checks the
//! responses written back.

use std::sync::Arc;

use serde_json::Value;
use stl_viewer_mcp::gateway::{DetachedLauncher, InvocationGateway, LaunchTarget};
use stl_viewer_mcp::protocol::{self, ErrorCode, McpHandler};
use stl_viewer_mcp::tools::CapabilityRegistry;
use tempfile::TempDir;
use tokio::io::AsyncReadExt;

async fn run_session(lines: &[Value], project_root: &std::path::Path) -> Vec<Value> {
    let mut input = Vec::new();
    for line in lines {
        input.extend_from_slice(line.to_string().as_bytes());
        input.push(b'\n');
    }
    run_raw(&input, project_root).await
}

async fn run_raw(input: &[u8], project_root: &std::path::Path) -> Vec<Value> {
    let launcher = DetachedLauncher::new(LaunchTarget::for_project_root(project_root));
    let gateway = InvocationGateway::new(Arc::new(CapabilityRegistry::standard()), Arc::new(launcher));
    let handler = Arc::new(McpHandler::new(Arc::new(gateway)));

    let (mut client, server_out) = tokio::io::duplex(256 * 1024);
    protocol::serve(input, server_out, handler).await.unwrap();

    let mut output = String::new();
    client.read_to_string(&mut output).await.unwrap();
    output.lines().map(|l| serde_json::from_str(l).unwrap()).collect()
}

fn by_id(responses: &[Value], id: i64) -> &Value {
    responses
        .iter()
        .find(|r| r["id"] == id)
        .unwrap_or_else(|| panic!("No response with id {}", id))
}

#[tokio::test]
async fn test_full_session() {
    let dir = TempDir::new().unwrap();
    let model = dir.path().join("cube.stl");
    std::fs::write(&model, "solid cube\nendsolid cube\n").unwrap();

    let session = [
        serde_json::json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {
            "protocolVersion": "2024-11-05",
            "capabilities": {},
            "clientInfo": {"name": "test-client", "version": "0.0.1"}
        }}),
        serde_json::json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
        serde_json::json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}),
        serde_json::json!({"jsonrpc": "2.0", "id": 3, "method": "tools/call", "params": {
            "name": "display_3d_model", "arguments": {"file_path": model}
        }}),
        serde_json::json!({"jsonrpc": "2.0", "id": 4, "method": "tools/call", "params": {
            "name": "display_3d_model", "arguments": {"file_path": "/definitely/not/here.stl"}
        }}),
        serde_json::json!({"jsonrpc": "2.0", "id": 5, "method": "tools/call", "params": {
            "name": "slice_model", "arguments": {"file_path": model}
        }}),
        serde_json::json!({"jsonrpc": "2.0", "id": 6, "method": "tools/call", "params": {
            "name": "display_3d_model", "arguments": {"file_path": ""}
        }}),
        serde_json::json!({"jsonrpc": "2.0", "id": 7, "method": "prompts/list"}),
    ];

    let responses = run_session(&session, dir.path()).await;

    // One response per request, none for the notification
    assert_eq!(responses.len(), 7);

    let init = by_id(&responses, 1);
    assert_eq!(init["result"]["serverInfo"]["name"], "stl-viewer-mcp");
    assert_eq!(init["result"]["protocolVersion"], "2024-11-05");

    let tools = by_id(&responses, 2)["result"]["tools"].as_array().unwrap();
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0]["name"], "display_3d_model");

    // Viewer is not built in the temp project root
    let missing_viewer = &by_id(&responses, 3)["result"];
    assert_eq!(missing_viewer["isError"], true);
    assert!(
        missing_viewer["content"][0]["text"]
            .as_str()
            .unwrap()
            .contains("Please build the project first.")
    );

    let missing_file = &by_id(&responses, 4)["result"];
    assert_eq!(missing_file["isError"], true);
    assert!(
        missing_file["content"][0]["text"]
            .as_str()
            .unwrap()
            .contains("/definitely/not/here.stl")
    );

    assert_eq!(by_id(&responses, 5)["error"]["code"], ErrorCode::INVALID_PARAMS);
    assert_eq!(by_id(&responses, 6)["error"]["code"], ErrorCode::INVALID_PARAMS);
    assert_eq!(by_id(&responses, 7)["error"]["code"], ErrorCode::METHOD_NOT_FOUND);
}

#[tokio::test]
async fn test_tools_list_is_stable_across_calls() {
    let dir = TempDir::new().unwrap();
    let session = [
        serde_json::json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"}),
        serde_json::json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}),
    ];

    let responses = run_session(&session, dir.path()).await;
    assert_eq!(by_id(&responses, 1)["result"], by_id(&responses, 2)["result"]);
    let schema = &by_id(&responses, 1)["result"]["tools"][0]["inputSchema"];
    assert_eq!(schema["required"], serde_json::json!(["file_path"]));
    assert_eq!(schema["properties"]["file_path"]["type"], "string");
}

#[tokio::test]
async fn test_invalid_utf8_line_gets_parse_error() {
    let dir = TempDir::new().unwrap();
    let mut input = Vec::new();
    input.extend_from_slice(b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n");
    input.extend_from_slice(b"\xff\xfe garbage\n");
    input.extend_from_slice(b"{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"tools/list\"}\n");

    let responses = run_raw(&input, dir.path()).await;

    assert_eq!(responses.len(), 3);
    assert!(by_id(&responses, 1)["result"].is_object());
    assert_eq!(by_id(&responses, 2)["result"]["tools"][0]["name"], "display_3d_model");
    let parse_error = responses.iter().find(|r| r["id"].is_null()).unwrap();
    assert_eq!(parse_error["error"]["code"], ErrorCode::PARSE_ERROR);
}
