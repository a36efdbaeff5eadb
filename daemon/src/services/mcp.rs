use super::info;
use super::tools::ToolService;
use sandybox_core::{
    CallToolParams, InitializeParams, JSONRPC_VERSION, JsonRpcError, JsonRpcRequest,
    JsonRpcResponse, ToolsListResult, tool_catalog,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

/// MCP server speaking newline-delimited JSON-RPC 2.0.
pub struct McpServer {
    tools: ToolService,
}

impl McpServer {
    pub fn new(tools: ToolService) -> Self {
        Self { tools }
    }

    /// Reads requests until `reader` is exhausted. Every request runs on its
    /// own task; a single writer task owns `writer` so response lines never
    /// interleave. Returns once all in-flight requests have been answered.
    pub async fn serve<R, W>(self: Arc<Self>, reader: R, writer: W) -> std::io::Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<JsonRpcResponse>();

        let writer_task = tokio::spawn(async move {
            let mut writer = writer;
            while let Some(response) = rx.recv().await {
                let mut line = match serde_json::to_string(&response) {
                    Ok(line) => line,
                    Err(e) => {
                        tracing::error!("Failed to serialize response: {}", e);
                        continue;
                    }
                };
                line.push('\n');
                writer.write_all(line.as_bytes()).await?;
                writer.flush().await?;
            }
            Ok::<_, std::io::Error>(())
        });

        let mut reader = BufReader::new(reader);
        let mut frame = Vec::new();
        loop {
            frame.clear();
            if reader.read_until(b'\n', &mut frame).await? == 0 {
                break;
            }

            let line = match String::from_utf8(std::mem::take(&mut frame)) {
                Ok(line) => line,
                Err(e) => {
                    tracing::warn!("Message is not valid UTF-8: {}", e);
                    let response = JsonRpcResponse::failure(
                        Value::Null,
                        JsonRpcError::parse_error(format!("parse error: {}", e)),
                    );
                    if tx.send(response).is_err() {
                        tracing::warn!("Dropping response, writer has gone away");
                    }
                    continue;
                }
            };
            if line.trim().is_empty() {
                continue;
            }

            let server = self.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                if let Some(response) = server.handle_line(&line).await
                    && tx.send(response).is_err()
                {
                    tracing::warn!("Dropping response, writer has gone away");
                }
            });
        }

        tracing::info!("Input closed, waiting for in-flight requests");
        drop(tx);

        match writer_task.await {
            Ok(result) => result,
            Err(e) => Err(std::io::Error::other(e)),
        }
    }

    /// Handles one line of input. Notifications produce no response.
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Unparseable message: {}", e);
                return Some(JsonRpcResponse::failure(
                    Value::Null,
                    JsonRpcError::parse_error(format!("parse error: {}", e)),
                ));
            }
        };

        let id = value.get("id").cloned().unwrap_or(Value::Null);
        let request: JsonRpcRequest = match serde_json::from_value(value) {
            Ok(request) => request,
            Err(e) => {
                return Some(JsonRpcResponse::failure(
                    id,
                    JsonRpcError::invalid_request(format!("invalid request: {}", e)),
                ));
            }
        };

        if request.jsonrpc != JSONRPC_VERSION {
            return Some(JsonRpcResponse::failure(
                id,
                JsonRpcError::invalid_request(format!(
                    "unsupported jsonrpc version: {}",
                    request.jsonrpc
                )),
            ));
        }

        if request.is_notification() {
            tracing::debug!("Notification: {}", request.method);
            return None;
        }

        tracing::debug!("Request {}: {}", id, request.method);
        let response = match self.dispatch(&request.method, request.params).await {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(e) => {
                tracing::warn!("{} failed: {}", request.method, e);
                JsonRpcResponse::failure(id, e)
            }
        };
        Some(response)
    }

    async fn dispatch(&self, method: &str, params: Option<Value>) -> Result<Value, JsonRpcError> {
        match method {
            "initialize" => {
                let params: InitializeParams = match params {
                    Some(params) => decode(params)?,
                    None => InitializeParams::default(),
                };
                encode(info::initialize(params))
            }
            "ping" => Ok(json!({})),
            "tools/list" => encode(ToolsListResult {
                tools: tool_catalog(),
            }),
            "tools/call" => {
                let params: CallToolParams = match params {
                    Some(params) => decode(params)?,
                    None => return Err(JsonRpcError::invalid_params("missing params")),
                };
                let result = self.tools.call(&params.name, params.arguments).await?;
                encode(result)
            }
            _ => Err(JsonRpcError::method_not_found(method)),
        }
    }
}

fn decode<T: DeserializeOwned>(params: Value) -> Result<T, JsonRpcError> {
    serde_json::from_value(params)
        .map_err(|e| JsonRpcError::invalid_params(format!("invalid params: {}", e)))
}

fn encode<T: Serialize>(result: T) -> Result<Value, JsonRpcError> {
    serde_json::to_value(result).map_err(|e| JsonRpcError::internal(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sandybox_core::{INVALID_PARAMS, INVALID_REQUEST, METHOD_NOT_FOUND, PARSE_ERROR};
    use sandybox_engine::testing::FakeEngine;
    use sandybox_executor::CommandExecutor;
    use sandybox_workspace::WorkspaceManager;
    use tempfile::TempDir;
    use tokio::io::AsyncReadExt;

    async fn create_test_server(engine: FakeEngine) -> (Arc<McpServer>, TempDir) {
        let dir = TempDir::new().unwrap();
        let workspaces = Arc::new(WorkspaceManager::new(dir.path()).await.unwrap());
        let executor = Arc::new(CommandExecutor::new(Arc::new(engine), workspaces.clone()));
        let server = McpServer::new(ToolService::new(workspaces, executor));
        (Arc::new(server), dir)
    }

    async fn run_session(server: Arc<McpServer>, input: &[u8]) -> Vec<Value> {
        let (mut client, server_half) = tokio::io::duplex(1 << 20);
        let reader = std::io::Cursor::new(input.to_vec());
        server.serve(reader, server_half).await.unwrap();

        let mut output = String::new();
        client.read_to_string(&mut output).await.unwrap();
        output
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    fn response_for(responses: &[Value], id: i64) -> &Value {
        responses
            .iter()
            .find(|r| r["id"] == json!(id))
            .unwrap_or_else(|| panic!("no response with id {}", id))
    }

    async fn handle(server: &McpServer, message: Value) -> Value {
        let response = server.handle_line(&message.to_string()).await.unwrap();
        serde_json::to_value(response).unwrap()
    }

    #[tokio::test]
    async fn test_initialize() {
        let (server, _dir) = create_test_server(FakeEngine::new()).await;

        let response = handle(
            &server,
            json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "initialize",
                "params": {
                    "protocolVersion": "2024-11-05",
                    "capabilities": {},
                    "clientInfo": {"name": "test-client", "version": "1.0"}
                }
            }),
        )
        .await;

        assert_eq!(response["result"]["protocolVersion"], "2024-11-05");
        assert_eq!(response["result"]["serverInfo"]["name"], "Sandybox");
        assert!(response["result"]["capabilities"]["tools"].is_object());
    }

    #[tokio::test]
    async fn test_tools_list() {
        let (server, _dir) = create_test_server(FakeEngine::new()).await;

        let response = handle(
            &server,
            json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}),
        )
        .await;

        let names: Vec<&str> = response["result"]["tools"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap())
            .collect();
        assert_eq!(
            names,
            vec![
                "create_workspace",
                "list_workspaces",
                "write_file",
                "read_file",
                "execute_command"
            ]
        );
        assert!(response["result"]["tools"][0]["inputSchema"].is_object());
    }

    #[tokio::test]
    async fn test_tools_call_result_shape() {
        let (server, _dir) = create_test_server(FakeEngine::new()).await;

        let response = handle(
            &server,
            json!({
                "jsonrpc": "2.0",
                "id": 3,
                "method": "tools/call",
                "params": {"name": "list_workspaces", "arguments": {}}
            }),
        )
        .await;

        assert_eq!(
            response["result"],
            json!({
                "content": [{"type": "text", "text": "No workspaces found."}],
                "isError": false
            })
        );
    }

    #[tokio::test]
    async fn test_protocol_errors() {
        let (server, _dir) = create_test_server(FakeEngine::new()).await;

        let response = server.handle_line("{not json").await.unwrap();
        assert_eq!(response.error.unwrap().code, PARSE_ERROR);
        assert_eq!(response.id, Value::Null);

        let response = handle(&server, json!({"jsonrpc": "2.0", "id": 4})).await;
        assert_eq!(response["error"]["code"], json!(INVALID_REQUEST));
        assert_eq!(response["id"], json!(4));

        let response = handle(
            &server,
            json!({"jsonrpc": "1.0", "id": 5, "method": "ping"}),
        )
        .await;
        assert_eq!(response["error"]["code"], json!(INVALID_REQUEST));

        let response = handle(
            &server,
            json!({"jsonrpc": "2.0", "id": 6, "method": "resources/list"}),
        )
        .await;
        assert_eq!(response["error"]["code"], json!(METHOD_NOT_FOUND));

        let response = handle(
            &server,
            json!({
                "jsonrpc": "2.0",
                "id": 7,
                "method": "tools/call",
                "params": {"name": "format_disk", "arguments": {}}
            }),
        )
        .await;
        assert_eq!(response["error"]["code"], json!(INVALID_PARAMS));

        let response = handle(
            &server,
            json!({"jsonrpc": "2.0", "id": 8, "method": "tools/call"}),
        )
        .await;
        assert_eq!(response["error"]["code"], json!(INVALID_PARAMS));
    }

    #[tokio::test]
    async fn test_notifications_are_not_answered() {
        let (server, _dir) = create_test_server(FakeEngine::new()).await;

        let message = json!({"jsonrpc": "2.0", "method": "notifications/initialized"});
        assert!(server.handle_line(&message.to_string()).await.is_none());
    }

    #[tokio::test]
    async fn test_serve_session() {
        let engine = FakeEngine::new().with_logs(["Hello\n"]);
        let (server, _dir) = create_test_server(engine).await;

        let input = [
            json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}}),
            json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
            json!({"jsonrpc": "2.0", "id": 2, "method": "ping"}),
            json!({
                "jsonrpc": "2.0",
                "id": 3,
                "method": "tools/call",
                "params": {"name": "execute_command", "arguments": {"command": "echo Hello"}}
            }),
            json!({
                "jsonrpc": "2.0",
                "id": 4,
                "method": "tools/call",
                "params": {"name": "create_workspace", "arguments": {"workspace_id": "demo"}}
            }),
        ]
        .iter()
        .map(|m| m.to_string())
        .collect::<Vec<_>>()
        .join("\n")
            + "\n\n";

        let responses = run_session(server, input.as_bytes()).await;
        assert_eq!(responses.len(), 4);

        assert_eq!(response_for(&responses, 2)["result"], json!({}));
        assert_eq!(
            response_for(&responses, 3)["result"]["content"][0]["text"],
            "Hello\n"
        );
        assert!(
            response_for(&responses, 4)["result"]["content"][0]["text"]
                .as_str()
                .unwrap()
                .starts_with("Workspace 'demo' created at ")
        );
    }

    #[tokio::test]
    async fn test_serve_survives_invalid_utf8() {
        let (server, _dir) = create_test_server(FakeEngine::new()).await;

        let mut input = Vec::new();
        input.extend_from_slice(b"{\"jsonrpc\": \"2.0\", \"id\": 1, \"method\": \"ping\"}\n");
        input.extend_from_slice(b"{\"jsonrpc\": \"2.0\", \"id\": 2, \"method\": \"\xff\"}\n");
        input.extend_from_slice(b"{\"jsonrpc\": \"2.0\", \"id\": 3, \"method\": \"ping\"}\n");

        let responses = run_session(server, &input).await;
        assert_eq!(responses.len(), 3);

        assert_eq!(response_for(&responses, 1)["result"], json!({}));
        assert_eq!(response_for(&responses, 3)["result"], json!({}));

        let parse_error = responses
            .iter()
            .find(|r| r["id"].is_null())
            .expect("parse error response");
        assert_eq!(parse_error["error"]["code"], json!(PARSE_ERROR));
    }

    #[tokio::test]
    async fn test_null_id_is_answered() {
        let (server, _dir) = create_test_server(FakeEngine::new()).await;

        let response = handle(
            &server,
            json!({"jsonrpc": "2.0", "id": null, "method": "ping"}),
        )
        .await;
        assert_eq!(response["id"], Value::Null);
        assert_eq!(response["result"], json!({}));
    }
}
