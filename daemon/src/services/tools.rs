use sandybox_core::{
    CREATE_WORKSPACE, CallToolResult, CreateWorkspaceArgs, EXECUTE_COMMAND, ExecuteCommandArgs,
    JsonRpcError, LIST_WORKSPACES, READ_FILE, ReadFileArgs, WRITE_FILE, WriteFileArgs,
};
use sandybox_executor::{CommandExecutor, DEFAULT_IMAGE, ExecutionRequest, ExecutorError};
use sandybox_workspace::{CreateOutcome, WorkspaceError, WorkspaceManager};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

const TRAVERSAL_DETECTED: &str = "Error: File path traversal detected.";

/// Dispatches `tools/call` requests to the workspace manager and executor.
///
/// Tool failures come back as `CallToolResult`s with `is_error` set; the
/// `Err` side is reserved for protocol problems (unknown tool, bad arguments).
pub struct ToolService {
    workspaces: Arc<WorkspaceManager>,
    executor: Arc<CommandExecutor>,
}

impl ToolService {
    pub fn new(workspaces: Arc<WorkspaceManager>, executor: Arc<CommandExecutor>) -> Self {
        Self {
            workspaces,
            executor,
        }
    }

    pub async fn call(
        &self,
        name: &str,
        arguments: Option<Value>,
    ) -> Result<CallToolResult, JsonRpcError> {
        match name {
            CREATE_WORKSPACE => Ok(self.create_workspace(decode(arguments)?).await),
            LIST_WORKSPACES => Ok(self.list_workspaces().await),
            WRITE_FILE => Ok(self.write_file(decode(arguments)?).await),
            READ_FILE => Ok(self.read_file(decode(arguments)?).await),
            EXECUTE_COMMAND => Ok(self.execute_command(decode(arguments)?).await),
            _ => Err(JsonRpcError::invalid_params(format!("unknown tool: {}", name))),
        }
    }

    async fn create_workspace(&self, args: CreateWorkspaceArgs) -> CallToolResult {
        tracing::info!("Tool Call: create_workspace(id={})", args.workspace_id);

        match self.workspaces.create(&args.workspace_id).await {
            Ok(CreateOutcome::Created(path)) => CallToolResult::text(format!(
                "Workspace '{}' created at {}",
                args.workspace_id,
                path.display()
            )),
            Ok(CreateOutcome::AlreadyExists(_)) => {
                CallToolResult::text(format!("Workspace '{}' already exists.", args.workspace_id))
            }
            Err(e) => {
                tracing::error!("Error creating workspace: {}", e);
                CallToolResult::error(format!("Error creating workspace: {}", e))
            }
        }
    }

    async fn list_workspaces(&self) -> CallToolResult {
        tracing::info!("Tool Call: list_workspaces()");

        match self.workspaces.list().await {
            Ok(ids) if ids.is_empty() => CallToolResult::text("No workspaces found."),
            Ok(ids) => CallToolResult::text(ids.join("\n")),
            Err(e) => {
                tracing::error!("Error listing workspaces: {}", e);
                CallToolResult::error(format!("Error listing workspaces: {}", e))
            }
        }
    }

    async fn write_file(&self, args: WriteFileArgs) -> CallToolResult {
        tracing::info!(
            "Tool Call: write_file(ws={}, path={}, size={} chars)",
            args.workspace_id,
            args.file_path,
            args.content.chars().count()
        );

        let result = self
            .workspaces
            .write_file(&args.workspace_id, &args.file_path, &args.content)
            .await;

        match result {
            Ok(_) => CallToolResult::text(format!(
                "File written to {} in workspace '{}'",
                args.file_path, args.workspace_id
            )),
            Err(WorkspaceError::WorkspaceNotFound(id)) => CallToolResult::error(format!(
                "Error: Workspace '{}' does not exist. Create it first.",
                id
            )),
            Err(WorkspaceError::PathTraversal(_)) => CallToolResult::error(TRAVERSAL_DETECTED),
            Err(e) => {
                tracing::error!("Error writing file: {}", e);
                CallToolResult::error(format!("Error writing file: {}", e))
            }
        }
    }

    async fn read_file(&self, args: ReadFileArgs) -> CallToolResult {
        tracing::info!(
            "Tool Call: read_file(ws={}, path={})",
            args.workspace_id,
            args.file_path
        );

        match self
            .workspaces
            .read_file(&args.workspace_id, &args.file_path)
            .await
        {
            Ok(content) => CallToolResult::text(content),
            Err(WorkspaceError::FileNotFound { workspace, path }) => CallToolResult::error(
                format!("Error: File '{}' not found in workspace '{}'", path, workspace),
            ),
            Err(WorkspaceError::PathTraversal(_)) => CallToolResult::error(TRAVERSAL_DETECTED),
            Err(e) => {
                tracing::error!("Error reading file: {}", e);
                CallToolResult::error(format!("Error reading file: {}", e))
            }
        }
    }

    async fn execute_command(&self, args: ExecuteCommandArgs) -> CallToolResult {
        let request = execution_request(args);

        match self.executor.execute(request).await {
            Ok(output) => CallToolResult::text(output.to_string()),
            Err(e) => into_tool_error(e),
        }
    }
}

fn decode<T: DeserializeOwned>(arguments: Option<Value>) -> Result<T, JsonRpcError> {
    let arguments = arguments.unwrap_or_else(|| Value::Object(Default::default()));
    serde_json::from_value(arguments)
        .map_err(|e| JsonRpcError::invalid_params(format!("invalid arguments: {}", e)))
}

fn execution_request(args: ExecuteCommandArgs) -> ExecutionRequest {
    ExecutionRequest {
        command: args.command,
        workspace_id: args.workspace_id.filter(|id| !id.is_empty()),
        packages: args.packages.unwrap_or_default(),
        image: args.image.unwrap_or_else(|| DEFAULT_IMAGE.to_string()),
        memory_limit: args.memory_limit,
        cpu_count: args.cpu_count,
        env_vars: args.env_vars.unwrap_or_default(),
        commit_to_image: args.commit_to_image.filter(|image| !image.is_empty()),
    }
}

fn into_tool_error(e: ExecutorError) -> CallToolResult {
    match e {
        ExecutorError::Workspace(WorkspaceError::WorkspaceNotFound(id)) => {
            CallToolResult::error(format!("Error: Workspace '{}' does not exist.", id))
        }
        e => CallToolResult::error(format!("Error executing command: {}", e)),
    }
}
