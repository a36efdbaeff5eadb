use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::HashMap;

pub const CREATE_WORKSPACE: &str = "create_workspace";
pub const LIST_WORKSPACES: &str = "list_workspaces";
pub const WRITE_FILE: &str = "write_file";
pub const READ_FILE: &str = "read_file";
pub const EXECUTE_COMMAND: &str = "execute_command";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsListResult {
    pub tools: Vec<ToolDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallToolParams {
    pub name: String,
    #[serde(default)]
    pub arguments: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Content {
    Text { text: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallToolResult {
    pub content: Vec<Content>,
    #[serde(default)]
    pub is_error: bool,
}

impl CallToolResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![Content::Text { text: text.into() }],
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            content: vec![Content::Text { text: text.into() }],
            is_error: true,
        }
    }

    /// Concatenated text of all content blocks.
    pub fn joined_text(&self) -> String {
        self.content
            .iter()
            .map(|c| match c {
                Content::Text { text } => text.as_str(),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateWorkspaceArgs {
    pub workspace_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WriteFileArgs {
    pub workspace_id: String,
    pub file_path: String,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReadFileArgs {
    pub workspace_id: String,
    pub file_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExecuteCommandArgs {
    pub command: String,
    #[serde(default)]
    pub workspace_id: Option<String>,
    #[serde(default)]
    pub packages: Option<Vec<String>>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub memory_limit: Option<String>,
    #[serde(default)]
    pub cpu_count: Option<f64>,
    #[serde(default)]
    pub env_vars: Option<HashMap<String, String>>,
    #[serde(default)]
    pub commit_to_image: Option<String>,
}

/// The tools served over MCP, with their JSON input schemas.
pub fn tool_catalog() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: CREATE_WORKSPACE.to_string(),
            description: "Creates a new persistent workspace directory.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "workspace_id": {"type": "string"}
                },
                "required": ["workspace_id"]
            }),
        },
        ToolDefinition {
            name: LIST_WORKSPACES.to_string(),
            description: "Lists all available workspaces.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {}
            }),
        },
        ToolDefinition {
            name: WRITE_FILE.to_string(),
            description: "Writes a file to a specific workspace.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "workspace_id": {"type": "string"},
                    "file_path": {"type": "string"},
                    "content": {"type": "string"}
                },
                "required": ["workspace_id", "file_path", "content"]
            }),
        },
        ToolDefinition {
            name: READ_FILE.to_string(),
            description: "Reads a file from a specific workspace.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "workspace_id": {"type": "string"},
                    "file_path": {"type": "string"}
                },
                "required": ["workspace_id", "file_path"]
            }),
        },
        ToolDefinition {
            name: EXECUTE_COMMAND.to_string(),
            description: "Executes a bash command in an ephemeral container. Optionally mounts \
                          a workspace at /workspace, installs apt packages first, applies \
                          memory/CPU limits and environment variables, and snapshots the \
                          container to a new image."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "command": {"type": "string"},
                    "workspace_id": {"type": "string"},
                    "packages": {"type": "array", "items": {"type": "string"}},
                    "image": {"type": "string", "description": "defaults to ubuntu:24.04"},
                    "memory_limit": {"type": "string", "description": "e.g. 512m, 1g"},
                    "cpu_count": {"type": "number", "description": "e.g. 0.5, 2"},
                    "env_vars": {
                        "type": "object",
                        "additionalProperties": {"type": "string"}
                    },
                    "commit_to_image": {"type": "string"}
                },
                "required": ["command"]
            }),
        },
    ]
}
