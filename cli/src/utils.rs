use sandybox_engine::{DEFAULT_REQUEST_TIMEOUT, DockerEngine};
use sandybox_workspace::WorkspaceManager;
use std::path::{Path, PathBuf};

pub async fn open_workspaces(
    root: Option<PathBuf>,
) -> Result<WorkspaceManager, Box<dyn std::error::Error>> {
    let root = root
        .or_else(WorkspaceManager::default_root)
        .ok_or("Cannot determine home directory, pass --workspace-root")?;

    let manager = WorkspaceManager::new(&root)
        .await
        .map_err(|e| format!("Failed to open workspace root {}: {}", root.display(), e))?;
    Ok(manager)
}

pub async fn connect_engine(
    socket: Option<&Path>,
) -> Result<DockerEngine, Box<dyn std::error::Error>> {
    let engine = DockerEngine::connect(socket, DEFAULT_REQUEST_TIMEOUT)
        .await
        .map_err(|e| {
            format!(
                "Failed to connect to container engine: {}. Is Docker or the Podman socket running?",
                e
            )
        })?;
    Ok(engine)
}

/// Splits `KEY=VALUE`. The value may itself contain `=`.
pub fn parse_env(entry: &str) -> Result<(String, String), String> {
    match entry.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("invalid environment entry '{}', expected KEY=VALUE", entry)),
    }
}
