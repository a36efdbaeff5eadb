use crate::error::WorkspaceError;
use crate::resolve::{is_strict_descendant, soft_canonicalize};
use std::path::{Path, PathBuf};
use tokio::fs;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    Created(PathBuf),
    AlreadyExists(PathBuf),
}

impl CreateOutcome {
    pub fn path(&self) -> &Path {
        match self {
            CreateOutcome::Created(path) | CreateOutcome::AlreadyExists(path) => path,
        }
    }
}

/// Persistent per-project directories under a single root.
///
/// Every id and every file path is canonicalized and must stay strictly
/// below its parent (the root for ids, the workspace for files).
pub struct WorkspaceManager {
    root: PathBuf,
}

impl WorkspaceManager {
    /// `~/.sandybox/workspaces`, or `None` when there is no home directory.
    pub fn default_root() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".sandybox").join("workspaces"))
    }

    pub async fn new(root: impl AsRef<Path>) -> Result<Self, WorkspaceError> {
        fs::create_dir_all(root.as_ref()).await?;
        let root = fs::canonicalize(root.as_ref()).await?;

        tracing::info!("Workspace root set to: {:?}", root);
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a workspace id to its directory without touching it.
    pub fn resolve(&self, workspace_id: &str) -> Result<PathBuf, WorkspaceError> {
        let path = soft_canonicalize(&self.root.join(workspace_id))?;
        if !is_strict_descendant(&path, &self.root) {
            tracing::warn!(
                "Security Alert: Path traversal attempt for ID '{}'",
                workspace_id
            );
            return Err(WorkspaceError::InvalidWorkspaceId(workspace_id.to_string()));
        }
        Ok(path)
    }

    fn resolve_file(&self, workspace: &Path, file_path: &str) -> Result<PathBuf, WorkspaceError> {
        let path = soft_canonicalize(&workspace.join(file_path))?;
        if !is_strict_descendant(&path, workspace) {
            tracing::warn!("Security Alert: File path traversal attempt '{}'", file_path);
            return Err(WorkspaceError::PathTraversal(file_path.to_string()));
        }
        Ok(path)
    }

    pub async fn exists(&self, workspace_id: &str) -> Result<bool, WorkspaceError> {
        let path = self.resolve(workspace_id)?;
        Ok(is_dir(&path).await)
    }

    /// Resolves a workspace id that must already exist.
    pub async fn workspace_path(&self, workspace_id: &str) -> Result<PathBuf, WorkspaceError> {
        let path = self.resolve(workspace_id)?;
        if !is_dir(&path).await {
            return Err(WorkspaceError::WorkspaceNotFound(workspace_id.to_string()));
        }
        Ok(path)
    }

    pub async fn create(&self, workspace_id: &str) -> Result<CreateOutcome, WorkspaceError> {
        let path = self.resolve(workspace_id)?;

        if is_dir(&path).await {
            tracing::info!("Workspace '{}' already exists", workspace_id);
            return Ok(CreateOutcome::AlreadyExists(path));
        }
        if fs::symlink_metadata(&path).await.is_ok() {
            tracing::warn!("Workspace '{}' collides with a non-directory entry", workspace_id);
            return Err(WorkspaceError::NotADirectory(workspace_id.to_string()));
        }

        fs::create_dir_all(&path).await?;
        tracing::info!("Workspace '{}' created at {:?}", workspace_id, path);
        Ok(CreateOutcome::Created(path))
    }

    /// Names of the immediate subdirectories of the root, sorted.
    pub async fn list(&self) -> Result<Vec<String>, WorkspaceError> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(e) => e,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(e.into()),
        };

        let mut workspaces = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !is_dir(&entry.path()).await {
                continue;
            }
            workspaces.push(entry.file_name().to_string_lossy().into_owned());
        }

        workspaces.sort();
        Ok(workspaces)
    }

    /// Writes `content` to `file_path` inside an existing workspace,
    /// creating parent directories. Returns the number of bytes written.
    pub async fn write_file(
        &self,
        workspace_id: &str,
        file_path: &str,
        content: &str,
    ) -> Result<usize, WorkspaceError> {
        let workspace = self.workspace_path(workspace_id).await?;
        let full_path = self.resolve_file(&workspace, file_path)?;

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&full_path, content).await?;

        tracing::debug!(
            "Wrote {} bytes to {:?} in workspace '{}'",
            content.len(),
            full_path,
            workspace_id
        );
        Ok(content.len())
    }

    pub async fn read_file(
        &self,
        workspace_id: &str,
        file_path: &str,
    ) -> Result<String, WorkspaceError> {
        let workspace = self.resolve(workspace_id)?;
        let full_path = self.resolve_file(&workspace, file_path)?;

        let not_found = || WorkspaceError::FileNotFound {
            workspace: workspace_id.to_string(),
            path: file_path.to_string(),
        };

        match fs::read_to_string(&full_path).await {
            Ok(content) => {
                tracing::info!("Read success: {} chars", content.chars().count());
                Ok(content)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(not_found()),
            Err(e) => Err(e.into()),
        }
    }
}

async fn is_dir(path: &Path) -> bool {
    fs::metadata(path)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false)
}
