use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkspaceError {
    #[error("Invalid workspace ID: {0}")]
    InvalidWorkspaceId(String),

    #[error("File path traversal detected: {0}")]
    PathTraversal(String),

    #[error("'{0}' exists and is not a workspace directory")]
    NotADirectory(String),

    #[error("Workspace '{0}' does not exist")]
    WorkspaceNotFound(String),

    #[error("File '{path}' not found in workspace '{workspace}'")]
    FileNotFound { workspace: String, path: String },

    #[error("too many levels of symbolic links: {0}")]
    SymlinkLoop(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkspaceError {
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            WorkspaceError::InvalidWorkspaceId(_)
                | WorkspaceError::PathTraversal(_)
                | WorkspaceError::SymlinkLoop(_)
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            WorkspaceError::WorkspaceNotFound(_) | WorkspaceError::FileNotFound { .. }
        )
    }
}
