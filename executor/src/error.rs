use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecutorError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid package name: {0}")]
    InvalidPackage(String),

    #[error("invalid memory limit: {0}")]
    InvalidMemoryLimit(String),

    #[error("invalid cpu count: {0}")]
    InvalidCpuCount(String),

    #[error("{0}")]
    Workspace(#[from] sandybox_workspace::WorkspaceError),

    #[error("{0}")]
    Engine(#[from] sandybox_engine::EngineError),
}

impl ExecutorError {
    pub fn is_validation(&self) -> bool {
        match self {
            ExecutorError::InvalidArgument(_)
            | ExecutorError::InvalidPackage(_)
            | ExecutorError::InvalidMemoryLimit(_)
            | ExecutorError::InvalidCpuCount(_) => true,
            ExecutorError::Workspace(e) => e.is_validation(),
            ExecutorError::Engine(_) => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ExecutorError::Workspace(e) if e.is_not_found())
    }

    pub fn is_engine_unavailable(&self) -> bool {
        matches!(
            self,
            ExecutorError::Engine(sandybox_engine::EngineError::Unavailable(_))
        )
    }
}
