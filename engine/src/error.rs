use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("container engine unavailable: {0}")]
    Unavailable(String),

    #[error("failed to pull image {image}: {reason}")]
    PullFailed { image: String, reason: String },

    #[error("failed to inspect image {image}: {reason}")]
    InspectFailed { image: String, reason: String },

    #[error("failed to create container: {0}")]
    CreateFailed(String),

    #[error("failed to start container {id}: {reason}")]
    StartFailed { id: String, reason: String },

    #[error("failed to wait for container {id}: {reason}")]
    WaitFailed { id: String, reason: String },

    #[error("failed to fetch logs of container {id}: {reason}")]
    LogsFailed { id: String, reason: String },

    #[error("failed to commit container {id} to {image}: {reason}")]
    CommitFailed {
        id: String,
        image: String,
        reason: String,
    },

    #[error("failed to remove container {id}: {reason}")]
    RemoveFailed { id: String, reason: String },

    #[error("failed to list containers: {0}")]
    ListFailed(String),

    #[error("invalid image reference: {0}")]
    InvalidReference(String),
}
