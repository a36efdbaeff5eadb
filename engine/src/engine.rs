use crate::error::EngineError;
use crate::types::*;
use async_trait::async_trait;

/// The slice of a container runtime that command execution needs.
#[async_trait]
pub trait ContainerEngine: Send + Sync {
    async fn version(&self) -> Result<EngineVersion, EngineError>;

    async fn image_exists(&self, image: &str) -> Result<bool, EngineError>;

    async fn pull_image(&self, image: &str) -> Result<(), EngineError>;

    /// Creates a container without starting it and returns its id.
    async fn create(&self, opts: CreateContainerOpts) -> Result<String, EngineError>;

    async fn start(&self, id: &str) -> Result<(), EngineError>;

    /// Blocks until the container is no longer running.
    async fn wait(&self, id: &str) -> Result<WaitResult, EngineError>;

    /// Combined stdout and stderr, in the order the runtime delivers them.
    async fn logs(&self, id: &str) -> Result<Vec<u8>, EngineError>;

    /// Snapshots the container filesystem as `image` (`repo[:tag]`).
    async fn commit(&self, id: &str, image: &str) -> Result<(), EngineError>;

    async fn remove(&self, id: &str, force: bool) -> Result<(), EngineError>;

    /// Ids of all containers, running or not, carrying `label` (`key` or
    /// `key=value`).
    async fn list_by_label(&self, label: &str) -> Result<Vec<String>, EngineError>;
}
