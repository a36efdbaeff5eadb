use crate::command::{WORKSPACE_MOUNT, build_shell_command, shell_argv, validate_package};
use crate::error::ExecutorError;
use crate::resources::{nano_cpus, parse_memory_limit};
use crate::types::*;
use sandybox_engine::{BindMount, ContainerConfig, ContainerEngine, CreateContainerOpts, HostConfig};
use sandybox_workspace::WorkspaceManager;
use std::collections::HashMap;
use std::sync::Arc;

/// Set to `true` on every container the executor creates.
pub const MANAGED_LABEL: &str = "sandybox.managed";
/// Id of the workspace mounted into the container, when there is one.
pub const WORKSPACE_LABEL: &str = "sandybox.workspace";

/// Runs one command per ephemeral container.
///
/// A container that was created is always removed again, whatever happened
/// between creation and removal.
pub struct CommandExecutor {
    engine: Arc<dyn ContainerEngine>,
    workspaces: Arc<WorkspaceManager>,
}

impl CommandExecutor {
    pub fn new(engine: Arc<dyn ContainerEngine>, workspaces: Arc<WorkspaceManager>) -> Self {
        Self { engine, workspaces }
    }

    pub async fn execute(
        &self,
        request: ExecutionRequest,
    ) -> Result<ExecutionOutput, ExecutorError> {
        tracing::info!(
            "Executing command (ws: {:?}, image: {}, mem: {:?}, cpus: {:?}, commit: {:?})",
            request.workspace_id,
            request.image,
            request.memory_limit,
            request.cpu_count,
            request.commit_to_image
        );
        tracing::info!("Command: {}", request.command);
        if !request.packages.is_empty() {
            tracing::info!("Packages to install: {:?}", request.packages);
        }

        let opts = self.prepare(&request).await?;
        self.ensure_image(&request.image).await?;

        tracing::info!("Spawning container...");
        let id = self.engine.create(opts).await?;

        let result = self.run(&id, &request).await;
        self.cleanup(&id).await;

        match &result {
            Ok(output) => tracing::info!(
                "Container execution finished. Output length: {} chars",
                output.output.chars().count()
            ),
            Err(e) => tracing::error!("Execution failed: {}", e),
        }
        result
    }

    /// Validates the request and builds the container options. Nothing is
    /// created on the engine here.
    async fn prepare(
        &self,
        request: &ExecutionRequest,
    ) -> Result<CreateContainerOpts, ExecutorError> {
        if request.command.trim().is_empty() {
            return Err(ExecutorError::InvalidArgument("command is empty".to_string()));
        }
        if request.image.trim().is_empty() {
            return Err(ExecutorError::InvalidArgument("image is empty".to_string()));
        }
        for package in &request.packages {
            validate_package(package)?;
        }

        let memory = request
            .memory_limit
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .map(parse_memory_limit)
            .transpose()?;
        let nano_cpus = match request.cpu_count {
            Some(count) => nano_cpus(count)?,
            None => None,
        };

        let mut labels = HashMap::from([(MANAGED_LABEL.to_string(), "true".to_string())]);
        let mut mounts = Vec::new();
        let mut working_dir = "/".to_string();

        if let Some(workspace_id) = &request.workspace_id {
            let path = self.workspaces.workspace_path(workspace_id).await?;
            mounts.push(BindMount {
                source: path.to_string_lossy().into_owned(),
                target: WORKSPACE_MOUNT.to_string(),
                read_only: false,
            });
            working_dir = WORKSPACE_MOUNT.to_string();
            labels.insert(WORKSPACE_LABEL.to_string(), workspace_id.clone());
        }

        let mut env: Vec<String> = request
            .env_vars
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        env.sort();

        let script = build_shell_command(&request.command, &request.packages);

        Ok(CreateContainerOpts {
            name: Some(format!("sandybox-{}", uuid::Uuid::new_v4())),
            config: ContainerConfig {
                image: request.image.clone(),
                env,
                cmd: shell_argv(script),
                working_dir: Some(working_dir),
                labels,
            },
            host_config: HostConfig {
                mounts,
                memory,
                nano_cpus,
            },
        })
    }

    async fn ensure_image(&self, image: &str) -> Result<(), ExecutorError> {
        if !self.engine.image_exists(image).await? {
            tracing::info!("Image {} not present locally, pulling", image);
            self.engine.pull_image(image).await?;
        }
        Ok(())
    }

    async fn run(
        &self,
        id: &str,
        request: &ExecutionRequest,
    ) -> Result<ExecutionOutput, ExecutorError> {
        self.engine.start(id).await?;

        let wait = self.engine.wait(id).await?;
        tracing::info!("Container exited with code: {}", wait.exit_code);
        if let Some(error) = &wait.error {
            tracing::warn!("Container {} reported: {}", id, error);
        }

        let logs = self.engine.logs(id).await?;
        let output = String::from_utf8_lossy(&logs).into_owned();

        let snapshot = match &request.commit_to_image {
            Some(image) => {
                tracing::info!("Committing container to image: {}", image);
                self.engine.commit(id, image).await?;
                Some(image.clone())
            }
            None => None,
        };

        Ok(ExecutionOutput {
            output,
            exit_code: wait.exit_code,
            snapshot,
        })
    }

    async fn cleanup(&self, id: &str) {
        if let Err(e) = self.engine.remove(id, true).await {
            tracing::warn!("Failed to remove container: {}", e);
        }
    }
}
