//! Docker Engine API backend (also serves Podman's compatibility socket).

use crate::engine::ContainerEngine;
use crate::error::EngineError;
use crate::types::*;
use async_trait::async_trait;
use bollard::Docker;
use bollard::errors::Error as BollardError;
use bollard::models::{ContainerCreateBody, Mount, MountTypeEnum};
use bollard::query_parameters::{
    CommitContainerOptions, CreateContainerOptions, CreateImageOptions, ListContainersOptions,
    LogsOptions, RemoveContainerOptions, StartContainerOptions, WaitContainerOptions,
};
use futures::StreamExt;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Client-side ceiling on a single API request, `wait` included.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

pub struct DockerEngine {
    docker: Docker,
}

impl std::fmt::Debug for DockerEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DockerEngine").finish_non_exhaustive()
    }
}

impl DockerEngine {
    /// Connects to the engine and verifies it answers a version probe.
    ///
    /// With `socket` set, connects to that unix socket (for example
    /// `$XDG_RUNTIME_DIR/podman/podman.sock`); otherwise uses the platform
    /// defaults, which honour `DOCKER_HOST`.
    pub async fn connect(
        socket: Option<&Path>,
        request_timeout: Duration,
    ) -> Result<Self, EngineError> {
        let docker = match socket {
            Some(path) => Docker::connect_with_socket(
                &path.to_string_lossy(),
                request_timeout.as_secs(),
                bollard::API_DEFAULT_VERSION,
            ),
            None => Docker::connect_with_local_defaults(),
        }
        .map_err(|e| EngineError::Unavailable(e.to_string()))?
        .with_timeout(request_timeout);

        let engine = Self { docker };
        let version = engine.version().await?;
        tracing::info!(
            "Connected to container engine v{} (API {})",
            version.version,
            version.api_version
        );

        Ok(engine)
    }

    pub fn with_client(docker: Docker) -> Self {
        Self { docker }
    }
}

fn create_body(opts: &CreateContainerOpts) -> ContainerCreateBody {
    let mounts: Vec<Mount> = opts
        .host_config
        .mounts
        .iter()
        .map(|m| Mount {
            typ: Some(MountTypeEnum::BIND),
            source: Some(m.source.clone()),
            target: Some(m.target.clone()),
            read_only: Some(m.read_only),
            ..Default::default()
        })
        .collect();

    let host_config = bollard::models::HostConfig {
        mounts: if mounts.is_empty() { None } else { Some(mounts) },
        memory: opts.host_config.memory,
        nano_cpus: opts.host_config.nano_cpus,
        ..Default::default()
    };

    let config = &opts.config;
    ContainerCreateBody {
        image: Some(config.image.clone()),
        cmd: Some(config.cmd.clone()),
        env: if config.env.is_empty() {
            None
        } else {
            Some(config.env.clone())
        },
        working_dir: config.working_dir.clone(),
        labels: if config.labels.is_empty() {
            None
        } else {
            Some(config.labels.clone())
        },
        attach_stdout: Some(true),
        attach_stderr: Some(true),
        tty: Some(false),
        host_config: Some(host_config),
        ..Default::default()
    }
}

#[async_trait]
impl ContainerEngine for DockerEngine {
    async fn version(&self) -> Result<EngineVersion, EngineError> {
        let version = self
            .docker
            .version()
            .await
            .map_err(|e| EngineError::Unavailable(e.to_string()))?;

        Ok(EngineVersion {
            version: version.version.unwrap_or_default(),
            api_version: version.api_version.unwrap_or_default(),
        })
    }

    async fn image_exists(&self, image: &str) -> Result<bool, EngineError> {
        match self.docker.inspect_image(image).await {
            Ok(_) => Ok(true),
            Err(BollardError::DockerResponseServerError {
                status_code: 404, ..
            }) => Ok(false),
            Err(e) => Err(EngineError::InspectFailed {
                image: image.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    async fn pull_image(&self, image: &str) -> Result<(), EngineError> {
        let (name, tag) = parse_image_ref(image);
        tracing::info!("Pulling image {} (name: {}, tag: {:?})", image, name, tag);

        let options = CreateImageOptions {
            from_image: Some(name.to_string()),
            tag: match tag {
                Some(tag) => Some(tag.to_string()),
                None if name.contains('@') => None,
                None => Some("latest".to_string()),
            },
            ..Default::default()
        };

        let mut stream = self.docker.create_image(Some(options), None, None);
        while let Some(result) = stream.next().await {
            match result {
                Ok(info) => {
                    if let Some(status) = info.status {
                        tracing::debug!("pull progress: {}", status);
                    }
                }
                Err(e) => {
                    return Err(EngineError::PullFailed {
                        image: image.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        tracing::info!("Image {} pulled", image);
        Ok(())
    }

    async fn create(&self, opts: CreateContainerOpts) -> Result<String, EngineError> {
        let body = create_body(&opts);
        let options = CreateContainerOptions {
            name: opts.name.clone(),
            platform: String::new(),
        };

        let response = self
            .docker
            .create_container(Some(options), body)
            .await
            .map_err(|e| EngineError::CreateFailed(e.to_string()))?;

        tracing::debug!("Created container {} ({:?})", response.id, opts.name);
        Ok(response.id)
    }

    async fn start(&self, id: &str) -> Result<(), EngineError> {
        self.docker
            .start_container(id, None::<StartContainerOptions>)
            .await
            .map_err(|e| EngineError::StartFailed {
                id: id.to_string(),
                reason: e.to_string(),
            })
    }

    async fn wait(&self, id: &str) -> Result<WaitResult, EngineError> {
        let options = WaitContainerOptions {
            condition: "not-running".to_string(),
        };

        let mut stream = self.docker.wait_container(id, Some(options));
        match stream.next().await {
            Some(Ok(response)) => Ok(WaitResult {
                exit_code: response.status_code,
                error: response.error.and_then(|e| e.message),
            }),
            // Non-zero exits arrive as an error; they are still a completed wait.
            Some(Err(BollardError::DockerContainerWaitError { error, code })) => Ok(WaitResult {
                exit_code: code,
                error: Some(error).filter(|e| !e.is_empty()),
            }),
            Some(Err(e)) => Err(EngineError::WaitFailed {
                id: id.to_string(),
                reason: e.to_string(),
            }),
            None => Err(EngineError::WaitFailed {
                id: id.to_string(),
                reason: "wait stream closed unexpectedly".to_string(),
            }),
        }
    }

    async fn logs(&self, id: &str) -> Result<Vec<u8>, EngineError> {
        let options = LogsOptions {
            stdout: true,
            stderr: true,
            tail: "all".to_string(),
            timestamps: false,
            ..Default::default()
        };

        let mut stream = self.docker.logs(id, Some(options));
        let mut output = Vec::new();

        while let Some(result) = stream.next().await {
            let chunk = result.map_err(|e| EngineError::LogsFailed {
                id: id.to_string(),
                reason: e.to_string(),
            })?;
            output.extend_from_slice(&chunk.into_bytes());
        }

        tracing::debug!("Fetched {} bytes of logs from {}", output.len(), id);
        Ok(output)
    }

    async fn commit(&self, id: &str, image: &str) -> Result<(), EngineError> {
        let (repo, tag) = parse_image_ref(image);
        if repo.is_empty() || repo.contains('@') {
            return Err(EngineError::InvalidReference(image.to_string()));
        }

        let options = CommitContainerOptions {
            container: Some(id.to_string()),
            repo: Some(repo.to_string()),
            tag: Some(tag.unwrap_or("latest").to_string()),
            pause: true,
            ..Default::default()
        };

        let response = self
            .docker
            .commit_container(options, bollard::models::ContainerConfig::default())
            .await
            .map_err(|e| EngineError::CommitFailed {
                id: id.to_string(),
                image: image.to_string(),
                reason: e.to_string(),
            })?;

        tracing::debug!("Commit of {} returned {:?}", id, response);
        Ok(())
    }

    async fn remove(&self, id: &str, force: bool) -> Result<(), EngineError> {
        let options = RemoveContainerOptions {
            force,
            ..Default::default()
        };

        self.docker
            .remove_container(id, Some(options))
            .await
            .map_err(|e| EngineError::RemoveFailed {
                id: id.to_string(),
                reason: e.to_string(),
            })
    }

    async fn list_by_label(&self, label: &str) -> Result<Vec<String>, EngineError> {
        let filters = HashMap::from([("label".to_string(), vec![label.to_string()])]);
        let options = ListContainersOptions {
            all: true,
            filters: Some(filters),
            ..Default::default()
        };

        let containers = self
            .docker
            .list_containers(Some(options))
            .await
            .map_err(|e| EngineError::ListFailed(e.to_string()))?;

        Ok(containers.into_iter().filter_map(|c| c.id).collect())
    }
}
