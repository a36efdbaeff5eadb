use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerConfig {
    pub image: String,
    pub env: Vec<String>,
    pub cmd: Vec<String>,
    pub working_dir: Option<String>,
    pub labels: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostConfig {
    pub mounts: Vec<BindMount>,
    /// Memory limit in bytes.
    pub memory: Option<i64>,
    /// CPU quota in units of 1e-9 CPUs.
    pub nano_cpus: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindMount {
    pub source: String,
    pub target: String,
    pub read_only: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateContainerOpts {
    pub name: Option<String>,
    pub config: ContainerConfig,
    pub host_config: HostConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WaitResult {
    pub exit_code: i64,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineVersion {
    pub version: String,
    pub api_version: String,
}

/// Splits an image reference into repository and tag.
///
/// Digest references are returned whole with no tag. A colon followed by a
/// `/` belongs to a registry port, not a tag.
pub fn parse_image_ref(image: &str) -> (&str, Option<&str>) {
    if image.contains('@') {
        return (image, None);
    }

    if let Some((name, tag)) = image.rsplit_once(':')
        && !tag.contains('/')
    {
        return (name, Some(tag));
    }

    (image, None)
}
