use std::collections::HashMap;

pub const DEFAULT_IMAGE: &str = "ubuntu:24.04";

#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionRequest {
    pub command: String,
    pub workspace_id: Option<String>,
    pub packages: Vec<String>,
    pub image: String,
    pub memory_limit: Option<String>,
    pub cpu_count: Option<f64>,
    pub env_vars: HashMap<String, String>,
    pub commit_to_image: Option<String>,
}

impl ExecutionRequest {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            workspace_id: None,
            packages: vec![],
            image: DEFAULT_IMAGE.to_string(),
            memory_limit: None,
            cpu_count: None,
            env_vars: HashMap::new(),
            commit_to_image: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionOutput {
    /// Combined stdout and stderr of the container.
    pub output: String,
    pub exit_code: i64,
    /// Image the container was committed to, if any.
    pub snapshot: Option<String>,
}

impl std::fmt::Display for ExecutionOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.output)?;
        if let Some(image) = &self.snapshot {
            write!(f, "\n[System] Snapshot saved as: {}", image)?;
        }
        Ok(())
    }
}
