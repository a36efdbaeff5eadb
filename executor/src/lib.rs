mod command;
mod error;
mod resources;
mod service;
mod types;

pub use command::{WORKSPACE_MOUNT, build_shell_command, validate_package};
pub use error::ExecutorError;
pub use resources::{nano_cpus, parse_memory_limit};
pub use service::{CommandExecutor, MANAGED_LABEL, WORKSPACE_LABEL};
pub use types::*;
