pub mod exec;
pub mod health;
pub mod workspace;

pub use exec::{ExecArgs, run_exec};
pub use health::health_check;
pub use workspace::{WorkspaceCommands, handle_workspace_command};
