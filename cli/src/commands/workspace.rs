use clap::Subcommand;
use sandybox_workspace::{CreateOutcome, WorkspaceManager};
use tokio::io::AsyncReadExt;

#[derive(Subcommand)]
pub enum WorkspaceCommands {
    /// Create a workspace (no-op if it already exists)
    Create {
        /// Workspace ID
        workspace_id: String,
    },
    /// List workspaces
    #[command(alias = "ls")]
    List,
    /// Write a file into a workspace
    Write {
        /// Workspace ID
        workspace_id: String,

        /// Path relative to the workspace
        file_path: String,

        /// File content; read from stdin when omitted
        content: Option<String>,
    },
    /// Print a file from a workspace
    Read {
        /// Workspace ID
        workspace_id: String,

        /// Path relative to the workspace
        file_path: String,
    },
}

pub async fn handle_workspace_command(
    workspaces: &WorkspaceManager,
    cmd: WorkspaceCommands,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        WorkspaceCommands::Create { workspace_id } => {
            match workspaces.create(&workspace_id).await? {
                CreateOutcome::Created(path) => {
                    println!("Workspace '{}' created at {}", workspace_id, path.display())
                }
                CreateOutcome::AlreadyExists(_) => {
                    println!("Workspace '{}' already exists.", workspace_id)
                }
            }
        }
        WorkspaceCommands::List => {
            let ids = workspaces.list().await?;
            if ids.is_empty() {
                println!("No workspaces found.");
            }
            for id in ids {
                println!("{}", id);
            }
        }
        WorkspaceCommands::Write {
            workspace_id,
            file_path,
            content,
        } => {
            let content = match content {
                Some(content) => content,
                None => {
                    let mut buf = String::new();
                    tokio::io::stdin().read_to_string(&mut buf).await?;
                    buf
                }
            };
            let written = workspaces
                .write_file(&workspace_id, &file_path, &content)
                .await?;
            eprintln!(
                "Wrote {} bytes to {} in workspace '{}'",
                written, file_path, workspace_id
            );
        }
        WorkspaceCommands::Read {
            workspace_id,
            file_path,
        } => {
            let content = workspaces.read_file(&workspace_id, &file_path).await?;
            print!("{}", content);
        }
    }

    Ok(())
}
