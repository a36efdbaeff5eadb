mod commands;
mod utils;

use clap::{Parser, Subcommand};
use commands::{ExecArgs, WorkspaceCommands, handle_workspace_command, health_check, run_exec};
use sandybox_executor::CommandExecutor;
use std::path::PathBuf;
use std::sync::Arc;
use utils::{connect_engine, open_workspaces};

#[derive(Parser)]
#[command(name = "sandybox")]
#[command(about = "Sandybox CLI - manage workspaces and run sandboxed commands")]
struct Cli {
    /// Directory holding the workspaces [default: ~/.sandybox/workspaces]
    #[arg(long, global = true, env = "SANDYBOX_WORKSPACE_ROOT")]
    workspace_root: Option<PathBuf>,

    /// Container engine socket (Docker or Podman)
    #[arg(long, global = true, env = "SANDYBOX_ENGINE_SOCKET")]
    engine_socket: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the container engine is reachable
    Health,
    /// Manage workspaces
    #[command(subcommand)]
    Workspace(WorkspaceCommands),
    /// Run a command in an ephemeral container
    Exec(ExecArgs),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Health) => {
            health_check(cli.engine_socket.as_deref()).await?;
        }
        Some(Commands::Workspace(cmd)) => {
            let workspaces = open_workspaces(cli.workspace_root).await?;
            handle_workspace_command(&workspaces, cmd).await?;
        }
        Some(Commands::Exec(args)) => {
            let workspaces = Arc::new(open_workspaces(cli.workspace_root).await?);
            let engine = connect_engine(cli.engine_socket.as_deref()).await?;
            let executor = CommandExecutor::new(Arc::new(engine), workspaces);

            let exit_code = run_exec(&executor, args).await?;
            if exit_code != 0 {
                std::process::exit(exit_code.clamp(1, 255) as i32);
            }
        }
        None => {
            println!("Sandybox CLI ready.");
            println!("Use --help for usage information.");
        }
    }

    Ok(())
}
