mod services;

use clap::{Parser, Subcommand};
use sandybox_engine::DockerEngine;
use sandybox_executor::CommandExecutor;
use sandybox_workspace::WorkspaceManager;
use services::{McpServer, ToolService};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "sandybox-daemon")]
#[command(about = "Sandybox MCP server: sandboxed command execution in ephemeral containers")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve MCP over stdin/stdout
    Serve {
        /// Directory holding the workspaces [default: ~/.sandybox/workspaces]
        #[arg(long, env = "SANDYBOX_WORKSPACE_ROOT")]
        workspace_root: Option<PathBuf>,

        /// Container engine socket (Docker or Podman); defaults to DOCKER_HOST
        /// or the platform socket
        #[arg(long, env = "SANDYBOX_ENGINE_SOCKET")]
        engine_socket: Option<PathBuf>,

        /// Timeout in seconds for a single engine request
        #[arg(long, env = "SANDYBOX_ENGINE_TIMEOUT", default_value_t = 86400)]
        engine_timeout: u64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            workspace_root,
            engine_socket,
            engine_timeout,
        } => {
            let workspace_root = match workspace_root.or_else(WorkspaceManager::default_root) {
                Some(root) => root,
                None => return Err("cannot determine home directory, pass --workspace-root".into()),
            };
            let workspaces = Arc::new(WorkspaceManager::new(&workspace_root).await?);

            let engine = DockerEngine::connect(
                engine_socket.as_deref(),
                Duration::from_secs(engine_timeout),
            )
            .await
            .inspect_err(|e| tracing::error!("Failed to connect to container engine: {}", e))?;

            let executor = Arc::new(CommandExecutor::new(Arc::new(engine), workspaces.clone()));
            let server = Arc::new(McpServer::new(ToolService::new(workspaces, executor)));

            tracing::info!("Starting Sandybox MCP server on stdio");
            server.serve(tokio::io::stdin(), tokio::io::stdout()).await?;
            tracing::info!("Sandybox MCP server stopped");
        }
    }

    Ok(())
}
