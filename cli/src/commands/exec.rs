use crate::utils::parse_env;
use clap::Args;
use sandybox_executor::{CommandExecutor, DEFAULT_IMAGE, ExecutionRequest};
use std::collections::HashMap;

#[derive(Args)]
pub struct ExecArgs {
    /// Workspace to mount at /workspace
    #[arg(long, short)]
    workspace: Option<String>,

    /// Apt package to install before running (repeatable)
    #[arg(long = "package", short)]
    packages: Vec<String>,

    /// Image to run
    #[arg(long, default_value = DEFAULT_IMAGE)]
    image: String,

    /// Memory limit (e.g. 512m, 1g)
    #[arg(long, short)]
    memory: Option<String>,

    /// Number of CPUs (e.g. 0.5, 2)
    #[arg(long)]
    cpus: Option<f64>,

    /// Set environment variables
    #[arg(long, short, value_parser = parse_env)]
    env: Vec<(String, String)>,

    /// Snapshot the container to this image when done
    #[arg(long)]
    commit: Option<String>,

    /// Command to run with bash -c
    #[arg(required = true, trailing_var_arg = true)]
    command: Vec<String>,
}

impl ExecArgs {
    fn into_request(self) -> ExecutionRequest {
        ExecutionRequest {
            command: self.command.join(" "),
            workspace_id: self.workspace,
            packages: self.packages,
            image: self.image,
            memory_limit: self.memory,
            cpu_count: self.cpus,
            env_vars: self.env.into_iter().collect::<HashMap<_, _>>(),
            commit_to_image: self.commit,
        }
    }
}

/// Runs the command and prints its output. Returns the container's exit code.
pub async fn run_exec(
    executor: &CommandExecutor,
    args: ExecArgs,
) -> Result<i64, Box<dyn std::error::Error>> {
    let output = executor.execute(args.into_request()).await?;
    println!("{}", output);
    Ok(output.exit_code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        exec: ExecArgs,
    }

    #[test]
    fn test_exec_args_to_request() {
        let cli = TestCli::parse_from([
            "exec",
            "--workspace",
            "proj",
            "-p",
            "curl",
            "-p",
            "jq",
            "--memory",
            "256m",
            "--cpus",
            "1.5",
            "-e",
            "A=1",
            "--commit",
            "snap:v1",
            "echo",
            "$A",
        ]);
        let request = cli.exec.into_request();

        assert_eq!(request.command, "echo $A");
        assert_eq!(request.workspace_id.as_deref(), Some("proj"));
        assert_eq!(request.packages, vec!["curl", "jq"]);
        assert_eq!(request.image, DEFAULT_IMAGE);
        assert_eq!(request.memory_limit.as_deref(), Some("256m"));
        assert_eq!(request.cpu_count, Some(1.5));
        assert_eq!(request.env_vars.get("A").map(String::as_str), Some("1"));
        assert_eq!(request.commit_to_image.as_deref(), Some("snap:v1"));
    }

    #[test]
    fn test_exec_defaults() {
        let cli = TestCli::parse_from(["exec", "ls -la"]);
        let request = cli.exec.into_request();

        assert_eq!(request, ExecutionRequest::new("ls -la"));
    }
}
