//! End-to-end checks against a real container engine.
//!
//! Every test returns early when no engine answers on the default socket
//! (`DOCKER_HOST` or `/var/run/docker.sock`). Point `DOCKER_HOST` at
//! `unix://$XDG_RUNTIME_DIR/podman/podman.sock` to run them against Podman.
//!
//! ```bash
//! cargo test -p sandybox-executor --test live_engine -- --nocapture
//! ```

use sandybox_engine::{ContainerEngine, DEFAULT_REQUEST_TIMEOUT, DockerEngine};
use sandybox_executor::{CommandExecutor, ExecutionRequest, WORKSPACE_LABEL};
use sandybox_workspace::WorkspaceManager;
use std::collections::HashMap;
use std::sync::Arc;
use tempfile::TempDir;

const TEST_IMAGE: &str = "ubuntu:24.04";

async fn skip_if_no_engine() -> Option<Arc<DockerEngine>> {
    DockerEngine::connect(None, DEFAULT_REQUEST_TIMEOUT)
        .await
        .ok()
        .map(Arc::new)
}

async fn setup() -> Option<(CommandExecutor, Arc<DockerEngine>, Arc<WorkspaceManager>, TempDir)> {
    let engine = skip_if_no_engine().await?;
    let dir = TempDir::new().unwrap();
    let workspaces = Arc::new(WorkspaceManager::new(dir.path()).await.unwrap());
    let executor = CommandExecutor::new(engine.clone(), workspaces.clone());
    Some((executor, engine, workspaces, dir))
}

fn unique_image_name(prefix: &str) -> String {
    format!("sandybox-test-{}-{}", prefix, std::process::id())
}

#[tokio::test]
async fn test_echo_hello() {
    let Some((executor, _engine, _ws, _dir)) = setup().await else {
        eprintln!("skipping: no container engine available");
        return;
    };

    let output = executor
        .execute(ExecutionRequest::new("echo Hello"))
        .await
        .unwrap();

    assert!(output.output.contains("Hello"));
    assert_eq!(output.exit_code, 0);
}

#[tokio::test]
async fn test_workspace_is_mounted() {
    let Some((executor, _engine, workspaces, _dir)) = setup().await else {
        eprintln!("skipping: no container engine available");
        return;
    };

    workspaces.create("mounted").await.unwrap();
    workspaces
        .write_file("mounted", "hello.txt", "Hello from the host filesystem!")
        .await
        .unwrap();

    let mut request = ExecutionRequest::new("pwd && cat hello.txt && echo out > result.txt");
    request.workspace_id = Some("mounted".to_string());
    let output = executor.execute(request).await.unwrap();

    assert!(output.output.contains("/workspace"));
    assert!(output.output.contains("Hello from the host filesystem!"));
    assert_eq!(
        workspaces
            .read_file("mounted", "result.txt")
            .await
            .unwrap()
            .trim(),
        "out"
    );
}

#[tokio::test]
async fn test_resource_limits_and_env() {
    let Some((executor, _engine, _ws, _dir)) = setup().await else {
        eprintln!("skipping: no container engine available");
        return;
    };

    let mut request = ExecutionRequest::new("echo \"Resources OK $MY_VAR\"");
    request.memory_limit = Some("128m".to_string());
    request.cpu_count = Some(0.5);
    request.env_vars = HashMap::from([("MY_VAR".to_string(), "hello".to_string())]);
    let output = executor.execute(request).await.unwrap();

    assert_eq!(output.output.trim(), "Resources OK hello");
}

#[tokio::test]
async fn test_quiet_install() {
    let Some((executor, _engine, _ws, _dir)) = setup().await else {
        eprintln!("skipping: no container engine available");
        return;
    };

    let mut request = ExecutionRequest::new("which file");
    request.packages = vec!["file".to_string()];
    let output = executor.execute(request).await.unwrap();

    assert!(output.output.contains("[System] Installed packages: file"));
    assert!(output.output.contains("/usr/bin/file"));
    assert!(!output.output.contains("Reading package lists..."));
}

#[tokio::test]
async fn test_failed_install_skips_command() {
    let Some((executor, _engine, _ws, _dir)) = setup().await else {
        eprintln!("skipping: no container engine available");
        return;
    };

    let mut request = ExecutionRequest::new("echo SHOULD-NOT-RUN");
    request.packages = vec!["sandybox-no-such-package".to_string()];
    let output = executor.execute(request).await.unwrap();

    assert!(output.output.contains("[System] Package installation failed"));
    assert!(!output.output.contains("SHOULD-NOT-RUN"));
    assert_eq!(output.exit_code, 1);
}

#[tokio::test]
async fn test_commit_snapshot_is_reusable() {
    let Some((executor, _engine, _ws, _dir)) = setup().await else {
        eprintln!("skipping: no container engine available");
        return;
    };

    let image = unique_image_name("commit");
    let mut request = ExecutionRequest::new("touch /root/artifact");
    request.commit_to_image = Some(image.clone());
    let output = executor.execute(request).await.unwrap();
    assert!(
        output
            .to_string()
            .contains(&format!("[System] Snapshot saved as: {}", image))
    );

    let mut request = ExecutionRequest::new("ls /root/artifact");
    request.image = image;
    let output = executor.execute(request).await.unwrap();
    assert_eq!(output.output.trim(), "/root/artifact");
}

#[tokio::test]
async fn test_image_present_after_run() {
    let Some((executor, engine, _ws, _dir)) = setup().await else {
        eprintln!("skipping: no container engine available");
        return;
    };

    executor
        .execute(ExecutionRequest::new("true"))
        .await
        .unwrap();
    assert!(engine.image_exists(TEST_IMAGE).await.unwrap());
}

#[tokio::test]
async fn test_container_removed_after_run() {
    let Some((executor, engine, workspaces, _dir)) = setup().await else {
        eprintln!("skipping: no container engine available");
        return;
    };

    let workspace = unique_image_name("cleanup");
    workspaces.create(&workspace).await.unwrap();
    let label = format!("{}={}", WORKSPACE_LABEL, workspace);

    let mut request = ExecutionRequest::new("echo done");
    request.workspace_id = Some(workspace.clone());
    executor.execute(request).await.unwrap();
    assert!(engine.list_by_label(&label).await.unwrap().is_empty());

    let mut request = ExecutionRequest::new("exit 3");
    request.workspace_id = Some(workspace.clone());
    let output = executor.execute(request).await.unwrap();
    assert_eq!(output.exit_code, 3);
    assert!(engine.list_by_label(&label).await.unwrap().is_empty());

    let mut request = ExecutionRequest::new("true");
    request.workspace_id = Some(workspace);
    request.commit_to_image = Some("Invalid Reference!".to_string());
    assert!(executor.execute(request).await.is_err());
    assert!(engine.list_by_label(&label).await.unwrap().is_empty());
}
