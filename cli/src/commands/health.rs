use crate::utils::connect_engine;
use sandybox_engine::ContainerEngine;
use sandybox_executor::MANAGED_LABEL;
use std::path::Path;

pub async fn health_check(socket: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let engine = connect_engine(socket).await?;

    let version = engine
        .version()
        .await
        .map_err(|e| format!("Health check failed: {}", e))?;

    println!("Container Engine:");
    println!("  Reachable:   ✓ yes");
    println!("  Version:     {}", version.version);
    println!("  API Version: {}", version.api_version);

    let leftover = engine
        .list_by_label(MANAGED_LABEL)
        .await
        .map_err(|e| format!("Health check failed: {}", e))?;
    println!("  Sandboxes:   {} container(s) present", leftover.len());

    Ok(())
}
