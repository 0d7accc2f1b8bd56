//! Check command handler.
//!
//! Starts the worker, asks for its status and stops it again. Useful to
//! verify that the configured binary runs and speaks the protocol.

use anyhow::Result;
use tracing::warn;

use crate::bootstrap::CliContext;
use crate::error::CliError;

pub async fn execute(ctx: &CliContext) -> Result<()> {
    let handle = ctx.controller.start(None).await.map_err(CliError::from)?;

    let status = ctx.controller.worker_status().await;
    if let Err(e) = ctx.controller.stop().await {
        warn!(error = %e, "Failed to stop worker cleanly");
    }
    let status = status.map_err(CliError::from)?;

    println!(
        "Worker {} is working",
        ctx.controller.worker_path().display()
    );
    if let Some(pid) = handle.pid {
        println!("  pid:    {pid}");
    }
    println!("  status: {}", serde_json::to_string_pretty(&status)?);
    Ok(())
}
