//! Validate-state command handler.

use std::path::Path;

use anyhow::Result;

use crate::error::CliError;
use crate::state_file;

/// Parse the state file, print a summary and fail if it is inconsistent.
pub fn execute(path: &Path) -> Result<()> {
    let state = state_file::load(path)?;

    println!("{}", path.display());
    println!("  channels: {}", state.channels.len());
    println!("  streams:  {}", state.stream_count());
    println!("  tunnels:  {}", state.tunnels.len());
    match state.logging_level {
        Some(level) => println!("  logging:  {level}"),
        None => println!("  logging:  (unchanged)"),
    }

    for channel in &state.channels {
        println!(
            "  channel {} \"{}\": {} in, {} out, buffer {} ms",
            channel.channel_id,
            channel.description,
            channel.inputs.len(),
            channel.outputs.len(),
            channel.buffer_duration_ms
        );
    }

    let problems = state_file::problems(&state);
    if problems.is_empty() {
        return Ok(());
    }
    for problem in &problems {
        eprintln!("  problem: {problem}");
    }
    Err(CliError::State(format!("{} problem(s) found", problems.len())).into())
}
