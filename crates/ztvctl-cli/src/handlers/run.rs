//! Run command handler.
//!
//! Starts the worker, replays the saved state, then logs bit rates until
//! Ctrl-C. On the way out the live topology is written back to the state
//! file (or printed when there is none) and the worker is stopped.

use std::path::Path;
use std::pin::pin;
use std::sync::Arc;

use anyhow::Result;
use futures_util::StreamExt;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use ztvctl_core::{LogLevel, SavedState, WorkerEvent};
use ztvctl_runtime::TelemetryPoller;
use ztvctl_telemetry::{BitrateReport, format_bitrate};

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::state_file;

pub async fn execute(
    ctx: &CliContext,
    state_path: Option<&Path>,
    worker_log_level: Option<LogLevel>,
) -> Result<()> {
    let saved = match state_path {
        Some(path) if path.exists() => Some(state_file::load(path)?),
        Some(path) => {
            info!(path = %path.display(), "No saved state yet, starting empty");
            None
        }
        None => None,
    };

    let mut events = ctx.events.subscribe();
    ctx.controller.start(None).await.map_err(CliError::from)?;

    if let Err(e) = configure(ctx, saved, worker_log_level).await {
        let _ = ctx.controller.stop().await;
        return Err(e);
    }

    let cancel_token = CancellationToken::new();
    let poller = TelemetryPoller::new(
        Arc::clone(&ctx.controller),
        ctx.config().poll_interval,
        cancel_token.clone(),
    );
    let mut reports = pin!(poller.reports());

    let outcome = loop {
        tokio::select! {
            Some(report) = reports.next() => log_report(&report),
            event = events.recv() => match event {
                Ok(WorkerEvent::Stopped { code }) => {
                    break Err(CliError::Process(format!("Worker exited unexpectedly (code {code:?})")));
                }
                Ok(_) | Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => break Ok(()),
            },
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    warn!(error = %e, "Failed to listen for Ctrl-C");
                }
                info!("Interrupted, shutting down");
                break Ok(());
            }
        }
    };
    cancel_token.cancel();

    if outcome.is_ok() {
        let state = ctx.controller.export_state().await;
        match state_path {
            Some(path) => {
                state_file::save(path, &state)?;
                info!(path = %path.display(), channels = state.channels.len(), "State saved");
            }
            None => println!("{}", serde_json::to_string_pretty(&state)?),
        }
    }

    ctx.controller.stop().await.map_err(CliError::from)?;
    outcome?;
    Ok(())
}

async fn configure(
    ctx: &CliContext,
    saved: Option<SavedState>,
    worker_log_level: Option<LogLevel>,
) -> Result<()> {
    if let Some(state) = saved {
        ctx.controller
            .import_state(state)
            .await
            .map_err(CliError::from)?;
    }
    if let Some(level) = worker_log_level {
        ctx.controller
            .set_logging_level(level)
            .await
            .map_err(CliError::from)?;
    }
    Ok(())
}

fn log_report(report: &BitrateReport) {
    info!(
        input = %format_bitrate(report.total_input_bps, false),
        output = %format_bitrate(report.total_output_bps, false),
        channels = report.channels.len(),
        tunnels = report.tunnels.len(),
        "Bit rates"
    );
    for (channel_id, channel) in &report.channels {
        debug!(
            channel_id,
            input = %format_bitrate(channel.input_bps, true),
            output = %format_bitrate(channel.output_bps, true),
            "Channel bit rates"
        );
    }
    for (tunnel_id, tunnel) in &report.tunnels {
        debug!(
            tunnel_id,
            rx = %format_bitrate(tunnel.rx_bps, true),
            tx = %format_bitrate(tunnel.tx_bps, true),
            "Tunnel bit rates"
        );
    }
}
