//! CLI entry point - the composition root.

use std::process::ExitCode;
use std::time::Duration;

use clap::{CommandFactory, Parser};

use ztvctl_cli::error::exit_code_for;
use ztvctl_cli::{Cli, CliConfig, Commands, bootstrap, handlers, init_tracing};

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables before clap reads ZTV_PATH and friends
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match dispatch(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(exit_code_for(&e))
        }
    }
}

async fn dispatch(cli: Cli) -> anyhow::Result<()> {
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let mut config = CliConfig {
        worker_path: cli.worker,
        poll_interval: None,
    };

    match command {
        Commands::Run {
            state,
            poll_ms,
            worker_log_level,
        } => {
            config.poll_interval = Some(Duration::from_millis(poll_ms.max(1)));
            let ctx = bootstrap(&config);
            handlers::run::execute(&ctx, state.as_deref(), worker_log_level).await?;
        }
        Commands::Check => {
            let ctx = bootstrap(&config);
            handlers::check::execute(&ctx).await?;
        }
        Commands::ValidateState { path } => {
            handlers::validate::execute(&path)?;
        }
    }
    Ok(())
}
