use std::future::Future;

use anyhow::Result;
use clap::Parser;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::cli::args::{Args, Commands};
use crate::cli::commands::{
    run_analyze_command, run_payload_command, run_pipeline_command, run_report_command, run_serve_command,
};
use crate::config::SolsentryConfig;

/// A one-shot command was stopped by Ctrl-C.
#[derive(Debug, Error)]
#[error("Interrupted by user")]
pub struct Interrupted;

pub struct RootCommand;

impl RootCommand {
    pub async fn execute() -> Result<()> {
        let args = Args::parse();

        if args.generate_config {
            println!("{}", SolsentryConfig::generate_default_config());
            return Ok(());
        }

        let serving = matches!(args.command, Some(Commands::Serve { .. }));
        init_tracing(args.verbosity, serving);

        let Some(command) = &args.command else {
            eprintln!("No command given; see `solsentry --help`");
            return Ok(());
        };

        if let Commands::Payload { file } = command {
            return run_payload_command(file);
        }

        let env_vars: std::collections::HashMap<String, String> = std::env::vars().collect();
        let config = SolsentryConfig::load_with_precedence(args.config.as_deref(), &args.overrides(), &env_vars)?;
        tracing::debug!("Effective configuration: {:?}", config);

        // actix installs its own signal handlers and shuts down gracefully.
        if let Commands::Serve { .. } = command {
            return run_serve_command(config).await;
        }

        let task = async {
            match command {
                Commands::Analyze { files, concurrency } => {
                    run_analyze_command(config, files.clone(), *concurrency).await
                }
                Commands::Report { input } => run_report_command(config, input).await,
                Commands::Run { files, concurrency } => {
                    run_pipeline_command(config, files.clone(), *concurrency).await
                }
                Commands::Serve { .. } | Commands::Payload { .. } => Ok(()),
            }
        };
        run_until_interrupted(task, ctrl_c()).await
    }
}

/// Drive `task` until it completes or `interrupt` fires.
///
/// On interrupt the task is dropped before this returns, which removes its
/// scratch files and kills any analyzer still running.
pub(crate) async fn run_until_interrupted<F, I>(task: F, interrupt: I) -> Result<()>
where
    F: Future<Output = Result<()>>,
    I: Future<Output = ()>,
{
    tokio::select! {
        result = task => result,
        _ = interrupt => Err(Interrupted.into()),
    }
}

/// Resolves on Ctrl-C; never resolves if the handler cannot be installed.
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

/// `RUST_LOG` wins; otherwise the level follows `-v`. The server logs at
/// info by default, one-shot commands only warn.
fn init_tracing(verbosity: u8, serving: bool) {
    let level = match (verbosity, serving) {
        (0, false) => "warn",
        (0, true) | (1, _) => "info",
        (2, _) => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{level},actix_server=warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
