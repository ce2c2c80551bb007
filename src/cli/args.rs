use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use solsentry_analyzer::MessagePolicy;

use crate::config::ConfigOverrides;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about,
    long_about = None
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbosity: u8,

    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Prompt language ("en" or "id")
    #[arg(long, global = true)]
    pub language: Option<String>,

    /// Analyzer executable
    #[arg(long, global = true)]
    pub analyzer_path: Option<PathBuf>,

    /// Analyzer timeout in seconds
    #[arg(long, global = true)]
    pub analyzer_timeout: Option<u64>,

    /// "first-line" or "full-text"
    #[arg(long, global = true)]
    pub message_policy: Option<MessagePolicy>,

    #[arg(short, long, global = true)]
    pub model: Option<String>,

    #[arg(long, global = true)]
    pub api_base_url: Option<String>,

    /// Save raw analyzer and model output under this directory
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    /// Print a default configuration file and exit
    #[arg(long)]
    pub generate_config: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP service
    Serve {
        #[arg(long)]
        host: Option<String>,

        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Run the static analyzer on Solidity files and print the issues
    Analyze {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Files analyzed at once
        #[arg(long, default_value = "4")]
        concurrency: usize,
    },

    /// Synthesize a report from an issues JSON file ("-" reads stdin)
    Report { input: PathBuf },

    /// Analyze Solidity files and synthesize a report for each
    Run {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Files processed at once
        #[arg(long, default_value = "4")]
        concurrency: usize,
    },

    /// Print the `{source_code}` request body for a Solidity file
    Payload { file: PathBuf },
}

impl Args {
    pub fn overrides(&self) -> ConfigOverrides {
        let (host, port) = match &self.command {
            Some(Commands::Serve { host, port }) => (host.clone(), *port),
            _ => (None, None),
        };

        ConfigOverrides {
            language: self.language.clone(),
            analyzer_path: self.analyzer_path.clone(),
            analyzer_timeout: self.analyzer_timeout,
            message_policy: self.message_policy,
            model: self.model.clone(),
            api_base_url: self.api_base_url.clone(),
            host,
            port,
            log_dir: self.log_dir.clone(),
        }
    }
}

pub fn validate_files(files: &[PathBuf], concurrency: usize) -> Result<()> {
    if concurrency == 0 {
        bail!("--concurrency must be at least 1");
    }
    for file in files {
        if !file.is_file() {
            bail!("Input file not found: {}", file.display());
        }
    }
    Ok(())
}
