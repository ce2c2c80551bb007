use anyhow::Result;
use tracing::{info, warn};

use crate::config::SolsentryConfig;
use crate::pipeline::Pipeline;
use crate::server::run_server;

pub async fn run_serve_command(config: SolsentryConfig) -> Result<()> {
    if config.llm_config().api_key.is_none() {
        warn!("GEMINI_API_KEY is not set; report endpoints will fail until it is configured");
    }
    info!(
        "Analyzer: {} (timeout {}s), model: {}, language: {}",
        config.analyzer.path.display(),
        config.analyzer.timeout_secs,
        config.llm.model,
        config.language()
    );

    let pipeline = Pipeline::from_config(&config)?;
    run_server(&config.server, pipeline).await?;
    Ok(())
}
