use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use sportradar_etl::config::AppConfig;
use sportradar_etl::db::Store;
use sportradar_etl::etl::Pipeline;
use sportradar_etl::fetch::ApiClient;
use sportradar_etl::logging;

/// Fetch Sportradar tennis data and load it into the reporting database.
#[derive(Parser)]
#[command(name = "sportradar-etl", version, about)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "config/default.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let (config, secrets) = AppConfig::load(&cli.config)?;

    logging::init(&config.logging)?;

    // refuse to run on placeholder credentials, before any network or
    // storage activity
    let api_key = match config.validate(&secrets) {
        Ok(key) => key,
        Err(e) => {
            tracing::error!(error = %e, "Configuration invalid. Exiting.");
            return Ok(ExitCode::FAILURE);
        }
    };

    tracing::info!(
        base_url = %config.api.base_url,
        database = %config.database.path,
        "Sportradar ETL starting"
    );

    let store = Store::new(&config.database).await?;
    let client = ApiClient::new(&config.api, config.retry.clone(), api_key)?;

    let pipeline = Pipeline::new(client, store);
    let report = pipeline.run_cycle().await;

    tracing::info!(
        rows = report.rows_written(),
        failed_groups = report.failed_groups(),
        duration_ms = report.duration_ms,
        "ETL completed"
    );

    // per-group failures are visible in the log, not the exit status
    Ok(ExitCode::SUCCESS)
}
