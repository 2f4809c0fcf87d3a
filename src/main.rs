use analyst_agent::utils::{logger, validation::Validate};
use analyst_agent::{server, Analyst, CliConfig};
use clap::Parser;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    logger::init_cli_logger(config.verbose);

    tracing::info!("🚀 Starting analyst-agent API");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }

    let analyst = Arc::new(Analyst::new(config.films_url.clone()));
    let app = server::router(analyst);

    tracing::info!("🎯 API endpoints:");
    tracing::info!("   POST {}:{}/api/", config.host, config.port);
    tracing::info!("   GET  {}:{}/health", config.host, config.port);

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    tracing::info!("📡 Server listening on {}:{}", config.host, config.port);
    axum::serve(listener, app).await?;

    Ok(())
}
