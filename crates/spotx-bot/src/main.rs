//! spotx - Entry Point

use anyhow::Result;
use clap::Parser;
use tracing::info;

use spotx_bot::{AppConfig, Application, Args};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config first: it carries the logging section.
    let config = AppConfig::load(args.config.as_deref())?;
    spotx_telemetry::init_logging(&config.logging)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        base_url = %config.gateway.base_url,
        "Starting spotx"
    );

    let app = Application::new(&config)?;
    let output = app.run(args.command).await?;
    println!("{output}");

    Ok(())
}
