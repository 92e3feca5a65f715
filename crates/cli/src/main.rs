use anyhow::Result;
use persistence::repositories::ClientRepository;
use tracing::info;

mod config;
mod demo;
mod logging;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = config::Config::load()?;

    logging::init_logging(&config.logging);

    info!("Starting Client Manager v{}", env!("CARGO_PKG_VERSION"));

    let mut repo = ClientRepository::connect(&config.database).await?;
    info!(host = %config.database.host, database = %config.database.database, "Connected");

    // Close the connection even if the demonstration fails midway.
    let outcome = demo::run(&mut repo, config.output.format).await;
    let closed = repo.close().await;
    outcome?;
    closed?;

    info!("Done");
    Ok(())
}
