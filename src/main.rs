use listing_ingest::config::{Config, CONFIG_EXIT_CODE};
use listing_ingest::helpers::http_client;
use listing_ingest::homeharvest::HomeHarvest;
use listing_ingest::ingest::IngestClient;
use listing_ingest::pipeline::Pipeline;
use listing_ingest::presets::load_presets;
use tracing::{error, info};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // install global collector configured based on RUST_LOG env var.
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            std::process::exit(CONFIG_EXIT_CODE);
        }
    };

    let client = http_client()?;
    let presets = load_presets(&config, &client).await?;

    let scraper = HomeHarvest::new(config.python_bin.clone());
    let sink = IngestClient::from_config(client, &config);

    let summary = Pipeline::new(&scraper, &sink, &config.source)
        .run(&presets)
        .await?;

    info!(
        "Run started {} finished {} presets",
        summary.started_at.format("%Y-%m-%d %H:%M:%S"),
        summary.presets
    );
    println!("DONE: {}", summary.totals);

    Ok(())
}
