//! Headless artmap host.
//!
//! ```text
//! artmap [--config FILE] [--data-dir DIR] [--output PNG] [--click X Y]
//! ```
//!
//! Loads the points in the data directory, builds the bitmap tiers, optionally
//! simulates a click, and writes the visible surface to the output PNG.

use std::sync::Arc;

use anyhow::Context;
use artmap::cli::Cli;
use artmap::{init_logging, Config, FsImageLoader, FsPointSource, LoggingPanel, ViewerSession};
use clap::Parser;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    init_logging()?;
    info!("artmap {} (built {})", artmap::VERSION, artmap::BUILD_DATE);

    let mut config = match &args.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::load_or_default(&Config::default_path()?)?,
    };
    if let Some(dir) = &args.data_dir {
        config.viewer.data_dir = dir.clone();
    }
    let data_dir = config.viewer.data_dir.clone();
    let projection = config.viewer.projection;

    let mut session = ViewerSession::new(
        config,
        Arc::new(FsPointSource::from_dir_with_projection(&data_dir, projection)),
        Arc::new(FsImageLoader::new(&data_dir)),
        Box::new(LoggingPanel::new()),
    )?;
    session
        .start()
        .await
        .with_context(|| format!("failed to load {}", data_dir.display()))?;

    if let Some((x, y)) = args.click_position() {
        match session.click(x, y).await {
            Some(hit) => info!("Clicked point #{} ({:?})", hit.index, hit.kind),
            None => info!("Click at ({}, {}) hit nothing", x, y),
        }
    }

    session.surface().save(&args.output)?;
    info!("Wrote {} in state {}", args.output.display(), session.state());

    session.teardown().await;
    Ok(())
}
