//! # artmap
//!
//! A pannable, zoomable scatter plot of artwork thumbnails:
//! - Thousands of points pre-rendered into multi-resolution bitmap tiers
//! - Pan/zoom with redraw suppression for insignificant changes
//! - Tolerant click resolution against dense, small targets
//! - A detail view backed by artist metadata
//!
//! ## Architecture
//!
//! artmap is organized as a workspace with multiple crates:
//!
//! 1. **artmap-core** - Errors, geometry, point/artist records, event bus
//! 2. **artmap-settings** - Viewer configuration (TOML/JSON)
//! 3. **artmap-viewer** - Projection, bitmap cache, transforms, hit testing, state machine
//! 4. **artmap** - Headless binary that integrates all crates

pub mod cli;

pub use artmap_core::{
    decode_points, ArtistRecord, BoundsBox, DataError, Error, EventBus, EventCategory,
    EventFilter, ImageError, PointRecord, RenderError, Result, Size, TierId, Transform,
    ViewError, ViewerEvent, ViewportRect,
};

pub use artmap_settings::{Config, SettingsError, TieBreak};

pub use artmap_viewer::{
    DetailFields, DetailPanel, FsImageLoader, FsPointSource, Hit, ImageLoader, LoggingPanel,
    PointSource, ViewState, ViewerSession,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Console output with pretty formatting
/// - RUST_LOG environment variable support
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_line_number(true)
        .pretty();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
