//! artmap Settings Crate
//!
//! Handles viewer configuration: tiers, zoom extent, hit testing and
//! rendering options.

pub mod config;
pub mod error;

pub use config::{
    Config, HitTestSettings, RenderSettings, TieBreak, TierSettings, TiersSettings,
    ViewerSettings, ZoomSettings, MAX_RASTER_DIMENSION,
};
pub use error::{ConfigError, ConfigResult, SettingsError, SettingsResult};
