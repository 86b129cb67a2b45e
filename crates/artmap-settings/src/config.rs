//! Configuration for the artmap viewer
//!
//! Provides configuration file handling and validation. Supports JSON and
//! TOML files, chosen by extension.
//!
//! Configuration is organized into logical sections:
//! - Viewer settings (viewport size, data location, projection, point limit)
//! - Tier settings (raster sizes and margins per resolution tier)
//! - Render settings (icon size, centre markers)
//! - Zoom settings (scale extent, redraw thresholds, wheel sensitivity)
//! - Hit-test settings (tolerance sequence, fallback radius, tie-break)

use artmap_core::{ProjectionKind, Size, TierId};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, SettingsError, SettingsResult};

/// Largest raster side the platform can allocate.
pub const MAX_RASTER_DIMENSION: u32 = 16384;

/// Viewer host settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerSettings {
    /// Initial visible surface width in pixels
    pub viewport_width: u32,
    /// Initial visible surface height in pixels
    pub viewport_height: u32,
    /// Directory holding points.json, artists.json, thumbnails/ and resized/
    pub data_dir: PathBuf,
    /// Which precomputed projection to plot
    pub projection: ProjectionKind,
    /// Keep only the first N fetched points
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_points: Option<usize>,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            viewport_width: 1280,
            viewport_height: 800,
            data_dir: PathBuf::from("data"),
            projection: ProjectionKind::default(),
            max_points: None,
        }
    }
}

impl ViewerSettings {
    /// The configured viewport size.
    pub fn viewport(&self) -> Size {
        Size::new(
            f64::from(self.viewport_width),
            f64::from(self.viewport_height),
        )
    }
}

/// One resolution tier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierSettings {
    /// Raster width in pixels
    pub width: u32,
    /// Raster height in pixels
    pub height: u32,
    /// Margin kept clear around the plotted points
    pub margin: f64,
}

impl TierSettings {
    /// The tier's raster size.
    pub fn size(&self) -> Size {
        Size::new(f64::from(self.width), f64::from(self.height))
    }
}

/// Resolution tiers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TiersSettings {
    /// Upper bound for any raster side
    pub max_raster_dimension: u32,
    /// Overview tier
    pub full: TierSettings,
    /// Tier used while the detail panel is open
    pub half: TierSettings,
}

impl Default for TiersSettings {
    fn default() -> Self {
        Self {
            max_raster_dimension: MAX_RASTER_DIMENSION,
            full: TierSettings {
                width: 8192,
                height: 8192,
                margin: 40.0,
            },
            half: TierSettings {
                width: 4096,
                height: 8192,
                margin: 40.0,
            },
        }
    }
}

impl TiersSettings {
    /// Settings for `tier`.
    pub fn get(&self, tier: TierId) -> &TierSettings {
        match tier {
            TierId::Full => &self.full,
            TierId::Half => &self.half,
        }
    }
}

/// Rasterization settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Side of each thumbnail icon in tier pixels
    pub icon_size: f64,
    /// Draw a marker dot at each point centre
    pub center_markers: bool,
    /// Marker dot radius in tier pixels
    pub marker_radius: f32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            icon_size: 80.0,
            center_markers: false,
            marker_radius: 2.0,
        }
    }
}

/// Zoom and redraw settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomSettings {
    /// Smallest allowed scale
    pub min_scale: f64,
    /// Largest allowed scale
    pub max_scale: f64,
    /// Translation change below which a redraw is skipped
    pub min_translate_delta: f64,
    /// Scale change below which a redraw is skipped
    pub min_scale_delta: f64,
    /// Wheel delta multiplier (zoom factor is `2^(-delta * sensitivity)`)
    pub wheel_sensitivity: f64,
}

impl Default for ZoomSettings {
    fn default() -> Self {
        Self {
            min_scale: 0.01,
            max_scale: 20.0,
            min_translate_delta: 1.0,
            min_scale_delta: 0.01,
            wheel_sensitivity: 0.002,
        }
    }
}

/// Rule used when several points match at the same tolerance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// First match in point list order
    FirstMatch,
    /// Closest box centre; list order on equal distance
    #[default]
    NearestCenter,
}

/// Hit-test settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HitTestSettings {
    /// Increasing box expansions tried in order
    pub tolerances: Vec<f64>,
    /// Maximum centre distance for the nearest-point fallback
    pub fallback_radius: f64,
    /// Tie-break rule
    pub tie_break: TieBreak,
}

impl Default for HitTestSettings {
    fn default() -> Self {
        Self {
            tolerances: vec![20.0, 40.0, 60.0, 80.0, 100.0],
            fallback_radius: 150.0,
            tie_break: TieBreak::default(),
        }
    }
}

/// Complete viewer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Host settings
    pub viewer: ViewerSettings,
    /// Resolution tiers
    pub tiers: TiersSettings,
    /// Rasterization
    pub render: RenderSettings,
    /// Zoom and redraw
    pub zoom: ZoomSettings,
    /// Hit testing
    pub hit_test: HitTestSettings,
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Default config file location (`<config dir>/artmap/config.toml`)
    pub fn default_path() -> SettingsResult<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("artmap").join("config.toml"))
            .ok_or_else(|| {
                ConfigError::UnsupportedPlatform(std::env::consts::OS.to_string()).into()
            })
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = Format::from_path(path)?;
        let content = std::fs::read_to_string(path)
            .map_err(|e| SettingsError::LoadError(format!("{}: {}", path.display(), e)))?;

        let config: Self = match format {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };

        config.validate()?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load config from `path` when it exists, otherwise use defaults
    pub fn load_or_default(path: &Path) -> SettingsResult<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match Format::from_path(path)? {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)
            .map_err(|e| SettingsError::SaveError(format!("{}: {}", path.display(), e)))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> SettingsResult<()> {
        if self.viewer.viewport_width == 0 || self.viewer.viewport_height == 0 {
            return Err(SettingsError::invalid(
                "viewer.viewport",
                "dimensions must be > 0",
            ));
        }

        let max = self.tiers.max_raster_dimension;
        if max == 0 {
            return Err(SettingsError::invalid(
                "tiers.max_raster_dimension",
                "must be > 0",
            ));
        }
        for tier in TierId::ALL {
            let settings = self.tiers.get(tier);
            let key = format!("tiers.{}", tier);
            if settings.width == 0 || settings.height == 0 {
                return Err(SettingsError::invalid(&key, "dimensions must be > 0"));
            }
            if settings.width > max || settings.height > max {
                return Err(SettingsError::invalid(
                    &key,
                    format!("exceeds max raster dimension {}", max),
                ));
            }
            if !settings.margin.is_finite() || settings.margin < 0.0 {
                return Err(SettingsError::invalid(&key, "margin must be >= 0"));
            }
            if 2.0 * settings.margin >= f64::from(settings.width.min(settings.height)) {
                return Err(SettingsError::invalid(&key, "margin leaves no drawing area"));
            }
        }

        if !self.render.icon_size.is_finite() || self.render.icon_size <= 0.0 {
            return Err(SettingsError::invalid("render.icon_size", "must be > 0"));
        }
        if !(self.render.marker_radius > 0.0 && self.render.marker_radius.is_finite()) {
            return Err(SettingsError::invalid("render.marker_radius", "must be > 0"));
        }

        let zoom = &self.zoom;
        if !(zoom.min_scale > 0.0 && zoom.min_scale.is_finite()) {
            return Err(SettingsError::invalid("zoom.min_scale", "must be > 0"));
        }
        if !(zoom.max_scale >= zoom.min_scale && zoom.max_scale.is_finite()) {
            return Err(SettingsError::invalid(
                "zoom.max_scale",
                "must be >= zoom.min_scale",
            ));
        }
        for (key, delta) in [
            ("zoom.min_translate_delta", zoom.min_translate_delta),
            ("zoom.min_scale_delta", zoom.min_scale_delta),
        ] {
            if !(delta >= 0.0 && delta.is_finite()) {
                return Err(SettingsError::invalid(key, "redraw thresholds must be >= 0"));
            }
        }
        if !(zoom.wheel_sensitivity > 0.0 && zoom.wheel_sensitivity.is_finite()) {
            return Err(SettingsError::invalid("zoom.wheel_sensitivity", "must be > 0"));
        }

        let hit = &self.hit_test;
        if hit.tolerances.is_empty() {
            return Err(SettingsError::invalid(
                "hit_test.tolerances",
                "at least one tolerance is required",
            ));
        }
        if hit.tolerances.iter().any(|t| !t.is_finite() || *t < 0.0) {
            return Err(SettingsError::invalid(
                "hit_test.tolerances",
                "tolerances must be >= 0",
            ));
        }
        if hit.tolerances.windows(2).any(|w| w[1] <= w[0]) {
            return Err(SettingsError::invalid(
                "hit_test.tolerances",
                "tolerances must be strictly increasing",
            ));
        }
        if !hit.fallback_radius.is_finite() || hit.fallback_radius < 0.0 {
            return Err(SettingsError::invalid(
                "hit_test.fallback_radius",
                "must be >= 0",
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
enum Format {
    Json,
    Toml,
}

impl Format {
    fn from_path(path: &Path) -> SettingsResult<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(Format::Json),
            Some("toml") => Ok(Format::Toml),
            other => Err(ConfigError::UnsupportedFormat(other.unwrap_or("none").to_string()).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = Config::new();
        assert!(config.validate().is_ok());
        assert_eq!(config.render.icon_size, 80.0);
        assert_eq!(config.tiers.full.margin, 40.0);
        assert_eq!(config.zoom.min_scale, 0.01);
        assert_eq!(config.zoom.max_scale, 20.0);
        assert_eq!(config.hit_test.fallback_radius, 150.0);
        assert_eq!(config.hit_test.tie_break, TieBreak::NearestCenter);
    }

    #[test]
    fn test_half_tier_is_narrower() {
        let tiers = TiersSettings::default();
        assert_eq!(tiers.get(TierId::Half).width * 2, tiers.get(TierId::Full).width);
        assert_eq!(tiers.get(TierId::Half).height, tiers.get(TierId::Full).height);
    }

    #[test]
    fn test_validate_rejects_oversized_tier() {
        let mut config = Config::new();
        config.tiers.full.width = MAX_RASTER_DIMENSION + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_zoom_extent() {
        let mut config = Config::new();
        config.zoom.min_scale = 5.0;
        config.zoom.max_scale = 1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_non_finite_zoom_and_marker_values() {
        let mut config = Config::new();
        config.zoom.min_translate_delta = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = Config::new();
        config.zoom.min_scale_delta = f64::INFINITY;
        assert!(config.validate().is_err());

        let mut config = Config::new();
        config.zoom.wheel_sensitivity = f64::NAN;
        assert!(config.validate().is_err());
        config.zoom.wheel_sensitivity = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::new();
        config.render.marker_radius = f32::NAN;
        assert!(config.validate().is_err());
        config.render.marker_radius = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_unordered_tolerances() {
        let mut config = Config::new();
        config.hit_test.tolerances = vec![20.0, 20.0, 40.0];
        assert!(config.validate().is_err());

        config.hit_test.tolerances.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_margin_larger_than_tier() {
        let mut config = Config::new();
        config.tiers.half.margin = 5000.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [render]
            icon_size = 64.0

            [hit_test]
            tie_break = "first_match"
            "#,
        )
        .expect("parses");
        assert_eq!(config.render.icon_size, 64.0);
        assert_eq!(config.hit_test.tie_break, TieBreak::FirstMatch);
        assert_eq!(config.hit_test.tolerances.len(), 5);
        assert_eq!(config.tiers, TiersSettings::default());
    }

    #[test]
    fn test_unsupported_extension() {
        let err = Config::load_from_file(Path::new("config.yaml")).expect_err("yaml unsupported");
        assert!(matches!(
            err,
            SettingsError::Config(ConfigError::UnsupportedFormat(_))
        ));
    }
}
