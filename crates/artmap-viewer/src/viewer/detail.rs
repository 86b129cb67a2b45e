//! Detail panel contents.

use artmap_core::{ArtistRecord, PointRecord};
use serde::Serialize;

use super::raster::Thumbnail;

/// The named text fields shown in the detail panel.
///
/// Missing values are empty strings, never errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DetailFields {
    pub bio: String,
    pub genre: String,
    pub name: String,
    pub nationality: String,
    pub paintings: String,
    pub wikipedia: String,
    pub years: String,
}

impl DetailFields {
    /// Field names in display order.
    pub const NAMES: [&'static str; 7] = [
        "bio",
        "genre",
        "name",
        "nationality",
        "paintings",
        "wikipedia",
        "years",
    ];

    pub fn from_artist(artist: Option<&ArtistRecord>) -> Self {
        let Some(artist) = artist else {
            return Self::default();
        };
        let text = |value: &Option<String>| value.clone().unwrap_or_default();
        Self {
            bio: text(&artist.bio),
            genre: text(&artist.genre),
            name: artist.name.clone(),
            nationality: text(&artist.nationality),
            paintings: text(&artist.paintings),
            wikipedia: text(&artist.wikipedia),
            years: text(&artist.years),
        }
    }

    /// Looks a field up by name.
    pub fn get(&self, name: &str) -> Option<&str> {
        let value = match name {
            "bio" => &self.bio,
            "genre" => &self.genre,
            "name" => &self.name,
            "nationality" => &self.nationality,
            "paintings" => &self.paintings,
            "wikipedia" => &self.wikipedia,
            "years" => &self.years,
            _ => return None,
        };
        Some(value.as_str())
    }

    /// `(name, value)` pairs in display order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        Self::NAMES
            .iter()
            .filter_map(move |name| self.get(name).map(|value| (*name, value)))
    }
}

/// The host's detail panel.
///
/// Calls arrive in order: `show`, then either `populate` or `show_error`,
/// then eventually `hide`. `show` may be called again to re-target an open
/// panel. The image hooks are independent of the text fields: exactly one
/// of `show_image` or `show_image_error` follows each `show`.
pub trait DetailPanel: Send {
    /// Opens the panel for `record`.
    fn show(&mut self, record: &PointRecord);

    /// Fills the text fields.
    fn populate(&mut self, fields: &DetailFields);

    /// Shows the selected point's resized image.
    fn show_image(&mut self, _image: &Thumbnail) {}

    /// Shows a message where the resized image would go.
    fn show_image_error(&mut self, _message: &str) {}

    /// Shows an inline error in place of the fields.
    fn show_error(&mut self, message: &str);

    fn hide(&mut self);
}

/// A panel that only logs, for headless hosts.
#[derive(Debug, Default)]
pub struct LoggingPanel {
    visible: bool,
}

impl LoggingPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

impl DetailPanel for LoggingPanel {
    fn show(&mut self, record: &PointRecord) {
        self.visible = true;
        tracing::info!("Detail: {} by {}", record.filename, record.artist);
    }

    fn populate(&mut self, fields: &DetailFields) {
        for (name, value) in fields.iter().filter(|(_, v)| !v.is_empty()) {
            tracing::info!("  {}: {}", name, value);
        }
    }

    fn show_image(&mut self, image: &Thumbnail) {
        tracing::debug!("  image: {}x{}", image.width(), image.height());
    }

    fn show_image_error(&mut self, message: &str) {
        tracing::warn!("  {}", message);
    }

    fn show_error(&mut self, message: &str) {
        tracing::warn!("Detail unavailable: {}", message);
    }

    fn hide(&mut self) {
        self.visible = false;
    }
}
