//! Session points: a record, its thumbnail and its per-tier bounds.

use artmap_core::{BoundsBox, PointRecord, TierBounds, TierId};

use super::raster::Thumbnail;

/// A plotted point.
///
/// Bounds are only written by the bitmap cache, one whole tier at a time.
#[derive(Debug, Clone)]
pub struct Point {
    record: PointRecord,
    thumbnail: Option<Thumbnail>,
    bounds: TierBounds,
}

impl Point {
    /// A point with no thumbnail and no bounds yet.
    pub fn new(record: PointRecord) -> Self {
        Self {
            record,
            thumbnail: None,
            bounds: TierBounds::default(),
        }
    }

    /// Attaches a loaded thumbnail.
    pub fn with_thumbnail(mut self, thumbnail: Option<Thumbnail>) -> Self {
        self.thumbnail = thumbnail;
        self
    }

    /// Sets bounds for one tier, for building fixtures by hand.
    pub fn with_bounds(mut self, tier: TierId, bounds: BoundsBox) -> Self {
        self.bounds.replace(tier, Some(bounds));
        self
    }

    pub fn record(&self) -> &PointRecord {
        &self.record
    }

    pub fn filename(&self) -> &str {
        &self.record.filename
    }

    pub fn artist(&self) -> &str {
        &self.record.artist
    }

    pub fn thumbnail(&self) -> Option<&Thumbnail> {
        self.thumbnail.as_ref()
    }

    /// Bounds in `tier`'s pixel space, if that tier drew this point.
    pub fn bounds(&self, tier: TierId) -> Option<&BoundsBox> {
        self.bounds.get(tier)
    }

    pub(crate) fn set_thumbnail(&mut self, thumbnail: Thumbnail) {
        self.thumbnail = Some(thumbnail);
    }

    pub(crate) fn replace_bounds(&mut self, tier: TierId, bounds: Option<BoundsBox>) {
        self.bounds.replace(tier, bounds);
    }
}
