//! Per-tier bitmap cache.
//!
//! Every tier is rasterized once onto a single shared off-screen raster,
//! which is resized for each tier in turn and moved into an immutable
//! [`Bitmap`]. Once all tiers are captured the raster goes back to the
//! viewport size.

use artmap_core::{BoundsBox, RenderError, Size, TierId};
use artmap_settings::{RenderSettings, TierSettings, TiersSettings};
use tiny_skia::{Color, FillRule, FilterQuality, Paint, PathBuilder, Pixmap, PixmapPaint};
use tracing::{debug, info, trace, warn};

use super::point::Point;
use super::projection::{Extent, ProjectionScale};
use super::raster::Bitmap;

/// Result of rasterizing one tier.
#[derive(Debug, Clone)]
pub struct TierBuild {
    pub tier: TierId,
    pub bitmap: Bitmap,
    pub scale: ProjectionScale,
    /// Bounds per point, in input order; `None` for skipped points.
    pub bounds: Vec<Option<BoundsBox>>,
    pub drawn: usize,
    pub skipped: usize,
}

/// Draw statistics for one captured tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierSummary {
    pub tier: TierId,
    pub drawn: usize,
    pub skipped: usize,
}

/// A captured tier: its bitmap and the scale it was drawn with.
#[derive(Debug, Clone)]
pub struct CachedTier {
    pub bitmap: Bitmap,
    pub scale: ProjectionScale,
}

#[derive(Debug)]
pub struct BitmapCache {
    raster: Pixmap,
    max_dimension: u32,
    icon_size: f64,
    marker_radius: Option<f32>,
    tiers: [Option<CachedTier>; 2],
    generation: u64,
}

fn slot(tier: TierId) -> usize {
    match tier {
        TierId::Full => 0,
        TierId::Half => 1,
    }
}

fn marker_color() -> Color {
    Color::from_rgba8(255, 0, 0, 255)
}

impl BitmapCache {
    /// Creates a cache whose shared raster starts at the viewport size.
    pub fn new(
        viewport: Size,
        render: &RenderSettings,
        max_dimension: u32,
    ) -> Result<Self, RenderError> {
        let (width, height) = Self::viewport_raster_size(viewport, max_dimension)?;
        Ok(Self {
            raster: Self::allocate(width, height)?,
            max_dimension,
            icon_size: render.icon_size,
            marker_radius: render.center_markers.then_some(render.marker_radius),
            tiers: [None, None],
            generation: 0,
        })
    }

    fn allocate(width: u32, height: u32) -> Result<Pixmap, RenderError> {
        Pixmap::new(width, height).ok_or(RenderError::RasterAllocation { width, height })
    }

    fn viewport_raster_size(viewport: Size, max_dimension: u32) -> Result<(u32, u32), RenderError> {
        if !viewport.is_valid() {
            return Err(RenderError::InvalidSize {
                what: "viewport".to_string(),
                width: viewport.width,
                height: viewport.height,
            });
        }
        let clamp = |v: f64| (v.ceil() as u32).clamp(1, max_dimension.max(1));
        Ok((clamp(viewport.width), clamp(viewport.height)))
    }

    /// Resizes (or just clears) the shared raster.
    fn resize_raster(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        if self.raster.width() == width && self.raster.height() == height {
            self.raster.fill(Color::TRANSPARENT);
        } else {
            self.raster = Self::allocate(width, height)?;
        }
        Ok(())
    }

    /// Rasterizes `points` for one tier.
    ///
    /// Points without a thumbnail are skipped and get no bounds. The shared
    /// raster is left at the tier size; call [`reset_raster`](Self::reset_raster)
    /// when done.
    pub fn build(
        &mut self,
        points: &[Point],
        tier: TierId,
        settings: &TierSettings,
    ) -> Result<TierBuild, RenderError> {
        let width = settings.width.min(self.max_dimension);
        let height = settings.height.min(self.max_dimension);
        if (width, height) != (settings.width, settings.height) {
            warn!(
                "{} tier {}x{} clamped to {}x{}",
                tier, settings.width, settings.height, width, height
            );
        }
        self.resize_raster(width, height)?;

        let output = Size::new(f64::from(width), f64::from(height));
        let extent = Extent::from_coords(points.iter().map(|p| (p.record().x, p.record().y)));
        let scale = ProjectionScale::fit(extent, output, settings.margin)?;

        debug!(
            "Building {} tier {}x{} from {} points",
            tier,
            width,
            height,
            points.len()
        );

        let icon = self.icon_size;
        let paint = PixmapPaint {
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        };
        let mut bounds = Vec::with_capacity(points.len());
        let mut drawn = 0;

        for point in points {
            let Some(thumb) = point.thumbnail() else {
                trace!("Skipping {} (no thumbnail)", point.filename());
                bounds.push(None);
                continue;
            };

            let (cx, cy) = scale.data_to_pixel(point.record().x, point.record().y);
            let b = BoundsBox::centered(cx, cy, icon, icon);
            let transform = tiny_skia::Transform::from_scale(
                (icon / f64::from(thumb.width())) as f32,
                (icon / f64::from(thumb.height())) as f32,
            )
            .post_translate(b.x as f32, b.y as f32);
            self.raster
                .draw_pixmap(0, 0, thumb.as_pixmap(), &paint, transform, None);

            bounds.push(Some(b));
            drawn += 1;
        }

        if let Some(radius) = self.marker_radius {
            self.draw_markers(&bounds, radius);
        }

        let skipped = points.len() - drawn;
        // The next resize_raster call reallocates from this placeholder
        let raster = std::mem::replace(&mut self.raster, Self::allocate(1, 1)?);
        Ok(TierBuild {
            tier,
            bitmap: Bitmap::from_raster(tier, raster),
            scale,
            bounds,
            drawn,
            skipped,
        })
    }

    fn draw_markers(&mut self, bounds: &[Option<BoundsBox>], radius: f32) {
        let mut paint = Paint::default();
        paint.set_color(marker_color());
        paint.anti_alias = true;

        let mut pb = PathBuilder::new();
        for (cx, cy) in bounds.iter().flatten().map(BoundsBox::center) {
            pb.push_circle(cx as f32, cy as f32, radius);
        }
        if let Some(path) = pb.finish() {
            self.raster.fill_path(
                &path,
                &paint,
                FillRule::Winding,
                tiny_skia::Transform::identity(),
                None,
            );
        }
    }

    /// Replaces every point's bounds for `tier` with the build result.
    pub fn attach_bounds(points: &mut [Point], build: &TierBuild) {
        for (point, bounds) in points.iter_mut().zip(build.bounds.iter()) {
            point.replace_bounds(build.tier, *bounds);
        }
    }

    /// Builds every tier in order, attaching bounds as each completes, then
    /// returns the raster to the viewport size.
    ///
    /// Tiers share one raster, so they are built strictly one after another.
    pub async fn build_all(
        &mut self,
        points: &mut [Point],
        tiers: &TiersSettings,
        viewport: Size,
    ) -> Result<Vec<TierSummary>, RenderError> {
        self.generation += 1;
        self.tiers = [None, None];
        let mut summaries = Vec::with_capacity(TierId::ALL.len());

        for tier in TierId::ALL {
            let build = self.build(points, tier, tiers.get(tier))?;
            Self::attach_bounds(points, &build);
            info!(
                "Captured {} tier ({} drawn, {} skipped)",
                tier, build.drawn, build.skipped
            );
            summaries.push(TierSummary {
                tier,
                drawn: build.drawn,
                skipped: build.skipped,
            });
            self.tiers[slot(tier)] = Some(CachedTier {
                bitmap: build.bitmap,
                scale: build.scale,
            });
            tokio::task::yield_now().await;
        }

        self.reset_raster(viewport)?;
        Ok(summaries)
    }

    /// Returns the shared raster to the viewport size.
    pub fn reset_raster(&mut self, viewport: Size) -> Result<(), RenderError> {
        let (width, height) = Self::viewport_raster_size(viewport, self.max_dimension)?;
        self.resize_raster(width, height)
    }

    /// The captured tier, if built.
    pub fn get(&self, tier: TierId) -> Option<&CachedTier> {
        self.tiers[slot(tier)].as_ref()
    }

    /// The captured tier, or `TierNotBuilt`.
    pub fn require(&self, tier: TierId) -> Result<&CachedTier, RenderError> {
        self.get(tier).ok_or_else(|| RenderError::TierNotBuilt {
            tier: tier.to_string(),
        })
    }

    pub fn bitmap(&self, tier: TierId) -> Option<&Bitmap> {
        self.get(tier).map(|t| &t.bitmap)
    }

    /// Whether every tier has been captured.
    pub fn is_complete(&self) -> bool {
        self.tiers.iter().all(Option::is_some)
    }

    /// Number of `build_all` runs started.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Current size of the shared raster.
    pub fn raster_size(&self) -> (u32, u32) {
        (self.raster.width(), self.raster.height())
    }
}
