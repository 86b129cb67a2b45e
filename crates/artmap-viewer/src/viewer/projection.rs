//! Data-space to pixel-space mapping.
//!
//! Both axes share one unit scale so the plot keeps its proportions:
//! `size = min(width, height) - 2 * margin`, the x range is
//! `[margin, margin + size * aspect]` and the y range is the flipped
//! `[margin + size, margin]`.

use artmap_core::{PointRecord, RenderError, Size};

/// Axis-aligned extent of the data coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Extent {
    /// A zero-sized extent at `(x, y)`.
    pub fn point(x: f64, y: f64) -> Self {
        Self {
            min_x: x,
            max_x: x,
            min_y: y,
            max_y: y,
        }
    }

    /// Grows the extent to include `(x, y)`.
    pub fn include(&mut self, x: f64, y: f64) {
        self.min_x = self.min_x.min(x);
        self.max_x = self.max_x.max(x);
        self.min_y = self.min_y.min(y);
        self.max_y = self.max_y.max(y);
    }

    /// Extent of a coordinate sequence; `None` when it is empty.
    pub fn from_coords<I>(coords: I) -> Option<Self>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let mut iter = coords.into_iter().filter(|(x, y)| x.is_finite() && y.is_finite());
        let (x, y) = iter.next()?;
        let mut extent = Self::point(x, y);
        for (x, y) in iter {
            extent.include(x, y);
        }
        Some(extent)
    }

    /// Extent of a slice of point records.
    pub fn from_records(records: &[PointRecord]) -> Option<Self> {
        Self::from_coords(records.iter().map(|r| (r.x, r.y)))
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Width over height, or 1 when either side is zero.
    pub fn aspect(&self) -> f64 {
        let (w, h) = (self.width(), self.height());
        if w > 0.0 && h > 0.0 {
            w / h
        } else {
            1.0
        }
    }
}

/// A monotonic linear map from a domain interval to a range interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    domain: (f64, f64),
    range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    pub fn domain(&self) -> (f64, f64) {
        self.domain
    }

    pub fn range(&self) -> (f64, f64) {
        self.range
    }

    fn is_degenerate(span: f64) -> bool {
        span == 0.0 || !span.is_finite()
    }

    /// Maps a domain value into the range. A zero-width domain maps
    /// everything to the range midpoint.
    pub fn map(&self, value: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        if Self::is_degenerate(d1 - d0) {
            return (r0 + r1) / 2.0;
        }
        r0 + (value - d0) / (d1 - d0) * (r1 - r0)
    }

    /// Maps a range value back into the domain.
    pub fn invert(&self, value: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        if Self::is_degenerate(d1 - d0) || Self::is_degenerate(r1 - r0) {
            return (d0 + d1) / 2.0;
        }
        d0 + (value - r0) / (r1 - r0) * (d1 - d0)
    }
}

/// Aspect-preserving data-to-pixel projection for one output size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionScale {
    x: LinearScale,
    y: LinearScale,
    output: Size,
    margin: f64,
}

impl ProjectionScale {
    /// Fits `extent` into `output` leaving `margin` pixels clear.
    ///
    /// An empty data set is treated as a single point at the origin.
    pub fn fit(extent: Option<Extent>, output: Size, margin: f64) -> Result<Self, RenderError> {
        if !output.is_valid() {
            return Err(RenderError::InvalidSize {
                what: "projection output".to_string(),
                width: output.width,
                height: output.height,
            });
        }

        let size = output.min_side() - 2.0 * margin;
        if size.is_nan() || size <= 0.0 {
            return Err(RenderError::InvalidSize {
                what: format!("projection drawing area (margin {})", margin),
                width: output.width,
                height: output.height,
            });
        }

        let extent = extent.unwrap_or_else(|| Extent::point(0.0, 0.0));
        let aspect = extent.aspect();

        Ok(Self {
            x: LinearScale::new(
                (extent.min_x, extent.max_x),
                (margin, margin + size * aspect),
            ),
            y: LinearScale::new((extent.min_y, extent.max_y), (margin + size, margin)),
            output,
            margin,
        })
    }

    /// Fits the extent of `records`.
    pub fn for_records(
        records: &[PointRecord],
        output: Size,
        margin: f64,
    ) -> Result<Self, RenderError> {
        Self::fit(Extent::from_records(records), output, margin)
    }

    pub fn data_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        (self.x.map(x), self.y.map(y))
    }

    pub fn pixel_to_data(&self, px: f64, py: f64) -> (f64, f64) {
        (self.x.invert(px), self.y.invert(py))
    }

    pub fn x_scale(&self) -> &LinearScale {
        &self.x
    }

    pub fn y_scale(&self) -> &LinearScale {
        &self.y
    }

    pub fn output(&self) -> Size {
        self.output
    }

    pub fn margin(&self) -> f64 {
        self.margin
    }
}
