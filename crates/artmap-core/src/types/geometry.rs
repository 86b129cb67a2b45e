//! Geometry primitives shared by the viewer components.
//!
//! Pixel-space sizes, client rectangles, per-tier bounding boxes and the
//! pan/zoom transform.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A pan/zoom transform: `screen = bitmap * k + (x, y)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Horizontal translation in screen pixels.
    pub x: f64,
    /// Vertical translation in screen pixels.
    pub y: f64,
    /// Uniform scale factor.
    pub k: f64,
}

impl Transform {
    /// The identity transform.
    pub const IDENTITY: Transform = Transform {
        x: 0.0,
        y: 0.0,
        k: 1.0,
    };

    /// Creates a transform from a translation and a scale.
    pub fn new(x: f64, y: f64, k: f64) -> Self {
        Self { x, y, k }
    }

    /// The identity transform scaled by `k`.
    pub fn scaled(k: f64) -> Self {
        Self { x: 0.0, y: 0.0, k }
    }

    /// Whether this is exactly the identity transform.
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Maps a bitmap-space point to screen space.
    pub fn apply(&self, px: f64, py: f64) -> (f64, f64) {
        (px * self.k + self.x, py * self.k + self.y)
    }

    /// Maps a screen-space point back to bitmap space.
    ///
    /// Returns `None` when the scale cannot be inverted.
    pub fn invert(&self, sx: f64, sy: f64) -> Option<(f64, f64)> {
        if !self.k.is_finite() || self.k <= 0.0 {
            return None;
        }
        Some(((sx - self.x) / self.k, (sy - self.y) / self.k))
    }

    /// Returns a copy with the translation moved by `(dx, dy)`.
    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            k: self.k,
        }
    }

    /// Whether this transform differs from `other` by at least one of the
    /// given thresholds.
    pub fn differs_from(&self, other: &Transform, min_translate: f64, min_scale: f64) -> bool {
        (self.x - other.x).abs() >= min_translate
            || (self.y - other.y).abs() >= min_translate
            || (self.k - other.k).abs() >= min_scale
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "translate({:.2}, {:.2}) scale({:.4})",
            self.x, self.y, self.k
        )
    }
}

/// A width/height pair in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
}

impl Size {
    /// Creates a new size.
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Whether both sides are finite and strictly positive.
    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    /// The shorter side.
    pub fn min_side(&self) -> f64 {
        self.width.min(self.height)
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// The visible surface's rectangle in client (window) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ViewportRect {
    /// Left edge in client pixels.
    pub left: f64,
    /// Top edge in client pixels.
    pub top: f64,
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
}

impl ViewportRect {
    /// Creates a new viewport rectangle.
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// A rectangle anchored at the client origin.
    pub fn from_size(size: Size) -> Self {
        Self::new(0.0, 0.0, size.width, size.height)
    }

    /// The rectangle's size.
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// A point's clickable rectangle in one tier's pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundsBox {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

impl BoundsBox {
    /// Creates a new bounds box.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// A box of the given size centered on `(cx, cy)`.
    pub fn centered(cx: f64, cy: f64, width: f64, height: f64) -> Self {
        Self::new(cx - width / 2.0, cy - height / 2.0, width, height)
    }

    /// The box center.
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Inclusive containment test.
    pub fn contains(&self, px: f64, py: f64) -> bool {
        px >= self.x && px <= self.x + self.width && py >= self.y && py <= self.y + self.height
    }

    /// The box grown by `margin` on all four sides.
    pub fn expanded(&self, margin: f64) -> Self {
        Self::new(
            self.x - margin,
            self.y - margin,
            self.width + 2.0 * margin,
            self.height + 2.0 * margin,
        )
    }

    /// Whether the two boxes share any interior area.
    pub fn overlaps(&self, other: &BoundsBox) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }

    /// Euclidean distance from `(px, py)` to the box center.
    pub fn distance_to_center(&self, px: f64, py: f64) -> f64 {
        let (cx, cy) = self.center();
        (px - cx).hypot(py - cy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_apply_and_invert() {
        let t = Transform::new(10.0, -20.0, 2.0);
        let (sx, sy) = t.apply(5.0, 5.0);
        assert_eq!((sx, sy), (20.0, -10.0));
        assert_eq!(t.invert(sx, sy), Some((5.0, 5.0)));
    }

    #[test]
    fn test_transform_invert_rejects_zero_scale() {
        assert_eq!(Transform::scaled(0.0).invert(1.0, 1.0), None);
        assert_eq!(Transform::scaled(f64::NAN).invert(1.0, 1.0), None);
    }

    #[test]
    fn test_transform_differs_from() {
        let a = Transform::new(0.0, 0.0, 1.0);
        assert!(!a.differs_from(&Transform::new(0.5, -0.5, 1.005), 1.0, 0.01));
        assert!(a.differs_from(&Transform::new(1.0, 0.0, 1.0), 1.0, 0.01));
        assert!(a.differs_from(&Transform::new(0.0, 0.0, 1.02), 1.0, 0.01));
    }

    #[test]
    fn test_bounds_contains_and_expand() {
        let b = BoundsBox::centered(100.0, 100.0, 80.0, 80.0);
        assert_eq!(b.x, 60.0);
        assert!(b.contains(100.0, 100.0));
        assert!(b.contains(60.0, 140.0));
        assert!(!b.contains(170.0, 100.0));
        assert!(b.expanded(40.0).contains(170.0, 100.0));
        assert_eq!(b.center(), (100.0, 100.0));
    }

    #[test]
    fn test_bounds_overlap() {
        let a = BoundsBox::new(0.0, 0.0, 10.0, 10.0);
        assert!(a.overlaps(&BoundsBox::new(5.0, 5.0, 10.0, 10.0)));
        // Touching edges do not overlap
        assert!(!a.overlaps(&BoundsBox::new(10.0, 0.0, 10.0, 10.0)));
    }

    #[test]
    fn test_size_validity() {
        assert!(Size::new(800.0, 600.0).is_valid());
        assert!(!Size::new(0.0, 600.0).is_valid());
        assert!(!Size::new(f64::INFINITY, 600.0).is_valid());
        assert_eq!(Size::new(800.0, 600.0).min_side(), 600.0);
    }
}
