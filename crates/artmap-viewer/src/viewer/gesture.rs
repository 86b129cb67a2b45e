//! Zoom/pan gesture recognizer.
//!
//! Turns wheel, drag and programmatic input into candidate transforms and
//! sends them over a channel. The recognizer is the only place the scale
//! extent is enforced.

use artmap_core::Transform;
use tokio::sync::mpsc;
use tracing::debug;

/// Allowed zoom range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleExtent {
    pub min: f64,
    pub max: f64,
}

impl ScaleExtent {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Clamps `k` into the extent. Non-finite input clamps to `min`.
    pub fn clamp(&self, k: f64) -> f64 {
        if k.is_nan() {
            return self.min;
        }
        k.clamp(self.min, self.max)
    }

    pub fn contains(&self, k: f64) -> bool {
        k >= self.min && k <= self.max
    }
}

/// What produced a candidate transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomSource {
    Wheel,
    Drag,
    /// Set by code, e.g. a reset; always propagated.
    Programmatic,
}

/// A candidate transform emitted by the recognizer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomEvent {
    pub transform: Transform,
    pub source: ZoomSource,
}

#[derive(Debug)]
pub struct ZoomGesture {
    extent: ScaleExtent,
    sensitivity: f64,
    transform: Transform,
    drag_anchor: Option<(f64, f64)>,
    sender: mpsc::UnboundedSender<ZoomEvent>,
}

impl ZoomGesture {
    /// Creates a recognizer and the receiving end of its event channel.
    pub fn new(
        extent: ScaleExtent,
        sensitivity: f64,
    ) -> (Self, mpsc::UnboundedReceiver<ZoomEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let gesture = Self {
            extent,
            sensitivity,
            transform: Transform::IDENTITY,
            drag_anchor: None,
            sender,
        };
        (gesture, receiver)
    }

    pub fn extent(&self) -> ScaleExtent {
        self.extent
    }

    /// The recognizer's own transform, including changes that were never
    /// propagated.
    pub fn transform(&self) -> Transform {
        self.transform
    }

    fn emit(&mut self, source: ZoomSource) {
        let event = ZoomEvent {
            transform: self.transform,
            source,
        };
        if self.sender.send(event).is_err() {
            debug!("Zoom event dropped: no receiver");
        }
    }

    /// Zooms to scale `k` keeping the surface point `(x, y)` fixed.
    pub fn zoom_about(&mut self, x: f64, y: f64, k: f64, source: ZoomSource) {
        let t = self.transform;
        let k1 = self.extent.clamp(k);
        // Bitmap point currently under (x, y)
        let bx = (x - t.x) / t.k;
        let by = (y - t.y) / t.k;
        self.transform = Transform::new(x - bx * k1, y - by * k1, k1);
        self.emit(source);
    }

    /// Applies a wheel step at surface position `(x, y)`.
    ///
    /// Positive `delta_y` zooms out, matching browser wheel deltas.
    pub fn wheel(&mut self, x: f64, y: f64, delta_y: f64) {
        if !delta_y.is_finite() {
            return;
        }
        let k = self.transform.k * 2f64.powf(-delta_y * self.sensitivity);
        self.zoom_about(x, y, k, ZoomSource::Wheel);
    }

    pub fn drag_start(&mut self, x: f64, y: f64) {
        self.drag_anchor = Some((x, y));
    }

    /// Pans by the pointer movement since the last drag position.
    pub fn drag_to(&mut self, x: f64, y: f64) {
        let Some((ax, ay)) = self.drag_anchor else {
            return;
        };
        self.drag_anchor = Some((x, y));
        self.transform = self.transform.translated(x - ax, y - ay);
        self.emit(ZoomSource::Drag);
    }

    pub fn drag_end(&mut self) {
        self.drag_anchor = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_anchor.is_some()
    }

    /// Replaces the transform programmatically. The scale is still clamped.
    pub fn set_transform(&mut self, transform: Transform) {
        self.transform = Transform::new(
            transform.x,
            transform.y,
            self.extent.clamp(transform.k),
        );
        self.emit(ZoomSource::Programmatic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gesture() -> (ZoomGesture, mpsc::UnboundedReceiver<ZoomEvent>) {
        ZoomGesture::new(ScaleExtent::new(0.5, 4.0), 0.002)
    }

    #[test]
    fn test_wheel_zooms_about_pointer() {
        let (mut g, mut rx) = gesture();
        g.wheel(100.0, 50.0, -500.0);

        let event = rx.try_recv().expect("event sent");
        assert_eq!(event.source, ZoomSource::Wheel);
        assert!((event.transform.k - 2.0).abs() < 1e-9);

        // The point under the cursor stays put
        let (sx, sy) = event.transform.apply(100.0, 50.0);
        assert!((sx - 100.0).abs() < 1e-9 && (sy - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_scale_is_clamped() {
        let (mut g, mut rx) = gesture();
        g.wheel(0.0, 0.0, -1.0e6);
        assert_eq!(rx.try_recv().expect("event").transform.k, 4.0);

        g.wheel(0.0, 0.0, 1.0e6);
        assert_eq!(rx.try_recv().expect("event").transform.k, 0.5);

        g.set_transform(Transform::scaled(100.0));
        assert_eq!(rx.try_recv().expect("event").transform.k, 4.0);
    }

    #[test]
    fn test_drag_pans() {
        let (mut g, mut rx) = gesture();
        g.drag_to(5.0, 5.0);
        assert!(rx.try_recv().is_err(), "no drag in progress");

        g.drag_start(10.0, 10.0);
        g.drag_to(25.0, 5.0);
        g.drag_end();
        let event = rx.try_recv().expect("event");
        assert_eq!(event.transform, Transform::new(15.0, -5.0, 1.0));
        assert!(!g.is_dragging());
    }

    #[test]
    fn test_extent_clamp_handles_nan() {
        let extent = ScaleExtent::new(0.01, 20.0);
        assert_eq!(extent.clamp(f64::NAN), 0.01);
        assert_eq!(extent.clamp(f64::INFINITY), 20.0);
        assert!(extent.contains(1.0));
    }
}
