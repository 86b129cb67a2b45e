//! Transform controller.
//!
//! Owns the gesture recognizer's receiving channel and decides which
//! candidate transforms are worth a redraw. Suppression state lives on each
//! controller, so independent viewers never interfere.

use artmap_core::{RenderError, Size, Transform};
use artmap_settings::ZoomSettings;
use tokio::sync::mpsc;
use tracing::{debug, trace};

use super::gesture::{ScaleExtent, ZoomEvent, ZoomGesture, ZoomSource};

#[derive(Debug)]
pub struct TransformController {
    gesture: ZoomGesture,
    events: mpsc::UnboundedReceiver<ZoomEvent>,
    last_propagated: Option<Transform>,
    min_translate: f64,
    min_scale: f64,
    propagated: u64,
    suppressed: u64,
}

impl TransformController {
    pub fn new(settings: &ZoomSettings) -> Self {
        let (gesture, events) = ZoomGesture::new(
            ScaleExtent::new(settings.min_scale, settings.max_scale),
            settings.wheel_sensitivity,
        );
        Self {
            gesture,
            events,
            last_propagated: None,
            min_translate: settings.min_translate_delta,
            min_scale: settings.min_scale_delta,
            propagated: 0,
            suppressed: 0,
        }
    }

    pub fn scale_extent(&self) -> ScaleExtent {
        self.gesture.extent()
    }

    /// The transform currently on screen (identity before the first one).
    pub fn current(&self) -> Transform {
        self.last_propagated.unwrap_or_default()
    }

    pub fn gesture(&self) -> &ZoomGesture {
        &self.gesture
    }

    /// Counts of propagated and suppressed candidates.
    pub fn stats(&self) -> (u64, u64) {
        (self.propagated, self.suppressed)
    }

    /// Decides whether `candidate` should reach the renderer.
    ///
    /// The first candidate always propagates. Later ones are dropped when
    /// translation moved less than the translate threshold on both axes and
    /// scale moved less than the scale threshold.
    pub fn offer(&mut self, candidate: Transform) -> Option<Transform> {
        if let Some(last) = self.last_propagated {
            if !candidate.differs_from(&last, self.min_translate, self.min_scale) {
                self.suppressed += 1;
                trace!("Suppressed {}", candidate);
                return None;
            }
        }
        Some(self.accept(candidate))
    }

    fn accept(&mut self, transform: Transform) -> Transform {
        self.last_propagated = Some(transform);
        self.propagated += 1;
        transform
    }

    /// Drains pending gesture events. Returns the latest propagated
    /// transform, if any event got through.
    pub fn pump(&mut self) -> Option<Transform> {
        let mut latest = None;
        while let Ok(event) = self.events.try_recv() {
            let result = match event.source {
                ZoomSource::Programmatic => Some(self.accept(event.transform)),
                ZoomSource::Wheel | ZoomSource::Drag => self.offer(event.transform),
            };
            if result.is_some() {
                latest = result;
            }
        }
        latest
    }

    pub fn wheel(&mut self, x: f64, y: f64, delta_y: f64) -> Option<Transform> {
        self.gesture.wheel(x, y, delta_y);
        self.pump()
    }

    pub fn drag_start(&mut self, x: f64, y: f64) {
        self.gesture.drag_start(x, y);
    }

    pub fn drag_to(&mut self, x: f64, y: f64) -> Option<Transform> {
        self.gesture.drag_to(x, y);
        self.pump()
    }

    pub fn drag_end(&mut self) {
        self.gesture.drag_end();
    }

    /// Scale that fits a bitmap inside the viewport.
    pub fn fit_scale(bitmap: Size, viewport: Size) -> Result<f64, RenderError> {
        for (what, size) in [("bitmap", bitmap), ("viewport", viewport)] {
            if !size.is_valid() {
                return Err(RenderError::InvalidSize {
                    what: what.to_string(),
                    width: size.width,
                    height: size.height,
                });
            }
        }
        Ok((viewport.width / bitmap.width).min(viewport.height / bitmap.height))
    }

    /// Sets the identity transform scaled to fit `bitmap` in `viewport`.
    ///
    /// Always propagates, regardless of suppression.
    pub fn reset_to_fit(&mut self, bitmap: Size, viewport: Size) -> Result<Transform, RenderError> {
        let k = Self::fit_scale(bitmap, viewport)?;
        self.gesture.set_transform(Transform::scaled(k));
        let transform = self.pump().unwrap_or_else(|| self.current());
        debug!("Reset to fit {} in {}: {}", bitmap, viewport, transform);
        Ok(transform)
    }
}
