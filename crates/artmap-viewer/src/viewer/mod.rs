//! Viewport engine components, leaf first: projection, rasters and points,
//! the bitmap cache, zoom gestures and the transform controller, the
//! renderer and hit tester, and finally the state machine and the session
//! that drives them.

pub mod bitmap_cache;
pub mod detail;
pub mod gesture;
pub mod point;
pub mod projection;
pub mod raster;
pub mod renderer;
pub mod session;
pub mod state;
pub mod transform;

pub use bitmap_cache::{BitmapCache, CachedTier, TierBuild, TierSummary};
pub use detail::{DetailFields, DetailPanel, LoggingPanel};
pub use gesture::{ScaleExtent, ZoomEvent, ZoomGesture, ZoomSource};
pub use hit_test::{Hit, HitKind, HitTester};
pub use point::Point;
pub use projection::{Extent, LinearScale, ProjectionScale};
pub use raster::{pixmap_from_rgba, rgba_from_pixmap, Bitmap, Thumbnail};
pub use renderer::{Renderer, Surface};
pub use session::ViewerSession;
pub use state::{transition, Effect, Transition, ViewEvent, ViewState};
pub use transform::TransformController;
