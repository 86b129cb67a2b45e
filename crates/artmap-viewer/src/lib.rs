//! # artmap Viewer
//!
//! The scatter-plot viewport engine: projection of data coordinates into
//! tier rasters, multi-resolution bitmap caching, pan/zoom with redraw
//! suppression, hit testing and the view state machine.
//!
//! A [`ViewerSession`] ties the components together behind the
//! [`PointSource`], [`ImageLoader`] and [`DetailPanel`] collaborators.

pub mod sources;
pub mod viewer;

pub use sources::{FsImageLoader, FsPointSource, ImageLoader, PointSource};
pub use viewer::*;
