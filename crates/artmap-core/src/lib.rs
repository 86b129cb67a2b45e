//! # artmap Core
//!
//! Core types and utilities for artmap.
//! Provides the error taxonomy, geometry and transform types, point and
//! artist records, and the session event bus.

pub mod data;
pub mod error;
pub mod event_bus;
pub mod types;

pub use data::{decode_points, ArtistRecord, DecodedPoints, PointRecord, ProjectionKind};

pub use error::{DataError, Error, ImageError, RenderError, Result, ViewError};

pub use event_bus::{
    EventBus, EventBusConfig, EventBusError, EventCategory, EventFilter, SubscriptionId,
    ViewerEvent,
};

pub use types::{BoundsBox, Size, TierBounds, TierId, Transform, ViewportRect};
