//! Shared value types.

pub mod geometry;
pub mod tier;

pub use geometry::{BoundsBox, Size, Transform, ViewportRect};
pub use tier::{TierBounds, TierId};
