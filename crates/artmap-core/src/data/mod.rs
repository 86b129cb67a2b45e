//! Point and artist records, plus the binary points decoder.

mod binary;
mod records;

pub use binary::{decode_points, DecodedPoints};
pub use records::{ArtistRecord, PointRecord, ProjectionKind};
