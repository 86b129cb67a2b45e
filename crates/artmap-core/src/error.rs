//! Error handling for artmap
//!
//! Provides error types for every layer of the viewer:
//! - Data errors (points list and artist lookups)
//! - Image errors (thumbnail and resized image loads)
//! - Render errors (raster allocation, tier capture)
//! - View errors (halted or closed sessions)
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Data error type
///
/// Represents failures of the points/artist store. A failed points fetch
/// is fatal to a session; a failed artist lookup is not.
#[derive(Error, Debug, Clone)]
pub enum DataError {
    /// The points list could not be fetched
    #[error("Failed to fetch points: {reason}")]
    FetchFailed {
        /// The reason the fetch failed.
        reason: String,
    },

    /// A points payload could not be decoded
    #[error("Failed to decode points: {reason}")]
    Decode {
        /// The reason decoding failed.
        reason: String,
    },

    /// An artist record could not be fetched
    #[error("Artist lookup failed for '{name}': {reason}")]
    ArtistLookup {
        /// The artist name that was looked up.
        name: String,
        /// The reason the lookup failed.
        reason: String,
    },
}

/// Image error type
///
/// Image failures are recoverable per point: the point stays in the list
/// but is not rasterized.
#[derive(Error, Debug, Clone)]
pub enum ImageError {
    /// The image bytes could not be loaded
    #[error("Failed to load {filename}: {reason}")]
    LoadFailed {
        /// The file that failed to load.
        filename: String,
        /// The reason the load failed.
        reason: String,
    },

    /// The image bytes could not be decoded
    #[error("Failed to decode {filename}: {reason}")]
    Decode {
        /// The file that failed to decode.
        filename: String,
        /// The reason decoding failed.
        reason: String,
    },

    /// The point has no loaded image
    #[error("No image loaded for {filename}")]
    Missing {
        /// The file with no image handle.
        filename: String,
    },
}

/// Render error type
///
/// Raster failures during a tier build are fatal to the session.
#[derive(Error, Debug, Clone)]
pub enum RenderError {
    /// An off-screen raster could not be allocated
    #[error("Failed to allocate {width}x{height} raster")]
    RasterAllocation {
        /// Requested raster width in pixels.
        width: u32,
        /// Requested raster height in pixels.
        height: u32,
    },

    /// A size was zero, negative or not finite
    #[error("Invalid size for {what}: {width}x{height}")]
    InvalidSize {
        /// What the size was for.
        what: String,
        /// The offending width.
        width: f64,
        /// The offending height.
        height: f64,
    },

    /// A tier was used before its bitmap was captured
    #[error("Tier '{tier}' has not been built")]
    TierNotBuilt {
        /// The tier name.
        tier: String,
    },
}

/// View error type
#[derive(Error, Debug, Clone)]
pub enum ViewError {
    /// A fatal error halted the session
    #[error("Viewer halted: {reason}")]
    Halted {
        /// The error that halted progression.
        reason: String,
    },

    /// The session was torn down
    #[error("Viewer session is closed")]
    Closed,
}

/// Main error type for artmap
///
/// Aggregates all error types into a single enum for unified error handling.
#[derive(Error, Debug)]
pub enum Error {
    /// Data error
    #[error(transparent)]
    Data(#[from] DataError),

    /// Image error
    #[error(transparent)]
    Image(#[from] ImageError),

    /// Render error
    #[error(transparent)]
    Render(#[from] RenderError),

    /// View error
    #[error(transparent)]
    View(#[from] ViewError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this error must halt the view state machine
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Error::Image(_) | Error::Data(DataError::ArtistLookup { .. })
        )
    }

    /// Check if this is a data error
    pub fn is_data_error(&self) -> bool {
        matches!(self, Error::Data(_))
    }

    /// Check if this is an image error
    pub fn is_image_error(&self) -> bool {
        matches!(self, Error::Image(_))
    }

    /// Check if this is a render error
    pub fn is_render_error(&self) -> bool {
        matches!(self, Error::Render(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DataError::FetchFailed {
            reason: "404".to_string(),
        };
        assert_eq!(err.to_string(), "Failed to fetch points: 404");

        let err = RenderError::RasterAllocation {
            width: 16384,
            height: 16384,
        };
        assert_eq!(err.to_string(), "Failed to allocate 16384x16384 raster");

        let err = ImageError::Missing {
            filename: "a.jpg".to_string(),
        };
        assert_eq!(err.to_string(), "No image loaded for a.jpg");
    }

    #[test]
    fn test_fatality() {
        let err: Error = ImageError::LoadFailed {
            filename: "a.jpg".to_string(),
            reason: "timeout".to_string(),
        }
        .into();
        assert!(!err.is_fatal());
        assert!(err.is_image_error());

        let err: Error = DataError::ArtistLookup {
            name: "Monet".to_string(),
            reason: "offline".to_string(),
        }
        .into();
        assert!(!err.is_fatal());

        let err: Error = RenderError::TierNotBuilt {
            tier: "half".to_string(),
        }
        .into();
        assert!(err.is_fatal());
        assert!(err.is_render_error());

        let err: Error = DataError::FetchFailed {
            reason: "offline".to_string(),
        }
        .into();
        assert!(err.is_fatal());
        assert!(err.is_data_error());
    }

    #[test]
    fn test_transparent_display() {
        let err: Error = ViewError::Closed.into();
        assert_eq!(err.to_string(), "Viewer session is closed");
        assert_eq!(Error::other("boom").to_string(), "boom");
    }
}
