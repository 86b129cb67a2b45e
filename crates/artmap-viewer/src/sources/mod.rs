//! External collaborators: the points/artist store and the image loader.
//!
//! Both are async because they sit on I/O. File-backed implementations live
//! in [`fs`].

pub mod fs;

use artmap_core::{ArtistRecord, PointRecord, Result};
use async_trait::async_trait;

use crate::viewer::Thumbnail;

pub use fs::{FsImageLoader, FsPointSource};

/// The points/artist store.
#[async_trait]
pub trait PointSource: Send + Sync {
    /// Fetches the full list of plotted points.
    async fn fetch_points(&self) -> Result<Vec<PointRecord>>;

    /// Looks up an artist by name. `Ok(None)` when the store has no entry.
    async fn artist(&self, name: &str) -> Result<Option<ArtistRecord>>;
}

/// Loads and decodes images by file name.
#[async_trait]
pub trait ImageLoader: Send + Sync {
    /// Loads `filename`, from the resized set when `resized` is true and
    /// from the thumbnail set otherwise.
    async fn load(&self, filename: &str, resized: bool) -> Result<Thumbnail>;
}
