//! File-backed collaborators.
//!
//! A data directory is laid out as:
//!
//! ```text
//! <root>/points.json     list of point records
//! <root>/points.bin      optional packed coordinates (overrides points.json x/y)
//! <root>/points_<kind>.* per-projection variants, e.g. points_tsne.json
//! <root>/artists.json    list or name-keyed map of artist records
//! <root>/thumbnails/     thumbnail images
//! <root>/resized/        larger images for the detail panel
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use artmap_core::{
    decode_points, ArtistRecord, DataError, ImageError, PointRecord, ProjectionKind, Result,
};
use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::{ImageLoader, PointSource};
use crate::viewer::Thumbnail;

#[derive(Deserialize)]
#[serde(untagged)]
enum ArtistsFile {
    List(Vec<ArtistRecord>),
    Map(HashMap<String, ArtistRecord>),
}

impl ArtistsFile {
    fn into_map(self) -> HashMap<String, ArtistRecord> {
        match self {
            ArtistsFile::List(list) => list.into_iter().map(|a| (a.name.clone(), a)).collect(),
            ArtistsFile::Map(map) => map
                .into_iter()
                .map(|(name, mut artist)| {
                    if artist.name.is_empty() {
                        artist.name = name.clone();
                    }
                    (name, artist)
                })
                .collect(),
        }
    }
}

/// Reads points and artists from JSON files.
#[derive(Debug)]
pub struct FsPointSource {
    points_path: PathBuf,
    artists_path: PathBuf,
    binary_path: Option<PathBuf>,
    projection: Option<ProjectionKind>,
    artists: OnceCell<HashMap<String, ArtistRecord>>,
}

impl FsPointSource {
    pub fn new(points_path: impl Into<PathBuf>, artists_path: impl Into<PathBuf>) -> Self {
        Self {
            points_path: points_path.into(),
            artists_path: artists_path.into(),
            binary_path: None,
            projection: None,
            artists: OnceCell::new(),
        }
    }

    /// A source over the standard data directory layout. Picks up
    /// `points.bin` when present.
    pub fn from_dir(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        let binary = root.join("points.bin");
        let source = Self::new(root.join("points.json"), root.join("artists.json"));
        if binary.is_file() {
            source.with_binary(binary)
        } else {
            source
        }
    }

    /// Like [`from_dir`](Self::from_dir), but prefers `points_<kind>.json`
    /// and `points_<kind>.bin` for the requested projection. Each file falls
    /// back to the unsuffixed name when the variant is absent.
    pub fn from_dir_with_projection(root: impl AsRef<Path>, kind: ProjectionKind) -> Self {
        let root = root.as_ref();
        let variant = |ext: &str| {
            let path = root.join(format!("points_{}.{}", kind.key(), ext));
            if path.is_file() {
                path
            } else {
                root.join(format!("points.{}", ext))
            }
        };
        let binary = variant("bin");
        let mut source = Self::new(variant("json"), root.join("artists.json"));
        source.projection = Some(kind);
        if binary.is_file() {
            source.with_binary(binary)
        } else {
            source
        }
    }

    pub fn projection(&self) -> Option<ProjectionKind> {
        self.projection
    }

    /// Takes coordinates from a packed binary payload, pairing them in order
    /// with the identities in the points file.
    pub fn with_binary(mut self, path: impl Into<PathBuf>) -> Self {
        self.binary_path = Some(path.into());
        self
    }

    async fn read(path: &Path) -> Result<Vec<u8>> {
        tokio::fs::read(path).await.map_err(|e| {
            DataError::FetchFailed {
                reason: format!("{}: {}", path.display(), e),
            }
            .into()
        })
    }

    async fn artists(&self) -> Result<&HashMap<String, ArtistRecord>> {
        self.artists
            .get_or_try_init(|| async {
                let bytes = tokio::fs::read(&self.artists_path).await.map_err(|e| {
                    DataError::ArtistLookup {
                        name: String::new(),
                        reason: format!("{}: {}", self.artists_path.display(), e),
                    }
                })?;
                let file: ArtistsFile =
                    serde_json::from_slice(&bytes).map_err(|e| DataError::ArtistLookup {
                        name: String::new(),
                        reason: e.to_string(),
                    })?;
                let map = file.into_map();
                debug!("Loaded {} artists", map.len());
                Ok::<_, artmap_core::Error>(map)
            })
            .await
    }
}

#[async_trait]
impl PointSource for FsPointSource {
    async fn fetch_points(&self) -> Result<Vec<PointRecord>> {
        let bytes = Self::read(&self.points_path).await?;
        let records: Vec<PointRecord> =
            serde_json::from_slice(&bytes).map_err(|e| DataError::Decode {
                reason: format!("{}: {}", self.points_path.display(), e),
            })?;

        let records = match &self.binary_path {
            Some(path) => {
                let decoded = decode_points(&Self::read(path).await?)?;
                if decoded.coordinates.len() != records.len() {
                    return Err(DataError::Decode {
                        reason: format!(
                            "{} has {} points but {} lists {}",
                            path.display(),
                            decoded.coordinates.len(),
                            self.points_path.display(),
                            records.len()
                        ),
                    }
                    .into());
                }
                decoded.into_records(records.into_iter().map(|r| (r.filename, r.artist)))
            }
            None => records,
        };

        match self.projection {
            Some(kind) => info!(
                "Fetched {} {} points from {}",
                records.len(),
                kind,
                self.points_path.display()
            ),
            None => info!(
                "Fetched {} points from {}",
                records.len(),
                self.points_path.display()
            ),
        }
        Ok(records)
    }

    async fn artist(&self, name: &str) -> Result<Option<ArtistRecord>> {
        let artists = self.artists().await.map_err(|e| match e {
            artmap_core::Error::Data(DataError::ArtistLookup { reason, .. }) => {
                DataError::ArtistLookup {
                    name: name.to_string(),
                    reason,
                }
                .into()
            }
            other => other,
        })?;
        Ok(artists.get(name).cloned())
    }
}

/// Loads images from `thumbnails/` and `resized/` under a root directory.
#[derive(Debug, Clone)]
pub struct FsImageLoader {
    root: PathBuf,
}

impl FsImageLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, filename: &str, resized: bool) -> PathBuf {
        let dir = if resized { "resized" } else { "thumbnails" };
        self.root.join(dir).join(filename)
    }
}

#[async_trait]
impl ImageLoader for FsImageLoader {
    async fn load(&self, filename: &str, resized: bool) -> Result<Thumbnail> {
        let path = self.path_for(filename, resized);
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| ImageError::LoadFailed {
                filename: filename.to_string(),
                reason: e.to_string(),
            })?;
        let image = image::load_from_memory(&bytes).map_err(|e| ImageError::Decode {
            filename: filename.to_string(),
            reason: e.to_string(),
        })?;
        Thumbnail::from_image(&image).ok_or_else(|| {
            ImageError::Decode {
                filename: filename.to_string(),
                reason: "empty image".to_string(),
            }
            .into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use tempfile::TempDir;

    fn write_points(dir: &Path) {
        std::fs::write(
            dir.join("points.json"),
            r#"[
                {"filename": "a.jpg", "artist": "Claude Monet", "x": 0, "y": 0},
                {"filename": "b.jpg", "artist": "Edgar Degas", "projection": [100, 50]}
            ]"#,
        )
        .unwrap();
    }

    #[tokio::test]
    async fn test_fetch_points_json() {
        let dir = TempDir::new().unwrap();
        write_points(dir.path());

        let source = FsPointSource::from_dir(dir.path());
        let points = source.fetch_points().await.unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[1], PointRecord::new("b.jpg", "Edgar Degas", 100.0, 50.0));
    }

    #[tokio::test]
    async fn test_fetch_points_with_binary_coordinates() {
        let dir = TempDir::new().unwrap();
        write_points(dir.path());
        let mut bytes = Vec::new();
        for v in [200.0f32, 100.0, 2.0, 7.0, 8.0, -1.0, 3.5] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        std::fs::write(dir.path().join("points.bin"), bytes).unwrap();

        let points = FsPointSource::from_dir(dir.path())
            .fetch_points()
            .await
            .unwrap();
        assert_eq!(points[0], PointRecord::new("a.jpg", "Claude Monet", 7.0, 8.0));
        assert_eq!((points[1].x, points[1].y), (-1.0, 3.5));
    }

    #[tokio::test]
    async fn test_projection_variant_is_preferred() {
        let dir = TempDir::new().unwrap();
        write_points(dir.path());
        std::fs::write(
            dir.path().join("points_tsne.json"),
            r#"[{"filename": "a.jpg", "artist": "Claude Monet", "x": -4, "y": 9}]"#,
        )
        .unwrap();

        let tsne = FsPointSource::from_dir_with_projection(dir.path(), ProjectionKind::Tsne);
        assert_eq!(tsne.projection(), Some(ProjectionKind::Tsne));
        let points = tsne.fetch_points().await.unwrap();
        assert_eq!(points, vec![PointRecord::new("a.jpg", "Claude Monet", -4.0, 9.0)]);

        // No points_pca.json: falls back to points.json
        let pca = FsPointSource::from_dir_with_projection(dir.path(), ProjectionKind::Pca);
        assert_eq!(pca.fetch_points().await.unwrap().len(), 2);
        assert_eq!(FsPointSource::from_dir(dir.path()).projection(), None);
    }

    #[tokio::test]
    async fn test_missing_points_file_is_fetch_failure() {
        let dir = TempDir::new().unwrap();
        let err = FsPointSource::from_dir(dir.path())
            .fetch_points()
            .await
            .unwrap_err();
        assert!(err.is_data_error());
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_artist_lookup() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("artists.json"),
            r#"{"Claude Monet": {"name": "", "years": "1840 - 1926", "paintings": 73}}"#,
        )
        .unwrap();
        let source = FsPointSource::from_dir(dir.path());

        let monet = source.artist("Claude Monet").await.unwrap().unwrap();
        assert_eq!(monet.name, "Claude Monet");
        assert_eq!(monet.paintings.as_deref(), Some("73"));
        assert!(source.artist("Nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_artist_lookup_failure_is_recoverable() {
        let dir = TempDir::new().unwrap();
        let err = FsPointSource::from_dir(dir.path())
            .artist("Claude Monet")
            .await
            .unwrap_err();
        assert!(!err.is_fatal());
        assert!(err.to_string().contains("Claude Monet"));
    }

    #[tokio::test]
    async fn test_image_loader() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("thumbnails")).unwrap();
        RgbaImage::from_pixel(4, 3, Rgba([10, 20, 30, 255]))
            .save(dir.path().join("thumbnails").join("a.png"))
            .unwrap();

        let loader = FsImageLoader::new(dir.path());
        let thumb = loader.load("a.png", false).await.unwrap();
        assert_eq!((thumb.width(), thumb.height()), (4, 3));

        let err = loader.load("a.png", true).await.unwrap_err();
        assert!(err.is_image_error());
        assert!(!err.is_fatal());
    }

    #[tokio::test]
    async fn test_undecodable_image() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("thumbnails")).unwrap();
        std::fs::write(dir.path().join("thumbnails").join("bad.jpg"), b"not an image").unwrap();

        let err = FsImageLoader::new(dir.path())
            .load("bad.jpg", false)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            artmap_core::Error::Image(ImageError::Decode { .. })
        ));
    }
}
