//! Records delivered by the points/artist store.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// The offline projection that produced a point's coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectionKind {
    /// Uniform manifold approximation and projection.
    #[default]
    Umap,
    /// Principal component analysis.
    Pca,
    /// t-distributed stochastic neighbour embedding.
    Tsne,
}

impl ProjectionKind {
    /// Lowercase key used in file names, e.g. `points_tsne.json`.
    pub fn key(&self) -> &'static str {
        match self {
            ProjectionKind::Umap => "umap",
            ProjectionKind::Pca => "pca",
            ProjectionKind::Tsne => "tsne",
        }
    }
}

impl fmt::Display for ProjectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectionKind::Umap => write!(f, "UMAP"),
            ProjectionKind::Pca => write!(f, "PCA"),
            ProjectionKind::Tsne => write!(f, "t-SNE"),
        }
    }
}

/// One point in the scatter plot.
///
/// Accepts either explicit `x`/`y` fields or a two-element `projection`
/// array, which is how the store serialises precomputed coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPointRecord")]
pub struct PointRecord {
    /// Image file name, also the point's identity.
    pub filename: String,
    /// Artist name, used for the detail lookup.
    pub artist: String,
    /// Data-space x coordinate.
    pub x: f64,
    /// Data-space y coordinate.
    pub y: f64,
}

impl PointRecord {
    /// Creates a new point record.
    pub fn new(filename: impl Into<String>, artist: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            filename: filename.into(),
            artist: artist.into(),
            x,
            y,
        }
    }
}

#[derive(Deserialize)]
struct RawPointRecord {
    filename: String,
    #[serde(default)]
    artist: String,
    x: Option<f64>,
    y: Option<f64>,
    projection: Option<Vec<f64>>,
}

impl TryFrom<RawPointRecord> for PointRecord {
    type Error = String;

    fn try_from(raw: RawPointRecord) -> Result<Self, Self::Error> {
        let (x, y) = match (raw.x, raw.y, raw.projection.as_deref()) {
            (Some(x), Some(y), _) => (x, y),
            (_, _, Some([x, y, ..])) => (*x, *y),
            _ => {
                return Err(format!(
                    "point '{}' has neither x/y nor a 2D projection",
                    raw.filename
                ))
            }
        };
        if !x.is_finite() || !y.is_finite() {
            return Err(format!("point '{}' has non-finite coordinates", raw.filename));
        }
        Ok(Self {
            filename: raw.filename,
            artist: raw.artist,
            x,
            y,
        })
    }
}

/// Artist metadata shown in the detail panel.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ArtistRecord {
    /// Artist name, the lookup key.
    pub name: String,
    /// Life span, e.g. "1840 - 1926".
    #[serde(default)]
    pub years: Option<String>,
    /// Genre or movement.
    #[serde(default)]
    pub genre: Option<String>,
    /// Nationality.
    #[serde(default)]
    pub nationality: Option<String>,
    /// Short biography.
    #[serde(default)]
    pub bio: Option<String>,
    /// Wikipedia URL.
    #[serde(default)]
    pub wikipedia: Option<String>,
    /// Number of paintings; stored as text or a number depending on the source.
    #[serde(default, deserialize_with = "string_or_number")]
    pub paintings: Option<String>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}
