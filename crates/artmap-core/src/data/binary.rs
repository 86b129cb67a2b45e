//! Decoder for the store's packed binary points payload.
//!
//! Layout, all little-endian `f32`:
//!
//! ```text
//! [width] [height] [count] [x0] [y0] [x1] [y1] ...
//! ```

use crate::error::DataError;

use super::records::PointRecord;

const HEADER_LEN: usize = 12;

/// A decoded binary payload.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedPoints {
    /// Width of the projection space reported by the store.
    pub width: f32,
    /// Height of the projection space reported by the store.
    pub height: f32,
    /// Point coordinates in payload order.
    pub coordinates: Vec<(f32, f32)>,
}

impl DecodedPoints {
    /// Pairs the decoded coordinates with `(filename, artist)` identities.
    ///
    /// Coordinates without an identity get empty names.
    pub fn into_records<I>(self, identities: I) -> Vec<PointRecord>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut identities = identities.into_iter();
        self.coordinates
            .into_iter()
            .map(|(x, y)| {
                let (filename, artist) = identities.next().unwrap_or_default();
                PointRecord::new(filename, artist, f64::from(x), f64::from(y))
            })
            .collect()
    }
}

fn read_f32(bytes: &[u8], offset: usize) -> Option<f32> {
    let chunk = bytes.get(offset..offset + 4)?;
    Some(f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
}

/// Decodes a packed points payload.
pub fn decode_points(bytes: &[u8]) -> Result<DecodedPoints, DataError> {
    let header = |offset, field: &str| {
        read_f32(bytes, offset).ok_or_else(|| DataError::Decode {
            reason: format!("payload too short for {} header", field),
        })
    };
    let width = header(0, "width")?;
    let height = header(4, "height")?;
    let count = header(8, "count")?;

    if !count.is_finite() || count < 0.0 || count.fract() != 0.0 {
        return Err(DataError::Decode {
            reason: format!("invalid point count {}", count),
        });
    }
    let available = (bytes.len() - HEADER_LEN) / 8;
    let count = count as usize;

    let expected = count
        .checked_mul(8)
        .and_then(|n| n.checked_add(HEADER_LEN))
        .filter(|_| count <= available);
    let Some(expected) = expected else {
        return Err(DataError::Decode {
            reason: format!(
                "payload truncated: header claims {} points, {} bytes hold {}",
                count,
                bytes.len(),
                available
            ),
        });
    };

    let coordinates = bytes[HEADER_LEN..expected]
        .chunks_exact(8)
        .filter_map(|pair| Some((read_f32(pair, 0)?, read_f32(pair, 4)?)))
        .collect();

    Ok(DecodedPoints {
        width,
        height,
        coordinates,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(width: f32, height: f32, points: &[(f32, f32)]) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&width.to_le_bytes());
        bytes.extend_from_slice(&height.to_le_bytes());
        bytes.extend_from_slice(&(points.len() as f32).to_le_bytes());
        for (x, y) in points {
            bytes.extend_from_slice(&x.to_le_bytes());
            bytes.extend_from_slice(&y.to_le_bytes());
        }
        bytes
    }

    #[test]
    fn test_decode_points() {
        let bytes = encode(640.0, 480.0, &[(1.0, 2.0), (-3.5, 4.25)]);
        let decoded = decode_points(&bytes).expect("decodes");
        assert_eq!(decoded.width, 640.0);
        assert_eq!(decoded.height, 480.0);
        assert_eq!(decoded.coordinates, vec![(1.0, 2.0), (-3.5, 4.25)]);
    }

    #[test]
    fn test_decode_empty_payload() {
        let decoded = decode_points(&encode(1.0, 1.0, &[])).expect("decodes");
        assert!(decoded.coordinates.is_empty());
    }

    #[test]
    fn test_decode_rejects_truncated_payload() {
        let mut bytes = encode(1.0, 1.0, &[(1.0, 2.0), (3.0, 4.0)]);
        bytes.truncate(bytes.len() - 2);
        let err = decode_points(&bytes).expect_err("truncated");
        assert!(err.to_string().contains("truncated"));

        assert!(decode_points(&[0, 0, 0]).is_err());
    }

    #[test]
    fn test_decode_rejects_oversized_count() {
        let mut bytes = encode(100.0, 100.0, &[]);
        bytes[8..12].copy_from_slice(&1e19f32.to_le_bytes());
        assert_eq!(bytes.len(), 12);
        let err = decode_points(&bytes).expect_err("count exceeds payload");
        assert!(err.to_string().contains("truncated"));

        let mut bytes = encode(1.0, 1.0, &[(1.0, 2.0)]);
        bytes[8..12].copy_from_slice(&3.0f32.to_le_bytes());
        assert!(decode_points(&bytes).is_err());
    }

    #[test]
    fn test_decode_rejects_fractional_count() {
        let mut bytes = encode(1.0, 1.0, &[]);
        bytes[8..12].copy_from_slice(&1.5f32.to_le_bytes());
        assert!(decode_points(&bytes).is_err());
    }

    #[test]
    fn test_into_records_pads_missing_identities() {
        let decoded = decode_points(&encode(1.0, 1.0, &[(1.0, 2.0), (3.0, 4.0)])).expect("decodes");
        let records = decoded.into_records(vec![("a.jpg".to_string(), "Monet".to_string())]);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].filename, "a.jpg");
        assert_eq!(records[1].filename, "");
        assert_eq!((records[1].x, records[1].y), (3.0, 4.0));
    }
}
