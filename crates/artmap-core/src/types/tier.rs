//! Resolution tiers and per-tier point bounds.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::geometry::BoundsBox;

/// Identifies one of the pre-rendered resolution tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TierId {
    /// Overview tier spanning the whole viewport width.
    Full,
    /// Narrow tier used while the detail panel takes half the width.
    Half,
}

impl TierId {
    /// Every tier, in build order.
    pub const ALL: [TierId; 2] = [TierId::Full, TierId::Half];

    /// The tier's name.
    pub fn name(&self) -> &'static str {
        match self {
            TierId::Full => "full",
            TierId::Half => "half",
        }
    }
}

impl fmt::Display for TierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A point's bounds in each tier. A slot is `None` until that tier has been
/// built, or when the point was skipped during the build.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TierBounds {
    full: Option<BoundsBox>,
    half: Option<BoundsBox>,
}

impl TierBounds {
    /// Bounds for `tier`, if any.
    pub fn get(&self, tier: TierId) -> Option<&BoundsBox> {
        match tier {
            TierId::Full => self.full.as_ref(),
            TierId::Half => self.half.as_ref(),
        }
    }

    /// Replaces the whole slot for `tier`.
    pub fn replace(&mut self, tier: TierId, bounds: Option<BoundsBox>) {
        match tier {
            TierId::Full => self.full = bounds,
            TierId::Half => self.half = bounds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_names() {
        assert_eq!(TierId::Full.to_string(), "full");
        assert_eq!(TierId::Half.name(), "half");
        assert_eq!(TierId::ALL, [TierId::Full, TierId::Half]);
    }

    #[test]
    fn test_tier_bounds_replace() {
        let mut bounds = TierBounds::default();
        assert!(bounds.get(TierId::Full).is_none());

        bounds.replace(TierId::Full, Some(BoundsBox::new(1.0, 2.0, 3.0, 4.0)));
        assert_eq!(bounds.get(TierId::Full).map(|b| b.x), Some(1.0));
        assert!(bounds.get(TierId::Half).is_none());

        bounds.replace(TierId::Full, None);
        assert!(bounds.get(TierId::Full).is_none());
    }
}
