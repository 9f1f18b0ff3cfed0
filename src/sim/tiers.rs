//! Monster tier table
//!
//! Tiers are ranked 1 (smallest) to [`TIER_COUNT`] (largest). Two monsters of
//! the same tier merge into the next one; the top tier has no successor.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of monster tiers
pub const TIER_COUNT: usize = 10;

/// A validated tier rank in `1..=TIER_COUNT`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Tier(u8);

impl Tier {
    /// Smallest tier
    pub const FIRST: Tier = Tier(1);
    /// Largest tier (never merges)
    pub const TOP: Tier = Tier(TIER_COUNT as u8);

    /// Returns `None` for ranks outside the table
    pub fn new(rank: u8) -> Option<Self> {
        if (1..=TIER_COUNT as u8).contains(&rank) {
            Some(Self(rank))
        } else {
            None
        }
    }

    /// 1-based rank
    #[inline]
    pub fn rank(self) -> u8 {
        self.0
    }

    /// Zero-based table index
    #[inline]
    fn index(self) -> usize {
        self.0 as usize - 1
    }

    pub fn is_top(self) -> bool {
        self == Self::TOP
    }

    /// The tier two of these merge into
    pub fn successor(self) -> Option<Tier> {
        Tier::new(self.0 + 1)
    }

    /// Static data for this tier
    pub fn spec(self) -> &'static TierSpec {
        &TIERS[self.index()]
    }

    /// All tiers, smallest first
    pub fn all() -> impl Iterator<Item = Tier> {
        (1..=TIER_COUNT as u8).map(Tier)
    }
}

impl TryFrom<u8> for Tier {
    type Error = String;

    fn try_from(rank: u8) -> Result<Self, Self::Error> {
        Tier::new(rank).ok_or_else(|| format!("tier {rank} outside 1..={TIER_COUNT}"))
    }
}

impl From<Tier> for u8 {
    fn from(tier: Tier) -> u8 {
        tier.0
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "monster-{}", self.0)
    }
}

/// How a tier looks. Opaque to the rules, handed to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Visual {
    /// Fill colour as 0xRRGGBB
    pub color: u32,
    /// Sprite path relative to the asset root
    pub sprite: &'static str,
}

impl Visual {
    /// CSS-style `#rrggbb`
    pub fn color_hex(&self) -> String {
        format!("#{:06x}", self.color)
    }
}

/// Immutable per-tier data
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierSpec {
    pub tier: Tier,
    pub radius: f32,
    /// Points awarded when a merge produces this tier
    pub score: u64,
    pub visual: Visual,
}

const fn spec(rank: u8, radius: f32, score: u64, color: u32, sprite: &'static str) -> TierSpec {
    TierSpec {
        tier: Tier(rank),
        radius,
        score,
        visual: Visual { color, sprite },
    }
}

/// The reference tier table
pub static TIERS: [TierSpec; TIER_COUNT] = [
    spec(1, 15.0, 2, 0xffadad, "assets/monsters/monster1.png"),
    spec(2, 25.0, 4, 0xffd6a5, "assets/monsters/monster2.png"),
    spec(3, 35.0, 8, 0xfdffb6, "assets/monsters/monster3.png"),
    spec(4, 45.0, 16, 0xcaffbf, "assets/monsters/monster4.png"),
    spec(5, 55.0, 32, 0x9bf6ff, "assets/monsters/monster5.png"),
    spec(6, 70.0, 64, 0xa0c4ff, "assets/monsters/monster6.png"),
    spec(7, 85.0, 128, 0xbdb2ff, "assets/monsters/monster7.png"),
    spec(8, 100.0, 256, 0xffc6ff, "assets/monsters/monster8.png"),
    spec(9, 120.0, 512, 0xfffffc, "assets/monsters/monster9.png"),
    spec(10, 150.0, 1024, 0x8d99ae, "assets/monsters/monster10.png"),
];

/// Look up a tier's data
#[inline]
pub fn tier_of(tier: Tier) -> &'static TierSpec {
    tier.spec()
}

/// Data of the tier two `tier` pieces merge into, `None` at the top
pub fn next_tier(tier: Tier) -> Option<&'static TierSpec> {
    tier.successor().map(Tier::spec)
}
