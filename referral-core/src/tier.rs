//! Referral Tier Ladder
//!
//! Maps a cumulative referral count to a named tier. Thresholds are
//! strictly increasing and evaluated from the highest down; the mapping
//! is pure and total.

use serde::{Deserialize, Serialize};

/// A named referral rank.
///
/// Variant order matches rank order, so the derived `Ord` agrees with
/// [`Tier::rank`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Bronze,
    Silver,
    Gold,
    Platinum,
    Diamond,
}

impl Tier {
    /// Resolve the tier for a cumulative referral count.
    pub fn for_referrals(total_referrals: u64) -> Tier {
        if total_referrals >= 50 {
            Tier::Diamond
        } else if total_referrals >= 30 {
            Tier::Platinum
        } else if total_referrals >= 15 {
            Tier::Gold
        } else if total_referrals >= 5 {
            Tier::Silver
        } else {
            Tier::Bronze
        }
    }

    /// Numeric rank, bronze = 0.
    pub fn rank(&self) -> u8 {
        match self {
            Tier::Bronze => 0,
            Tier::Silver => 1,
            Tier::Gold => 2,
            Tier::Platinum => 3,
            Tier::Diamond => 4,
        }
    }

    /// Minimum referral count that unlocks this tier.
    pub fn min_referrals(&self) -> u64 {
        match self {
            Tier::Bronze => 0,
            Tier::Silver => 5,
            Tier::Gold => 15,
            Tier::Platinum => 30,
            Tier::Diamond => 50,
        }
    }

    /// Display name for dashboards.
    pub fn display_name(&self) -> &'static str {
        match self {
            Tier::Bronze => "Bronze",
            Tier::Silver => "Silver",
            Tier::Gold => "Gold",
            Tier::Platinum => "Platinum",
            Tier::Diamond => "Diamond",
        }
    }

    /// Icon glyph shown next to the tier name.
    pub fn icon(&self) -> &'static str {
        match self {
            Tier::Bronze => "\u{1F949}",   // 🥉
            Tier::Silver => "\u{1F948}",   // 🥈
            Tier::Gold => "\u{1F947}",     // 🥇
            Tier::Platinum => "\u{1F3C6}", // 🏆
            Tier::Diamond => "\u{1F48E}",  // 💎
        }
    }

    /// The next tier up, if any.
    pub fn next(&self) -> Option<Tier> {
        match self {
            Tier::Bronze => Some(Tier::Silver),
            Tier::Silver => Some(Tier::Gold),
            Tier::Gold => Some(Tier::Platinum),
            Tier::Platinum => Some(Tier::Diamond),
            Tier::Diamond => None,
        }
    }

    /// Progress toward the next tier as `(current, needed)`.
    ///
    /// `None` once the top tier is reached.
    pub fn progress_toward_next(total_referrals: u64) -> Option<(u64, u64)> {
        let current = Tier::for_referrals(total_referrals);
        current
            .next()
            .map(|next| (total_referrals, next.min_referrals()))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Bronze => "bronze",
            Tier::Silver => "silver",
            Tier::Gold => "gold",
            Tier::Platinum => "platinum",
            Tier::Diamond => "diamond",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
