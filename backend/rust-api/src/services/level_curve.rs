use serde::Serialize;

/// Position on the level curve for a given XP total
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelInfo {
    pub level: u32,
    pub xp_into_level: u64,
    pub xp_to_next: u64,
}

/// Canonical XP curve: going from level `n` to `n + 1` costs `n * base_xp`.
///
/// The cumulative XP needed to reach level `L` is `base_xp * L * (L - 1) / 2`,
/// so level 2 starts at 100 XP, level 3 at 300, level 4 at 600 (base 100).
/// Nothing else in the crate derives a level from raw XP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelCurve {
    base_xp: u64,
}

impl Default for LevelCurve {
    fn default() -> Self {
        Self { base_xp: 100 }
    }
}

impl LevelCurve {
    pub fn new(base_xp: u64) -> Self {
        Self {
            base_xp: base_xp.max(1),
        }
    }

    pub fn base_xp(&self) -> u64 {
        self.base_xp
    }

    /// Cumulative XP at which `level` begins
    pub fn threshold(&self, level: u32) -> u128 {
        let l = level.max(1) as u128;
        (self.base_xp as u128)
            .saturating_mul(l - 1)
            .saturating_mul(l)
            / 2
    }

    /// Total over every u64; never fails.
    pub fn level_for(&self, xp: u64) -> LevelInfo {
        let target = xp as u128;

        // Closed-form estimate, then correct for float rounding
        let ratio = 8.0 * (xp as f64) / (self.base_xp as f64);
        let estimate = ((1.0 + (1.0 + ratio).sqrt()) / 2.0).floor();
        let mut level = if estimate >= u32::MAX as f64 {
            u32::MAX
        } else {
            (estimate as u32).max(1)
        };

        while level > 1 && self.threshold(level) > target {
            level -= 1;
        }
        while level < u32::MAX && self.threshold(level + 1) <= target {
            level += 1;
        }

        let start = self.threshold(level);
        let next = if level == u32::MAX {
            u128::MAX
        } else {
            self.threshold(level + 1)
        };

        LevelInfo {
            level,
            xp_into_level: clamp_u64(target - start),
            xp_to_next: clamp_u64(next.saturating_sub(target)),
        }
    }
}

fn clamp_u64(value: u128) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}
