//! Reward computation: quest base value plus quality rating plus guild
//! modifiers, all in unsigned integer percentage arithmetic.
//!
//! Combination order is fixed: apply the rating multiplier to the base
//! value first, then sum the additive percentage bonuses (attribute match,
//! full roster) and apply them in a single final multiplication with floor
//! division. Gold rewards skip the attribute term; the caller passes half
//! the quest's XP base as the gold base.

use serde::{Deserialize, Serialize};

use crate::economy::types::GuildContext;

/// Tuning constants for the reward formulas, overridable in `[economy]`
/// config.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RewardTuning {
    /// Percentage points added (or removed) per rating step away from the
    /// neutral rating of 3. The default 25 maps rating 1 to 50% and
    /// rating 5 to 150% of the base value.
    pub rating_step_pct: u32,
    /// Additive bonus when the acting member's attribute matches the
    /// quest's declared attribute.
    pub attribute_match_pct: u32,
    /// Additive bonus when every core guild role is staffed.
    pub full_roster_pct: u32,
}

impl Default for RewardTuning {
    fn default() -> Self {
        Self {
            rating_step_pct: 25,
            attribute_match_pct: 20,
            full_roster_pct: 10,
        }
    }
}

/// Pure reward calculator. No side effects, total over ratings 1..=5,
/// never negative.
#[derive(Debug, Clone, Copy, Default)]
pub struct RewardCalculator {
    tuning: RewardTuning,
}

impl RewardCalculator {
    pub fn new(tuning: RewardTuning) -> Self {
        Self { tuning }
    }

    fn rating_pct(&self, rating: u8) -> u64 {
        let rating = i64::from(rating.clamp(1, 5));
        let pct = 100 + (rating - 3) * i64::from(self.tuning.rating_step_pct);
        pct.max(0) as u64
    }

    fn apply(&self, base: u64, rating: u8, bonus_pct: u64) -> u64 {
        let scaled = base * self.rating_pct(rating) / 100;
        scaled * (100 + bonus_pct) / 100
    }

    /// XP for a completed quest. Attribute match and full-roster bonuses
    /// stack additively before the final multiplication.
    pub fn xp_reward(&self, base_xp: u64, rating: u8, ctx: &GuildContext) -> u64 {
        let mut bonus = 0u64;
        if ctx.attribute_match() {
            bonus += u64::from(self.tuning.attribute_match_pct);
        }
        if ctx.all_core_roles_filled {
            bonus += u64::from(self.tuning.full_roster_pct);
        }
        self.apply(base_xp, rating, bonus)
    }

    /// Gold for a completed quest. Role-agnostic: only the roster bonus
    /// applies. `half_base_xp` is the quest's XP base already halved by
    /// the caller.
    pub fn gold_reward(&self, half_base_xp: u64, rating: u8, ctx: &GuildContext) -> u64 {
        let bonus = if ctx.all_core_roles_filled {
            u64::from(self.tuning.full_roster_pct)
        } else {
            0
        };
        self.apply(half_base_xp, rating, bonus)
    }
}
