//! Mission reward resolution: flower payout and the outfit drop roll.
//!
//! Everything here is side-effect free. The engine applies the results.

use rand::Rng;
use serde::Serialize;

use crate::constants::{
    BASE_DROP_CHANCE, DROP_CHANCE_PER_MINUTE, FLOWERS_PER_MINUTE, MAX_DROP_CHANCE,
};
use crate::outfits::{OUTFITS, Outfit};

/// Flowers paid for a mission: ten per minute, rounded down.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn flower_reward(duration_minutes: f64) -> u64 {
    if !duration_minutes.is_finite() || duration_minutes <= 0.0 {
        return 0;
    }
    (duration_minutes * FLOWERS_PER_MINUTE).floor() as u64
}

/// Probability that a finished mission drops an outfit, `0.5 + 0.005/min`,
/// capped at 1.
#[must_use]
pub fn drop_chance(duration_minutes: f64) -> f64 {
    if duration_minutes.is_nan() {
        return BASE_DROP_CHANCE;
    }
    (BASE_DROP_CHANCE + duration_minutes * DROP_CHANCE_PER_MINUTE).clamp(0.0, MAX_DROP_CHANCE)
}

/// Reward-only outfits the profile does not own yet, in catalog order.
#[must_use]
pub fn eligible_pool(unlocked: &[String]) -> Vec<&'static Outfit> {
    OUTFITS
        .iter()
        .filter(|outfit| !outfit.is_purchasable())
        .filter(|outfit| !unlocked.iter().any(|id| id == outfit.id))
        .collect()
}

/// Roll for an outfit drop. Does not unlock anything.
pub fn roll_outfit_drop(
    duration_minutes: f64,
    unlocked: &[String],
    rng: &mut impl Rng,
) -> Option<&'static Outfit> {
    let pool = eligible_pool(unlocked);
    if pool.is_empty() {
        return None;
    }
    let chance = drop_chance(duration_minutes);
    let roll = rng.r#gen::<f64>();
    if roll > chance {
        log::debug!("drop roll {roll:.3} missed chance {chance:.3}");
        return None;
    }
    let pick = rng.gen_range(0..pool.len());
    Some(pool[pick])
}

/// What a completed mission paid out.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardSummary {
    pub duration_minutes: f64,
    pub flowers: u64,
    pub balance: u64,
    pub unlocked: Option<&'static Outfit>,
}
