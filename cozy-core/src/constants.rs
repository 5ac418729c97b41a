//! Centralized storage keys and tuning constants for Cozy Block logic.
//!
//! Key strings are part of the persisted layout; changing one orphans the
//! value already saved under the old name.

// Storage keys -------------------------------------------------------------
pub const KEY_FLOWERS: &str = "cozy_flowers_balance";
pub const KEY_MISSION_STATUS: &str = "cozy_mission_status";
pub const KEY_MISSION_START: &str = "cozy_mission_start_time";
pub const KEY_MISSION_DURATION: &str = "cozy_mission_duration";
pub const KEY_OUTFITS_UNLOCKED: &str = "cozy_outfits_unlocked";
pub const KEY_OUTFIT_EQUIPPED: &str = "cozy_outfit_equipped";
pub const KEY_PENDING_UNLOCK: &str = "cozy_pending_unlock";
pub const KEY_STRATEGY: &str = "cozy_strategy";

/// Every key the engine writes, used when clearing a profile key by key.
pub const ALL_KEYS: [&str; 8] = [
    KEY_FLOWERS,
    KEY_MISSION_STATUS,
    KEY_MISSION_START,
    KEY_MISSION_DURATION,
    KEY_OUTFITS_UNLOCKED,
    KEY_OUTFIT_EQUIPPED,
    KEY_PENDING_UNLOCK,
    KEY_STRATEGY,
];

// Outfits ------------------------------------------------------------------
pub const DEFAULT_OUTFIT_ID: &str = "default";

// Mission tuning -----------------------------------------------------------
pub const MS_PER_MINUTE: f64 = 60_000.0;
/// Duration reported when none has been persisted.
pub const FALLBACK_DURATION_MS: u64 = 10_000;
/// Mission length used when a start request carries no duration.
pub const DEFAULT_MISSION_MINUTES: f64 = 0.5;
pub const POLL_INTERVAL_MS: u32 = 100;

// Reward tuning ------------------------------------------------------------
pub const FLOWERS_PER_MINUTE: f64 = 10.0;
pub const BASE_DROP_CHANCE: f64 = 0.5;
pub const DROP_CHANCE_PER_MINUTE: f64 = 0.005;
pub const MAX_DROP_CHANCE: f64 = 1.0;
