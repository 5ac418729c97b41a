//! Cozy Block Engine
//!
//! Platform-agnostic core logic for the Cozy Block rest-break game: timed
//! missions, the flower currency, outfit unlocks and strategy selection.
//! This crate owns no UI and no platform storage; callers plug in a
//! [`KeyValueStore`] and a [`Clock`].

pub mod clock;
pub mod constants;
pub mod currency;
pub mod engine;
pub mod error;
pub mod events;
pub mod mission;
pub mod outfits;
pub mod reward;
pub mod storage;
pub mod strategies;

// Re-export commonly used types
#[cfg(not(target_arch = "wasm32"))]
pub use clock::SystemClock;
pub use clock::{Clock, ManualClock};
pub use currency::FlowerLedger;
pub use engine::{CozyEngine, EngineConfig, HomeSnapshot, PollOutcome};
pub use error::{CozyError, CozyResult};
pub use events::{CozyEvent, EventBus, SubscriptionId};
pub use mission::{
    DURATION_PRESETS, DurationPreset, MissionProgress, MissionStatus, MissionTimer,
    compute_progress,
};
pub use outfits::{
    Accessory, OUTFITS, Outfit, OutfitVisuals, Rarity, Wardrobe, default_outfit, find_outfit,
};
pub use reward::{RewardSummary, drop_chance, eligible_pool, flower_reward, roll_outfit_drop};
pub use storage::{CozyRepository, MemoryStore};
pub use strategies::{RiskLevel, STRATEGIES, Strategy, StrategySelector, find_strategy};

/// Trait for abstracting the persistent key-value store.
/// Platform-specific implementations should provide this
pub trait KeyValueStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Read the raw value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn get_item(&self, key: &str) -> Result<Option<String>, Self::Error>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store rejects the write.
    fn set_item(&self, key: &str, value: &str) -> Result<(), Self::Error>;

    /// Remove `key` if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store rejects the removal.
    fn remove_item(&self, key: &str) -> Result<(), Self::Error>;

    /// Remove every key in the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be cleared.
    fn clear(&self) -> Result<(), Self::Error>;
}
