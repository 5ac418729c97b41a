//! Screen-to-screen game flow.
//!
//! [`CozyEngine`] ties the store, the clock, the event bus and the drop RNG
//! together and exposes the operations the home, waiting and reward screens
//! call. Every piece of state lives in the store, so an engine can be dropped
//! and rebuilt over the same store at any point (a page reload, a new CLI
//! run) without losing anything.

use std::cell::RefCell;

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::Serialize;

use crate::KeyValueStore;
use crate::clock::Clock;
use crate::constants::{DEFAULT_MISSION_MINUTES, POLL_INTERVAL_MS};
use crate::currency::FlowerLedger;
use crate::error::{CozyError, CozyResult};
use crate::events::{CozyEvent, EventBus};
use crate::mission::{MissionProgress, MissionStatus, MissionTimer};
use crate::outfits::{Outfit, Wardrobe, default_outfit, find_outfit};
use crate::reward::{RewardSummary, flower_reward, roll_outfit_drop};
use crate::storage::CozyRepository;
use crate::strategies::{Strategy, StrategySelector};

/// Tunables that are not part of the persisted profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// How often front ends should call [`CozyEngine::poll`].
    pub tick_interval_ms: u32,
    /// Mission length used when `start_mission` gets no explicit duration.
    pub default_mission_minutes: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: POLL_INTERVAL_MS,
            default_mission_minutes: DEFAULT_MISSION_MINUTES,
        }
    }
}

/// Result of one [`CozyEngine::poll`] tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum PollOutcome {
    /// No mission running.
    Idle,
    Running(MissionProgress),
    /// This tick moved the mission to completed.
    Finished,
    /// Completed earlier and still waiting for rewards to be claimed.
    AlreadyCompleted,
}

/// Everything the home screen renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeSnapshot {
    pub balance: u64,
    pub equipped_outfit: String,
    pub unlocked_outfits: Vec<String>,
    pub strategy: String,
    pub mission_status: MissionStatus,
    pub progress: Option<MissionProgress>,
    pub pending_unlock: Option<String>,
}

pub struct CozyEngine<S: KeyValueStore, C: Clock> {
    repo: CozyRepository<S>,
    clock: C,
    events: EventBus,
    rng: RefCell<ChaCha20Rng>,
    config: EngineConfig,
}

impl<S: KeyValueStore, C: Clock> CozyEngine<S, C> {
    /// Create an engine with the default configuration. `seed` drives the
    /// outfit drop rolls.
    pub fn new(store: S, clock: C, seed: u64) -> Self {
        Self::with_config(store, clock, seed, EngineConfig::default())
    }

    pub fn with_config(store: S, clock: C, seed: u64, config: EngineConfig) -> Self {
        log::debug!("engine created with seed {seed:#x}");
        Self {
            repo: CozyRepository::new(store),
            clock,
            events: EventBus::new(),
            rng: RefCell::new(ChaCha20Rng::seed_from_u64(seed)),
            config,
        }
    }

    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub const fn events(&self) -> &EventBus {
        &self.events
    }

    pub const fn repository(&self) -> &CozyRepository<S> {
        &self.repo
    }

    pub const fn clock(&self) -> &C {
        &self.clock
    }

    pub const fn ledger(&self) -> FlowerLedger<'_, S> {
        FlowerLedger::new(&self.repo, &self.events)
    }

    pub const fn wardrobe(&self) -> Wardrobe<'_, S> {
        Wardrobe::new(&self.repo, &self.events)
    }

    pub const fn strategies(&self) -> StrategySelector<'_, S> {
        StrategySelector::new(&self.repo, &self.events)
    }

    pub const fn timer(&self) -> MissionTimer<'_, S, C> {
        MissionTimer::new(&self.repo, &self.clock)
    }

    // Home ------------------------------------------------------------------

    /// Start a mission of `minutes` (the configured default when `None`).
    /// Returns the start timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`CozyError::WalletNotConnected`] when the wallet gate is
    /// closed, [`CozyError::InvalidDuration`] for unusable lengths, or a
    /// storage error.
    pub fn start_mission(&self, wallet_connected: bool, minutes: Option<f64>) -> CozyResult<i64> {
        if !wallet_connected {
            return Err(CozyError::WalletNotConnected);
        }
        let minutes = minutes.unwrap_or(self.config.default_mission_minutes);
        let timer = self.timer();
        let started_at = timer.start(minutes)?;
        self.events.emit(&CozyEvent::MissionStarted {
            duration_ms: timer.duration_ms(),
        });
        Ok(started_at)
    }

    #[must_use]
    pub fn mission_status(&self) -> MissionStatus {
        self.timer().status()
    }

    #[must_use]
    pub fn mission_progress(&self) -> Option<MissionProgress> {
        self.timer().progress()
    }

    /// Equip an owned outfit.
    ///
    /// # Errors
    ///
    /// See [`Wardrobe::equip`].
    pub fn equip_outfit(&self, id: &str) -> CozyResult<&'static Outfit> {
        self.wardrobe().equip(id)
    }

    /// Buy a closet outfit.
    ///
    /// # Errors
    ///
    /// See [`Wardrobe::purchase`].
    pub fn purchase_outfit(&self, id: &str) -> CozyResult<&'static Outfit> {
        self.wardrobe().purchase(id)
    }

    /// # Errors
    ///
    /// See [`StrategySelector::select`].
    pub fn select_strategy(&self, id: &str) -> CozyResult<&'static Strategy> {
        self.strategies().select(id)
    }

    /// Wipe the whole profile back to a first launch.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the store cannot be cleared.
    pub fn reset_demo(&self) -> CozyResult<()> {
        self.repo.clear_all()?;
        log::info!("demo reset, profile cleared");
        self.events.emit(&CozyEvent::FlowersChanged { balance: 0 });
        self.events.emit(&CozyEvent::OutfitChanged {
            outfit_id: default_outfit().id.to_string(),
        });
        self.events.emit(&CozyEvent::MissionReset);
        Ok(())
    }

    #[must_use]
    pub fn snapshot(&self) -> HomeSnapshot {
        let wardrobe = self.wardrobe();
        let timer = self.timer();
        HomeSnapshot {
            balance: self.ledger().balance(),
            equipped_outfit: wardrobe.equipped().id.to_string(),
            unlocked_outfits: wardrobe.unlocked_ids(),
            strategy: self.strategies().selected().id.to_string(),
            mission_status: timer.status(),
            progress: timer.progress(),
            pending_unlock: wardrobe.pending_unlock().map(|o| o.id.to_string()),
        }
    }

    // Waiting ---------------------------------------------------------------

    /// Advance the mission state machine to the clock's current time.
    ///
    /// # Errors
    ///
    /// Returns a storage error if completion cannot be persisted.
    pub fn poll(&self) -> CozyResult<PollOutcome> {
        let timer = self.timer();
        match timer.status() {
            MissionStatus::Idle => Ok(PollOutcome::Idle),
            MissionStatus::Completed => Ok(PollOutcome::AlreadyCompleted),
            MissionStatus::Waiting => {
                let Some(progress) = timer.progress() else {
                    return Ok(PollOutcome::Idle);
                };
                if !progress.is_finished() {
                    return Ok(PollOutcome::Running(progress));
                }
                timer.complete()?;
                self.events.emit(&CozyEvent::MissionCompleted);
                Ok(PollOutcome::Finished)
            }
        }
    }

    /// Finish a waiting mission immediately. Returns false when nothing was
    /// running.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub fn skip(&self) -> CozyResult<bool> {
        let timer = self.timer();
        if timer.status() != MissionStatus::Waiting {
            return Ok(false);
        }
        log::info!("skipping the rest of the mission");
        timer.complete()?;
        self.events.emit(&CozyEvent::MissionCompleted);
        Ok(true)
    }

    // Reward ----------------------------------------------------------------

    /// Pay out a completed mission: flowers for its length and a chance at a
    /// reward-only outfit, which is unlocked and parked in the pending slot.
    /// The mission is returned to idle before anything is paid or announced,
    /// so each one pays at most once, even when a listener or a failed write
    /// triggers another claim.
    ///
    /// # Errors
    ///
    /// Returns [`CozyError::MissionNotCompleted`] unless the mission is
    /// completed, or a storage error.
    pub fn claim_rewards(&self) -> CozyResult<RewardSummary> {
        let timer = self.timer();
        if timer.status() != MissionStatus::Completed {
            return Err(CozyError::MissionNotCompleted);
        }
        let duration_minutes = timer.duration_minutes();
        timer.reset()?;

        let flowers = flower_reward(duration_minutes);
        let ledger = self.ledger();
        let balance = if flowers > 0 {
            ledger.credit(flowers)?
        } else {
            ledger.balance()
        };

        let wardrobe = self.wardrobe();
        let owned = wardrobe.unlocked_ids();
        let unlocked = {
            let mut rng = self.rng.borrow_mut();
            roll_outfit_drop(duration_minutes, &owned, &mut *rng)
        };
        if let Some(outfit) = unlocked {
            wardrobe.unlock(outfit.id)?;
            wardrobe.set_pending_unlock(outfit.id)?;
        }

        log::info!(
            "rewards claimed: {flowers} flowers, drop {}",
            unlocked.map_or("none", |o| o.id)
        );
        self.events.emit(&CozyEvent::RewardEarned {
            flowers,
            unlocked: unlocked.map(|o| o.id.to_string()),
        });
        self.events.emit(&CozyEvent::MissionReset);

        Ok(RewardSummary {
            duration_minutes,
            flowers,
            balance,
            unlocked,
        })
    }

    /// Leave the reward screen. Safe to call in any state.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub fn return_home(&self) -> CozyResult<()> {
        self.timer().reset()?;
        self.events.emit(&CozyEvent::MissionReset);
        Ok(())
    }

    /// Read and clear the pending unlock for the new-outfit modal.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub fn take_pending_unlock(&self) -> CozyResult<Option<&'static Outfit>> {
        self.wardrobe().take_pending_unlock()
    }

    /// Dismiss the new-outfit modal, wearing the outfit when `wear_now`.
    /// Returns the equipped outfit in that case.
    ///
    /// # Errors
    ///
    /// Returns [`CozyError::UnknownOutfit`], [`CozyError::OutfitLocked`] or a
    /// storage error.
    pub fn acknowledge_unlock(&self, id: &str, wear_now: bool) -> CozyResult<Option<&'static Outfit>> {
        let wardrobe = self.wardrobe();
        if wardrobe
            .pending_unlock()
            .is_some_and(|pending| pending.id == id)
        {
            wardrobe.clear_pending_unlock()?;
        }
        if wear_now {
            return wardrobe.equip(id).map(Some);
        }
        find_outfit(id)
            .map(|_| None)
            .ok_or_else(|| CozyError::UnknownOutfit(id.to_string()))
    }
}

impl<S: KeyValueStore, C: Clock> std::fmt::Debug for CozyEngine<S, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CozyEngine")
            .field("config", &self.config)
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}
