use std::cell::Cell;
use std::rc::Rc;

use anyhow::{Context, Result, bail, ensure};
use cozy_core::{
    Clock, CozyEngine, CozyError, HomeSnapshot, KeyValueStore, ManualClock, MissionStatus,
    PollOutcome, SystemClock,
};
use serde::Serialize;

/// What one simulator invocation should do.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationPlan {
    pub missions: u32,
    pub minutes: f64,
    pub seed: u64,
    pub strategy: Option<String>,
    pub purchases: Vec<String>,
    pub fresh: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionRecord {
    pub index: u32,
    pub flowers: u64,
    pub balance: u64,
    pub unlocked: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRecord {
    pub outfit: String,
    pub success: bool,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationReport {
    pub seed: u64,
    pub minutes_per_mission: f64,
    pub starting_balance: u64,
    pub missions: Vec<MissionRecord>,
    pub purchases: Vec<PurchaseRecord>,
    pub events_seen: u32,
    pub profile: HomeSnapshot,
}

impl SimulationReport {
    #[must_use]
    pub fn total_flowers(&self) -> u64 {
        self.missions.iter().map(|m| m.flowers).sum()
    }

    pub fn drops(&self) -> impl Iterator<Item = &str> {
        self.missions.iter().filter_map(|m| m.unlocked.as_deref())
    }
}

/// Run `plan` against `store` with a simulated clock.
///
/// # Errors
/// Fails on invalid plan input (duration, strategy, unknown outfit ids) or
/// when the store rejects a write.
pub fn run<S: KeyValueStore>(store: S, plan: &SimulationPlan) -> Result<SimulationReport> {
    let clock = ManualClock::new(SystemClock.now_ms());
    let engine = CozyEngine::new(store, clock.clone(), plan.seed);

    let events_seen = Rc::new(Cell::new(0_u32));
    let counter = Rc::clone(&events_seen);
    engine
        .events()
        .subscribe(move |_| counter.set(counter.get().saturating_add(1)));

    if plan.fresh {
        engine.reset_demo().context("failed to reset the profile")?;
    }
    if engine.mission_status() != MissionStatus::Idle {
        log::warn!("store held an unfinished mission, returning home first");
        engine.return_home()?;
    }
    if let Some(id) = plan.strategy.as_deref() {
        engine.select_strategy(id)?;
    }

    let starting_balance = engine.ledger().balance();
    let mut missions = Vec::new();
    for index in 1..=plan.missions {
        engine
            .start_mission(true, Some(plan.minutes))
            .with_context(|| format!("mission {index} did not start"))?;
        clock.advance_minutes(plan.minutes);
        let outcome = engine.poll()?;
        ensure!(
            outcome == PollOutcome::Finished,
            "mission {index} still running after its full duration: {outcome:?}"
        );
        let summary = engine.claim_rewards()?;
        let unlocked = engine.take_pending_unlock()?.map(|o| o.id.to_string());
        log::debug!(
            "mission {index}: +{} flowers, drop {:?}",
            summary.flowers,
            unlocked
        );
        missions.push(MissionRecord {
            index,
            flowers: summary.flowers,
            balance: summary.balance,
            unlocked,
        });
    }

    let mut purchases = Vec::new();
    for id in &plan.purchases {
        purchases.push(match engine.purchase_outfit(id) {
            Ok(outfit) => PurchaseRecord {
                outfit: outfit.id.to_string(),
                success: true,
                detail: format!("bought {}", outfit.name),
            },
            Err(err @ CozyError::UnknownOutfit(_)) => bail!(err),
            Err(err) => PurchaseRecord {
                outfit: id.clone(),
                success: false,
                detail: err.to_string(),
            },
        });
    }

    Ok(SimulationReport {
        seed: plan.seed,
        minutes_per_mission: plan.minutes,
        starting_balance,
        missions,
        purchases,
        events_seen: events_seen.get(),
        profile: engine.snapshot(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cozy_core::MemoryStore;

    fn plan() -> SimulationPlan {
        SimulationPlan {
            missions: 3,
            minutes: 15.0,
            seed: 1337,
            strategy: None,
            purchases: Vec::new(),
            fresh: false,
        }
    }

    #[test]
    fn pays_ten_flowers_per_minute_per_mission() {
        let report = run(MemoryStore::new(), &plan()).unwrap();
        assert_eq!(report.missions.len(), 3);
        assert_eq!(report.total_flowers(), 450);
        assert_eq!(report.profile.balance, 450);
        assert_eq!(report.missions[1].balance, 300);
        assert_eq!(report.profile.mission_status, MissionStatus::Idle);
        assert!(report.events_seen >= 9);
    }

    #[test]
    fn same_seed_same_drops() {
        let first = run(MemoryStore::new(), &plan()).unwrap();
        let second = run(MemoryStore::new(), &plan()).unwrap();
        assert_eq!(
            first.drops().collect::<Vec<_>>(),
            second.drops().collect::<Vec<_>>()
        );
    }

    #[test]
    fn every_drop_is_owned_and_unique() {
        let report = run(
            MemoryStore::new(),
            &SimulationPlan {
                missions: 8,
                minutes: 240.0,
                ..plan()
            },
        )
        .unwrap();
        let drops: Vec<_> = report.drops().collect();
        assert_eq!(drops.len(), 4, "four reward-only outfits, all drop at 4h");
        for id in drops {
            assert!(report.profile.unlocked_outfits.iter().any(|o| o == id));
        }
    }

    #[test]
    fn profile_carries_over_unless_fresh() {
        let store = MemoryStore::new();
        run(store.clone(), &plan()).unwrap();
        let again = run(store.clone(), &plan()).unwrap();
        assert_eq!(again.starting_balance, 450);
        assert_eq!(again.profile.balance, 900);

        let fresh = run(store, &SimulationPlan { fresh: true, ..plan() }).unwrap();
        assert_eq!(fresh.starting_balance, 0);
    }

    #[test]
    fn purchases_record_failures_but_reject_unknown_ids() {
        let report = run(
            MemoryStore::new(),
            &SimulationPlan {
                purchases: vec!["cool_cat".into(), "gamer_mode".into(), "dark_mode".into()],
                strategy: Some("spicy".into()),
                ..plan()
            },
        )
        .unwrap();
        assert!(report.purchases[0].success);
        assert!(!report.purchases[1].success);
        assert!(report.purchases[1].detail.contains("need 400"));
        assert!(!report.purchases[2].success);
        assert_eq!(report.profile.strategy, "spicy");
        assert_eq!(report.profile.balance, 300);

        let err = run(
            MemoryStore::new(),
            &SimulationPlan {
                purchases: vec!["tuxedo".into()],
                ..plan()
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("tuxedo"));
    }

    #[test]
    fn invalid_input_is_an_error() {
        assert!(run(MemoryStore::new(), &SimulationPlan { minutes: 0.0, ..plan() }).is_err());
        assert!(
            run(
                MemoryStore::new(),
                &SimulationPlan {
                    strategy: Some("yolo".into()),
                    ..plan()
                }
            )
            .is_err()
        );
    }
}
