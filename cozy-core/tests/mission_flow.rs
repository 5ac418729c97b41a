use std::cell::RefCell;
use std::rc::Rc;

use cozy_core::{
    CozyEngine, CozyError, CozyEvent, KeyValueStore, ManualClock, MemoryStore, MissionStatus,
    PollOutcome, constants,
};

const T0: i64 = 1_717_171_717_000;

fn engine_over(store: &MemoryStore, clock: &ManualClock, seed: u64) -> CozyEngine<MemoryStore, ManualClock> {
    CozyEngine::new(store.clone(), clock.clone(), seed)
}

#[test]
fn fifteen_minute_mission_end_to_end() {
    let store = MemoryStore::new();
    let clock = ManualClock::new(T0);
    let engine = engine_over(&store, &clock, 99);

    engine.start_mission(true, Some(15.0)).unwrap();
    assert_eq!(
        store.get_item(constants::KEY_MISSION_STATUS).unwrap().as_deref(),
        Some("waiting")
    );
    assert_eq!(
        store.get_item(constants::KEY_MISSION_DURATION).unwrap().as_deref(),
        Some("900000")
    );

    clock.advance_minutes(7.5);
    let PollOutcome::Running(progress) = engine.poll().unwrap() else {
        panic!("mission should still be running");
    };
    assert_eq!(progress.remaining_ms, 450_000);
    assert_eq!(progress.countdown_label(), "00:07:30");

    clock.advance_minutes(7.5);
    assert_eq!(engine.poll().unwrap(), PollOutcome::Finished);
    assert_eq!(engine.mission_status(), MissionStatus::Completed);
    assert_eq!(store.get_item(constants::KEY_MISSION_START).unwrap(), None);

    let summary = engine.claim_rewards().unwrap();
    assert_eq!(summary.flowers, 150);
    assert_eq!(summary.balance, 150);
    assert_eq!(
        store.get_item(constants::KEY_FLOWERS).unwrap().as_deref(),
        Some("150")
    );
    assert_eq!(engine.mission_status(), MissionStatus::Idle);
}

#[test]
fn completion_with_empty_pool_credits_flowers_only() {
    let store = MemoryStore::new();
    store
        .set_item(
            constants::KEY_OUTFITS_UNLOCKED,
            r#"["default","party_pudding","royal_highness","dark_mode","golden_god"]"#,
        )
        .unwrap();
    let clock = ManualClock::new(T0);
    let engine = engine_over(&store, &clock, 5);

    engine.start_mission(true, Some(4.0)).unwrap();
    clock.advance_minutes(4.0);
    engine.poll().unwrap();
    let summary = engine.claim_rewards().unwrap();

    assert_eq!(summary.flowers, 40);
    assert!(summary.unlocked.is_none());
    assert_eq!(store.get_item(constants::KEY_PENDING_UNLOCK).unwrap(), None);
}

#[test]
fn dropped_outfit_reaches_the_modal_exactly_once() {
    let store = MemoryStore::new();
    let clock = ManualClock::new(T0);
    let engine = engine_over(&store, &clock, 2024);
    let earned = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&earned);
    engine.events().subscribe(move |event| {
        if let CozyEvent::RewardEarned { unlocked, .. } = event {
            sink.borrow_mut().push(unlocked.clone());
        }
    });

    engine.start_mission(true, Some(240.0)).unwrap();
    clock.advance_minutes(240.0);
    engine.poll().unwrap();
    let summary = engine.claim_rewards().unwrap();
    let outfit = summary.unlocked.expect("4h missions always drop");

    assert_eq!(summary.flowers, 2_400);
    assert_eq!(*earned.borrow(), vec![Some(outfit.id.to_string())]);

    // A reload between the reward and home screens keeps the mailbox.
    let reloaded = engine_over(&store, &clock, 7);
    assert!(reloaded.wardrobe().is_unlocked(outfit.id));
    assert_eq!(reloaded.take_pending_unlock().unwrap(), Some(outfit));
    assert_eq!(reloaded.take_pending_unlock().unwrap(), None);

    reloaded.acknowledge_unlock(outfit.id, true).unwrap();
    assert_eq!(reloaded.snapshot().equipped_outfit, outfit.id);
}

#[test]
fn closet_purchase_after_missions() {
    let store = MemoryStore::new();
    let clock = ManualClock::new(T0);
    let engine = engine_over(&store, &clock, 1);

    assert_eq!(
        engine.purchase_outfit("cool_cat"),
        Err(CozyError::InsufficientFlowers {
            needed: 150,
            balance: 0
        })
    );
    engine.start_mission(true, Some(15.0)).unwrap();
    engine.skip().unwrap();
    engine.claim_rewards().unwrap();

    engine.purchase_outfit("cool_cat").unwrap();
    assert_eq!(engine.ledger().balance(), 0);
    assert_eq!(
        engine.purchase_outfit("cool_cat"),
        Err(CozyError::AlreadyOwned("cool_cat".into()))
    );
    assert_eq!(
        engine.purchase_outfit("golden_god"),
        Err(CozyError::NotPurchasable("golden_god".into()))
    );
    engine.equip_outfit("cool_cat").unwrap();
    assert_eq!(engine.snapshot().equipped_outfit, "cool_cat");
}

#[test]
fn wallet_gate_and_reset_demo() {
    let store = MemoryStore::new();
    let clock = ManualClock::new(T0);
    let engine = engine_over(&store, &clock, 3);

    assert_eq!(
        engine.start_mission(false, None),
        Err(CozyError::WalletNotConnected)
    );
    assert!(store.is_empty());

    engine.start_mission(true, None).unwrap();
    engine.select_strategy("degen").unwrap();
    assert!(!store.is_empty());

    engine.reset_demo().unwrap();
    assert!(store.is_empty());
    let snapshot = engine.snapshot();
    assert_eq!(snapshot.balance, 0);
    assert_eq!(snapshot.strategy, "safe");
    assert_eq!(snapshot.mission_status, MissionStatus::Idle);
    assert_eq!(engine.timer().duration_ms(), constants::FALLBACK_DURATION_MS);
}

#[test]
fn corrupted_store_reads_fall_back_to_defaults() {
    let store = MemoryStore::new();
    for (key, value) in [
        (constants::KEY_FLOWERS, "lots"),
        (constants::KEY_MISSION_STATUS, "sleeping"),
        (constants::KEY_MISSION_DURATION, "0"),
        (constants::KEY_OUTFITS_UNLOCKED, "{not json"),
        (constants::KEY_OUTFIT_EQUIPPED, "tuxedo"),
        (constants::KEY_STRATEGY, "yolo"),
    ] {
        store.set_item(key, value).unwrap();
    }
    let engine = engine_over(&store, &ManualClock::new(T0), 0);

    let snapshot = engine.snapshot();
    assert_eq!(snapshot.balance, 0);
    assert_eq!(snapshot.mission_status, MissionStatus::Idle);
    assert_eq!(snapshot.unlocked_outfits, vec!["default".to_string()]);
    assert_eq!(snapshot.equipped_outfit, "default");
    assert_eq!(snapshot.strategy, "safe");
    assert_eq!(engine.timer().duration_ms(), 10_000);
}
