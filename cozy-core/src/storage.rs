//! Typed access to the persisted key-value layout.
//!
//! [`CozyRepository`] is the only code that knows key strings and value
//! encodings. Reads never fail: a store error is logged and treated as an
//! absent value, and every absent or unparsable value falls back to its
//! documented default. Writes surface store failures as
//! [`CozyError::Storage`].

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::rc::Rc;

use crate::KeyValueStore;
use crate::constants::{
    ALL_KEYS, DEFAULT_OUTFIT_ID, FALLBACK_DURATION_MS, KEY_FLOWERS, KEY_MISSION_DURATION,
    KEY_MISSION_START, KEY_MISSION_STATUS, KEY_OUTFIT_EQUIPPED, KEY_OUTFITS_UNLOCKED,
    KEY_PENDING_UNLOCK, KEY_STRATEGY,
};
use crate::error::{CozyError, CozyResult};
use crate::mission::MissionStatus;

/// In-memory store. Clones share the same map, so a test can keep a handle
/// and inspect what the engine wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Rc<RefCell<BTreeMap<String, String>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    type Error = Infallible;

    fn get_item(&self, key: &str) -> Result<Option<String>, Self::Error> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), Self::Error> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), Self::Error> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<(), Self::Error> {
        self.entries.borrow_mut().clear();
        Ok(())
    }
}

#[derive(Debug)]
pub struct CozyRepository<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> CozyRepository<S> {
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.store.get_item(key) {
            Ok(value) => value.filter(|v| !v.is_empty()),
            Err(err) => {
                log::warn!("reading {key} failed, using default: {err}");
                None
            }
        }
    }

    fn write(&self, key: &str, value: &str) -> CozyResult<()> {
        self.store
            .set_item(key, value)
            .map_err(|err| CozyError::storage(&err))
    }

    fn remove(&self, key: &str) -> CozyResult<()> {
        self.store
            .remove_item(key)
            .map_err(|err| CozyError::storage(&err))
    }

    // Flowers --------------------------------------------------------------

    #[must_use]
    pub fn flowers(&self) -> u64 {
        self.read(KEY_FLOWERS)
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or(0)
    }

    /// # Errors
    ///
    /// Returns [`CozyError::Storage`] if the store rejects the write.
    pub fn set_flowers(&self, balance: u64) -> CozyResult<()> {
        self.write(KEY_FLOWERS, &balance.to_string())
    }

    // Mission --------------------------------------------------------------

    /// Raw persisted status. Does not check the start-time invariant; see
    /// [`crate::MissionTimer::status`].
    #[must_use]
    pub fn mission_status(&self) -> MissionStatus {
        self.read(KEY_MISSION_STATUS)
            .and_then(|raw| MissionStatus::from_key(raw.trim()))
            .unwrap_or_default()
    }

    /// # Errors
    ///
    /// Returns [`CozyError::Storage`] if the store rejects the write.
    pub fn set_mission_status(&self, status: MissionStatus) -> CozyResult<()> {
        self.write(KEY_MISSION_STATUS, status.key())
    }

    #[must_use]
    pub fn mission_start_ms(&self) -> Option<i64> {
        self.read(KEY_MISSION_START)
            .and_then(|raw| raw.trim().parse().ok())
    }

    /// # Errors
    ///
    /// Returns [`CozyError::Storage`] if the store rejects the write.
    pub fn set_mission_start_ms(&self, start_ms: i64) -> CozyResult<()> {
        self.write(KEY_MISSION_START, &start_ms.to_string())
    }

    /// # Errors
    ///
    /// Returns [`CozyError::Storage`] if the store rejects the removal.
    pub fn clear_mission_start(&self) -> CozyResult<()> {
        self.remove(KEY_MISSION_START)
    }

    /// Persisted mission length, or [`FALLBACK_DURATION_MS`] when absent,
    /// unparsable or zero.
    #[must_use]
    pub fn mission_duration_ms(&self) -> u64 {
        self.read(KEY_MISSION_DURATION)
            .and_then(|raw| raw.trim().parse().ok())
            .filter(|ms| *ms > 0)
            .unwrap_or(FALLBACK_DURATION_MS)
    }

    /// # Errors
    ///
    /// Returns [`CozyError::Storage`] if the store rejects the write.
    pub fn set_mission_duration_ms(&self, duration_ms: u64) -> CozyResult<()> {
        self.write(KEY_MISSION_DURATION, &duration_ms.to_string())
    }

    // Outfits --------------------------------------------------------------

    /// Owned outfit ids in unlock order. Always contains the default id.
    #[must_use]
    pub fn unlocked_outfits(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .read(KEY_OUTFITS_UNLOCKED)
            .and_then(|raw| match serde_json::from_str::<Vec<String>>(&raw) {
                Ok(ids) => Some(ids),
                Err(err) => {
                    log::warn!("unlocked outfit list is corrupted, resetting view: {err}");
                    None
                }
            })
            .unwrap_or_default();
        if !ids.iter().any(|id| id == DEFAULT_OUTFIT_ID) {
            ids.insert(0, DEFAULT_OUTFIT_ID.to_string());
        }
        ids
    }

    /// # Errors
    ///
    /// Returns [`CozyError::Storage`] if the list cannot be encoded or the
    /// store rejects the write.
    pub fn set_unlocked_outfits(&self, ids: &[String]) -> CozyResult<()> {
        let json = serde_json::to_string(ids).map_err(|err| CozyError::storage(&err))?;
        self.write(KEY_OUTFITS_UNLOCKED, &json)
    }

    #[must_use]
    pub fn equipped_outfit_id(&self) -> Option<String> {
        self.read(KEY_OUTFIT_EQUIPPED)
    }

    /// # Errors
    ///
    /// Returns [`CozyError::Storage`] if the store rejects the write.
    pub fn set_equipped_outfit_id(&self, id: &str) -> CozyResult<()> {
        self.write(KEY_OUTFIT_EQUIPPED, id)
    }

    #[must_use]
    pub fn pending_unlock_id(&self) -> Option<String> {
        self.read(KEY_PENDING_UNLOCK)
    }

    /// # Errors
    ///
    /// Returns [`CozyError::Storage`] if the store rejects the write.
    pub fn set_pending_unlock_id(&self, id: &str) -> CozyResult<()> {
        self.write(KEY_PENDING_UNLOCK, id)
    }

    /// # Errors
    ///
    /// Returns [`CozyError::Storage`] if the store rejects the removal.
    pub fn clear_pending_unlock(&self) -> CozyResult<()> {
        self.remove(KEY_PENDING_UNLOCK)
    }

    // Strategy -------------------------------------------------------------

    #[must_use]
    pub fn strategy_id(&self) -> Option<String> {
        self.read(KEY_STRATEGY)
    }

    /// # Errors
    ///
    /// Returns [`CozyError::Storage`] if the store rejects the write.
    pub fn set_strategy_id(&self, id: &str) -> CozyResult<()> {
        self.write(KEY_STRATEGY, id)
    }

    // Profile --------------------------------------------------------------

    /// Wipe the whole profile. Falls back to removing the known keys one by
    /// one when the store cannot clear itself.
    ///
    /// # Errors
    ///
    /// Returns [`CozyError::Storage`] if neither clearing strategy succeeds.
    pub fn clear_all(&self) -> CozyResult<()> {
        if let Err(err) = self.store.clear() {
            log::warn!("store clear failed, removing keys individually: {err}");
            for key in ALL_KEYS {
                self.remove(key)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo() -> (MemoryStore, CozyRepository<MemoryStore>) {
        let store = MemoryStore::new();
        (store.clone(), CozyRepository::new(store))
    }

    #[test]
    fn empty_store_yields_documented_defaults() {
        let (_, repo) = repo();
        assert_eq!(repo.flowers(), 0);
        assert_eq!(repo.mission_status(), MissionStatus::Idle);
        assert_eq!(repo.mission_start_ms(), None);
        assert_eq!(repo.mission_duration_ms(), FALLBACK_DURATION_MS);
        assert_eq!(repo.unlocked_outfits(), vec![DEFAULT_OUTFIT_ID.to_string()]);
        assert_eq!(repo.equipped_outfit_id(), None);
        assert_eq!(repo.pending_unlock_id(), None);
        assert_eq!(repo.strategy_id(), None);
    }

    #[test]
    fn corrupted_values_fall_back() {
        let (store, repo) = repo();
        store.set_item(KEY_FLOWERS, "lots").unwrap();
        store.set_item(KEY_MISSION_STATUS, "sleeping").unwrap();
        store.set_item(KEY_MISSION_START, "yesterday").unwrap();
        store.set_item(KEY_MISSION_DURATION, "-5").unwrap();
        store.set_item(KEY_OUTFITS_UNLOCKED, "[\"default\",").unwrap();
        assert_eq!(repo.flowers(), 0);
        assert_eq!(repo.mission_status(), MissionStatus::Idle);
        assert_eq!(repo.mission_start_ms(), None);
        assert_eq!(repo.mission_duration_ms(), FALLBACK_DURATION_MS);
        assert_eq!(repo.unlocked_outfits(), vec![DEFAULT_OUTFIT_ID.to_string()]);
    }

    #[test]
    fn unlocked_list_always_reports_default() {
        let (store, repo) = repo();
        store
            .set_item(KEY_OUTFITS_UNLOCKED, r#"["dark_mode"]"#)
            .unwrap();
        assert_eq!(
            repo.unlocked_outfits(),
            vec!["default".to_string(), "dark_mode".to_string()]
        );
    }

    #[test]
    fn values_are_written_in_the_documented_encoding() {
        let (store, repo) = repo();
        repo.set_flowers(150).unwrap();
        repo.set_mission_status(MissionStatus::Waiting).unwrap();
        repo.set_mission_start_ms(1_700_000_000_000).unwrap();
        repo.set_mission_duration_ms(900_000).unwrap();
        repo.set_unlocked_outfits(&["default".into(), "cool_cat".into()])
            .unwrap();
        assert_eq!(store.get_item(KEY_FLOWERS).unwrap().as_deref(), Some("150"));
        assert_eq!(
            store.get_item(KEY_MISSION_STATUS).unwrap().as_deref(),
            Some("waiting")
        );
        assert_eq!(
            store.get_item(KEY_MISSION_START).unwrap().as_deref(),
            Some("1700000000000")
        );
        assert_eq!(
            store.get_item(KEY_MISSION_DURATION).unwrap().as_deref(),
            Some("900000")
        );
        assert_eq!(
            store.get_item(KEY_OUTFITS_UNLOCKED).unwrap().as_deref(),
            Some(r#"["default","cool_cat"]"#)
        );
    }

    #[test]
    fn clear_all_wipes_profile() {
        let (store, repo) = repo();
        repo.set_flowers(10).unwrap();
        repo.set_strategy_id("spicy").unwrap();
        repo.clear_all().unwrap();
        assert!(store.is_empty());
    }

    #[derive(Debug, thiserror::Error)]
    #[error("quota exceeded")]
    struct QuotaError;

    struct FailingStore;

    impl KeyValueStore for FailingStore {
        type Error = QuotaError;

        fn get_item(&self, _key: &str) -> Result<Option<String>, Self::Error> {
            Err(QuotaError)
        }

        fn set_item(&self, _key: &str, _value: &str) -> Result<(), Self::Error> {
            Err(QuotaError)
        }

        fn remove_item(&self, _key: &str) -> Result<(), Self::Error> {
            Err(QuotaError)
        }

        fn clear(&self) -> Result<(), Self::Error> {
            Err(QuotaError)
        }
    }

    #[test]
    fn store_failures_read_as_defaults_and_surface_on_write() {
        let repo = CozyRepository::new(FailingStore);
        assert_eq!(repo.flowers(), 0);
        assert_eq!(repo.unlocked_outfits(), vec![DEFAULT_OUTFIT_ID.to_string()]);
        assert_eq!(
            repo.set_flowers(5),
            Err(CozyError::Storage("quota exceeded".into()))
        );
        assert!(repo.clear_all().is_err());
    }
}
