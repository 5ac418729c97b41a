//! Outfit catalog, unlock registry, equipped outfit and the pending-unlock
//! mailbox.
//!
//! The catalog is static. Per-profile state (owned ids, equipped id, pending
//! unlock) lives in the store and is reached through [`Wardrobe`].

use serde::Serialize;

use crate::KeyValueStore;
use crate::constants::DEFAULT_OUTFIT_ID;
use crate::currency::FlowerLedger;
use crate::error::{CozyError, CozyResult};
use crate::events::{CozyEvent, EventBus};
use crate::storage::CozyRepository;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Common => "common",
            Self::Rare => "rare",
            Self::Epic => "epic",
            Self::Legendary => "legendary",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Accessory {
    None,
    Hat,
    Glasses,
    Scarf,
    Crown,
    Headphones,
}

/// Presentation hints. Opaque to game logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutfitVisuals {
    pub body_color: &'static str,
    pub accessory: Accessory,
    pub accessory_color: Option<&'static str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Outfit {
    pub id: &'static str,
    pub name: &'static str,
    pub rarity: Rarity,
    pub description: &'static str,
    /// Closet price in flowers. Negative means the outfit is reward-only.
    pub price: i32,
    pub visuals: OutfitVisuals,
}

impl Outfit {
    #[must_use]
    pub const fn is_purchasable(&self) -> bool {
        self.price >= 0
    }

    /// Price as a flower amount, `None` for reward-only outfits.
    #[must_use]
    pub fn flower_price(&self) -> Option<u64> {
        u64::try_from(self.price).ok()
    }
}

const fn visuals(body_color: &'static str, accessory: Accessory) -> OutfitVisuals {
    OutfitVisuals {
        body_color,
        accessory,
        accessory_color: None,
    }
}

/// The catalog. The first entry is the free default every profile owns.
pub static OUTFITS: [Outfit; 8] = [
    Outfit {
        id: DEFAULT_OUTFIT_ID,
        name: "Classic Pudding",
        rarity: Rarity::Common,
        description: "Just your regular comfortable self.",
        price: 0,
        visuals: visuals("from-amber-100 to-amber-200", Accessory::None),
    },
    Outfit {
        id: "cool_cat",
        name: "Cool Cat",
        rarity: Rarity::Common,
        description: "Stay chill.",
        price: 150,
        visuals: visuals("from-blue-100 to-blue-200", Accessory::Glasses),
    },
    Outfit {
        id: "winter_cozy",
        name: "Shy Pudding",
        rarity: Rarity::Rare,
        description: "Warm and snug.",
        price: 300,
        visuals: visuals("from-stone-100 to-stone-200", Accessory::Scarf),
    },
    Outfit {
        id: "party_pudding",
        name: "Party Pudding",
        rarity: Rarity::Epic,
        description: "Ready to celebrate!",
        price: -1,
        visuals: visuals("from-pink-100 to-pink-200", Accessory::Hat),
    },
    Outfit {
        id: "royal_highness",
        name: "Royal Highness",
        rarity: Rarity::Legendary,
        description: "Bow down to the cuteness.",
        price: -1,
        visuals: visuals("from-purple-100 to-purple-200", Accessory::Crown),
    },
    Outfit {
        id: "gamer_mode",
        name: "Gamer Mode",
        rarity: Rarity::Rare,
        description: "Focus +100",
        price: 400,
        visuals: visuals("from-green-100 to-green-200", Accessory::Headphones),
    },
    Outfit {
        id: "dark_mode",
        name: "Midnight",
        rarity: Rarity::Epic,
        description: "Embrace the night.",
        price: -1,
        visuals: visuals("from-slate-700 to-slate-900", Accessory::None),
    },
    Outfit {
        id: "golden_god",
        name: "Midas Touch",
        rarity: Rarity::Legendary,
        description: "Pure gold.",
        price: -1,
        visuals: visuals("from-yellow-300 to-yellow-500", Accessory::Crown),
    },
];

#[must_use]
pub fn find_outfit(id: &str) -> Option<&'static Outfit> {
    OUTFITS.iter().find(|outfit| outfit.id == id)
}

#[must_use]
pub fn default_outfit() -> &'static Outfit {
    &OUTFITS[0]
}

fn known_outfit(id: &str) -> CozyResult<&'static Outfit> {
    find_outfit(id).ok_or_else(|| CozyError::UnknownOutfit(id.to_string()))
}

/// Per-profile outfit state: owned ids, equipped outfit, pending unlock and
/// closet purchases.
pub struct Wardrobe<'a, S: KeyValueStore> {
    repo: &'a CozyRepository<S>,
    events: &'a EventBus,
}

impl<'a, S: KeyValueStore> Wardrobe<'a, S> {
    pub const fn new(repo: &'a CozyRepository<S>, events: &'a EventBus) -> Self {
        Self { repo, events }
    }

    #[must_use]
    pub fn unlocked_ids(&self) -> Vec<String> {
        self.repo.unlocked_outfits()
    }

    #[must_use]
    pub fn is_unlocked(&self, id: &str) -> bool {
        self.unlocked_ids().iter().any(|owned| owned == id)
    }

    /// Add `id` to the owned set. Returns false if it was already owned.
    ///
    /// # Errors
    ///
    /// Returns [`CozyError::UnknownOutfit`] for ids outside the catalog, or a
    /// storage error if the list cannot be saved.
    pub fn unlock(&self, id: &str) -> CozyResult<bool> {
        let outfit = known_outfit(id)?;
        let mut owned = self.unlocked_ids();
        if owned.iter().any(|existing| existing == outfit.id) {
            return Ok(false);
        }
        owned.push(outfit.id.to_string());
        self.repo.set_unlocked_outfits(&owned)?;
        log::info!("unlocked outfit {}", outfit.id);
        Ok(true)
    }

    /// Wear an owned outfit.
    ///
    /// # Errors
    ///
    /// Returns [`CozyError::UnknownOutfit`] or [`CozyError::OutfitLocked`] when
    /// the id cannot be worn, or a storage error.
    pub fn equip(&self, id: &str) -> CozyResult<&'static Outfit> {
        let outfit = known_outfit(id)?;
        if !self.is_unlocked(outfit.id) {
            return Err(CozyError::OutfitLocked(outfit.id.to_string()));
        }
        self.repo.set_equipped_outfit_id(outfit.id)?;
        log::debug!("equipped outfit {}", outfit.id);
        self.events.emit(&CozyEvent::OutfitChanged {
            outfit_id: outfit.id.to_string(),
        });
        Ok(outfit)
    }

    /// The worn outfit; the default entry when nothing valid is stored.
    #[must_use]
    pub fn equipped(&self) -> &'static Outfit {
        self.repo
            .equipped_outfit_id()
            .and_then(|id| find_outfit(&id))
            .unwrap_or_else(default_outfit)
    }

    /// # Errors
    ///
    /// Returns [`CozyError::UnknownOutfit`] or a storage error.
    pub fn set_pending_unlock(&self, id: &str) -> CozyResult<()> {
        let outfit = known_outfit(id)?;
        self.repo.set_pending_unlock_id(outfit.id)
    }

    #[must_use]
    pub fn pending_unlock(&self) -> Option<&'static Outfit> {
        self.repo
            .pending_unlock_id()
            .and_then(|id| find_outfit(&id))
    }

    /// # Errors
    ///
    /// Returns a storage error if the slot cannot be cleared.
    pub fn clear_pending_unlock(&self) -> CozyResult<()> {
        self.repo.clear_pending_unlock()
    }

    /// Read and clear the pending-unlock slot. An id that no longer names a
    /// catalog entry is discarded.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the slot cannot be cleared.
    pub fn take_pending_unlock(&self) -> CozyResult<Option<&'static Outfit>> {
        let Some(id) = self.repo.pending_unlock_id() else {
            return Ok(None);
        };
        self.clear_pending_unlock()?;
        let outfit = find_outfit(&id);
        if outfit.is_none() {
            log::warn!("discarding pending unlock for unknown outfit {id}");
        }
        Ok(outfit)
    }

    /// Buy a closet outfit with flowers.
    ///
    /// # Errors
    ///
    /// Returns [`CozyError::UnknownOutfit`], [`CozyError::AlreadyOwned`],
    /// [`CozyError::NotPurchasable`] or [`CozyError::InsufficientFlowers`];
    /// none of these change the balance or the owned set. A storage error
    /// while paying rolls the unlock back.
    pub fn purchase(&self, id: &str) -> CozyResult<&'static Outfit> {
        let outfit = known_outfit(id)?;
        if self.is_unlocked(outfit.id) {
            return Err(CozyError::AlreadyOwned(outfit.id.to_string()));
        }
        let Some(price) = outfit.flower_price() else {
            return Err(CozyError::NotPurchasable(outfit.id.to_string()));
        };
        let ledger = FlowerLedger::new(self.repo, self.events);
        let balance = ledger.balance();
        if balance < price {
            return Err(CozyError::InsufficientFlowers {
                needed: price,
                balance,
            });
        }

        // Unlock before paying so a failed write never costs flowers.
        let owned = self.unlocked_ids();
        self.unlock(outfit.id)?;
        match ledger.debit(price) {
            Ok(true) => {}
            Ok(false) => {
                self.restore_unlocked(&owned);
                return Err(CozyError::InsufficientFlowers {
                    needed: price,
                    balance: ledger.balance(),
                });
            }
            Err(err) => {
                self.restore_unlocked(&owned);
                return Err(err);
            }
        }
        log::info!("purchased outfit {} for {price} flowers", outfit.id);
        Ok(outfit)
    }

    fn restore_unlocked(&self, owned: &[String]) {
        if let Err(err) = self.repo.set_unlocked_outfits(owned) {
            log::warn!("could not roll back owned outfits: {err}");
        }
    }
}
