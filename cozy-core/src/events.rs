//! Change notifications.
//!
//! Delivery is synchronous and in-process. Listeners registered after an
//! event fired never see it, so every consumer re-reads state when it
//! attaches.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum CozyEvent {
    FlowersChanged { balance: u64 },
    OutfitChanged { outfit_id: String },
    RewardEarned { flowers: u64, unlocked: Option<String> },
    MissionStarted { duration_ms: u64 },
    MissionCompleted,
    MissionReset,
    StrategyChanged { strategy_id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u32);

impl SubscriptionId {
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

type Listener = Rc<dyn Fn(&CozyEvent)>;

/// Explicit observer registry for [`CozyEvent`]s.
#[derive(Default)]
pub struct EventBus {
    next_id: Cell<u32>,
    listeners: RefCell<Vec<(SubscriptionId, Listener)>>,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&CozyEvent) + 'static,
    {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(self.next_id.get().wrapping_add(1));
        self.listeners.borrow_mut().push((id, Rc::new(listener)));
        id
    }

    /// Returns false if `id` was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    pub fn emit(&self, event: &CozyEvent) {
        // Snapshot so listeners may subscribe or unsubscribe while handling.
        let snapshot: Vec<Listener> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        log::trace!("emit {event:?} to {} listener(s)", snapshot.len());
        for listener in snapshot {
            listener(event);
        }
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listener_count())
            .finish()
    }
}
