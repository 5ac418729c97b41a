//! Vault strategy presets. The selection is a stored preference only; it does
//! not feed into rewards.

use serde::Serialize;

use crate::KeyValueStore;
use crate::error::{CozyError, CozyResult};
use crate::events::{CozyEvent, EventBus};
use crate::storage::CozyRepository;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Strategy {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub technical_description: &'static str,
    pub risk_level: RiskLevel,
    pub apy: &'static str,
    pub color: &'static str,
}

pub static STRATEGIES: [Strategy; 3] = [
    Strategy {
        id: "safe",
        name: "Safe & Warm",
        description: "Cozy up with a steady yield.",
        technical_description: "Covered Call Vault",
        risk_level: RiskLevel::Low,
        apy: "5-12%",
        color: "bg-green-100 text-green-700 border-green-200",
    },
    Strategy {
        id: "spicy",
        name: "Spicy & Bold",
        description: "A little adventure for more treat.",
        technical_description: "Put Selling Vault",
        risk_level: RiskLevel::Medium,
        apy: "15-25%",
        color: "bg-orange-100 text-orange-700 border-orange-200",
    },
    Strategy {
        id: "degen",
        name: "Degen Mode",
        description: "High risk, high pudding.",
        technical_description: "Exotic Options Vault",
        risk_level: RiskLevel::High,
        apy: "50%+",
        color: "bg-purple-100 text-purple-700 border-purple-200",
    },
];

#[must_use]
pub fn find_strategy(id: &str) -> Option<&'static Strategy> {
    STRATEGIES.iter().find(|strategy| strategy.id == id)
}

pub struct StrategySelector<'a, S: KeyValueStore> {
    repo: &'a CozyRepository<S>,
    events: &'a EventBus,
}

impl<'a, S: KeyValueStore> StrategySelector<'a, S> {
    pub const fn new(repo: &'a CozyRepository<S>, events: &'a EventBus) -> Self {
        Self { repo, events }
    }

    /// The stored strategy, or the first preset when none or an unknown id
    /// is stored.
    #[must_use]
    pub fn selected(&self) -> &'static Strategy {
        self.repo
            .strategy_id()
            .and_then(|id| find_strategy(&id))
            .unwrap_or(&STRATEGIES[0])
    }

    /// # Errors
    ///
    /// Returns [`CozyError::UnknownStrategy`] or a storage error.
    pub fn select(&self, id: &str) -> CozyResult<&'static Strategy> {
        let strategy = find_strategy(id).ok_or_else(|| CozyError::UnknownStrategy(id.to_string()))?;
        self.repo.set_strategy_id(strategy.id)?;
        self.events.emit(&CozyEvent::StrategyChanged {
            strategy_id: strategy.id.to_string(),
        });
        Ok(strategy)
    }
}
