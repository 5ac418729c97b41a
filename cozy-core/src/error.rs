use thiserror::Error;

/// Errors raised by engine operations.
///
/// Reads never produce these; absent or corrupted values fall back to
/// defaults. An insufficient balance on a plain debit is a `false` return,
/// not an error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CozyError {
    #[error("connect a wallet before starting a mission")]
    WalletNotConnected,
    #[error("mission duration must be a positive number of minutes (got {0})")]
    InvalidDuration(f64),
    #[error("no mission has completed yet")]
    MissionNotCompleted,
    #[error("unknown outfit: {0}")]
    UnknownOutfit(String),
    #[error("outfit {0} has not been unlocked")]
    OutfitLocked(String),
    #[error("outfit {0} is already in the closet")]
    AlreadyOwned(String),
    #[error("outfit {0} can only be found on missions")]
    NotPurchasable(String),
    #[error("need {needed} flowers but only have {balance}")]
    InsufficientFlowers { needed: u64, balance: u64 },
    #[error("unknown strategy: {0}")]
    UnknownStrategy(String),
    #[error("storage error: {0}")]
    Storage(String),
}

pub type CozyResult<T> = Result<T, CozyError>;

impl CozyError {
    pub(crate) fn storage(err: &impl std::error::Error) -> Self {
        Self::Storage(err.to_string())
    }
}
