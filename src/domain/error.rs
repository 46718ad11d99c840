//! Domain Error Types
//!
//! Business rule violations and invariant failures of the card ledger,
//! independent of the web/infrastructure layer.

use thiserror::Error;

/// Card ledger domain errors.
///
/// Every failure path of the lifecycle service and the transfer engine
/// surfaces as exactly one of these. `CardNotFound` deliberately does not
/// distinguish "does not exist" from "exists but not owned by the caller".
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CardError {
    /// Transfer amount is zero, negative, or malformed
    #[error("Invalid transfer amount: {0}")]
    InvalidAmount(String),

    /// Source and destination cards are the same
    #[error("Cannot transfer to the same card")]
    SameCardTransfer,

    /// Card does not exist or is not owned by the caller
    #[error("Card not found")]
    CardNotFound,

    /// Card is not in ACTIVE status
    #[error("Card is not active: **** **** **** {last_four}")]
    CardNotActive { last_four: String },

    /// Source card balance is below the requested amount
    #[error("Not enough money on card: **** **** **** {last_four}")]
    InsufficientFunds { last_four: String },

    /// A card with the same number fingerprint already exists
    #[error("Card already exists")]
    CardAlreadyExists,

    /// Lock timeout or deadlock abort; the whole transfer may be retried
    #[error("Transfer conflict: concurrent access detected, retry the transfer")]
    TransferConflict,
}

impl CardError {
    /// Caller-input or business-rule error; retrying without a state
    /// change would repeat the same outcome.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidAmount(_)
                | Self::SameCardTransfer
                | Self::CardNotFound
                | Self::CardNotActive { .. }
                | Self::InsufficientFunds { .. }
                | Self::CardAlreadyExists
        )
    }

    /// Transient concurrency conflict; safe to retry since no side effect
    /// is observable before commit.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TransferConflict)
    }
}
