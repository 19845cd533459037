use thiserror::Error;

use crate::domain::{AccountId, Cents};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    #[error("Account already exists: {0}")]
    AccountAlreadyExists(AccountId),

    #[error(
        "Insufficient limit on account {account_id}: balance {balance}, limit {credit_limit}, attempted debit {attempted}"
    )]
    InsufficientLimit {
        account_id: AccountId,
        balance: Cents,
        credit_limit: Cents,
        attempted: Cents,
    },

    #[error("Concurrent update conflict on account {0}")]
    ConcurrencyConflict(AccountId),

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}

impl AppError {
    /// Whether retrying the same operation against fresh state can succeed.
    /// Only a lost compare-and-swap race is worth another attempt; every
    /// other outcome is terminal.
    pub fn is_retriable(&self) -> bool {
        matches!(self, AppError::ConcurrencyConflict(_))
    }
}
