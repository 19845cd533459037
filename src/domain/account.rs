use serde::{Deserialize, Serialize};

use super::{Cents, Transaction};

pub type AccountId = i64;

/// Maximum number of transactions kept in an account's history.
pub const HISTORY_CAPACITY: usize = 10;

/// An account row as read from storage.
///
/// `id` and `credit_limit` are immutable after provisioning; the engine only
/// ever rewrites `balance`, `history` and `version`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    /// How far below zero the balance may go (always >= 0)
    pub credit_limit: Cents,
    /// Current balance; invariant: balance >= -credit_limit
    pub balance: Cents,
    /// Most recent transactions, oldest first, capped at HISTORY_CAPACITY
    pub history: Vec<Transaction>,
    /// Optimistic-concurrency token, bumped on every successful write
    pub version: i64,
}

impl Account {
    /// The lowest balance this account may reach.
    pub fn balance_floor(&self) -> Cents {
        -self.credit_limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balance_floor() {
        let account = Account {
            id: 1,
            credit_limit: 1000,
            balance: 0,
            history: Vec::new(),
            version: 0,
        };
        assert_eq!(account.balance_floor(), -1000);
    }
}
