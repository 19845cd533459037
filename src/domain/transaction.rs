use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Cents;

/// Maximum description length in characters.
pub const MAX_DESCRIPTION_LEN: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money entering the account (balance increases)
    Credit,
    /// Money leaving the account (balance decreases)
    Debit,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Credit => "credit",
            TransactionKind::Debit => "debit",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "credit" | "c" => Some(TransactionKind::Credit),
            "debit" | "d" => Some(TransactionKind::Debit),
            _ => None,
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single credit or debit against an account.
/// Transactions are immutable - the ledger only ever appends them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub kind: TransactionKind,
    /// Amount in cents (always non-negative; the kind carries the sign)
    pub value: Cents,
    /// Short human-readable description (1 to 10 characters)
    pub description: String,
    /// When the transaction was submitted by the caller
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Create a validated transaction.
    pub fn new(
        kind: TransactionKind,
        value: Cents,
        description: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, TransactionError> {
        if value < 0 {
            return Err(TransactionError::NegativeValue(value));
        }

        let description = description.into();
        let len = description.chars().count();
        if len == 0 {
            return Err(TransactionError::EmptyDescription);
        }
        if len > MAX_DESCRIPTION_LEN {
            return Err(TransactionError::DescriptionTooLong(len));
        }

        Ok(Self {
            kind,
            value,
            description,
            created_at,
        })
    }

    /// The signed balance delta this transaction represents.
    pub fn signed_delta(&self) -> Cents {
        match self.kind {
            TransactionKind::Credit => self.value,
            TransactionKind::Debit => -self.value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionError {
    NegativeValue(Cents),
    EmptyDescription,
    DescriptionTooLong(usize),
}

impl std::fmt::Display for TransactionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionError::NegativeValue(value) => {
                write!(f, "transaction value must be non-negative, got {}", value)
            }
            TransactionError::EmptyDescription => {
                write!(f, "transaction description must not be empty")
            }
            TransactionError::DescriptionTooLong(len) => {
                write!(
                    f,
                    "transaction description must be at most {} characters, got {}",
                    MAX_DESCRIPTION_LEN, len
                )
            }
        }
    }
}

impl std::error::Error for TransactionError {}
