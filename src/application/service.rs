use chrono::{DateTime, Utc};

use crate::domain::{Account, AccountId, ApplyError, Cents, Transaction, apply_transaction};
use crate::storage::Repository;

use super::AppError;

/// How many read-validate-write attempts `apply` makes before surfacing the
/// conflict to the caller. Every round at least one contending writer
/// commits, so with K concurrent writers K rounds always suffice; conflicts
/// are self-limiting because each commit shrinks the race window.
const MAX_APPLY_ATTEMPTS: u32 = 50;

/// Application service providing the ledger operations.
/// This is the primary interface for any client (CLI, API, tests).
pub struct LedgerService {
    repo: Repository,
}

/// Result of a successfully applied transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resume {
    pub balance: Cents,
    pub credit_limit: Cents,
}

/// A point-in-time view of an account.
#[derive(Debug, Clone)]
pub struct BankStatement {
    pub balance: Cents,
    pub credit_limit: Cents,
    /// Wall-clock time the snapshot was taken
    pub snapshot_time: DateTime<Utc>,
    /// Most recent transactions, newest first, at most 10
    pub last_transactions: Vec<Transaction>,
}

impl LedgerService {
    /// Create a new ledger service with the given repository.
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Initialize a new database at the given path.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        Ok(Self::new(repo))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo))
    }

    // ========================
    // Account provisioning
    // ========================

    /// Provision a new account. The ledger engine itself never creates
    /// accounts; this exists for seed data and tests.
    pub async fn create_account(
        &self,
        id: AccountId,
        credit_limit: Cents,
    ) -> Result<Account, AppError> {
        if self.repo.get_account(id).await?.is_some() {
            return Err(AppError::AccountAlreadyExists(id));
        }

        self.repo.create_account(id, credit_limit).await?;

        Ok(Account {
            id,
            credit_limit,
            balance: 0,
            history: Vec::new(),
            version: 0,
        })
    }

    /// Get an account by id.
    pub async fn get_account(&self, id: AccountId) -> Result<Account, AppError> {
        self.repo
            .get_account(id)
            .await?
            .ok_or(AppError::AccountNotFound(id))
    }

    /// List all accounts.
    pub async fn list_accounts(&self) -> Result<Vec<Account>, AppError> {
        Ok(self.repo.list_accounts().await?)
    }

    // ========================
    // Ledger operations
    // ========================

    /// Apply a transaction with bounded retry on concurrency conflicts.
    ///
    /// Each attempt re-reads fresh state; a stale snapshot is never reused.
    /// `InsufficientLimit`, `AccountNotFound` and storage errors are
    /// terminal and returned as-is.
    pub async fn apply(
        &self,
        account_id: AccountId,
        transaction: Transaction,
    ) -> Result<Resume, AppError> {
        for attempt in 1..=MAX_APPLY_ATTEMPTS {
            match self.apply_once(account_id, &transaction).await {
                Err(err) if err.is_retriable() => {
                    log::debug!(
                        "lost update race on account {} (attempt {}), retrying",
                        account_id,
                        attempt
                    );
                    tokio::task::yield_now().await;
                }
                outcome => return outcome,
            }
        }

        log::warn!(
            "giving up on account {} after {} conflicting attempts",
            account_id,
            MAX_APPLY_ATTEMPTS
        );
        Err(AppError::ConcurrencyConflict(account_id))
    }

    /// A single read-validate-write attempt.
    ///
    /// Reads a snapshot, computes the candidate state, then commits it only
    /// if the stored version is still the one the snapshot was read at.
    /// Losing that compare surfaces as `ConcurrencyConflict`; retry policy
    /// belongs to the caller (see `apply`). The read doubles as the
    /// existence check, so a zero-row conditional write is never a masked
    /// `AccountNotFound`.
    pub async fn apply_once(
        &self,
        account_id: AccountId,
        transaction: &Transaction,
    ) -> Result<Resume, AppError> {
        let account = self
            .repo
            .get_account(account_id)
            .await?
            .ok_or(AppError::AccountNotFound(account_id))?;

        let (new_balance, new_history) =
            apply_transaction(&account, transaction).map_err(|err| match err {
                ApplyError::InsufficientLimit {
                    balance,
                    credit_limit,
                    attempted,
                } => AppError::InsufficientLimit {
                    account_id,
                    balance,
                    credit_limit,
                    attempted,
                },
            })?;

        if self
            .repo
            .update_if_unchanged(&account, new_balance, &new_history)
            .await?
        {
            Ok(Resume {
                balance: new_balance,
                credit_limit: account.credit_limit,
            })
        } else {
            Err(AppError::ConcurrencyConflict(account_id))
        }
    }

    /// Read the current statement for an account: balance, credit limit,
    /// snapshot timestamp and the last transactions, newest first.
    pub async fn statement(&self, account_id: AccountId) -> Result<BankStatement, AppError> {
        let account = self
            .repo
            .get_account(account_id)
            .await?
            .ok_or(AppError::AccountNotFound(account_id))?;

        // History is stored oldest first; statements present newest first.
        let mut last_transactions = account.history;
        last_transactions.reverse();

        Ok(BankStatement {
            balance: account.balance,
            credit_limit: account.credit_limit,
            snapshot_time: Utc::now(),
            last_transactions,
        })
    }
}
