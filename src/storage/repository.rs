use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode};
use sqlx::{Row, SqlitePool};

use crate::domain::{Account, AccountId, Cents, Transaction};

use super::MIGRATION_001_INITIAL;

/// How long a writer waits on SQLite's write lock before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Repository for persisting and querying accounts.
///
/// All concurrency control is delegated to the storage engine: the
/// conditional update below is a single atomic statement, so the repository
/// stays correct even when several processes share the same database file.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given URL.
    ///
    /// WAL journaling keeps readers unblocked while a writer commits; the
    /// busy timeout makes concurrent writers queue instead of failing fast.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .context("Invalid database URL")?
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePool::connect_with(options)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;

        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    /// Provision a new account with a zero balance and empty history.
    /// Accounts are created outside the ledger engine (seed data, CLI).
    pub async fn create_account(&self, id: AccountId, credit_limit: Cents) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO accounts (id, credit_limit, balance, history, version)
            VALUES (?, ?, 0, '[]', 0)
            "#,
        )
        .bind(id)
        .bind(credit_limit)
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to create account {}", id))?;
        Ok(())
    }

    /// Get an account by id, including its bounded transaction history.
    pub async fn get_account(&self, id: AccountId) -> Result<Option<Account>> {
        let row = sqlx::query(
            r#"
            SELECT id, credit_limit, balance, history, version
            FROM accounts
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("Failed to fetch account {}", id))?;

        match row {
            Some(row) => Ok(Some(Self::row_to_account(&row)?)),
            None => Ok(None),
        }
    }

    /// List all accounts, ordered by id.
    pub async fn list_accounts(&self) -> Result<Vec<Account>> {
        let rows = sqlx::query(
            r#"
            SELECT id, credit_limit, balance, history, version
            FROM accounts
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list accounts")?;

        rows.iter().map(Self::row_to_account).collect()
    }

    /// Conditionally commit a new balance and history for an account.
    ///
    /// The write only lands if the stored version still equals the version
    /// the snapshot was read at; the statement also bumps the version, so
    /// any concurrent writer that raced us will see its own compare fail.
    /// Returns true if exactly one row was updated, false if the snapshot
    /// was stale.
    pub async fn update_if_unchanged(
        &self,
        snapshot: &Account,
        new_balance: Cents,
        new_history: &[Transaction],
    ) -> Result<bool> {
        let history_json = serde_json::to_string(new_history)
            .with_context(|| format!("Failed to serialize history for account {}", snapshot.id))?;

        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET balance = ?, history = ?, version = version + 1
            WHERE id = ? AND version = ?
            "#,
        )
        .bind(new_balance)
        .bind(&history_json)
        .bind(snapshot.id)
        .bind(snapshot.version)
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to update account {}", snapshot.id))?;

        Ok(result.rows_affected() == 1)
    }

    fn row_to_account(row: &sqlx::sqlite::SqliteRow) -> Result<Account> {
        let id: AccountId = row.get("id");
        let history_json: String = row.get("history");

        // A history column that no longer parses is corrupt storage, not a
        // caller error; surface it as fatal.
        let history: Vec<Transaction> = serde_json::from_str(&history_json)
            .with_context(|| format!("Malformed transaction history for account {}", id))?;

        Ok(Account {
            id,
            credit_limit: row.get("credit_limit"),
            balance: row.get("balance"),
            history,
            version: row.get("version"),
        })
    }
}
