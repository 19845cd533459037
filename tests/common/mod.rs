// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use chrono::Utc;
use saldo::application::LedgerService;
use saldo::domain::{Cents, Transaction, TransactionKind};
use tempfile::TempDir;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(LedgerService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = LedgerService::init(db_path.to_str().unwrap()).await?;
    Ok((service, temp_dir))
}

/// Helper to build a valid transaction with the current timestamp
pub fn make_tx(kind: TransactionKind, value: Cents, description: &str) -> Transaction {
    Transaction::new(kind, value, description, Utc::now()).unwrap()
}

pub fn credit(value: Cents) -> Transaction {
    make_tx(TransactionKind::Credit, value, "credit")
}

pub fn debit(value: Cents) -> Transaction {
    make_tx(TransactionKind::Debit, value, "debit")
}
