use super::{Account, Cents, HISTORY_CAPACITY, Transaction};

/// Compute the candidate state for applying a transaction to an account.
///
/// Returns the new balance and the new bounded history (oldest first, newest
/// last, at most `HISTORY_CAPACITY` entries). Pure: the account is not
/// modified and nothing is persisted here - committing the candidate state is
/// the repository's job.
pub fn apply_transaction(
    account: &Account,
    transaction: &Transaction,
) -> Result<(Cents, Vec<Transaction>), ApplyError> {
    let candidate = account.balance + transaction.signed_delta();

    if candidate < account.balance_floor() {
        return Err(ApplyError::InsufficientLimit {
            balance: account.balance,
            credit_limit: account.credit_limit,
            attempted: transaction.value,
        });
    }

    let mut history = account.history.clone();
    if history.len() >= HISTORY_CAPACITY {
        history.remove(0);
    }
    history.push(transaction.clone());

    Ok((candidate, history))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyError {
    /// The debit would push the balance below -credit_limit
    InsufficientLimit {
        balance: Cents,
        credit_limit: Cents,
        attempted: Cents,
    },
}

impl std::fmt::Display for ApplyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApplyError::InsufficientLimit {
                balance,
                credit_limit,
                attempted,
            } => {
                write!(
                    f,
                    "debit of {} cents would exceed credit limit ({} cents, balance {})",
                    attempted, credit_limit, balance
                )
            }
        }
    }
}

impl std::error::Error for ApplyError {}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::TransactionKind;

    fn make_account(balance: Cents, credit_limit: Cents) -> Account {
        Account {
            id: 1,
            credit_limit,
            balance,
            history: Vec::new(),
            version: 0,
        }
    }

    fn make_tx(kind: TransactionKind, value: Cents) -> Transaction {
        Transaction::new(kind, value, "test", Utc::now()).unwrap()
    }

    #[test]
    fn test_credit_increases_balance() {
        let account = make_account(0, 1000);
        let tx = make_tx(TransactionKind::Credit, 500);

        let (balance, history) = apply_transaction(&account, &tx).unwrap();
        assert_eq!(balance, 500);
        assert_eq!(history, vec![tx]);
    }

    #[test]
    fn test_debit_decreases_balance() {
        let account = make_account(500, 1000);
        let tx = make_tx(TransactionKind::Debit, 300);

        let (balance, _) = apply_transaction(&account, &tx).unwrap();
        assert_eq!(balance, 200);
    }

    #[test]
    fn test_debit_may_use_credit_limit() {
        let account = make_account(0, 1000);
        let tx = make_tx(TransactionKind::Debit, 1000);

        // Exactly at the floor is still allowed
        let (balance, _) = apply_transaction(&account, &tx).unwrap();
        assert_eq!(balance, -1000);
    }

    #[test]
    fn test_debit_below_floor_fails() {
        let account = make_account(0, 1000);
        let tx = make_tx(TransactionKind::Debit, 1001);

        let result = apply_transaction(&account, &tx);
        assert_eq!(
            result,
            Err(ApplyError::InsufficientLimit {
                balance: 0,
                credit_limit: 1000,
                attempted: 1001,
            })
        );
    }

    #[test]
    fn test_credit_never_fails_limit_check() {
        // Balance already at the floor; a credit still goes through
        let account = make_account(-1000, 1000);
        let tx = make_tx(TransactionKind::Credit, 1);

        let (balance, _) = apply_transaction(&account, &tx).unwrap();
        assert_eq!(balance, -999);
    }

    #[test]
    fn test_history_appends_newest_last() {
        let mut account = make_account(0, 0);
        for value in [1, 2, 3] {
            let tx = make_tx(TransactionKind::Credit, value);
            let (balance, history) = apply_transaction(&account, &tx).unwrap();
            account.balance = balance;
            account.history = history;
        }

        let values: Vec<Cents> = account.history.iter().map(|t| t.value).collect();
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[test]
    fn test_history_evicts_oldest_at_capacity() {
        let mut account = make_account(0, 0);
        for value in 1..=11 {
            let tx = make_tx(TransactionKind::Credit, value);
            let (balance, history) = apply_transaction(&account, &tx).unwrap();
            account.balance = balance;
            account.history = history;
        }

        assert_eq!(account.history.len(), HISTORY_CAPACITY);
        let values: Vec<Cents> = account.history.iter().map(|t| t.value).collect();
        assert_eq!(values, (2..=11).collect::<Vec<Cents>>());
    }

    #[test]
    fn test_failed_apply_has_no_effect() {
        let account = make_account(0, 100);
        let tx = make_tx(TransactionKind::Debit, 500);

        assert!(apply_transaction(&account, &tx).is_err());
        assert_eq!(account.balance, 0);
        assert!(account.history.is_empty());
    }
}
