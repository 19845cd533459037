use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};

use crate::application::LedgerService;
use crate::domain::{Transaction, TransactionKind, format_cents};

/// Saldo - concurrent account ledger
#[derive(Parser)]
#[command(name = "saldo")]
#[command(about = "A concurrent account ledger with credit limits and bounded statements")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, default_value = "saldo.db")]
    pub database: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Account provisioning commands
    #[command(subcommand)]
    Account(AccountCommands),

    /// Apply a credit or debit to an account
    Apply {
        /// Account id
        account: i64,

        /// Transaction kind: credit (c) or debit (d)
        kind: String,

        /// Amount in cents
        value: i64,

        /// Short description (1 to 10 characters)
        description: String,
    },

    /// Show an account statement (balance, limit, last transactions)
    Statement {
        /// Account id
        account: i64,
    },
}

#[derive(Subcommand)]
pub enum AccountCommands {
    /// Provision a new account with a zero balance
    Create {
        /// Account id (externally assigned)
        id: i64,

        /// Credit limit in cents (how far below zero the balance may go)
        limit: i64,
    },

    /// List all accounts
    List,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Init => {
                LedgerService::init(&self.database).await?;
                println!("Database initialized: {}", self.database);
            }

            Commands::Account(account_cmd) => {
                let service = LedgerService::connect(&self.database).await?;
                run_account_command(&service, account_cmd).await?;
            }

            Commands::Apply {
                account,
                kind,
                value,
                description,
            } => {
                let service = LedgerService::connect(&self.database).await?;

                let kind = TransactionKind::from_str(&kind)
                    .with_context(|| format!("Invalid kind '{}'. Use 'credit' or 'debit'", kind))?;
                let transaction = Transaction::new(kind, value, description, Utc::now())
                    .context("Invalid transaction")?;

                let resume = service.apply(account, transaction).await?;

                println!(
                    "Applied {} of {} to account {} (balance: {}, limit: {})",
                    kind,
                    format_cents(value),
                    account,
                    format_cents(resume.balance),
                    format_cents(resume.credit_limit)
                );
            }

            Commands::Statement { account } => {
                let service = LedgerService::connect(&self.database).await?;
                let statement = service.statement(account).await?;

                println!("Account {} at {}", account, statement.snapshot_time);
                println!(
                    "  balance: {}  limit: {}",
                    format_cents(statement.balance),
                    format_cents(statement.credit_limit)
                );

                if statement.last_transactions.is_empty() {
                    println!("  no transactions");
                } else {
                    println!("  last transactions (newest first):");
                    for tx in &statement.last_transactions {
                        println!(
                            "    {}  {:6}  {:10}  {}",
                            tx.created_at,
                            tx.kind,
                            tx.description,
                            format_cents(tx.value)
                        );
                    }
                }
            }
        }

        Ok(())
    }
}

async fn run_account_command(service: &LedgerService, command: AccountCommands) -> Result<()> {
    match command {
        AccountCommands::Create { id, limit } => {
            let account = service.create_account(id, limit).await?;
            println!(
                "Created account {} with limit {}",
                account.id,
                format_cents(account.credit_limit)
            );
        }

        AccountCommands::List => {
            let accounts = service.list_accounts().await?;
            if accounts.is_empty() {
                println!("No accounts");
                return Ok(());
            }

            println!(
                "{:>10}  {:>12}  {:>12}  {:>8}",
                "id", "balance", "limit", "version"
            );
            for account in accounts {
                println!(
                    "{:>10}  {:>12}  {:>12}  {:>8}",
                    account.id,
                    format_cents(account.balance),
                    format_cents(account.credit_limit),
                    account.version
                );
            }
        }
    }

    Ok(())
}
