//! Storage for account balances and the transaction log
//!
//! The store owns the consistency invariants of the ledger: the balance
//! mutation and the log append are a single atomic unit, and concurrent
//! operations on the same account are linearized. Callers never interleave
//! a read and a write across a suspension point visible to other tasks.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use common::db::models::{DbTransactionEntry, DbUserBalance};
use common::decimal::Amount;
use common::error::{Error, Result};
use common::model::ledger::{AccountBalance, EntryDraft, MissingAccountPolicy, TransactionEntry};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::{debug, info};

/// Ledger store trait defining the interface for durable ledger state
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Get the current balance record, or `None` for an account that has
    /// never transacted
    async fn get_balance(&self, account_id: &str) -> Result<Option<AccountBalance>>;

    /// Apply a signed delta to an account balance and append the matching
    /// log entry, as one atomic unit
    ///
    /// The sequence is: serialize access to the account's row, read the
    /// current balance, compute `current + delta`, upsert the balance,
    /// append the entry stamped with the recording time, commit both
    /// writes together. A missing account is handled per `policy`; on
    /// rejection nothing is written. Returns the post-operation balance.
    async fn apply_delta(
        &self,
        account_id: &str,
        delta: Amount,
        entry: EntryDraft,
        policy: MissingAccountPolicy,
    ) -> Result<Amount>;

    /// All log entries that affected the account's balance, in recording
    /// order
    async fn entries(&self, account_id: &str) -> Result<Vec<TransactionEntry>>;
}

/// In-memory ledger store
///
/// Balance updates and the paired log append happen while the account's
/// map entry is held, which serializes same-account operations. No lock
/// is held across an await point.
pub struct InMemoryLedgerStore {
    /// Balances by account ID
    balances: DashMap<String, Amount>,
    /// Append-only transaction log
    log: Mutex<Vec<TransactionEntry>>,
}

impl InMemoryLedgerStore {
    /// Create a new in-memory ledger store
    pub fn new() -> Self {
        Self {
            balances: DashMap::new(),
            log: Mutex::new(Vec::new()),
        }
    }
}

impl Default for InMemoryLedgerStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn get_balance(&self, account_id: &str) -> Result<Option<AccountBalance>> {
        Ok(self.balances.get(account_id).map(|b| AccountBalance {
            account_id: account_id.to_string(),
            balance: *b,
        }))
    }

    async fn apply_delta(
        &self,
        account_id: &str,
        delta: Amount,
        entry: EntryDraft,
        policy: MissingAccountPolicy,
    ) -> Result<Amount> {
        let recorded = TransactionEntry {
            payer_id: entry.payer_id,
            beneficiary_id: entry.beneficiary_id,
            amount: delta,
            created_at: Utc::now(),
        };

        // The entry guard is held until the log append completes, so the
        // balance change and its log entry are observed together.
        let new_balance = match self.balances.entry(account_id.to_string()) {
            Entry::Occupied(mut occupied) => {
                let new_balance = *occupied.get() + delta;
                *occupied.get_mut() = new_balance;
                self.log
                    .lock()
                    .expect("transaction log mutex poisoned")
                    .push(recorded);
                new_balance
            }
            Entry::Vacant(vacant) => match policy {
                MissingAccountPolicy::CreateOnCredit => {
                    vacant.insert(delta);
                    self.log
                        .lock()
                        .expect("transaction log mutex poisoned")
                        .push(recorded);
                    delta
                }
                MissingAccountPolicy::Reject => {
                    return Err(Error::AccountNotFound(format!(
                        "Account not found: {}",
                        account_id
                    )));
                }
            },
        };

        Ok(new_balance)
    }

    async fn entries(&self, account_id: &str) -> Result<Vec<TransactionEntry>> {
        let log = self.log.lock().expect("transaction log mutex poisoned");
        Ok(log
            .iter()
            .filter(|entry| entry.affects(account_id))
            .cloned()
            .collect())
    }
}

/// PostgreSQL ledger store
pub struct PostgresLedgerStore {
    /// Database connection pool
    pool: PgPool,
}

impl PostgresLedgerStore {
    /// Create a new PostgreSQL ledger store
    pub async fn new(database_url: Option<String>) -> Result<Self> {
        let database_url = match database_url {
            Some(url) => url,
            None => std::env::var("DATABASE_URL")
                .map_err(|_| Error::ConfigurationError("DATABASE_URL must be set".to_string()))?,
        };

        let pool = PgPoolOptions::new()
            .max_connections(common::db::DEFAULT_POOL_SIZE)
            .connect(&database_url)
            .await
            .map_err(Error::Database)?;

        info!("Connected to PostgreSQL database");

        Ok(Self { pool })
    }

    /// Create a new PostgreSQL ledger store with configuration
    pub async fn with_config(config: &crate::config::LedgerConfig) -> Result<Self> {
        info!(
            "Connecting to PostgreSQL database with pool size: {}",
            config.db_pool_size
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.db_pool_size)
            .connect(&config.database_url)
            .await
            .map_err(Error::Database)?;

        info!("Connected to PostgreSQL database");

        Ok(Self { pool })
    }

    /// Create a ledger store over an existing pool
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying connection pool, for running migrations at startup
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl LedgerStore for PostgresLedgerStore {
    async fn get_balance(&self, account_id: &str) -> Result<Option<AccountBalance>> {
        debug!("Getting balance from database: {}", account_id);

        let row = sqlx::query_as::<_, DbUserBalance>(
            "SELECT account_id, balance FROM user_balance WHERE account_id = $1",
        )
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(AccountBalance::from))
    }

    async fn apply_delta(
        &self,
        account_id: &str,
        delta: Amount,
        entry: EntryDraft,
        policy: MissingAccountPolicy,
    ) -> Result<Amount> {
        debug!("Applying delta {} to account {}", delta, account_id);

        let mut tx = self.pool.begin().await?;

        // Row-level lock: concurrent apply_delta calls on the same account
        // queue here until this transaction commits or rolls back.
        let current: Option<Amount> = sqlx::query_scalar(
            "SELECT balance FROM user_balance WHERE account_id = $1 FOR UPDATE",
        )
        .bind(account_id)
        .fetch_optional(&mut *tx)
        .await?;

        let new_balance = match (current, policy) {
            (Some(balance), _) => {
                let new_balance = balance + delta;
                sqlx::query("UPDATE user_balance SET balance = $2 WHERE account_id = $1")
                    .bind(account_id)
                    .bind(new_balance)
                    .execute(&mut *tx)
                    .await?;
                new_balance
            }
            (None, MissingAccountPolicy::CreateOnCredit) => {
                // No row to lock yet, so concurrent first credits race on
                // the insert; the increment upsert makes them compose
                // instead of overwriting each other.
                sqlx::query_scalar(
                    "INSERT INTO user_balance (account_id, balance)
                     VALUES ($1, $2)
                     ON CONFLICT (account_id) DO UPDATE
                     SET balance = user_balance.balance + EXCLUDED.balance
                     RETURNING balance",
                )
                .bind(account_id)
                .bind(delta)
                .fetch_one(&mut *tx)
                .await?
            }
            (None, MissingAccountPolicy::Reject) => {
                tx.rollback().await?;
                return Err(Error::AccountNotFound(format!(
                    "Account not found: {}",
                    account_id
                )));
            }
        };

        sqlx::query(
            "INSERT INTO transaction_log (pay_by, to_whom, amount, created_at)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(&entry.payer_id)
        .bind(&entry.beneficiary_id)
        .bind(delta)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(new_balance)
    }

    async fn entries(&self, account_id: &str) -> Result<Vec<TransactionEntry>> {
        debug!("Getting transaction log for account: {}", account_id);

        let rows = sqlx::query_as::<_, DbTransactionEntry>(
            "SELECT pay_by, to_whom, amount, created_at
             FROM transaction_log
             WHERE to_whom = $1 OR (to_whom IS NULL AND pay_by = $1)
             ORDER BY created_at",
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(TransactionEntry::from).collect())
    }
}
