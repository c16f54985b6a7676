//! Balance transaction service implementation
//!
//! Validates the three operation kinds and translates them into ledger
//! store calls. Each call is a single atomic transition of the store;
//! there is no multi-step state machine.

use std::sync::Arc;

use common::decimal::Amount;
use common::error::{Error, ErrorExt, Result};
use common::model::ledger::{EntryDraft, MissingAccountPolicy, TransactionEntry};
use tracing::info;

use crate::repository::{InMemoryLedgerStore, LedgerStore, PostgresLedgerStore};

/// Balance transaction service over an injected ledger store
pub struct BalanceService {
    /// Store holding balances and the transaction log
    store: Arc<dyn LedgerStore>,
}

/// Repository Type
pub enum RepositoryType {
    /// In-memory repository
    InMemory,
    /// PostgreSQL repository
    Postgres(Option<String>),
}

impl BalanceService {
    /// Create a new balance service over an in-memory store
    pub fn new() -> Self {
        Self {
            store: Arc::new(InMemoryLedgerStore::new()),
        }
    }

    /// Create a balance service over the given store
    pub fn with_store(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Create a new balance service with a specific repository type
    pub async fn with_repository(repo_type: RepositoryType) -> Result<Self> {
        let store: Arc<dyn LedgerStore> = match repo_type {
            RepositoryType::InMemory => Arc::new(InMemoryLedgerStore::new()),
            RepositoryType::Postgres(database_url) => {
                Arc::new(PostgresLedgerStore::new(database_url).await?)
            }
        };

        Ok(Self { store })
    }

    /// Create a new balance service with a configuration
    pub async fn with_config(config: &crate::config::LedgerConfig) -> Result<Self> {
        let store: Arc<dyn LedgerStore> =
            Arc::new(PostgresLedgerStore::with_config(config).await?);

        Ok(Self { store })
    }

    /// Get the current balance of an account
    ///
    /// Fails with `AccountNotFound` if the account has never transacted;
    /// absence is not a zero balance.
    pub async fn get_balance(&self, account_id: &str) -> Result<Amount> {
        let record = self
            .store
            .get_balance(account_id)
            .await
            .with_context(|| format!("Failed to read balance for account {}", account_id))?
            .ok_or_else(|| Error::AccountNotFound(format!("Account not found: {}", account_id)))?;

        Ok(record.balance)
    }

    /// Credit an account, creating it if it has never transacted
    pub async fn topup(&self, account_id: &str, amount: Amount) -> Result<Amount> {
        info!("Topping up account {} by {}", account_id, amount);

        validate_amount(amount)?;

        self.store
            .apply_delta(
                account_id,
                amount,
                EntryDraft::own(account_id),
                MissingAccountPolicy::CreateOnCredit,
            )
            .await
            .with_context(|| format!("Failed to top up account {}", account_id))
    }

    /// Debit an account
    ///
    /// Never creates an account. No overdraft guard: the resulting balance
    /// may go negative.
    pub async fn withdraw(&self, account_id: &str, amount: Amount) -> Result<Amount> {
        info!("Withdrawing {} from account {}", amount, account_id);

        validate_amount(amount)?;

        self.store
            .apply_delta(
                account_id,
                -amount,
                EntryDraft::own(account_id),
                MissingAccountPolicy::Reject,
            )
            .await
            .with_context(|| format!("Failed to withdraw from account {}", account_id))
    }

    /// Record a labeled entry: debit the beneficiary's balance with the
    /// payer recorded as initiator
    pub async fn label_entry(
        &self,
        payer_id: &str,
        beneficiary_id: &str,
        amount: Amount,
    ) -> Result<Amount> {
        info!(
            "Labeled entry of {} by {} against account {}",
            amount, payer_id, beneficiary_id
        );

        validate_amount(amount)?;

        self.store
            .apply_delta(
                beneficiary_id,
                -amount,
                EntryDraft::labeled(payer_id, beneficiary_id),
                MissingAccountPolicy::Reject,
            )
            .await
            .with_context(|| {
                format!("Failed to record labeled entry against account {}", beneficiary_id)
            })
    }

    /// The transaction log entries that affected an account, in recording
    /// order
    pub async fn entries(&self, account_id: &str) -> Result<Vec<TransactionEntry>> {
        self.store
            .entries(account_id)
            .await
            .with_context(|| format!("Failed to read transaction log for account {}", account_id))
    }
}

impl Default for BalanceService {
    fn default() -> Self {
        Self::new()
    }
}

/// Operation amounts are strictly positive magnitudes; the sign is decided
/// by the operation kind, not the caller.
fn validate_amount(amount: Amount) -> Result<()> {
    if amount <= Amount::ZERO {
        return Err(Error::InvalidAmount(format!(
            "amount must be positive, got {}",
            amount
        )));
    }
    Ok(())
}
