//! Ledger models and related types
//!
//! The ledger is two pieces of durable state: a mutable current-balance
//! projection (`AccountBalance`, one row per account) and the immutable
//! source-of-truth event stream (`TransactionEntry`, append-only). Every
//! accepted balance change has exactly one corresponding log entry, written
//! in the same atomic unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Amount;
#[cfg(feature = "utoipa")]
use crate::utoipa::ToSchema;

/// Current balance for a single account
///
/// A missing record means the account has never transacted, which is not
/// the same as a zero balance. Records are created implicitly on the
/// account's first credit and never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct AccountBalance {
    /// Opaque account identifier
    pub account_id: String,
    /// Current balance
    pub balance: Amount,
}

/// A recorded transaction log entry
///
/// Entries are immutable once written and ordered by `created_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct TransactionEntry {
    /// Account the operation is charged against (`pay_by`)
    pub payer_id: String,
    /// Second account credited by a labeled operation (`to_whom`);
    /// absent for simple top-up/withdraw
    pub beneficiary_id: Option<String>,
    /// Signed delta as applied to the affected balance
    /// (credits positive, debits negative)
    pub amount: Amount,
    /// Timestamp assigned when the entry was durably recorded
    pub created_at: DateTime<Utc>,
}

impl TransactionEntry {
    /// Whether this entry affected the given account's balance
    ///
    /// Labeled entries debit the beneficiary; plain entries debit or
    /// credit the payer itself.
    pub fn affects(&self, account_id: &str) -> bool {
        match &self.beneficiary_id {
            Some(beneficiary) => beneficiary == account_id,
            None => self.payer_id == account_id,
        }
    }
}

/// Attribution for a log entry about to be recorded
///
/// The store stamps `created_at` and the signed amount at the moment the
/// entry is durably written, so a draft carries only the two account
/// references.
#[derive(Debug, Clone)]
pub struct EntryDraft {
    /// Account the operation is charged against
    pub payer_id: String,
    /// Second account credited by a labeled operation
    pub beneficiary_id: Option<String>,
}

impl EntryDraft {
    /// Draft for a plain top-up/withdraw on the account itself
    pub fn own(account_id: &str) -> Self {
        Self {
            payer_id: account_id.to_string(),
            beneficiary_id: None,
        }
    }

    /// Draft for a labeled operation charged to `payer_id` against
    /// `beneficiary_id`'s balance
    pub fn labeled(payer_id: &str, beneficiary_id: &str) -> Self {
        Self {
            payer_id: payer_id.to_string(),
            beneficiary_id: Some(beneficiary_id.to_string()),
        }
    }
}

/// Policy for operations that reference an account with no balance record
///
/// Accounts are created implicitly on their first credit, never on a
/// debit. The asymmetry is deliberate: a top-up to an unknown account
/// opens it, a withdrawal from an unknown account is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingAccountPolicy {
    /// Create the account with the operation's delta as its balance
    CreateOnCredit,
    /// Reject with `AccountNotFound`, writing nothing
    Reject,
}
