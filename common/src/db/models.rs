use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

use crate::model::ledger::{AccountBalance, TransactionEntry};

/// Database row for the user_balance table
#[derive(Debug, Clone, FromRow)]
pub struct DbUserBalance {
    pub account_id: String,
    pub balance: Decimal,
}

impl From<DbUserBalance> for AccountBalance {
    fn from(row: DbUserBalance) -> Self {
        AccountBalance {
            account_id: row.account_id,
            balance: row.balance,
        }
    }
}

/// Database row for the transaction_log table
#[derive(Debug, Clone, FromRow)]
pub struct DbTransactionEntry {
    pub pay_by: String,
    pub to_whom: Option<String>,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
}

impl From<DbTransactionEntry> for TransactionEntry {
    fn from(row: DbTransactionEntry) -> Self {
        TransactionEntry {
            payer_id: row.pay_by,
            beneficiary_id: row.to_whom,
            amount: row.amount,
            created_at: row.created_at,
        }
    }
}
