//! Ledger service for managing account balances and the transaction log

pub mod service;
pub mod repository;
pub mod config;

pub use service::BalanceService;
pub use service::RepositoryType;
pub use repository::{LedgerStore, InMemoryLedgerStore, PostgresLedgerStore};
pub use config::LedgerConfig;
