//! Common types and utilities for the payment ledger
//!
//! This library contains the shared types used across the ledger service
//! and the API gateway. It provides a unified approach to error handling,
//! exact monetary arithmetic, database access, and the domain models for
//! balances and transaction log entries.

pub mod error;
pub mod model;
pub mod decimal;
pub mod db;

/// Re-export important types
pub use error::{Error, Result, ErrorExt};
pub use decimal::*;

// Re-export utoipa for use in model ToSchema derives
#[cfg(feature = "utoipa")]
pub use utoipa;
