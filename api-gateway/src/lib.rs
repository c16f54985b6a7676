// api-gateway/src/lib.rs
pub mod api;
pub mod error;
pub mod config;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use ledger_service::BalanceService;

use crate::api::account::{get_balance, health, label_entry, topup, withdraw};

/// App state shared across handlers
pub struct AppState {
    /// Balance transaction service
    pub balance_service: Arc<BalanceService>,
}

/// Build the application router over the given state
///
/// `labelEntry` is routed as POST: the operation mutates the ledger.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/account/balance/:account_id", get(get_balance))
        .route("/account/topup", post(topup))
        .route("/account/withdraw", post(withdraw))
        .route("/account/labelEntry", post(label_entry))
        .with_state(state)
}
