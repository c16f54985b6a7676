//! Account API handlers
//!
//! Handles the balance-affecting endpoints:
//! - Get current balance
//! - Top up (credits, creating the account on first use)
//! - Withdraw (debits, never creating an account)
//! - Labeled entry (debits the beneficiary, recording the payer)

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use common::decimal::Amount;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::response::ApiResponse;
use crate::error::ApiError;
use crate::AppState;

/// Post-operation balance payload
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BalanceData {
    /// The account's balance after the operation
    pub balance: Amount,
}

/// Health check
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service is running")
    ),
    tag = "account"
)]
pub async fn health() -> ApiResponse<()> {
    ApiResponse::success_message("payment ledger is running")
}

/// Get the current balance of an account
#[utoipa::path(
    get,
    path = "/account/balance/{account_id}",
    params(
        ("account_id" = String, Path, description = "Account ID")
    ),
    responses(
        (status = 200, description = "Current balance retrieved successfully"),
        (status = 404, description = "Account not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "account"
)]
pub async fn get_balance(
    State(state): State<Arc<AppState>>,
    Path(account_id): Path<String>,
) -> Result<ApiResponse<Amount>, ApiError> {
    let balance = state
        .balance_service
        .get_balance(&account_id)
        .await
        .map_err(ApiError::Common)?;

    Ok(ApiResponse::success(balance))
}

/// Topup request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TopupRequest {
    /// Account to credit
    pub account_id: String,
    /// Amount (strictly positive)
    pub amount: Amount,
}

/// Credit an account, creating it on first use
#[utoipa::path(
    post,
    path = "/account/topup",
    request_body = TopupRequest,
    responses(
        (status = 200, description = "Account credited successfully"),
        (status = 400, description = "Invalid amount"),
        (status = 500, description = "Internal server error")
    ),
    tag = "account"
)]
pub async fn topup(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TopupRequest>,
) -> Result<ApiResponse<BalanceData>, ApiError> {
    let balance = state
        .balance_service
        .topup(&request.account_id, request.amount)
        .await
        .map_err(ApiError::Common)?;

    Ok(ApiResponse::success(BalanceData { balance }))
}

/// Withdraw request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawRequest {
    /// Account to debit
    pub account_id: String,
    /// Amount (strictly positive)
    pub amount: Amount,
}

/// Debit an account
#[utoipa::path(
    post,
    path = "/account/withdraw",
    request_body = WithdrawRequest,
    responses(
        (status = 200, description = "Account debited successfully"),
        (status = 400, description = "Invalid amount"),
        (status = 404, description = "Account not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "account"
)]
pub async fn withdraw(
    State(state): State<Arc<AppState>>,
    Json(request): Json<WithdrawRequest>,
) -> Result<ApiResponse<BalanceData>, ApiError> {
    let balance = state
        .balance_service
        .withdraw(&request.account_id, request.amount)
        .await
        .map_err(ApiError::Common)?;

    Ok(ApiResponse::success(BalanceData { balance }))
}

/// Labeled entry request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LabelEntryRequest {
    /// Account recorded as initiator
    pub payer_id: String,
    /// Account whose balance is debited
    pub beneficiary_id: String,
    /// Amount (strictly positive)
    pub amount: Amount,
}

/// Record a labeled entry against the beneficiary's balance
#[utoipa::path(
    post,
    path = "/account/labelEntry",
    request_body = LabelEntryRequest,
    responses(
        (status = 200, description = "Labeled entry recorded successfully"),
        (status = 400, description = "Invalid amount"),
        (status = 404, description = "Beneficiary account not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "account"
)]
pub async fn label_entry(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LabelEntryRequest>,
) -> Result<ApiResponse<BalanceData>, ApiError> {
    let balance = state
        .balance_service
        .label_entry(&request.payer_id, &request.beneficiary_id, request.amount)
        .await
        .map_err(ApiError::Common)?;

    Ok(ApiResponse::success(BalanceData { balance }))
}
