use std::sync::Arc;

use common::decimal::{dec, Amount};
use common::error::Error;
use futures::future::join_all;
use ledger_service::{BalanceService, PostgresLedgerStore};
use uuid::Uuid;

use dotenv::dotenv;

// PostgreSQL integration tests for the ledger service
// These tests require a running PostgreSQL database
// Run with: cargo test --test ledger_postgres_tests -- --ignored

async fn create_test_service() -> BalanceService {
    dotenv().ok(); // Load .env.test if it exists

    let database_url = std::env::var("TEST_DATABASE_URL")
        .expect("TEST_DATABASE_URL must be set to run PostgreSQL tests");

    let store = PostgresLedgerStore::new(Some(database_url))
        .await
        .expect("Failed to connect to test database");

    common::db::run_migrations(store.pool())
        .await
        .expect("Failed to run migrations on test database");

    BalanceService::with_store(Arc::new(store))
}

fn fresh_account() -> String {
    Uuid::new_v4().to_string()
}

#[tokio::test]
#[ignore = "Requires test database"]
async fn test_postgres_topup_and_balance() {
    let service = create_test_service().await;
    let account = fresh_account();

    let balance = service.topup(&account, dec!(100)).await.unwrap();
    assert_eq!(balance, dec!(100));
    assert_eq!(service.get_balance(&account).await.unwrap(), dec!(100));

    let entries = service.entries(&account).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].amount, dec!(100));
}

#[tokio::test]
#[ignore = "Requires test database"]
async fn test_postgres_withdraw_missing_account() {
    let service = create_test_service().await;
    let account = fresh_account();

    let result = service.withdraw(&account, dec!(10)).await;
    assert!(matches!(result, Err(Error::AccountNotFound(_))));

    // The rejected unit rolled back: no row, no log entry
    assert!(matches!(
        service.get_balance(&account).await,
        Err(Error::AccountNotFound(_))
    ));
    assert!(service.entries(&account).await.unwrap().is_empty());
}

#[tokio::test]
#[ignore = "Requires test database"]
async fn test_postgres_labeled_entry() {
    let service = create_test_service().await;
    let payer = fresh_account();
    let beneficiary = fresh_account();

    service.topup(&beneficiary, dec!(80)).await.unwrap();

    let balance = service
        .label_entry(&payer, &beneficiary, dec!(20))
        .await
        .unwrap();
    assert_eq!(balance, dec!(60));

    let entries = service.entries(&beneficiary).await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].payer_id, payer);
    assert_eq!(entries[1].beneficiary_id.as_deref(), Some(beneficiary.as_str()));
    assert_eq!(entries[1].amount, dec!(-20));
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "Requires test database"]
async fn test_postgres_concurrent_topups_no_lost_updates() {
    let service = Arc::new(create_test_service().await);
    let account = fresh_account();
    let concurrency = 16;

    // The row lock inside apply_delta must linearize these; a lost update
    // would leave the balance short
    let handles: Vec<_> = (0..concurrency)
        .map(|_| {
            let service = service.clone();
            let account = account.clone();
            tokio::spawn(async move { service.topup(&account, dec!(1)).await })
        })
        .collect();

    for result in join_all(handles).await {
        result.unwrap().unwrap();
    }

    assert_eq!(
        service.get_balance(&account).await.unwrap(),
        Amount::from(concurrency)
    );
    assert_eq!(
        service.entries(&account).await.unwrap().len(),
        concurrency as usize
    );
}

#[tokio::test]
#[ignore = "Requires test database"]
async fn test_postgres_log_sum_matches_balance() {
    let service = create_test_service().await;
    let account = fresh_account();

    service.topup(&account, dec!(500)).await.unwrap();
    service.withdraw(&account, dec!(120)).await.unwrap();
    service.topup(&account, dec!(75)).await.unwrap();

    let entries = service.entries(&account).await.unwrap();
    let log_sum: Amount = entries.iter().map(|e| e.amount).sum();

    assert_eq!(log_sum, service.get_balance(&account).await.unwrap());
}
