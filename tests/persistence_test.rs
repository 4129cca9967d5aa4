#![cfg(feature = "storage-rocksdb")]

mod common;

use common::amount;
use emoney_wallet::application::auth::{InMemoryTokenIssuer, Sha256SecretHasher};
use emoney_wallet::application::service::WalletService;
use emoney_wallet::domain::money::Balance;
use emoney_wallet::infrastructure::rocksdb::RocksDbStore;
use rust_decimal_macros::dec;
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;

async fn open_service(path: &Path) -> WalletService {
    let store = Arc::new(RocksDbStore::open(path).unwrap());
    WalletService::new(
        store.clone(),
        store.clone(),
        store,
        Arc::new(Sha256SecretHasher::new()),
        Arc::new(InMemoryTokenIssuer::new()),
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn test_state_survives_reopen() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("wallet_db");

    let alice_id = {
        let service = open_service(&db_path).await;
        let alice = service.accounts.register("alice", "pw").await.unwrap();
        service
            .engine
            .deposit(alice.id, amount(dec!(100.00)))
            .await
            .unwrap();
        alice.id
    };

    // Reopen: balance, history, and id assignment all resume.
    let service = open_service(&db_path).await;
    assert_eq!(
        service.accounts.balance(alice_id).await.unwrap(),
        Balance::new(dec!(100.00))
    );
    let history = service.history.list_transactions(alice_id).await.unwrap();
    assert_eq!(history.len(), 1);

    service
        .engine
        .deposit(alice_id, amount(dec!(50.00)))
        .await
        .unwrap();
    let history = service.history.list_transactions(alice_id).await.unwrap();
    assert_eq!(history.len(), 2);
    // The new record's id continues past the recovered high-water mark.
    assert!(history[0].id > history[1].id);
    assert!(service.audit.check(alice_id).await.unwrap().is_consistent());
}

#[tokio::test]
async fn test_refund_guard_survives_reopen() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("wallet_db");

    let (merchant_id, charge_id) = {
        let service = open_service(&db_path).await;
        let admin = service.accounts.seed_admin("root", "pw").await.unwrap();
        let alice = service.accounts.register("alice", "pw").await.unwrap();
        service.accounts.register("shop", "pw").await.unwrap();
        service
            .accounts
            .admin_set_merchant(admin.id, "shop", true)
            .await
            .unwrap();
        let merchant = service.accounts.user_by_username("shop").await.unwrap();

        service
            .engine
            .deposit(alice.id, amount(dec!(30.00)))
            .await
            .unwrap();
        service
            .engine
            .charge(merchant.id, "alice", amount(dec!(30.00)))
            .await
            .unwrap();
        let charge_id = service
            .history
            .merchant_records(merchant.id, None)
            .await
            .unwrap()[0]
            .id;
        service
            .refunds
            .by_reference(merchant.id, charge_id)
            .await
            .unwrap();
        (merchant.id, charge_id)
    };

    let service = open_service(&db_path).await;
    let result = service.refunds.by_reference(merchant_id, charge_id).await;
    assert!(matches!(
        result,
        Err(emoney_wallet::error::WalletError::AlreadyRefunded(_))
    ));
}
