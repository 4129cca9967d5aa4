mod common;

use common::{amount, register, register_merchant, service};
use emoney_wallet::application::queries::RecordFilter;
use emoney_wallet::domain::transaction::TransactionKind;
use emoney_wallet::error::WalletError;
use rust_decimal_macros::dec;

async fn seeded() -> (
    emoney_wallet::application::service::WalletService,
    emoney_wallet::domain::user::User,
    emoney_wallet::domain::user::User,
    emoney_wallet::domain::user::User,
) {
    let service = service().await;
    let alice = register(&service, "alice").await;
    let bob = register(&service, "bob").await;
    let merchant = register_merchant(&service, "shop").await;

    service
        .engine
        .deposit(alice.id, amount(dec!(100.00)))
        .await
        .unwrap();
    service.gate.set_pin(alice.id, "1234").await.unwrap();
    service
        .engine
        .transfer(alice.id, "bob", amount(dec!(40.00)), "1234")
        .await
        .unwrap();
    service
        .engine
        .charge(merchant.id, "alice", amount(dec!(20.00)))
        .await
        .unwrap();
    (service, alice, bob, merchant)
}

#[tokio::test]
async fn test_list_transactions_newest_first() {
    let (service, alice, _, _) = seeded().await;

    let history = service.history.list_transactions(alice.id).await.unwrap();
    assert_eq!(history.len(), 3);
    assert_eq!(history[0].kind, TransactionKind::Charge);
    assert_eq!(history[2].kind, TransactionKind::Deposit);
    assert!(history[0].timestamp >= history[2].timestamp);
}

#[tokio::test]
async fn test_search_by_kind() {
    let (service, alice, _, _) = seeded().await;

    let filter = RecordFilter {
        kind: Some(TransactionKind::Transfer),
        ..Default::default()
    };
    let records = service.history.search_records(alice.id, filter).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].kind, TransactionKind::Transfer);
}

#[tokio::test]
async fn test_search_by_counterparty_keyword() {
    let (service, alice, bob, _) = seeded().await;

    let filter = RecordFilter {
        counterparty: Some("bo".to_string()),
        ..Default::default()
    };
    let records = service.history.search_records(alice.id, filter).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].to_user, bob.id);

    let filter = RecordFilter {
        counterparty: Some("zzz".to_string()),
        ..Default::default()
    };
    let records = service.history.search_records(alice.id, filter).await.unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn test_search_by_date_window() {
    let (service, alice, _, _) = seeded().await;

    // Everything happened after 2000-01-01 and after the midnight boundary
    // of any end date in the past.
    let filter = RecordFilter {
        start_date: Some("2000-01-01".to_string()),
        ..Default::default()
    };
    let records = service.history.search_records(alice.id, filter).await.unwrap();
    assert_eq!(records.len(), 3);

    let filter = RecordFilter {
        end_date: Some("2000-01-01".to_string()),
        ..Default::default()
    };
    let records = service.history.search_records(alice.id, filter).await.unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn test_search_rejects_malformed_dates() {
    let (service, alice, _, _) = seeded().await;

    let filter = RecordFilter {
        start_date: Some("01-01-2000".to_string()),
        ..Default::default()
    };
    let result = service.history.search_records(alice.id, filter).await;
    assert!(matches!(result, Err(WalletError::InvalidInput(_))));
}

#[tokio::test]
async fn test_transaction_detail_is_party_only() {
    let (service, alice, bob, merchant) = seeded().await;

    let charge = service
        .history
        .merchant_records(merchant.id, Some(TransactionKind::Charge))
        .await
        .unwrap()
        .remove(0);

    // Both parties can read it.
    service.history.get_transaction(alice.id, charge.id).await.unwrap();
    service
        .history
        .get_transaction(merchant.id, charge.id)
        .await
        .unwrap();

    // A stranger cannot.
    let result = service.history.get_transaction(bob.id, charge.id).await;
    assert!(matches!(result, Err(WalletError::Forbidden(_))));

    let result = service.history.get_transaction(alice.id, 9999).await;
    assert!(matches!(result, Err(WalletError::TransactionNotFound)));
}

#[tokio::test]
async fn test_merchant_records_gate_and_filter() {
    let (service, alice, _, merchant) = seeded().await;

    let result = service.history.merchant_records(alice.id, None).await;
    assert!(matches!(result, Err(WalletError::Forbidden(_))));

    let all = service.history.merchant_records(merchant.id, None).await.unwrap();
    assert_eq!(all.len(), 1);
    let refunds = service
        .history
        .merchant_records(merchant.id, Some(TransactionKind::Refund))
        .await
        .unwrap();
    assert!(refunds.is_empty());
}

#[tokio::test]
async fn test_kyc_flow() {
    let (service, alice, _, _) = seeded().await;
    let admin = service.accounts.user_by_username(common::ADMIN).await.unwrap();

    use emoney_wallet::domain::user::KycStatus;

    // Self-service may only request 'pending'.
    let result = service
        .accounts
        .request_kyc(alice.id, KycStatus::Verified)
        .await;
    assert!(matches!(result, Err(WalletError::Forbidden(_))));
    service
        .accounts
        .request_kyc(alice.id, KycStatus::Pending)
        .await
        .unwrap();
    assert_eq!(
        service.accounts.profile(alice.id).await.unwrap().kyc_status,
        KycStatus::Pending
    );

    // Admin approves; non-admin cannot.
    let result = service
        .accounts
        .admin_set_kyc(alice.id, "alice", KycStatus::Verified)
        .await;
    assert!(matches!(result, Err(WalletError::Forbidden(_))));
    service
        .accounts
        .admin_set_kyc(admin.id, "alice", KycStatus::Verified)
        .await
        .unwrap();
    assert_eq!(
        service.accounts.profile(alice.id).await.unwrap().kyc_status,
        KycStatus::Verified
    );
}

#[tokio::test]
async fn test_merchant_status_is_admin_gated() {
    let (service, alice, _, _) = seeded().await;

    let result = service
        .accounts
        .admin_set_merchant(alice.id, "bob", true)
        .await;
    assert!(matches!(result, Err(WalletError::Forbidden(_))));
}
