#![allow(dead_code)]

use emoney_wallet::application::service::WalletService;
use emoney_wallet::domain::money::Amount;
use emoney_wallet::domain::user::User;
use rust_decimal::Decimal;

pub const ADMIN: &str = "root";

pub async fn service() -> WalletService {
    let service = WalletService::in_memory().await.unwrap();
    service.accounts.seed_admin(ADMIN, "root-pw").await.unwrap();
    service
}

pub fn amount(value: Decimal) -> Amount {
    Amount::new(value).unwrap()
}

pub async fn register(service: &WalletService, username: &str) -> User {
    service
        .accounts
        .register(username, &format!("pw-{username}"))
        .await
        .unwrap()
}

/// Registers a user and promotes them to merchant through the admin path.
pub async fn register_merchant(service: &WalletService, username: &str) -> User {
    let user = register(service, username).await;
    let admin = service.accounts.user_by_username(ADMIN).await.unwrap();
    service
        .accounts
        .admin_set_merchant(admin.id, username, true)
        .await
        .unwrap();
    service.accounts.user_by_username(&user.username).await.unwrap()
}
