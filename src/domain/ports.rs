use crate::domain::transaction::{TransactionRecord, TxId};
use crate::domain::user::{User, UserId};
use crate::domain::wallet::Wallet;
use crate::error::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;

pub type UserStoreRef = Arc<dyn UserStore>;
pub type WalletStoreRef = Arc<dyn WalletStore>;
pub type TransactionStoreRef = Arc<dyn TransactionStore>;

/// Payload for creating a user; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a new user, failing with `UsernameTaken` on a duplicate name.
    async fn create(&self, new_user: NewUser) -> Result<User>;
    async fn get(&self, user_id: UserId) -> Result<Option<User>>;
    async fn by_username(&self, username: &str) -> Result<Option<User>>;
    async fn update(&self, user: User) -> Result<()>;
    /// Ids of users whose username contains `keyword` (substring match).
    async fn search_usernames(&self, keyword: &str) -> Result<Vec<UserId>>;
    async fn all(&self) -> Result<Vec<User>>;
}

#[async_trait]
pub trait WalletStore: Send + Sync {
    async fn create(&self, user_id: UserId) -> Result<Wallet>;
    async fn get(&self, user_id: UserId) -> Result<Option<Wallet>>;
    /// Applies `delta` (possibly negative) to the stored balance.
    ///
    /// Pure data access: preconditions live in the engine, which must hold the
    /// wallet's lock across its read-validate-write sequence.
    async fn adjust_balance(&self, user_id: UserId, delta: Decimal) -> Result<Wallet>;
    async fn all(&self) -> Result<Vec<Wallet>>;
}

#[async_trait]
pub trait TransactionStore: Send + Sync {
    async fn append(&self, record: TransactionRecord) -> Result<()>;
    async fn get(&self, tx_id: TxId) -> Result<Option<TransactionRecord>>;
    /// Every record the user is a party to, newest first.
    async fn all_for(&self, user_id: UserId) -> Result<Vec<TransactionRecord>>;
    /// The refund already linked to `tx_id`, if any.
    async fn refund_referencing(&self, tx_id: TxId) -> Result<Option<TransactionRecord>>;
    /// The whole log, newest first.
    async fn all(&self) -> Result<Vec<TransactionRecord>>;
    /// Highest assigned id (0 when empty); seeds the record factory.
    async fn last_id(&self) -> Result<TxId>;
}
