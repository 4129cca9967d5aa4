use crate::domain::ports::{NewUser, TransactionStore, UserStore, WalletStore};
use crate::domain::transaction::{TransactionKind, TransactionRecord, TxId};
use crate::domain::user::{User, UserId};
use crate::domain::wallet::Wallet;
use crate::error::{Result, WalletError};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

/// Thread-safe in-memory user store.
///
/// Username uniqueness is enforced under the map's write lock, so concurrent
/// registrations of the same name cannot both succeed.
#[derive(Default, Clone)]
pub struct InMemoryUserStore {
    users: Arc<RwLock<HashMap<UserId, User>>>,
    next_id: Arc<AtomicU64>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self {
            users: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create(&self, new_user: NewUser) -> Result<User> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.username == new_user.username) {
            return Err(WalletError::UsernameTaken(new_user.username));
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let user = User::new(id, new_user.username, new_user.password_hash);
        users.insert(id, user.clone());
        Ok(user)
    }

    async fn get(&self, user_id: UserId) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.get(&user_id).cloned())
    }

    async fn by_username(&self, username: &str) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn update(&self, user: User) -> Result<()> {
        let mut users = self.users.write().await;
        users.insert(user.id, user);
        Ok(())
    }

    async fn search_usernames(&self, keyword: &str) -> Result<Vec<UserId>> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .filter(|u| u.username.contains(keyword))
            .map(|u| u.id)
            .collect())
    }

    async fn all(&self) -> Result<Vec<User>> {
        let users = self.users.read().await;
        let mut all: Vec<User> = users.values().cloned().collect();
        all.sort_by_key(|u| u.id);
        Ok(all)
    }
}

/// Thread-safe in-memory wallet store. Pure data access: balance policy
/// lives in the engine, which serializes access per wallet row.
#[derive(Default, Clone)]
pub struct InMemoryWalletStore {
    wallets: Arc<RwLock<HashMap<UserId, Wallet>>>,
}

impl InMemoryWalletStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WalletStore for InMemoryWalletStore {
    async fn create(&self, user_id: UserId) -> Result<Wallet> {
        let mut wallets = self.wallets.write().await;
        let wallet = Wallet::new(user_id);
        wallets.insert(user_id, wallet.clone());
        Ok(wallet)
    }

    async fn get(&self, user_id: UserId) -> Result<Option<Wallet>> {
        let wallets = self.wallets.read().await;
        Ok(wallets.get(&user_id).cloned())
    }

    async fn adjust_balance(&self, user_id: UserId, delta: Decimal) -> Result<Wallet> {
        let mut wallets = self.wallets.write().await;
        let wallet = wallets
            .get_mut(&user_id)
            .ok_or(WalletError::WalletNotFound)?;
        wallet.balance.0 += delta;
        Ok(wallet.clone())
    }

    async fn all(&self) -> Result<Vec<Wallet>> {
        let wallets = self.wallets.read().await;
        let mut all: Vec<Wallet> = wallets.values().cloned().collect();
        all.sort_by_key(|w| w.user_id);
        Ok(all)
    }
}

/// Append-only in-memory transaction log.
#[derive(Default, Clone)]
pub struct InMemoryTransactionStore {
    records: Arc<RwLock<Vec<TransactionRecord>>>,
}

impl InMemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first(records: &mut [TransactionRecord]) {
    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn append(&self, record: TransactionRecord) -> Result<()> {
        let mut records = self.records.write().await;
        records.push(record);
        Ok(())
    }

    async fn get(&self, tx_id: TxId) -> Result<Option<TransactionRecord>> {
        let records = self.records.read().await;
        Ok(records.iter().find(|tx| tx.id == tx_id).cloned())
    }

    async fn all_for(&self, user_id: UserId) -> Result<Vec<TransactionRecord>> {
        let records = self.records.read().await;
        let mut matching: Vec<TransactionRecord> = records
            .iter()
            .filter(|tx| tx.involves(user_id))
            .cloned()
            .collect();
        newest_first(&mut matching);
        Ok(matching)
    }

    async fn refund_referencing(&self, tx_id: TxId) -> Result<Option<TransactionRecord>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .find(|tx| tx.kind == TransactionKind::Refund && tx.refers_to == Some(tx_id))
            .cloned())
    }

    async fn all(&self) -> Result<Vec<TransactionRecord>> {
        let records = self.records.read().await;
        let mut all = records.clone();
        newest_first(&mut all);
        Ok(all)
    }

    async fn last_id(&self) -> Result<TxId> {
        let records = self.records.read().await;
        Ok(records.iter().map(|tx| tx.id).max().unwrap_or(0))
    }
}
