use crate::domain::ports::{NewUser, TransactionStore, UserStore, WalletStore};
use crate::domain::transaction::{TransactionKind, TransactionRecord, TxId};
use crate::domain::user::{User, UserId};
use crate::domain::wallet::Wallet;
use crate::error::{Result, WalletError};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options};
use rust_decimal::Decimal;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;

/// Column family for user records.
pub const CF_USERS: &str = "users";
/// Column family for wallet rows.
pub const CF_WALLETS: &str = "wallets";
/// Column family for the transaction log.
pub const CF_TRANSACTIONS: &str = "transactions";
/// Secondary index: username -> user id.
pub const CF_USERNAMES: &str = "usernames";

/// Persistent store backed by RocksDB, one column family per table plus a
/// username index. Thread-safe; `Clone` shares the underlying `Arc<DB>`.
#[derive(Clone)]
pub struct RocksDbStore {
    db: Arc<DB>,
    next_user_id: Arc<AtomicU64>,
    // Serializes username check + id assignment in `create`.
    create_lock: Arc<Mutex<()>>,
}

impl RocksDbStore {
    /// Opens or creates the database, ensuring all column families exist and
    /// recovering the user-id high-water mark.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let descriptors = [CF_USERS, CF_WALLETS, CF_TRANSACTIONS, CF_USERNAMES]
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect::<Vec<_>>();

        let db = DB::open_cf_descriptors(&opts, path, descriptors).map_err(internal)?;

        let last_user_id = last_key(&db, CF_USERS)?;
        Ok(Self {
            db: Arc::new(db),
            next_user_id: Arc::new(AtomicU64::new(last_user_id + 1)),
            create_lock: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            internal(std::io::Error::other(format!(
                "column family '{name}' not found"
            )))
        })
    }

    fn put_json<T: Serialize>(&self, cf: &str, key: u64, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec(value).map_err(internal)?;
        self.db
            .put_cf(self.cf(cf)?, key.to_be_bytes(), bytes)
            .map_err(internal)
    }

    fn get_json<T: DeserializeOwned>(&self, cf: &str, key: u64) -> Result<Option<T>> {
        match self.db.get_cf(self.cf(cf)?, key.to_be_bytes()).map_err(internal)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes).map_err(internal)?)),
            None => Ok(None),
        }
    }

    fn scan<T: DeserializeOwned>(&self, cf: &str) -> Result<Vec<T>> {
        let mut values = Vec::new();
        for item in self.db.iterator_cf(self.cf(cf)?, IteratorMode::Start) {
            let (_key, bytes) = item.map_err(internal)?;
            values.push(serde_json::from_slice(&bytes).map_err(internal)?);
        }
        Ok(values)
    }
}

fn internal<E: std::error::Error + Send + Sync + 'static>(e: E) -> WalletError {
    WalletError::Internal(Box::new(e))
}

fn last_key(db: &DB, cf: &str) -> Result<u64> {
    let handle = db
        .cf_handle(cf)
        .ok_or_else(|| internal(std::io::Error::other("missing column family")))?;
    match db.iterator_cf(handle, IteratorMode::End).next() {
        Some(item) => {
            let (key, _value) = item.map_err(internal)?;
            let bytes: [u8; 8] = key
                .as_ref()
                .try_into()
                .map_err(|_| internal(std::io::Error::other("malformed key")))?;
            Ok(u64::from_be_bytes(bytes))
        }
        None => Ok(0),
    }
}

fn newest_first(records: &mut [TransactionRecord]) {
    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
}

#[async_trait]
impl UserStore for RocksDbStore {
    async fn create(&self, new_user: NewUser) -> Result<User> {
        let _guard = self.create_lock.lock().await;

        let names = self.cf(CF_USERNAMES)?;
        if self
            .db
            .get_cf(names, new_user.username.as_bytes())
            .map_err(internal)?
            .is_some()
        {
            return Err(WalletError::UsernameTaken(new_user.username));
        }

        let id = self.next_user_id.fetch_add(1, Ordering::SeqCst);
        let user = User::new(id, new_user.username, new_user.password_hash);
        self.put_json(CF_USERS, id, &user)?;
        self.db
            .put_cf(names, user.username.as_bytes(), id.to_be_bytes())
            .map_err(internal)?;
        Ok(user)
    }

    async fn get(&self, user_id: UserId) -> Result<Option<User>> {
        self.get_json(CF_USERS, user_id)
    }

    async fn by_username(&self, username: &str) -> Result<Option<User>> {
        let names = self.cf(CF_USERNAMES)?;
        match self.db.get_cf(names, username.as_bytes()).map_err(internal)? {
            Some(bytes) => {
                let id_bytes: [u8; 8] = bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| internal(std::io::Error::other("malformed username index")))?;
                self.get_json(CF_USERS, u64::from_be_bytes(id_bytes))
            }
            None => Ok(None),
        }
    }

    async fn update(&self, user: User) -> Result<()> {
        self.put_json(CF_USERS, user.id, &user)
    }

    async fn search_usernames(&self, keyword: &str) -> Result<Vec<UserId>> {
        let users: Vec<User> = self.scan(CF_USERS)?;
        Ok(users
            .into_iter()
            .filter(|u| u.username.contains(keyword))
            .map(|u| u.id)
            .collect())
    }

    async fn all(&self) -> Result<Vec<User>> {
        let mut users: Vec<User> = self.scan(CF_USERS)?;
        users.sort_by_key(|u| u.id);
        Ok(users)
    }
}

#[async_trait]
impl WalletStore for RocksDbStore {
    async fn create(&self, user_id: UserId) -> Result<Wallet> {
        let wallet = Wallet::new(user_id);
        self.put_json(CF_WALLETS, user_id, &wallet)?;
        Ok(wallet)
    }

    async fn get(&self, user_id: UserId) -> Result<Option<Wallet>> {
        self.get_json(CF_WALLETS, user_id)
    }

    async fn adjust_balance(&self, user_id: UserId, delta: Decimal) -> Result<Wallet> {
        let mut wallet: Wallet = self
            .get_json(CF_WALLETS, user_id)?
            .ok_or(WalletError::WalletNotFound)?;
        wallet.balance.0 += delta;
        self.put_json(CF_WALLETS, user_id, &wallet)?;
        Ok(wallet)
    }

    async fn all(&self) -> Result<Vec<Wallet>> {
        let mut wallets: Vec<Wallet> = self.scan(CF_WALLETS)?;
        wallets.sort_by_key(|w| w.user_id);
        Ok(wallets)
    }
}

#[async_trait]
impl TransactionStore for RocksDbStore {
    async fn append(&self, record: TransactionRecord) -> Result<()> {
        self.put_json(CF_TRANSACTIONS, record.id, &record)
    }

    async fn get(&self, tx_id: TxId) -> Result<Option<TransactionRecord>> {
        self.get_json(CF_TRANSACTIONS, tx_id)
    }

    async fn all_for(&self, user_id: UserId) -> Result<Vec<TransactionRecord>> {
        let mut records: Vec<TransactionRecord> = self.scan(CF_TRANSACTIONS)?;
        records.retain(|tx| tx.involves(user_id));
        newest_first(&mut records);
        Ok(records)
    }

    async fn refund_referencing(&self, tx_id: TxId) -> Result<Option<TransactionRecord>> {
        let records: Vec<TransactionRecord> = self.scan(CF_TRANSACTIONS)?;
        Ok(records
            .into_iter()
            .find(|tx| tx.kind == TransactionKind::Refund && tx.refers_to == Some(tx_id)))
    }

    async fn all(&self) -> Result<Vec<TransactionRecord>> {
        let mut records: Vec<TransactionRecord> = self.scan(CF_TRANSACTIONS)?;
        newest_first(&mut records);
        Ok(records)
    }

    async fn last_id(&self) -> Result<TxId> {
        last_key(&self.db, CF_TRANSACTIONS)
    }
}
