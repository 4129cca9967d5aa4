use crate::domain::user::UserId;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Row-level locks over wallets, one mutex per user id.
///
/// Every money-movement operation must hold the locks of the wallets it
/// touches across its whole read-validate-write sequence. Pairs are always
/// acquired in ascending id order so two concurrent transfers between the
/// same wallets in opposite directions cannot deadlock.
#[derive(Default)]
pub struct WalletLocks {
    inner: Mutex<HashMap<UserId, Arc<Mutex<()>>>>,
}

impl WalletLocks {
    pub fn new() -> Self {
        Self::default()
    }

    async fn entry(&self, user_id: UserId) -> Arc<Mutex<()>> {
        let mut map = self.inner.lock().await;
        map.entry(user_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    pub async fn lock(&self, user_id: UserId) -> OwnedMutexGuard<()> {
        self.entry(user_id).await.lock_owned().await
    }

    /// Locks both wallet rows, lowest id first. Locking a wallet against
    /// itself (self-transfer, deposit) takes a single guard.
    pub async fn lock_pair(
        &self,
        a: UserId,
        b: UserId,
    ) -> (OwnedMutexGuard<()>, Option<OwnedMutexGuard<()>>) {
        if a == b {
            return (self.lock(a).await, None);
        }
        let (first, second) = if a < b { (a, b) } else { (b, a) };
        let first_guard = self.lock(first).await;
        let second_guard = self.lock(second).await;
        (first_guard, Some(second_guard))
    }
}
