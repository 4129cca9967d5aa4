use crate::domain::money::Amount;
use crate::domain::user::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

pub type TxId = u64;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Deposit,
    Transfer,
    Charge,
    Refund,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "deposit",
            TransactionKind::Transfer => "transfer",
            TransactionKind::Charge => "charge",
            TransactionKind::Refund => "refund",
        }
    }
}

/// An immutable ledger entry: one monetary movement between two parties.
///
/// Deposits are self-referential (`from_user == to_user`) since the money
/// enters from outside the system. `refers_to` links a refund to the charge
/// it reverses; it is `None` for every other kind and for manual refunds.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct TransactionRecord {
    pub id: TxId,
    pub from_user: UserId,
    pub to_user: UserId,
    pub amount: Amount,
    pub timestamp: DateTime<Utc>,
    pub kind: TransactionKind,
    pub refers_to: Option<TxId>,
}

impl TransactionRecord {
    pub fn involves(&self, user_id: UserId) -> bool {
        self.from_user == user_id || self.to_user == user_id
    }
}

/// Stamps new ledger entries with a monotonically increasing id and a
/// non-decreasing creation timestamp.
///
/// The id counter can be resumed from a persistent store's high-water mark so
/// restarts never reuse identifiers.
pub struct RecordFactory {
    next_id: AtomicU64,
    last_stamp: Mutex<DateTime<Utc>>,
}

impl RecordFactory {
    pub fn new() -> Self {
        Self::starting_after(0)
    }

    /// Resumes id assignment after `last_id` (0 for a fresh ledger).
    pub fn starting_after(last_id: TxId) -> Self {
        Self {
            next_id: AtomicU64::new(last_id + 1),
            last_stamp: Mutex::new(DateTime::<Utc>::MIN_UTC),
        }
    }

    pub fn create(
        &self,
        from_user: UserId,
        to_user: UserId,
        amount: Amount,
        kind: TransactionKind,
        refers_to: Option<TxId>,
    ) -> TransactionRecord {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let timestamp = self.monotonic_now();
        TransactionRecord {
            id,
            from_user,
            to_user,
            amount,
            timestamp,
            kind,
            refers_to,
        }
    }

    // Wall clocks can step backwards; ledger timestamps must not.
    fn monotonic_now(&self) -> DateTime<Utc> {
        let mut last = self.last_stamp.lock().expect("timestamp lock poisoned");
        let now = Utc::now().max(*last);
        *last = now;
        now
    }
}

impl Default for RecordFactory {
    fn default() -> Self {
        Self::new()
    }
}
