use crate::domain::money::Balance;
use crate::domain::ports::{TransactionStoreRef, WalletStoreRef};
use crate::domain::transaction::{TransactionKind, TransactionRecord};
use crate::domain::user::UserId;
use crate::error::Result;
use rust_decimal::Decimal;

/// Consistency report for one wallet: cached balance vs. the balance
/// replayed from the transaction log.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditReport {
    pub user_id: UserId,
    pub cached: Balance,
    pub replayed: Balance,
}

impl AuditReport {
    pub fn is_consistent(&self) -> bool {
        self.cached == self.replayed
    }
}

/// Treats the transaction log as the source of truth and the stored balances
/// as a cache to be reconciled against it.
///
/// Two checks fall out of the ledger rules: each wallet's cached balance must
/// equal the net effect of the records touching it, and the sum of all
/// balances must equal the sum of all deposits (every other kind is
/// zero-sum).
pub struct LedgerAudit {
    wallets: WalletStoreRef,
    transactions: TransactionStoreRef,
}

impl LedgerAudit {
    pub fn new(wallets: WalletStoreRef, transactions: TransactionStoreRef) -> Self {
        Self {
            wallets,
            transactions,
        }
    }

    /// The balance one wallet would hold if rebuilt from the log alone.
    pub async fn replayed_balance(&self, user_id: UserId) -> Result<Balance> {
        let records = self.transactions.all_for(user_id).await?;
        Ok(Balance::new(
            records
                .iter()
                .map(|tx| net_effect(tx, user_id))
                .sum::<Decimal>(),
        ))
    }

    pub async fn check(&self, user_id: UserId) -> Result<AuditReport> {
        let cached = self
            .wallets
            .get(user_id)
            .await?
            .map(|wallet| wallet.balance)
            .unwrap_or(Balance::ZERO);
        let replayed = self.replayed_balance(user_id).await?;
        Ok(AuditReport {
            user_id,
            cached,
            replayed,
        })
    }

    /// Total held across all wallets minus total deposited; zero when money
    /// has been conserved.
    pub async fn conservation_drift(&self) -> Result<Decimal> {
        let held: Decimal = self
            .wallets
            .all()
            .await?
            .iter()
            .map(|wallet| wallet.balance.0)
            .sum();
        let deposited: Decimal = self
            .transactions
            .all()
            .await?
            .iter()
            .filter(|tx| tx.kind == TransactionKind::Deposit)
            .map(|tx| tx.amount.value())
            .sum();
        Ok(held - deposited)
    }
}

fn net_effect(tx: &TransactionRecord, user_id: UserId) -> Decimal {
    // A deposit is self-referential; it counts once, as a credit.
    if tx.kind == TransactionKind::Deposit {
        return if tx.to_user == user_id {
            tx.amount.value()
        } else {
            Decimal::ZERO
        };
    }
    let mut delta = Decimal::ZERO;
    if tx.to_user == user_id {
        delta += tx.amount.value();
    }
    if tx.from_user == user_id {
        delta -= tx.amount.value();
    }
    delta
}
