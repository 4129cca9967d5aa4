use crate::application::engine::MoneyMovementEngine;
use crate::domain::money::{Amount, Balance};
use crate::domain::ports::{TransactionStoreRef, UserStoreRef};
use crate::domain::transaction::{TransactionKind, TxId};
use crate::domain::user::UserId;
use crate::error::{Result, WalletError};
use std::sync::Arc;
use tracing::debug;

/// Resolves refund requests into engine executions.
///
/// Manual refunds take explicit parameters and intentionally perform no
/// duplicate check (repeated calls are independent ad-hoc refunds). Refunds
/// by reference derive customer and amount from the original charge and carry
/// the explicit `refers_to` link that backs the duplicate guard.
pub struct RefundResolver {
    users: UserStoreRef,
    transactions: TransactionStoreRef,
    engine: Arc<MoneyMovementEngine>,
}

impl RefundResolver {
    pub fn new(
        users: UserStoreRef,
        transactions: TransactionStoreRef,
        engine: Arc<MoneyMovementEngine>,
    ) -> Self {
        Self {
            users,
            transactions,
            engine,
        }
    }

    /// Ad-hoc refund to a customer by username. Returns the merchant's new
    /// balance.
    pub async fn manual(
        &self,
        merchant_id: UserId,
        customer: &str,
        amount: Amount,
    ) -> Result<Balance> {
        let customer = self
            .users
            .by_username(customer)
            .await?
            .ok_or(WalletError::UserNotFound)?;
        self.engine
            .refund(merchant_id, customer.id, amount, None)
            .await
    }

    /// Refunds a prior charge in full, identified by its transaction id.
    ///
    /// The referenced record must be a charge received by the calling
    /// merchant and must not already have a refund linked to it. The
    /// linked-refund check here is a fast path; the engine repeats it under
    /// the wallet-pair lock before committing.
    pub async fn by_reference(&self, merchant_id: UserId, tx_id: TxId) -> Result<Balance> {
        let original = self
            .transactions
            .get(tx_id)
            .await?
            .filter(|tx| tx.kind == TransactionKind::Charge)
            .ok_or(WalletError::TransactionNotFound)?;

        if original.to_user != merchant_id {
            return Err(WalletError::Forbidden(
                "not the receiver of this transaction",
            ));
        }

        if self.transactions.refund_referencing(tx_id).await?.is_some() {
            return Err(WalletError::AlreadyRefunded(tx_id));
        }

        debug!(merchant_id, tx_id, "refunding charge by reference");
        self.engine
            .refund(merchant_id, original.from_user, original.amount, Some(tx_id))
            .await
    }
}
