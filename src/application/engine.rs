use crate::application::gate::AccessGate;
use crate::application::locks::WalletLocks;
use crate::domain::money::{Amount, Balance};
use crate::domain::ports::{TransactionStoreRef, UserStoreRef, WalletStoreRef};
use crate::domain::transaction::{RecordFactory, TransactionKind, TxId};
use crate::domain::user::UserId;
use crate::domain::wallet::Wallet;
use crate::error::{Result, WalletError};
use std::sync::Arc;
use tracing::info;

/// The ledger integrity core: deposit, transfer, merchant charge, and refund.
///
/// Every operation validates its preconditions and mutates the involved
/// wallet rows plus the transaction log as one isolated unit, holding the
/// rows' locks (ascending id order) for the whole read-validate-write
/// sequence. Money is only created by deposits; everything else is zero-sum.
pub struct MoneyMovementEngine {
    users: UserStoreRef,
    wallets: WalletStoreRef,
    transactions: TransactionStoreRef,
    factory: Arc<RecordFactory>,
    locks: Arc<WalletLocks>,
    gate: Arc<AccessGate>,
}

impl MoneyMovementEngine {
    pub fn new(
        users: UserStoreRef,
        wallets: WalletStoreRef,
        transactions: TransactionStoreRef,
        factory: Arc<RecordFactory>,
        locks: Arc<WalletLocks>,
        gate: Arc<AccessGate>,
    ) -> Self {
        Self {
            users,
            wallets,
            transactions,
            factory,
            locks,
            gate,
        }
    }

    /// Credits `amount` from outside the system and appends the
    /// self-referential `deposit` record. Returns the new balance.
    pub async fn deposit(&self, user_id: UserId, amount: Amount) -> Result<Balance> {
        let _guard = self.locks.lock(user_id).await;

        self.wallet(user_id).await?;
        let wallet = self
            .wallets
            .adjust_balance(user_id, amount.value())
            .await?;
        let record = self
            .factory
            .create(user_id, user_id, amount, TransactionKind::Deposit, None);
        self.transactions.append(record).await?;

        info!(user_id, %amount, "deposit");
        Ok(wallet.balance)
    }

    /// Moves `amount` from the sender to the user named `recipient`, gated on
    /// PIN verification. Returns the sender's new balance.
    pub async fn transfer(
        &self,
        sender_id: UserId,
        recipient: &str,
        amount: Amount,
        pin: &str,
    ) -> Result<Balance> {
        self.gate.verify_pin(sender_id, pin).await?;

        let sender_wallet = self.wallet(sender_id).await?;
        if !sender_wallet.balance.covers(amount) {
            return Err(WalletError::InsufficientBalance);
        }

        let recipient = self
            .users
            .by_username(recipient)
            .await?
            .ok_or(WalletError::RecipientNotFound)?;

        let _guards = self.locks.lock_pair(sender_id, recipient.id).await;

        // Authoritative check: the balance may have changed since the
        // pre-check above ran without the lock.
        let sender_wallet = self.wallet(sender_id).await?;
        if !sender_wallet.balance.covers(amount) {
            return Err(WalletError::InsufficientBalance);
        }
        self.wallet(recipient.id).await?;

        let wallet = self
            .wallets
            .adjust_balance(sender_id, -amount.value())
            .await?;
        self.wallets
            .adjust_balance(recipient.id, amount.value())
            .await?;
        let record = self.factory.create(
            sender_id,
            recipient.id,
            amount,
            TransactionKind::Transfer,
            None,
        );
        self.transactions.append(record).await?;

        info!(sender_id, recipient_id = recipient.id, %amount, "transfer");
        Ok(wallet.balance)
    }

    /// Debits the user named `payer` and credits the calling merchant.
    /// Returns the merchant's new balance.
    pub async fn charge(
        &self,
        merchant_id: UserId,
        payer: &str,
        amount: Amount,
    ) -> Result<Balance> {
        self.gate.ensure_merchant(merchant_id).await?;

        let payer = self
            .users
            .by_username(payer)
            .await?
            .ok_or(WalletError::UserNotFound)?;

        let _guards = self.locks.lock_pair(payer.id, merchant_id).await;

        let payer_wallet = self.wallet(payer.id).await?;
        if !payer_wallet.balance.covers(amount) {
            return Err(WalletError::InsufficientBalance);
        }
        self.wallet(merchant_id).await?;

        self.wallets
            .adjust_balance(payer.id, -amount.value())
            .await?;
        let wallet = self
            .wallets
            .adjust_balance(merchant_id, amount.value())
            .await?;
        let record = self.factory.create(
            payer.id,
            merchant_id,
            amount,
            TransactionKind::Charge,
            None,
        );
        self.transactions.append(record).await?;

        info!(merchant_id, payer_id = payer.id, %amount, "charge");
        Ok(wallet.balance)
    }

    /// Returns `amount` from the calling merchant to `customer_id`.
    ///
    /// When `refers_to` names the original charge, the duplicate guard runs
    /// again inside the wallet-pair lock: two concurrent refunds of the same
    /// charge cannot both pass it. Returns the merchant's new balance.
    pub async fn refund(
        &self,
        merchant_id: UserId,
        customer_id: UserId,
        amount: Amount,
        refers_to: Option<TxId>,
    ) -> Result<Balance> {
        self.gate.ensure_merchant(merchant_id).await?;

        let _guards = self.locks.lock_pair(merchant_id, customer_id).await;

        if let Some(original_id) = refers_to
            && self
                .transactions
                .refund_referencing(original_id)
                .await?
                .is_some()
        {
            return Err(WalletError::AlreadyRefunded(original_id));
        }

        let merchant_wallet = self.wallet(merchant_id).await?;
        if !merchant_wallet.balance.covers(amount) {
            return Err(WalletError::InsufficientBalance);
        }
        self.wallet(customer_id).await?;

        let wallet = self
            .wallets
            .adjust_balance(merchant_id, -amount.value())
            .await?;
        self.wallets
            .adjust_balance(customer_id, amount.value())
            .await?;
        let record = self.factory.create(
            merchant_id,
            customer_id,
            amount,
            TransactionKind::Refund,
            refers_to,
        );
        self.transactions.append(record).await?;

        info!(merchant_id, customer_id, %amount, ?refers_to, "refund");
        Ok(wallet.balance)
    }

    async fn wallet(&self, user_id: UserId) -> Result<Wallet> {
        self.wallets
            .get(user_id)
            .await?
            .ok_or(WalletError::WalletNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::auth::Sha256SecretHasher;
    use crate::domain::ports::{NewUser, UserStore, WalletStore};
    use crate::infrastructure::in_memory::{
        InMemoryTransactionStore, InMemoryUserStore, InMemoryWalletStore,
    };
    use rust_decimal_macros::dec;

    async fn engine_with_user() -> (MoneyMovementEngine, UserId) {
        let users = Arc::new(InMemoryUserStore::new());
        let wallets = Arc::new(InMemoryWalletStore::new());
        let transactions = Arc::new(InMemoryTransactionStore::new());
        let locks = Arc::new(WalletLocks::new());
        let gate = Arc::new(AccessGate::new(
            users.clone(),
            locks.clone(),
            Arc::new(Sha256SecretHasher::new()),
        ));

        let user = users
            .create(NewUser {
                username: "alice".to_string(),
                password_hash: "h".to_string(),
            })
            .await
            .unwrap();
        WalletStore::create(wallets.as_ref(), user.id).await.unwrap();

        let engine = MoneyMovementEngine::new(
            users,
            wallets,
            transactions,
            Arc::new(RecordFactory::new()),
            locks,
            gate,
        );
        (engine, user.id)
    }

    fn amount(value: rust_decimal::Decimal) -> Amount {
        Amount::new(value).unwrap()
    }

    #[tokio::test]
    async fn test_deposits_accumulate() {
        let (engine, user_id) = engine_with_user().await;

        engine.deposit(user_id, amount(dec!(10.00))).await.unwrap();
        let balance = engine.deposit(user_id, amount(dec!(2.50))).await.unwrap();
        assert_eq!(balance, Balance::new(dec!(12.50)));
    }

    #[tokio::test]
    async fn test_transfer_is_pin_gated() {
        let (engine, user_id) = engine_with_user().await;
        engine.deposit(user_id, amount(dec!(10.00))).await.unwrap();

        // No PIN has been set; the gate rejects before any balance check.
        let result = engine
            .transfer(user_id, "alice", amount(dec!(1.00)), "1234")
            .await;
        assert!(matches!(result, Err(WalletError::InvalidPin)));
    }

    #[tokio::test]
    async fn test_refund_requires_merchant_role() {
        let (engine, user_id) = engine_with_user().await;

        let result = engine
            .refund(user_id, user_id, amount(dec!(1.00)), None)
            .await;
        assert!(matches!(result, Err(WalletError::Forbidden(_))));
    }
}
