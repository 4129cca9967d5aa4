use crate::application::accounts::AccountService;
use crate::application::audit::LedgerAudit;
use crate::application::auth::{
    InMemoryTokenIssuer, SecretHasherRef, Sha256SecretHasher, TokenIssuerRef,
};
use crate::application::engine::MoneyMovementEngine;
use crate::application::gate::AccessGate;
use crate::application::locks::WalletLocks;
use crate::application::queries::HistoryService;
use crate::application::refund::RefundResolver;
use crate::domain::ports::{TransactionStoreRef, UserStoreRef, WalletStoreRef};
use crate::domain::transaction::RecordFactory;
use crate::domain::user::User;
use crate::domain::wallet::Wallet;
use crate::error::Result;
use crate::infrastructure::in_memory::{
    InMemoryTransactionStore, InMemoryUserStore, InMemoryWalletStore,
};
use std::sync::Arc;

/// Fully wired wallet service: the composition root over one set of stores.
///
/// The record factory resumes from the store's id high-water mark so a
/// persistent ledger keeps monotonic ids across restarts.
pub struct WalletService {
    pub accounts: AccountService,
    pub gate: Arc<AccessGate>,
    pub engine: Arc<MoneyMovementEngine>,
    pub refunds: RefundResolver,
    pub history: HistoryService,
    pub audit: LedgerAudit,
    users: UserStoreRef,
    wallets: WalletStoreRef,
}

impl WalletService {
    pub async fn new(
        users: UserStoreRef,
        wallets: WalletStoreRef,
        transactions: TransactionStoreRef,
        hasher: SecretHasherRef,
        tokens: TokenIssuerRef,
    ) -> Result<Self> {
        let locks = Arc::new(WalletLocks::new());
        let factory = Arc::new(RecordFactory::starting_after(transactions.last_id().await?));
        let gate = Arc::new(AccessGate::new(
            users.clone(),
            locks.clone(),
            hasher.clone(),
        ));
        let engine = Arc::new(MoneyMovementEngine::new(
            users.clone(),
            wallets.clone(),
            transactions.clone(),
            factory,
            locks,
            gate.clone(),
        ));
        Ok(Self {
            accounts: AccountService::new(
                users.clone(),
                wallets.clone(),
                hasher,
                tokens,
                gate.clone(),
            ),
            refunds: RefundResolver::new(users.clone(), transactions.clone(), engine.clone()),
            history: HistoryService::new(users.clone(), transactions.clone(), gate.clone()),
            audit: LedgerAudit::new(wallets.clone(), transactions),
            gate,
            engine,
            users,
            wallets,
        })
    }

    /// Current users and wallets, in id order; the batch driver's final
    /// report.
    pub async fn snapshot(&self) -> Result<(Vec<User>, Vec<Wallet>)> {
        Ok((self.users.all().await?, self.wallets.all().await?))
    }

    /// A service over fresh in-memory stores with the default collaborators.
    pub async fn in_memory() -> Result<Self> {
        Self::new(
            Arc::new(InMemoryUserStore::new()),
            Arc::new(InMemoryWalletStore::new()),
            Arc::new(InMemoryTransactionStore::new()),
            Arc::new(Sha256SecretHasher::new()),
            Arc::new(InMemoryTokenIssuer::new()),
        )
        .await
    }
}
