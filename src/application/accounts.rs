use crate::application::auth::{AccessToken, SecretHasherRef, TokenIssuerRef};
use crate::application::gate::AccessGate;
use crate::domain::money::Balance;
use crate::domain::ports::{NewUser, UserStoreRef, WalletStoreRef};
use crate::domain::user::{KycStatus, User, UserId};
use crate::error::{Result, WalletError};
use std::sync::Arc;
use tracing::info;

/// A user's profile as exposed to the request layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub id: UserId,
    pub username: String,
    pub balance: Balance,
    pub is_merchant: bool,
    pub kyc_status: KycStatus,
}

/// Account lifecycle: registration, login, profile, KYC, and the
/// admin-gated status overrides.
pub struct AccountService {
    users: UserStoreRef,
    wallets: WalletStoreRef,
    hasher: SecretHasherRef,
    tokens: TokenIssuerRef,
    gate: Arc<AccessGate>,
}

impl AccountService {
    pub fn new(
        users: UserStoreRef,
        wallets: WalletStoreRef,
        hasher: SecretHasherRef,
        tokens: TokenIssuerRef,
        gate: Arc<AccessGate>,
    ) -> Self {
        Self {
            users,
            wallets,
            hasher,
            tokens,
            gate,
        }
    }

    /// Creates a user and their zero-balance wallet.
    pub async fn register(&self, username: &str, password: &str) -> Result<User> {
        let user = self
            .users
            .create(NewUser {
                username: username.to_string(),
                password_hash: self.hasher.hash(password),
            })
            .await?;
        self.wallets.create(user.id).await?;
        info!(user_id = user.id, username, "user registered");
        Ok(user)
    }

    /// Creates an administrator account. Not reachable from the operation
    /// surface; used to bootstrap the first admin.
    pub async fn seed_admin(&self, username: &str, password: &str) -> Result<User> {
        let mut user = self.register(username, password).await?;
        user.is_admin = true;
        self.users.update(user.clone()).await?;
        Ok(user)
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<AccessToken> {
        let user = self
            .users
            .by_username(username)
            .await?
            .ok_or(WalletError::InvalidCredentials)?;
        if !self.hasher.verify(password, &user.password_hash) {
            return Err(WalletError::InvalidCredentials);
        }
        Ok(self.tokens.issue(user.id).await)
    }

    pub async fn current_user(&self, token: &str) -> Result<UserId> {
        self.tokens
            .resolve(token)
            .await
            .ok_or(WalletError::InvalidCredentials)
    }

    pub async fn profile(&self, user_id: UserId) -> Result<Profile> {
        let user = self
            .users
            .get(user_id)
            .await?
            .ok_or(WalletError::UserNotFound)?;
        let wallet = self
            .wallets
            .get(user_id)
            .await?
            .ok_or(WalletError::WalletNotFound)?;
        Ok(Profile {
            id: user.id,
            username: user.username,
            balance: wallet.balance,
            is_merchant: user.is_merchant,
            kyc_status: user.kyc_status,
        })
    }

    pub async fn balance(&self, user_id: UserId) -> Result<Balance> {
        let wallet = self
            .wallets
            .get(user_id)
            .await?
            .ok_or(WalletError::WalletNotFound)?;
        Ok(wallet.balance)
    }

    pub async fn user_by_username(&self, username: &str) -> Result<User> {
        self.users
            .by_username(username)
            .await?
            .ok_or(WalletError::UserNotFound)
    }

    /// Self-service KYC submission; users may only move themselves to
    /// `Pending`, the rest of the state machine belongs to admins.
    pub async fn request_kyc(&self, user_id: UserId, status: KycStatus) -> Result<()> {
        if status != KycStatus::Pending {
            return Err(WalletError::Forbidden(
                "only 'pending' status can be requested",
            ));
        }
        let mut user = self
            .users
            .get(user_id)
            .await?
            .ok_or(WalletError::UserNotFound)?;
        user.kyc_status = KycStatus::Pending;
        self.users.update(user).await
    }

    pub async fn admin_set_kyc(
        &self,
        admin_id: UserId,
        username: &str,
        status: KycStatus,
    ) -> Result<()> {
        self.gate.ensure_admin(admin_id).await?;
        let mut user = self.user_by_username(username).await?;
        user.kyc_status = status;
        info!(username, status = status.as_str(), "KYC status updated");
        self.users.update(user).await
    }

    pub async fn admin_set_merchant(
        &self,
        admin_id: UserId,
        username: &str,
        is_merchant: bool,
    ) -> Result<()> {
        self.gate.ensure_admin(admin_id).await?;
        let mut user = self.user_by_username(username).await?;
        user.is_merchant = is_merchant;
        info!(username, is_merchant, "merchant status updated");
        self.users.update(user).await
    }
}
