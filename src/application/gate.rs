use crate::application::auth::SecretHasherRef;
use crate::application::locks::WalletLocks;
use crate::domain::ports::UserStoreRef;
use crate::domain::user::{User, UserId};
use crate::error::{Result, WalletError};
use std::sync::Arc;
use tracing::warn;

/// Authorization gate: PIN verification with lockout, and role checks.
///
/// PIN verification serializes on the user's wallet lock so concurrent failed
/// attempts can never lose a counter increment.
pub struct AccessGate {
    users: UserStoreRef,
    locks: Arc<WalletLocks>,
    hasher: SecretHasherRef,
}

impl AccessGate {
    pub fn new(users: UserStoreRef, locks: Arc<WalletLocks>, hasher: SecretHasherRef) -> Self {
        Self {
            users,
            locks,
            hasher,
        }
    }

    /// Checks `input` against the stored PIN hash.
    ///
    /// A locked account fails immediately without counting an attempt. A
    /// mismatch (or unset PIN) increments the failure counter and locks the
    /// account at the third strike; a match resets the counter.
    pub async fn verify_pin(&self, user_id: UserId, input: &str) -> Result<()> {
        let _guard = self.locks.lock(user_id).await;

        let mut user = self
            .users
            .get(user_id)
            .await?
            .ok_or(WalletError::UserNotFound)?;

        if user.pin_locked {
            return Err(WalletError::PinLocked);
        }

        let matches = user
            .pin_hash
            .as_deref()
            .is_some_and(|hash| self.hasher.verify(input, hash));

        if matches {
            user.record_pin_success();
            self.users.update(user).await?;
            Ok(())
        } else {
            user.record_pin_failure();
            if user.pin_locked {
                warn!(user_id, "PIN locked after repeated failed attempts");
            }
            self.users.update(user).await?;
            Err(WalletError::InvalidPin)
        }
    }

    /// Sets or replaces the PIN. The code must be 4-10 ASCII digits.
    pub async fn set_pin(&self, user_id: UserId, pin: &str) -> Result<()> {
        validate_pin_format(pin)?;

        let _guard = self.locks.lock(user_id).await;
        let mut user = self
            .users
            .get(user_id)
            .await?
            .ok_or(WalletError::UserNotFound)?;
        user.set_pin(self.hasher.hash(pin));
        self.users.update(user).await
    }

    /// Clears a lockout. Admin-only: a self-service unlock would defeat the
    /// lockout entirely.
    pub async fn unlock_pin(&self, admin_id: UserId, user_id: UserId) -> Result<()> {
        self.ensure_admin(admin_id).await?;

        let _guard = self.locks.lock(user_id).await;
        let mut user = self
            .users
            .get(user_id)
            .await?
            .ok_or(WalletError::UserNotFound)?;
        user.unlock_pin();
        self.users.update(user).await
    }

    pub async fn ensure_merchant(&self, user_id: UserId) -> Result<User> {
        let user = self
            .users
            .get(user_id)
            .await?
            .ok_or(WalletError::UserNotFound)?;
        if user.is_merchant {
            Ok(user)
        } else {
            Err(WalletError::Forbidden("merchant role required"))
        }
    }

    pub async fn ensure_admin(&self, user_id: UserId) -> Result<User> {
        let user = self
            .users
            .get(user_id)
            .await?
            .ok_or(WalletError::UserNotFound)?;
        if user.is_admin {
            Ok(user)
        } else {
            Err(WalletError::Forbidden("administrator role required"))
        }
    }
}

fn validate_pin_format(pin: &str) -> Result<()> {
    if !(4..=10).contains(&pin.len()) || !pin.bytes().all(|b| b.is_ascii_digit()) {
        return Err(WalletError::InvalidInput(
            "PIN must be 4-10 digits".to_string(),
        ));
    }
    Ok(())
}
