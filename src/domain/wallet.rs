use crate::domain::money::{Amount, Balance};
use crate::domain::user::UserId;
use crate::error::WalletError;
use serde::{Deserialize, Serialize};

/// A user's stored monetary balance, one row per user.
///
/// The balance is a cache over the transaction log; `credit`/`debit` are the
/// only mutation paths and `debit` enforces the non-negativity invariant.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Wallet {
    pub user_id: UserId,
    pub balance: Balance,
}

impl Wallet {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            balance: Balance::ZERO,
        }
    }

    pub fn credit(&mut self, amount: Amount) {
        self.balance += amount.into();
    }

    pub fn debit(&mut self, amount: Amount) -> Result<(), WalletError> {
        if self.balance.covers(amount) {
            self.balance -= amount.into();
            Ok(())
        } else {
            Err(WalletError::InsufficientBalance)
        }
    }
}
