use serde::{Deserialize, Serialize};

pub type UserId = u64;

/// Consecutive failed PIN attempts tolerated before the account locks.
pub const MAX_PIN_FAILURES: u8 = 3;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "snake_case")]
pub enum KycStatus {
    #[default]
    NotVerified,
    Pending,
    Verified,
    Rejected,
}

impl std::str::FromStr for KycStatus {
    type Err = crate::error::WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_verified" => Ok(KycStatus::NotVerified),
            "pending" => Ok(KycStatus::Pending),
            "verified" => Ok(KycStatus::Verified),
            "rejected" => Ok(KycStatus::Rejected),
            other => Err(crate::error::WalletError::InvalidInput(format!(
                "unknown KYC status '{other}'"
            ))),
        }
    }
}

impl KycStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            KycStatus::NotVerified => "not_verified",
            KycStatus::Pending => "pending",
            KycStatus::Verified => "verified",
            KycStatus::Rejected => "rejected",
        }
    }
}

/// A registered account holder.
///
/// Carries the credential material (password and optional PIN hashes) plus the
/// role flags and KYC state that gate operations. The PIN lockout counter is
/// part of the entity so its transitions stay next to the data they guard.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub password_hash: String,
    pub is_merchant: bool,
    pub is_admin: bool,
    pub kyc_status: KycStatus,
    pub pin_hash: Option<String>,
    pub pin_fail_count: u8,
    pub pin_locked: bool,
}

impl User {
    pub fn new(id: UserId, username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            password_hash: password_hash.into(),
            is_merchant: false,
            is_admin: false,
            kyc_status: KycStatus::NotVerified,
            pin_hash: None,
            pin_fail_count: 0,
            pin_locked: false,
        }
    }

    /// Records a failed PIN attempt, locking at `MAX_PIN_FAILURES`.
    pub fn record_pin_failure(&mut self) {
        self.pin_fail_count += 1;
        if self.pin_fail_count >= MAX_PIN_FAILURES {
            self.pin_locked = true;
        }
    }

    /// Clears the failure counter after a successful verification.
    pub fn record_pin_success(&mut self) {
        self.pin_fail_count = 0;
    }

    /// Re-keys the PIN. Any previous lockout state is cleared.
    pub fn set_pin(&mut self, pin_hash: String) {
        self.pin_hash = Some(pin_hash);
        self.pin_fail_count = 0;
        self.pin_locked = false;
    }

    pub fn unlock_pin(&mut self) {
        self.pin_fail_count = 0;
        self.pin_locked = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pin_lockout_after_three_failures() {
        let mut user = User::new(1, "alice", "h");
        user.record_pin_failure();
        user.record_pin_failure();
        assert!(!user.pin_locked);
        user.record_pin_failure();
        assert!(user.pin_locked);
        assert_eq!(user.pin_fail_count, 3);
    }

    #[test]
    fn test_pin_success_resets_counter() {
        let mut user = User::new(1, "alice", "h");
        user.record_pin_failure();
        user.record_pin_success();
        assert_eq!(user.pin_fail_count, 0);
        assert!(!user.pin_locked);
    }

    #[test]
    fn test_unlock_resets_state() {
        let mut user = User::new(1, "alice", "h");
        for _ in 0..3 {
            user.record_pin_failure();
        }
        assert!(user.pin_locked);
        user.unlock_pin();
        assert!(!user.pin_locked);
        assert_eq!(user.pin_fail_count, 0);
    }

    #[test]
    fn test_set_pin_clears_lockout() {
        let mut user = User::new(1, "alice", "h");
        for _ in 0..3 {
            user.record_pin_failure();
        }
        user.set_pin("new-hash".to_string());
        assert!(!user.pin_locked);
        assert_eq!(user.pin_hash.as_deref(), Some("new-hash"));
    }
}
