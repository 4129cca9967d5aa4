use crate::domain::user::UserId;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

pub type SecretHasherRef = Arc<dyn SecretHasher>;
pub type TokenIssuerRef = Arc<dyn TokenIssuer>;

/// One-way hashing for passwords and PIN codes.
///
/// The service never stores or compares secrets in the clear; swapping in a
/// hardened KDF is a matter of providing another implementation.
pub trait SecretHasher: Send + Sync {
    fn hash(&self, secret: &str) -> String;
    fn verify(&self, secret: &str, hashed: &str) -> bool;
}

/// Salted SHA-256 digests, encoded as `salt$hexdigest`.
#[derive(Default, Clone)]
pub struct Sha256SecretHasher;

impl Sha256SecretHasher {
    pub fn new() -> Self {
        Self
    }

    fn digest(salt: &str, secret: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(salt.as_bytes());
        hasher.update(secret.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

impl SecretHasher for Sha256SecretHasher {
    fn hash(&self, secret: &str) -> String {
        let salt = Uuid::new_v4().simple().to_string();
        let digest = Self::digest(&salt, secret);
        format!("{salt}${digest}")
    }

    fn verify(&self, secret: &str, hashed: &str) -> bool {
        match hashed.split_once('$') {
            Some((salt, digest)) => Self::digest(salt, secret) == digest,
            None => false,
        }
    }
}

/// Opaque bearer token handed out at login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken(pub String);

/// Issues and resolves access tokens; stands in for the out-of-scope JWT
/// layer while keeping the login/current-user contract intact.
#[async_trait]
pub trait TokenIssuer: Send + Sync {
    async fn issue(&self, user_id: UserId) -> AccessToken;
    async fn resolve(&self, token: &str) -> Option<UserId>;
}

#[derive(Default, Clone)]
pub struct InMemoryTokenIssuer {
    tokens: Arc<RwLock<HashMap<String, UserId>>>,
}

impl InMemoryTokenIssuer {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenIssuer for InMemoryTokenIssuer {
    async fn issue(&self, user_id: UserId) -> AccessToken {
        let token = Uuid::new_v4().to_string();
        self.tokens.write().await.insert(token.clone(), user_id);
        AccessToken(token)
    }

    async fn resolve(&self, token: &str) -> Option<UserId> {
        self.tokens.read().await.get(token).copied()
    }
}
