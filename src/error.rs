use crate::domain::transaction::TxId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, WalletError>;

#[derive(Error, Debug)]
pub enum WalletError {
    #[error("user not found")]
    UserNotFound,
    #[error("wallet not found")]
    WalletNotFound,
    #[error("recipient not found")]
    RecipientNotFound,
    #[error("transaction not found")]
    TransactionNotFound,
    #[error("username '{0}' already exists")]
    UsernameTaken(String),
    #[error("transaction {0} has already been refunded")]
    AlreadyRefunded(TxId),
    #[error("amount must be positive with at most two decimal places")]
    InvalidAmount,
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("forbidden: {0}")]
    Forbidden(&'static str),
    #[error("PIN is locked after repeated failed attempts")]
    PinLocked,
    #[error("invalid PIN code")]
    InvalidPin,
    #[error("incorrect username or password")]
    InvalidCredentials,
    #[error("insufficient balance")]
    InsufficientBalance,
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("internal error: {0}")]
    Internal(Box<dyn std::error::Error + Send + Sync>),
}
