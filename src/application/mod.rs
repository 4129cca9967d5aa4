//! Application layer: the services orchestrating the ledger core.
//!
//! `MoneyMovementEngine` is the only writer of balances and transaction
//! records; `WalletLocks` serializes its operations per wallet row. The
//! remaining services (accounts, refunds, history, audit) compose around it,
//! wired together by `WalletService`.

pub mod accounts;
pub mod audit;
pub mod auth;
pub mod engine;
pub mod gate;
pub mod locks;
pub mod queries;
pub mod refund;
pub mod service;
