use crate::application::service::WalletService;
use crate::domain::money::Amount;
use crate::domain::transaction::TxId;
use crate::domain::user::{KycStatus, UserId};
use crate::error::{Result, WalletError};
use crate::interfaces::csv::operation_reader::{OpKind, OperationRow};

/// Applies one operations-file row to the service, resolving usernames to
/// ids the way the authentication layer would for a live request.
pub async fn apply(service: &WalletService, row: OperationRow) -> Result<()> {
    match row.op {
        OpKind::Register => {
            let password = require(row.detail, "password")?;
            service.accounts.register(&row.user, &password).await?;
        }
        OpKind::Deposit => {
            let user_id = actor(service, &row.user).await?;
            service.engine.deposit(user_id, amount(row.amount)?).await?;
        }
        OpKind::SetPin => {
            let user_id = actor(service, &row.user).await?;
            let pin = require(row.detail, "pin")?;
            service.gate.set_pin(user_id, &pin).await?;
        }
        OpKind::Transfer => {
            let user_id = actor(service, &row.user).await?;
            let recipient = require(row.counterparty, "recipient")?;
            let pin = require(row.detail, "pin")?;
            service
                .engine
                .transfer(user_id, &recipient, amount(row.amount)?, &pin)
                .await?;
        }
        OpKind::Charge => {
            let merchant_id = actor(service, &row.user).await?;
            let payer = require(row.counterparty, "payer")?;
            service
                .engine
                .charge(merchant_id, &payer, amount(row.amount)?)
                .await?;
        }
        OpKind::Refund => {
            let merchant_id = actor(service, &row.user).await?;
            let customer = require(row.counterparty, "customer")?;
            service
                .refunds
                .manual(merchant_id, &customer, amount(row.amount)?)
                .await?;
        }
        OpKind::RefundTx => {
            let merchant_id = actor(service, &row.user).await?;
            let tx_id: TxId = parse(require(row.detail, "transaction id")?)?;
            service.refunds.by_reference(merchant_id, tx_id).await?;
        }
        OpKind::RequestKyc => {
            let user_id = actor(service, &row.user).await?;
            let status: KycStatus = require(row.detail, "status")?.parse()?;
            service.accounts.request_kyc(user_id, status).await?;
        }
        OpKind::SetKyc => {
            let admin_id = actor(service, &row.user).await?;
            let target = require(row.counterparty, "target user")?;
            let status: KycStatus = require(row.detail, "status")?.parse()?;
            service
                .accounts
                .admin_set_kyc(admin_id, &target, status)
                .await?;
        }
        OpKind::SetMerchant => {
            let admin_id = actor(service, &row.user).await?;
            let target = require(row.counterparty, "target user")?;
            let is_merchant: bool = parse(require(row.detail, "flag")?)?;
            service
                .accounts
                .admin_set_merchant(admin_id, &target, is_merchant)
                .await?;
        }
        OpKind::UnlockPin => {
            let admin_id = actor(service, &row.user).await?;
            let target = require(row.counterparty, "target user")?;
            let target_id = actor(service, &target).await?;
            service.gate.unlock_pin(admin_id, target_id).await?;
        }
    }
    Ok(())
}

async fn actor(service: &WalletService, username: &str) -> Result<UserId> {
    Ok(service.accounts.user_by_username(username).await?.id)
}

fn amount(value: Option<rust_decimal::Decimal>) -> Result<Amount> {
    Amount::new(value.ok_or_else(|| WalletError::InvalidInput("missing amount".to_string()))?)
}

fn require(value: Option<String>, what: &str) -> Result<String> {
    value.ok_or_else(|| WalletError::InvalidInput(format!("missing {what}")))
}

fn parse<T: std::str::FromStr>(value: String) -> Result<T> {
    value
        .parse()
        .map_err(|_| WalletError::InvalidInput(format!("malformed value '{value}'")))
}
