use crate::application::gate::AccessGate;
use crate::domain::ports::{TransactionStoreRef, UserStoreRef};
use crate::domain::transaction::{TransactionKind, TransactionRecord, TxId};
use crate::domain::user::UserId;
use crate::error::{Result, WalletError};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use std::sync::Arc;

/// Filter for `HistoryService::search`. Dates are `YYYY-MM-DD` strings and
/// compare against UTC midnight of the named day (start inclusive, end up to
/// midnight), matching the record-search contract.
#[derive(Debug, Default, Clone)]
pub struct RecordFilter {
    pub kind: Option<TransactionKind>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub counterparty: Option<String>,
}

/// Read-only views over the transaction log.
pub struct HistoryService {
    users: UserStoreRef,
    transactions: TransactionStoreRef,
    gate: Arc<AccessGate>,
}

impl HistoryService {
    pub fn new(
        users: UserStoreRef,
        transactions: TransactionStoreRef,
        gate: Arc<AccessGate>,
    ) -> Self {
        Self {
            users,
            transactions,
            gate,
        }
    }

    /// Every record the user is a party to, newest first.
    pub async fn list_transactions(&self, user_id: UserId) -> Result<Vec<TransactionRecord>> {
        self.transactions.all_for(user_id).await
    }

    pub async fn search_records(
        &self,
        user_id: UserId,
        filter: RecordFilter,
    ) -> Result<Vec<TransactionRecord>> {
        let start = filter
            .start_date
            .as_deref()
            .map(parse_day_start)
            .transpose()?;
        let end = filter.end_date.as_deref().map(parse_day_start).transpose()?;

        let counterparty_ids = match filter.counterparty.as_deref() {
            Some(keyword) => Some(self.users.search_usernames(keyword).await?),
            None => None,
        };

        let records = self.transactions.all_for(user_id).await?;
        Ok(records
            .into_iter()
            .filter(|tx| filter.kind.is_none_or(|kind| tx.kind == kind))
            .filter(|tx| start.is_none_or(|start| tx.timestamp >= start))
            .filter(|tx| end.is_none_or(|end| tx.timestamp <= end))
            .filter(|tx| {
                counterparty_ids.as_ref().is_none_or(|ids| {
                    ids.contains(&tx.from_user) || ids.contains(&tx.to_user)
                })
            })
            .collect())
    }

    /// A single record, visible only to its parties.
    pub async fn get_transaction(&self, user_id: UserId, tx_id: TxId) -> Result<TransactionRecord> {
        let tx = self
            .transactions
            .get(tx_id)
            .await?
            .ok_or(WalletError::TransactionNotFound)?;
        if !tx.involves(user_id) {
            return Err(WalletError::Forbidden(
                "not a party to this transaction",
            ));
        }
        Ok(tx)
    }

    /// Merchant-side view of the log, optionally narrowed by kind.
    pub async fn merchant_records(
        &self,
        merchant_id: UserId,
        kind: Option<TransactionKind>,
    ) -> Result<Vec<TransactionRecord>> {
        self.gate.ensure_merchant(merchant_id).await?;
        let records = self.transactions.all_for(merchant_id).await?;
        Ok(records
            .into_iter()
            .filter(|tx| kind.is_none_or(|kind| tx.kind == kind))
            .collect())
    }
}

fn parse_day_start(date: &str) -> Result<DateTime<Utc>> {
    let day = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| WalletError::InvalidInput(format!("malformed date '{date}'")))?;
    Ok(day.and_time(NaiveTime::MIN).and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_day_start() {
        let parsed = parse_day_start("2026-08-07").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2026-08-07T00:00:00+00:00");
    }

    #[test]
    fn test_parse_day_start_rejects_malformed_input() {
        assert!(matches!(
            parse_day_start("07/08/2026"),
            Err(WalletError::InvalidInput(_))
        ));
        assert!(matches!(
            parse_day_start("2026-13-40"),
            Err(WalletError::InvalidInput(_))
        ));
    }
}
