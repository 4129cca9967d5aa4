use crate::error::{Result, WalletError};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum OpKind {
    Register,
    Deposit,
    SetPin,
    Transfer,
    Charge,
    Refund,
    RefundTx,
    RequestKyc,
    SetKyc,
    SetMerchant,
    UnlockPin,
}

/// One row of an operations file.
///
/// `user` is the acting party (the authenticated caller in the live system);
/// the remaining columns are operation-specific: `counterparty` names the
/// other user, `amount` carries money values, and `detail` holds passwords,
/// PINs, KYC statuses, flags, or transaction ids.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct OperationRow {
    pub op: OpKind,
    pub user: String,
    pub counterparty: Option<String>,
    pub amount: Option<Decimal>,
    pub detail: Option<String>,
}

/// Reads operations from a CSV source.
///
/// Wraps `csv::Reader` with whitespace trimming and flexible record lengths,
/// yielding rows lazily so large files stream without loading into memory.
pub struct OperationReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> OperationReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    pub fn operations(self) -> impl Iterator<Item = Result<OperationRow>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(WalletError::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const HEADER: &str = "op, user, counterparty, amount, detail";

    #[test]
    fn test_reader_valid_stream() {
        let data = format!(
            "{HEADER}\nregister, alice, , , s3cret\ndeposit, alice, , 100.00,\ntransfer, alice, bob, 40.00, 1234"
        );
        let reader = OperationReader::new(data.as_bytes());
        let rows: Vec<Result<OperationRow>> = reader.operations().collect();

        assert_eq!(rows.len(), 3);
        let register = rows[0].as_ref().unwrap();
        assert_eq!(register.op, OpKind::Register);
        assert_eq!(register.detail.as_deref(), Some("s3cret"));
        assert_eq!(register.amount, None);

        let transfer = rows[2].as_ref().unwrap();
        assert_eq!(transfer.counterparty.as_deref(), Some("bob"));
        assert_eq!(transfer.amount, Some(dec!(40.00)));
    }

    #[test]
    fn test_reader_malformed_line() {
        let data = format!("{HEADER}\nteleport, alice, , ,");
        let reader = OperationReader::new(data.as_bytes());
        let rows: Vec<Result<OperationRow>> = reader.operations().collect();

        assert!(rows[0].is_err());
    }
}
