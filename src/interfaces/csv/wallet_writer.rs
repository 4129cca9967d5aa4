use crate::domain::user::User;
use crate::domain::wallet::Wallet;
use crate::error::Result;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use std::io::Write;

#[derive(Serialize)]
struct WalletRow<'a> {
    username: &'a str,
    balance: Decimal,
    merchant: bool,
    kyc: &'static str,
    pin_locked: bool,
}

/// Writes the final wallet state as CSV, one row per user in id order.
pub struct WalletWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> WalletWriter<W> {
    pub fn new(destination: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(destination),
        }
    }

    pub fn write_snapshot(&mut self, users: Vec<User>, wallets: Vec<Wallet>) -> Result<()> {
        let balances: HashMap<_, _> = wallets
            .into_iter()
            .map(|w| (w.user_id, w.balance.0))
            .collect();
        for user in &users {
            self.writer.serialize(WalletRow {
                username: &user.username,
                balance: balances.get(&user.id).copied().unwrap_or(Decimal::ZERO),
                merchant: user.is_merchant,
                kyc: user.kyc_status.as_str(),
                pin_locked: user.pin_locked,
            })?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::money::Balance;
    use rust_decimal_macros::dec;

    #[test]
    fn test_writer_output_shape() {
        let user = User::new(1, "alice", "h");
        let wallet = Wallet {
            user_id: 1,
            balance: Balance::new(dec!(60.00)),
        };

        let mut out = Vec::new();
        WalletWriter::new(&mut out)
            .write_snapshot(vec![user], vec![wallet])
            .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("username,balance,merchant,kyc,pin_locked"));
        assert!(text.contains("alice,60.00,false,not_verified,false"));
    }

    #[test]
    fn test_writer_defaults_missing_wallet_to_zero() {
        let user = User::new(1, "alice", "h");

        let mut out = Vec::new();
        WalletWriter::new(&mut out)
            .write_snapshot(vec![user], vec![])
            .unwrap();

        assert!(String::from_utf8(out).unwrap().contains("alice,0,"));
    }
}
