use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use crate::error::Error;
use crate::persist;




/**
 * Unique, immutable key of an account.
 */
pub type AccountNumber = i64;




/**
 * The mutable part of an account: everything the index stores under an
 * account number. Handing out `&mut Account` lets callers adjust a balance in
 * place without ever touching the key.
 */
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub owner: String,
    pub balance: f64,
}




/**
 * A complete account row, as produced by ordered traversal and consumed by
 * bulk loading. Its text form is `<number> <owner> <balance>`.
 */
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub account_number: AccountNumber,
    pub owner: String,
    pub balance: f64,
}




// ============================================================================
impl AccountRecord {
    pub fn new(account_number: AccountNumber, owner: &str, balance: f64) -> Self {
        Self { account_number, owner: owner.to_string(), balance }
    }

    pub(crate) fn from_parts(account_number: AccountNumber, account: Account) -> Self {
        Self { account_number, owner: account.owner, balance: account.balance }
    }

    pub(crate) fn into_parts(self) -> (AccountNumber, Account) {
        (self.account_number, Account { owner: self.owner, balance: self.balance })
    }
}




// ============================================================================
impl fmt::Display for AccountRecord {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "{} {} {}", self.account_number, self.owner, self.balance)
    }
}

impl FromStr for AccountRecord {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let malformed = || Error::MalformedRecord { line: 0, content: line.to_string() };
        let fields: Vec<_> = line.split_whitespace().collect();

        match fields.as_slice() {
            [number, owner, balance] => Ok(Self {
                account_number: number.parse().map_err(|_| malformed())?,
                owner: owner.to_string(),
                balance: persist::parse_decimal(balance).ok_or_else(malformed)?,
            }),
            _ => Err(malformed()),
        }
    }
}




// ============================================================================
#[cfg(test)]
mod test {

    use super::AccountRecord;

    #[test]
    fn record_text_form_has_three_fields() {
        let record = AccountRecord::new(1001, "alice", 250.5);
        assert_eq!(record.to_string(), "1001 alice 250.5");
        assert_eq!("1001 alice 250.5".parse::<AccountRecord>().unwrap(), record);
    }

    #[test]
    fn negative_balances_are_accepted() {
        let record: AccountRecord = "7   bob\t-12.25".parse().unwrap();
        assert_eq!(record, AccountRecord::new(7, "bob", -12.25));
    }

    #[test]
    fn lines_without_exactly_three_fields_are_malformed() {
        assert!("".parse::<AccountRecord>().is_err());
        assert!("1 alice".parse::<AccountRecord>().is_err());
        assert!("1 alice 2.0 extra".parse::<AccountRecord>().is_err());
        assert!("one alice 2.0".parse::<AccountRecord>().is_err());
        assert!("1 alice lots".parse::<AccountRecord>().is_err());
        assert!("1 a NaN".parse::<AccountRecord>().is_err());
        assert!("1 a inf".parse::<AccountRecord>().is_err());
        assert!("1 a -inf".parse::<AccountRecord>().is_err());
        assert!("1 a 1e400".parse::<AccountRecord>().is_err());
    }
}
