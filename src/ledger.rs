use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use log::debug;
use serde::{Deserialize, Serialize};
use crate::account::AccountNumber;
use crate::error::Error;
use crate::persist;




/**
 * A completed transfer, stored as `<sender> <receiver> <amount>`.
 */
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: AccountNumber,
    pub receiver: AccountNumber,
    pub amount: f64,
}

impl Transaction {
    pub fn involves(&self, account_number: AccountNumber) -> bool {
        self.sender == account_number || self.receiver == account_number
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "{} {} {}", self.sender, self.receiver, self.amount)
    }
}

impl FromStr for Transaction {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let malformed = || Error::MalformedRecord { line: 0, content: line.to_string() };

        match line.split_whitespace().collect::<Vec<_>>().as_slice() {
            [sender, receiver, amount] => Ok(Self {
                sender: sender.parse().map_err(|_| malformed())?,
                receiver: receiver.parse().map_err(|_| malformed())?,
                amount: persist::parse_decimal(amount).ok_or_else(malformed)?,
            }),
            _ => Err(malformed()),
        }
    }
}




/**
 * Handle on the append-only transaction log.
 */
#[derive(Clone, Debug)]
pub struct TransactionLog {
    path: PathBuf,
}




// ============================================================================
impl TransactionLog {

    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }

    pub fn append(&self, transaction: &Transaction) -> Result<(), Error> {
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        writeln!(file, "{}", transaction)?;
        debug!("logged transaction {}", transaction);
        Ok(())
    }




    /**
     * Scan the whole log and return, in log order, every transaction in which
     * the account was sender or receiver. A missing log has no history.
     */
    pub fn history(&self, account_number: AccountNumber) -> Result<Vec<Transaction>, Error> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        persist::read_records::<_, Transaction>(BufReader::new(file))
            .filter(|t| t.as_ref().map_or(true, |t| t.involves(account_number)))
            .collect()
    }
}
