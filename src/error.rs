use std::error;
use std::fmt;
use std::io;
use crate::account::AccountNumber;

/**
 * Error to represent failed persistence or a rejected session operation. The
 * account index itself never fails: a missing key or a duplicate insert is
 * reported through its return value instead.
 *
 * A `MalformedRecord` built while parsing a single line has `line` zero; the
 * record reader fills in the real line number with `at_line`.
 */
#[derive(Debug)]
pub enum Error {
    MalformedRecord { line: usize, content: String },
    AccountNotFound(AccountNumber),
    DuplicateAccount(AccountNumber),
    UsernameTaken(String),
    InvalidToken(String),
    InvalidAmount(f64),
    InsufficientFunds { account: AccountNumber, balance: f64, requested: f64 },
    SelfTransfer(AccountNumber),
    AccessDenied(String),
    Snapshot(String),
    Io(io::Error),
}

impl Error {
    /**
     * Attach the 1-based line number a malformed record was read from. Other
     * errors are returned unchanged.
     */
    pub fn at_line(self, line: usize) -> Self {
        match self {
            Error::MalformedRecord { content, .. } => Error::MalformedRecord { line, content },
            other => other,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        use Error::*;

        match self {
            MalformedRecord { line, content } => write!(fmt, "malformed record on line {}: {:?}", line, content),
            AccountNotFound(n) => write!(fmt, "account {} not found", n),
            DuplicateAccount(n) => write!(fmt, "account {} already exists", n),
            UsernameTaken(u) => write!(fmt, "username {} already exists", u),
            InvalidToken(t) => write!(fmt, "{:?} must be a single non-empty word", t),
            InvalidAmount(a) => write!(fmt, "invalid amount: {}", a),
            InsufficientFunds { account, balance, requested } => write!(
                fmt,
                "insufficient balance in account {}: {} requested, {} available",
                account, requested, balance
            ),
            SelfTransfer(n) => write!(fmt, "account {} cannot send money to itself", n),
            AccessDenied(reason) => write!(fmt, "access denied: {}", reason),
            Snapshot(e) => write!(fmt, "snapshot encoding failed: {}", e),
            Io(e) => write!(fmt, "i/o error: {}", e),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}
