use std::path::PathBuf;
use clap::Parser;
use log::LevelFilter;




/**
 * Command-line configuration of a banking session. Every file the session
 * touches is named here rather than assumed.
 */
#[derive(Debug, Parser)]
#[clap(version = "0.1", about = "Account index with a text-menu banking session")]
pub struct Config {
    /// Account file, one `<number> <owner> <balance>` line per account
    #[clap(short = 'a', long, default_value = "accounts.txt")]
    pub accounts: PathBuf,

    /// Credential file, one `<username> <password> <role>` line per login
    #[clap(short = 'c', long, default_value = "credentials.txt")]
    pub credentials: PathBuf,

    /// Append-only transaction log
    #[clap(short = 't', long, default_value = "transactions.txt")]
    pub transactions: PathBuf,

    /// Also write a CBOR snapshot of the accounts here on exit
    #[clap(short = 's', long)]
    pub snapshot: Option<PathBuf>,

    /// Log level: off, error, warn, info, debug or trace
    #[clap(short = 'l', long, default_value = "warn")]
    pub log_level: LevelFilter,
}
