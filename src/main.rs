use std::io;
use clap::Parser;
use log::info;
use simple_logger::SimpleLogger;
use ledgertree::bank::Bank;
use ledgertree::config::Config;
use ledgertree::console::Console;
use ledgertree::credentials::CredentialStore;
use ledgertree::ledger::TransactionLog;
use ledgertree::store::AccountStore;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::parse();

    SimpleLogger::new().with_level(config.log_level).init()?;
    info!("{:?}", config);

    let bank = Bank::open(
        AccountStore::new(&config.accounts),
        CredentialStore::new(&config.credentials),
        TransactionLog::new(&config.transactions),
    )?;

    let stdin = io::stdin();
    let mut console = Console::new(bank, stdin.lock(), io::stdout());
    console.run()?;

    if let Some(snapshot) = &config.snapshot {
        AccountStore::export_snapshot(console.into_bank().index(), snapshot)?;
    }
    Ok(())
}
