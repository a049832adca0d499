use log::{error, info};
use crate::account::{Account, AccountNumber, AccountRecord};
use crate::account_index::AccountIndex;
use crate::avl_node;
use crate::credentials::{CredentialStore, Role};
use crate::error::Error;
use crate::ledger::{Transaction, TransactionLog};
use crate::persist;
use crate::store::AccountStore;




/**
 * A banking session: the in-memory account index together with the three
 * stores it is persisted through. Every operation that changes a balance or
 * the set of accounts rewrites the account file before returning. When that
 * write fails the change is undone in memory as well, so the index and the
 * file agree on which operations happened.
 */
pub struct Bank {
    index: AccountIndex,
    accounts: AccountStore,
    credentials: CredentialStore,
    ledger: TransactionLog,
}




// ============================================================================
impl Bank {




    /**
     * Open a session, rebuilding the index from the account store.
     */
    pub fn open(accounts: AccountStore, credentials: CredentialStore, ledger: TransactionLog) -> Result<Self, Error> {
        let index = accounts.load()?;
        Ok(Self { index, accounts, credentials, ledger })
    }

    pub fn index(&self) -> &AccountIndex {
        &self.index
    }

    /**
     * Every account in ascending account number.
     */
    pub fn accounts(&self) -> avl_node::Iter<'_, AccountNumber, Account> {
        self.index.iter()
    }

    pub fn save(&self) -> Result<(), Error> {
        self.accounts.save(&self.index)
    }

    /**
     * Persist the index. If that fails, `undo` is applied to the in-memory
     * index before the error is returned.
     */
    fn commit<F: FnOnce(&mut AccountIndex)>(&mut self, undo: F) -> Result<(), Error> {
        match self.save() {
            Ok(()) => Ok(()),
            Err(e) => {
                undo(&mut self.index);
                Err(e)
            }
        }
    }

    pub fn register(&self, username: &str, password: &str, role: Role) -> Result<(), Error> {
        self.credentials.register(username, password, role)
    }

    pub fn is_registered(&self, username: &str) -> Result<bool, Error> {
        self.credentials.is_registered(username)
    }

    pub fn login(&self, username: &str, password: &str) -> Result<Option<Role>, Error> {
        self.credentials.authenticate(username, password)
    }




    pub fn account(&self, account_number: AccountNumber) -> Result<&Account, Error> {
        self.index.get(account_number).ok_or(Error::AccountNotFound(account_number))
    }

    fn account_mut(&mut self, account_number: AccountNumber) -> Result<&mut Account, Error> {
        self.index.get_mut(account_number).ok_or(Error::AccountNotFound(account_number))
    }




    /**
     * Create an account. The owner name must be a single word so that the
     * account file stays parseable.
     */
    pub fn open_account(&mut self, account_number: AccountNumber, owner: &str, balance: f64) -> Result<(), Error> {
        if !persist::is_token(owner) {
            return Err(Error::InvalidToken(owner.to_string()))
        }
        if !balance.is_finite() {
            return Err(Error::InvalidAmount(balance))
        }
        if !self.index.insert(account_number, owner, balance) {
            return Err(Error::DuplicateAccount(account_number))
        }
        self.commit(|index| {
            index.remove(account_number);
        })?;
        info!("opened account {} for {}", account_number, owner);
        Ok(())
    }

    pub fn close_account(&mut self, account_number: AccountNumber) -> Result<AccountRecord, Error> {
        let record = self.index.remove(account_number).ok_or(Error::AccountNotFound(account_number))?;
        let restore = record.clone();
        self.commit(move |index| {
            index.load_bulk(std::iter::once(restore));
        })?;
        info!("closed account {}", account_number);
        Ok(record)
    }




    /**
     * Check that the account exists and is owned by the logged-in user.
     */
    pub fn authorize_owner(&self, username: &str, account_number: AccountNumber) -> Result<(), Error> {
        if self.account(account_number)?.owner == username {
            Ok(())
        } else {
            Err(Error::AccessDenied(format!("{} does not own account {}", username, account_number)))
        }
    }




    /**
     * Add a positive amount to the account and return the new balance.
     */
    pub fn deposit(&mut self, account_number: AccountNumber, amount: f64) -> Result<f64, Error> {
        validate_amount(amount)?;
        let account = self.account_mut(account_number)?;
        let previous = account.balance;
        account.balance += amount;
        let balance = account.balance;
        self.commit(|index| set_balance(index, account_number, previous))?;
        info!("deposit of {} into {}", amount, account_number);
        Ok(balance)
    }




    /**
     * Remove a positive amount, no larger than the balance, from the account
     * and return the new balance.
     */
    pub fn withdraw(&mut self, account_number: AccountNumber, amount: f64) -> Result<f64, Error> {
        validate_amount(amount)?;
        let account = self.account_mut(account_number)?;

        if amount > account.balance {
            return Err(Error::InsufficientFunds { account: account_number, balance: account.balance, requested: amount })
        }
        let previous = account.balance;
        account.balance -= amount;
        let balance = account.balance;
        self.commit(|index| set_balance(index, account_number, previous))?;
        info!("withdrawal of {} from {}", amount, account_number);
        Ok(balance)
    }




    /**
     * Check that money may be sent from one account to the other: the two
     * must differ and the receiver must exist.
     */
    pub fn check_transfer_target(&self, sender: AccountNumber, receiver: AccountNumber) -> Result<(), Error> {
        if sender == receiver {
            return Err(Error::SelfTransfer(sender))
        }
        self.account(receiver).map(|_| ())
    }




    /**
     * Move money between two accounts and record the transfer in the
     * transaction log. Nothing changes unless every check passes. If the log
     * cannot be appended to, the balances are put back and rewritten, so no
     * transfer is applied without being logged.
     */
    pub fn transfer(&mut self, sender: AccountNumber, receiver: AccountNumber, amount: f64) -> Result<Transaction, Error> {
        self.check_transfer_target(sender, receiver)?;
        validate_amount(amount)?;

        let from = self.account_mut(sender)?;

        if amount > from.balance {
            return Err(Error::InsufficientFunds { account: sender, balance: from.balance, requested: amount })
        }
        let sender_before = from.balance;
        from.balance -= amount;

        let to = self.account_mut(receiver)?;
        let receiver_before = to.balance;
        to.balance += amount;

        let restore = move |index: &mut AccountIndex| {
            set_balance(index, sender, sender_before);
            set_balance(index, receiver, receiver_before);
        };
        self.commit(restore)?;

        let transaction = Transaction { sender, receiver, amount };

        if let Err(e) = self.ledger.append(&transaction) {
            restore(&mut self.index);
            if let Err(save) = self.save() {
                error!("account file holds an unlogged transfer from {} to {}: {}", sender, receiver, save);
            }
            return Err(e)
        }
        info!("transfer of {} from {} to {}", amount, sender, receiver);
        Ok(transaction)
    }

    pub fn history(&self, account_number: AccountNumber) -> Result<Vec<Transaction>, Error> {
        self.ledger.history(account_number)
    }
}




fn set_balance(index: &mut AccountIndex, account_number: AccountNumber, balance: f64) {
    if let Some(account) = index.get_mut(account_number) {
        account.balance = balance
    }
}




fn validate_amount(amount: f64) -> Result<(), Error> {
    if amount.is_finite() && amount > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidAmount(amount))
    }
}




// ============================================================================
#[cfg(test)]
pub(crate) mod test {

    use std::fs;
    use std::path::PathBuf;
    use crate::credentials::{CredentialStore, Role};
    use crate::error::Error;
    use crate::ledger::{Transaction, TransactionLog};
    use crate::persist::scratch_path;
    use crate::store::AccountStore;
    use super::Bank;

    /**
     * A bank whose three files live in the temporary directory. The files
     * are removed when the fixture is dropped.
     */
    pub(crate) struct Fixture {
        pub bank: Bank,
        paths: Vec<PathBuf>,
    }

    impl Fixture {
        pub(crate) fn new(name: &str) -> Self {
            let paths = vec![
                scratch_path(&format!("{}-accounts", name)),
                scratch_path(&format!("{}-credentials", name)),
                scratch_path(&format!("{}-transactions", name)),
            ];
            let bank = Bank::open(
                AccountStore::new(&paths[0]),
                CredentialStore::new(&paths[1]),
                TransactionLog::new(&paths[2])).unwrap();
            Self { bank, paths }
        }

        pub(crate) fn reopen(&self) -> Bank {
            Bank::open(
                AccountStore::new(&self.paths[0]),
                CredentialStore::new(&self.paths[1]),
                TransactionLog::new(&self.paths[2])).unwrap()
        }

        pub(crate) fn accounts_text(&self) -> String {
            fs::read_to_string(&self.paths[0]).unwrap_or_default()
        }
    }

    impl Drop for Fixture {
        fn drop(&mut self) {
            for path in &self.paths {
                let _ = fs::remove_file(path);
            }
        }
    }

    fn two_accounts(name: &str) -> Fixture {
        let mut fixture = Fixture::new(name);
        fixture.bank.open_account(1, "ann", 100.0).unwrap();
        fixture.bank.open_account(2, "bob", 50.0).unwrap();
        fixture
    }

    #[test]
    fn accounts_are_listed_in_ascending_order() {
        let mut fixture = two_accounts("bank-list");
        fixture.bank.open_account(0, "cy", 5.0).unwrap();
        let listed: Vec<_> = fixture.bank.accounts().map(|(n, a)| (*n, a.owner.clone())).collect();
        assert_eq!(listed, vec![(0, "cy".to_string()), (1, "ann".to_string()), (2, "bob".to_string())]);
    }

    #[test]
    fn opened_accounts_are_persisted_in_order() {
        let mut fixture = Fixture::new("bank-open");
        fixture.bank.open_account(7, "g", 7.0).unwrap();
        fixture.bank.open_account(3, "c", 3.0).unwrap();
        assert_eq!(fixture.accounts_text(), "3 c 3\n7 g 7\n");
        assert!(fixture.reopen().index().iter().eq(fixture.bank.index().iter()));
    }

    #[test]
    fn duplicate_account_is_rejected_and_first_owner_kept() {
        let mut fixture = two_accounts("bank-dup");
        assert!(matches!(fixture.bank.open_account(1, "eve", 1.0), Err(Error::DuplicateAccount(1))));
        assert_eq!(fixture.bank.account(1).unwrap().owner, "ann");
    }

    #[test]
    fn owner_names_must_be_single_words() {
        let mut fixture = Fixture::new("bank-token");
        assert!(matches!(fixture.bank.open_account(1, "ann smith", 1.0), Err(Error::InvalidToken(_))));
        assert!(fixture.bank.index().is_empty());
    }

    #[test]
    fn closing_a_missing_account_is_not_found() {
        let mut fixture = two_accounts("bank-close");
        assert!(matches!(fixture.bank.close_account(9), Err(Error::AccountNotFound(9))));
        assert_eq!(fixture.bank.close_account(2).unwrap().owner, "bob");
        assert_eq!(fixture.accounts_text(), "1 ann 100\n");
    }

    #[test]
    fn deposit_and_withdraw_update_the_balance() {
        let mut fixture = two_accounts("bank-dw");
        assert_eq!(fixture.bank.deposit(1, 25.5).unwrap(), 125.5);
        assert_eq!(fixture.bank.withdraw(1, 100.0).unwrap(), 25.5);
        assert!(matches!(fixture.bank.withdraw(1, 30.0), Err(Error::InsufficientFunds { .. })));
        assert!(matches!(fixture.bank.deposit(1, -5.0), Err(Error::InvalidAmount(_))));
        assert!(matches!(fixture.bank.deposit(3, 5.0), Err(Error::AccountNotFound(3))));
        assert_eq!(fixture.reopen().account(1).unwrap().balance, 25.5);
    }

    #[test]
    fn transfer_moves_money_and_logs_it() {
        let mut fixture = two_accounts("bank-transfer");
        let transaction = fixture.bank.transfer(1, 2, 30.0).unwrap();
        assert_eq!(transaction, Transaction { sender: 1, receiver: 2, amount: 30.0 });
        assert_eq!(fixture.bank.account(1).unwrap().balance, 70.0);
        assert_eq!(fixture.bank.account(2).unwrap().balance, 80.0);
        assert_eq!(fixture.bank.history(2).unwrap(), vec![transaction]);
        assert_eq!(fixture.accounts_text(), "1 ann 70\n2 bob 80\n");
    }

    #[test]
    fn rejected_transfers_change_nothing() {
        let mut fixture = two_accounts("bank-reject");
        assert!(matches!(fixture.bank.transfer(1, 1, 5.0), Err(Error::SelfTransfer(1))));
        assert!(matches!(fixture.bank.transfer(1, 9, 5.0), Err(Error::AccountNotFound(9))));
        assert!(matches!(fixture.bank.transfer(1, 2, 0.0), Err(Error::InvalidAmount(_))));
        assert!(matches!(fixture.bank.transfer(2, 1, 50.01), Err(Error::InsufficientFunds { .. })));
        assert_eq!(fixture.bank.account(1).unwrap().balance, 100.0);
        assert_eq!(fixture.bank.account(2).unwrap().balance, 50.0);
        assert!(fixture.bank.history(1).unwrap().is_empty());
    }

    #[test]
    fn failed_save_leaves_memory_unchanged() {
        let mut fixture = two_accounts("bank-rollback");
        fs::remove_file(&fixture.paths[0]).unwrap();
        fs::create_dir(&fixture.paths[0]).unwrap();

        assert!(matches!(fixture.bank.deposit(1, 10.0), Err(Error::Io(_))));
        assert!(matches!(fixture.bank.withdraw(1, 10.0), Err(Error::Io(_))));
        assert!(matches!(fixture.bank.open_account(3, "cy", 1.0), Err(Error::Io(_))));
        assert!(matches!(fixture.bank.close_account(2), Err(Error::Io(_))));
        assert!(matches!(fixture.bank.transfer(1, 2, 5.0), Err(Error::Io(_))));
        fs::remove_dir(&fixture.paths[0]).unwrap();

        assert_eq!(fixture.bank.account(1).unwrap().balance, 100.0);
        assert_eq!(fixture.bank.account(2).unwrap().balance, 50.0);
        assert!(!fixture.bank.index().contains(3));
        assert!(fixture.bank.history(1).unwrap().is_empty());
        fixture.bank.index().validate();
    }

    #[test]
    fn failed_log_append_undoes_the_transfer() {
        let mut fixture = two_accounts("bank-unlogged");
        fs::create_dir(&fixture.paths[2]).unwrap();

        assert!(matches!(fixture.bank.transfer(1, 2, 30.0), Err(Error::Io(_))));
        fs::remove_dir(&fixture.paths[2]).unwrap();

        assert_eq!(fixture.bank.account(1).unwrap().balance, 100.0);
        assert_eq!(fixture.bank.account(2).unwrap().balance, 50.0);
        assert_eq!(fixture.accounts_text(), "1 ann 100\n2 bob 50\n");
    }

    #[test]
    fn only_the_owner_is_authorized() {
        let fixture = two_accounts("bank-auth");
        assert!(fixture.bank.authorize_owner("ann", 1).is_ok());
        assert!(matches!(fixture.bank.authorize_owner("bob", 1), Err(Error::AccessDenied(_))));
        assert!(matches!(fixture.bank.authorize_owner("ann", 5), Err(Error::AccountNotFound(5))));
    }

    #[test]
    fn register_then_login() {
        let fixture = Fixture::new("bank-login");
        fixture.bank.register("boss", "pw", Role::Manager).unwrap();
        assert_eq!(fixture.bank.login("boss", "pw").unwrap(), Some(Role::Manager));
        assert_eq!(fixture.bank.login("boss", "nope").unwrap(), None);
    }
}
