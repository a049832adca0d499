use std::collections::VecDeque;
use std::io::{BufRead, Write};
use std::str::FromStr;
use log::{info, warn};
use crate::account::AccountNumber;
use crate::bank::Bank;
use crate::credentials::Role;
use crate::error::Error;




/**
 * Whether a menu loop should keep reading input. Running out of input ends
 * every menu as if the user had chosen to leave.
 */
#[derive(Clone, Copy, PartialEq)]
enum Flow {
    Continue,
    Quit,
}




/**
 * Text front end for a `Bank`. Input is consumed one whitespace-separated
 * token at a time, so answers may be given on one line or spread over
 * several. Rejected operations are reported to the user and the menu carries
 * on; only I/O failures end the session with an error.
 */
pub struct Console<R, W> {
    bank: Bank,
    input: R,
    output: W,
    pending: VecDeque<String>,
}




// ============================================================================
impl<R: BufRead, W: Write> Console<R, W> {

    pub fn new(bank: Bank, input: R, output: W) -> Self {
        Self { bank, input, output, pending: VecDeque::new() }
    }

    pub fn into_bank(self) -> Bank {
        self.bank
    }




    /**
     * Run the main menu until the user exits or input runs out. The account
     * file is saved on the way out.
     */
    pub fn run(&mut self) -> Result<(), Error> {
        loop {
            write!(self.output, "\n=== Welcome to Bank Account Manager ===\n\
                1. Login as Manager\n2. Login as User\n3. Register as Manager\n4. Register as User\n0. Exit\nChoose: ")?;

            let flow = match self.token()?.as_deref() {
                Some("1") => self.login(Role::Manager)?,
                Some("2") => self.login(Role::User)?,
                Some("3") => self.register(Role::Manager)?,
                Some("4") => self.register(Role::User)?,
                Some("0") | None => Flow::Quit,
                Some(_) => {
                    writeln!(self.output, "Invalid option.")?;
                    Flow::Continue
                }
            };
            if flow == Flow::Quit {
                break
            }
        }
        self.bank.save()?;
        writeln!(self.output, "Goodbye!")?;
        Ok(())
    }




    /**
     * A taken username is refused before the password is asked for, so no
     * password token is consumed in that case.
     */
    fn register(&mut self, role: Role) -> Result<Flow, Error> {
        let username = match self.prompt("Enter username: ")? {
            Some(username) => username,
            None => return Ok(Flow::Quit),
        };
        if self.bank.is_registered(&username)? {
            writeln!(self.output, "Username already exists!")?;
            return Ok(Flow::Continue)
        }
        let password = match self.prompt("Enter password: ")? {
            Some(password) => password,
            None => return Ok(Flow::Quit),
        };
        let registered = self.bank.register(&username, &password, role);

        if self.report(registered)?.is_some() {
            writeln!(self.output, "Registered successfully as {}!", role)?;
        }
        Ok(Flow::Continue)
    }




    fn login(&mut self, role: Role) -> Result<Flow, Error> {
        let username = match self.prompt("Username: ")? {
            Some(username) => username,
            None => return Ok(Flow::Quit),
        };
        let password = match self.prompt("Password: ")? {
            Some(password) => password,
            None => return Ok(Flow::Quit),
        };
        match self.bank.login(&username, &password)? {
            Some(found) if found == role => {
                info!("{} logged in as {}", username, role);
                match role {
                    Role::Manager => self.manager_menu(),
                    Role::User => self.user_menu(&username),
                }
            }
            Some(_) => {
                writeln!(self.output, "Access denied: Incorrect role.")?;
                Ok(Flow::Continue)
            }
            None => {
                warn!("failed login for {}", username);
                writeln!(self.output, "Login failed.")?;
                Ok(Flow::Continue)
            }
        }
    }




    fn manager_menu(&mut self) -> Result<Flow, Error> {
        loop {
            write!(self.output, "\n=== Manager Menu ===\n\
                1. Add User Account\n2. Delete User Account\n3. Search User Account\n4. View All Users\n0. Logout\nChoose: ")?;

            match self.token()?.as_deref() {
                Some("1") => {
                    let account_number = match self.prompt_parse::<AccountNumber>("Enter new account number: ")? {
                        Some(n) => n,
                        None => return Ok(Flow::Quit),
                    };
                    if self.bank.index().contains(account_number) {
                        writeln!(self.output, "Account already exists!")?;
                        continue
                    }
                    let owner = match self.prompt("Enter username: ")? {
                        Some(owner) => owner,
                        None => return Ok(Flow::Quit),
                    };
                    let balance = match self.prompt_parse::<f64>("Enter initial balance: ")? {
                        Some(balance) => balance,
                        None => return Ok(Flow::Quit),
                    };
                    let opened = self.bank.open_account(account_number, &owner, balance);

                    if self.report(opened)?.is_some() {
                        writeln!(self.output, "User account created.")?;
                    }
                }
                Some("2") => {
                    let account_number = match self.prompt_parse::<AccountNumber>("Enter account number to delete: ")? {
                        Some(n) => n,
                        None => return Ok(Flow::Quit),
                    };
                    let closed = self.bank.close_account(account_number);

                    if self.report(closed)?.is_some() {
                        writeln!(self.output, "Account deleted.")?;
                    }
                }
                Some("3") => {
                    let account_number = match self.prompt_parse::<AccountNumber>("Enter account number to search: ")? {
                        Some(n) => n,
                        None => return Ok(Flow::Quit),
                    };
                    let found = self.bank.account(account_number).map(|a| (a.owner.clone(), a.balance));

                    if let Some((owner, balance)) = self.report(found)? {
                        writeln!(self.output, "Found: {} | Balance: ${}", owner, balance)?;
                    }
                }
                Some("4") => {
                    for (number, account) in self.bank.accounts() {
                        writeln!(self.output, "Account No: {}, Username: {}, Balance: ${}", number, account.owner, account.balance)?;
                    }
                }
                Some("0") => return Ok(Flow::Continue),
                None => return Ok(Flow::Quit),
                Some(_) => writeln!(self.output, "Invalid option.")?,
            }
        }
    }




    fn user_menu(&mut self, username: &str) -> Result<Flow, Error> {
        let account_number = match self.prompt_parse::<AccountNumber>("Enter your account number: ")? {
            Some(n) => n,
            None => return Ok(Flow::Quit),
        };
        let authorized = self.bank.authorize_owner(username, account_number);

        if self.report(authorized)?.is_none() {
            return Ok(Flow::Continue)
        }

        loop {
            write!(self.output, "\n=== User Menu ===\n\
                1. Deposit\n2. Withdraw\n3. View Balance\n4. Send Money\n5. View Transaction History\n0. Logout\nChoose: ")?;

            match self.token()?.as_deref() {
                Some("1") => {
                    let amount = match self.prompt_parse::<f64>("Amount to deposit: ")? {
                        Some(amount) => amount,
                        None => return Ok(Flow::Quit),
                    };
                    let deposited = self.bank.deposit(account_number, amount);

                    if let Some(balance) = self.report(deposited)? {
                        writeln!(self.output, "Deposit successful. Balance: ${}", balance)?;
                    }
                }
                Some("2") => {
                    let amount = match self.prompt_parse::<f64>("Amount to withdraw: ")? {
                        Some(amount) => amount,
                        None => return Ok(Flow::Quit),
                    };
                    let withdrawn = self.bank.withdraw(account_number, amount);

                    if let Some(balance) = self.report(withdrawn)? {
                        writeln!(self.output, "Withdrawal successful. Balance: ${}", balance)?;
                    }
                }
                Some("3") => {
                    let balance = self.bank.account(account_number).map(|a| a.balance);

                    if let Some(balance) = self.report(balance)? {
                        writeln!(self.output, "Current Balance: ${}", balance)?;
                    }
                }
                Some("4") => {
                    let receiver = match self.prompt_parse::<AccountNumber>("Enter receiver's account number: ")? {
                        Some(n) => n,
                        None => return Ok(Flow::Quit),
                    };
                    let target = self.bank.check_transfer_target(account_number, receiver);

                    if self.report(target)?.is_none() {
                        continue
                    }
                    let amount = match self.prompt_parse::<f64>("Enter amount to send: ")? {
                        Some(amount) => amount,
                        None => return Ok(Flow::Quit),
                    };
                    let sent = self.bank.transfer(account_number, receiver, amount);

                    if let Some(t) = self.report(sent)? {
                        let to = self.bank.account(t.receiver).map_or(String::new(), |a| a.owner.clone());
                        writeln!(self.output, "Transaction successful. ${} sent to {} (Acc#: {}).", t.amount, to, t.receiver)?;
                    }
                }
                Some("5") => {
                    let history = self.bank.history(account_number)?;

                    writeln!(self.output, "\n--- Transaction History ---")?;
                    if history.is_empty() {
                        writeln!(self.output, "No transactions found for this account.")?;
                    }
                    for t in history {
                        writeln!(self.output, "From: {} To: {} | Amount: ${}", t.sender, t.receiver, t.amount)?;
                    }
                }
                Some("0") => return Ok(Flow::Continue),
                None => return Ok(Flow::Quit),
                Some(_) => writeln!(self.output, "Invalid option.")?,
            }
        }
    }




    /**
     * Turn a rejected operation into a message for the user. I/O failures are
     * passed through to end the session.
     */
    fn report<T>(&mut self, result: Result<T, Error>) -> Result<Option<T>, Error> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(Error::Io(e)) => Err(Error::Io(e)),
            Err(e) => {
                writeln!(self.output, "{}.", capitalize(&e.to_string()))?;
                Ok(None)
            }
        }
    }




    /**
     * Return the next whitespace-separated input token, or `None` at end of
     * input.
     */
    fn token(&mut self) -> Result<Option<String>, Error> {
        while self.pending.is_empty() {
            self.output.flush()?;

            let mut line = String::new();

            if self.input.read_line(&mut line)? == 0 {
                return Ok(None)
            }
            self.pending.extend(line.split_whitespace().map(str::to_string));
        }
        Ok(self.pending.pop_front())
    }

    fn prompt(&mut self, message: &str) -> Result<Option<String>, Error> {
        write!(self.output, "{}", message)?;
        self.token()
    }




    /**
     * Prompt until the answer parses, or input runs out.
     */
    fn prompt_parse<T: FromStr>(&mut self, message: &str) -> Result<Option<T>, Error> {
        loop {
            match self.prompt(message)? {
                Some(answer) => match answer.parse() {
                    Ok(value) => return Ok(Some(value)),
                    Err(_) => writeln!(self.output, "Invalid input {:?}.", answer)?,
                },
                None => return Ok(None),
            }
        }
    }
}




fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
