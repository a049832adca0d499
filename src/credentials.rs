use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use log::info;
use serde::{Deserialize, Serialize};
use crate::error::Error;
use crate::persist;




/**
 * The two kinds of login. Managers administer accounts; users operate on the
 * account they own.
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Manager,
    User,
}

impl fmt::Display for Role {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Manager => write!(fmt, "manager"),
            Role::User => write!(fmt, "user"),
        }
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manager" => Ok(Role::Manager),
            "user" => Ok(Role::User),
            _ => Err(Error::MalformedRecord { line: 0, content: s.to_string() }),
        }
    }
}




/**
 * One `<username> <password> <role>` line of the credential file. Passwords
 * are stored as given.
 */
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    pub username: String,
    pub password: String,
    pub role: Role,
}

impl fmt::Display for Credential {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "{} {} {}", self.username, self.password, self.role)
    }
}

impl FromStr for Credential {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let malformed = || Error::MalformedRecord { line: 0, content: line.to_string() };

        match line.split_whitespace().collect::<Vec<_>>().as_slice() {
            [username, password, role] => Ok(Self {
                username: username.to_string(),
                password: password.to_string(),
                role: role.parse().map_err(|_| malformed())?,
            }),
            _ => Err(malformed()),
        }
    }
}




/**
 * Handle on the append-only credential file.
 */
#[derive(Clone, Debug)]
pub struct CredentialStore {
    path: PathBuf,
}




// ============================================================================
impl CredentialStore {

    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }




    /**
     * Read every credential in file order. A missing file holds no
     * credentials.
     */
    pub fn credentials(&self) -> Result<Vec<Credential>, Error> {
        match File::open(&self.path) {
            Ok(file) => persist::read_records(BufReader::new(file)).collect(),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }




    /**
     * Return true if any credential, of either role, uses this username.
     */
    pub fn is_registered(&self, username: &str) -> Result<bool, Error> {
        Ok(self.credentials()?.iter().any(|c| c.username == username))
    }




    /**
     * Append a new credential. Usernames are matched exactly and must be
     * unique across both roles.
     */
    pub fn register(&self, username: &str, password: &str, role: Role) -> Result<(), Error> {
        for token in &[username, password] {
            if !persist::is_token(token) {
                return Err(Error::InvalidToken(token.to_string()))
            }
        }
        if self.is_registered(username)? {
            return Err(Error::UsernameTaken(username.to_string()))
        }
        let credential = Credential {
            username: username.to_string(),
            password: password.to_string(),
            role,
        };
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        writeln!(file, "{}", credential)?;

        info!("registered {} as {}", username, role);
        Ok(())
    }




    /**
     * Return the role of the first credential matching both username and
     * password, or `None` if there is no such credential.
     */
    pub fn authenticate(&self, username: &str, password: &str) -> Result<Option<Role>, Error> {
        Ok(self
            .credentials()?
            .into_iter()
            .find(|c| c.username == username && c.password == password)
            .map(|c| c.role))
    }
}




// ============================================================================
#[cfg(test)]
mod test {

    use std::fs;
    use crate::error::Error;
    use crate::persist::scratch_path;
    use super::{CredentialStore, Role};

    #[test]
    fn registered_user_can_log_in_with_their_role() {
        let path = scratch_path("credentials-login");
        let store = CredentialStore::new(&path);
        store.register("mgr", "pw1", Role::Manager).unwrap();
        store.register("ann", "pw2", Role::User).unwrap();

        assert_eq!(store.authenticate("mgr", "pw1").unwrap(), Some(Role::Manager));
        assert_eq!(store.authenticate("ann", "pw2").unwrap(), Some(Role::User));
        assert_eq!(fs::read_to_string(&path).unwrap(), "mgr pw1 manager\nann pw2 user\n");
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn login_is_exact_and_case_sensitive() {
        let path = scratch_path("credentials-exact");
        let store = CredentialStore::new(&path);
        store.register("ann", "secret", Role::User).unwrap();

        assert_eq!(store.authenticate("Ann", "secret").unwrap(), None);
        assert_eq!(store.authenticate("ann", "secre").unwrap(), None);
        assert_eq!(store.authenticate("ann", "secrets").unwrap(), None);
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn duplicate_username_is_rejected_across_roles() {
        let path = scratch_path("credentials-dup");
        let store = CredentialStore::new(&path);
        store.register("ann", "a", Role::User).unwrap();

        match store.register("ann", "b", Role::Manager) {
            Err(Error::UsernameTaken(name)) => assert_eq!(name, "ann"),
            other => panic!("expected UsernameTaken, got {:?}", other),
        }
        assert_eq!(store.credentials().unwrap().len(), 1);
        assert!(store.is_registered("ann").unwrap());
        assert!(!store.is_registered("Ann").unwrap());
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn usernames_with_spaces_are_rejected() {
        let store = CredentialStore::new(scratch_path("credentials-token"));
        assert!(matches!(store.register("a b", "pw", Role::User), Err(Error::InvalidToken(_))));
        assert!(matches!(store.register("ab", "", Role::User), Err(Error::InvalidToken(_))));
    }

    #[test]
    fn missing_file_authenticates_nobody() {
        let store = CredentialStore::new(scratch_path("credentials-missing"));
        assert_eq!(store.authenticate("x", "y").unwrap(), None);
    }
}
