use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind};
use std::path::{Path, PathBuf};
use log::info;
use crate::account::AccountRecord;
use crate::account_index::AccountIndex;
use crate::error::Error;
use crate::persist;




/**
 * Handle on the text file that holds the account index between sessions: one
 * `<number> <owner> <balance>` line per account, in ascending account number.
 */
#[derive(Clone, Debug)]
pub struct AccountStore {
    path: PathBuf,
}




// ============================================================================
impl AccountStore {

    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }




    /**
     * Rebuild an index from the account file. A missing file yields an empty
     * index; malformed lines are skipped.
     */
    pub fn load(&self) -> Result<AccountIndex, Error> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("no account file at {}; starting empty", self.path.display());
                return Ok(AccountIndex::new())
            }
            Err(e) => return Err(e.into()),
        };
        let records = persist::read_records::<_, AccountRecord>(BufReader::new(file))
            .collect::<Result<Vec<_>, _>>()?;
        let mut index = AccountIndex::new();
        let inserted = index.load_bulk(records);

        info!("loaded {} accounts from {}", inserted, self.path.display());
        Ok(index)
    }




    /**
     * Overwrite the account file with the index's ordered record sequence.
     */
    pub fn save(&self, index: &AccountIndex) -> Result<(), Error> {
        let file = File::create(&self.path)?;
        persist::write_records(BufWriter::new(file), index.save_ordered())?;
        info!("saved {} accounts to {}", index.len(), self.path.display());
        Ok(())
    }




    /**
     * Write a CBOR snapshot of the index to the given path.
     */
    pub fn export_snapshot<P: AsRef<Path>>(index: &AccountIndex, path: P) -> Result<(), Error> {
        let file = File::create(path.as_ref())?;
        persist::write_snapshot(BufWriter::new(file), index.save_ordered())?;
        info!("wrote snapshot of {} accounts to {}", index.len(), path.as_ref().display());
        Ok(())
    }




    /**
     * Rebuild an index from a CBOR snapshot written by `export_snapshot`.
     */
    pub fn import_snapshot<P: AsRef<Path>>(path: P) -> Result<AccountIndex, Error> {
        let file = File::open(path.as_ref())?;
        Ok(persist::read_snapshot(BufReader::new(file))?.into_iter().collect())
    }
}




// ============================================================================
#[cfg(test)]
mod test {

    use std::fs;
    use crate::account_index::AccountIndex;
    use crate::persist::scratch_path;
    use super::AccountStore;

    #[test]
    fn missing_file_loads_as_empty_index() {
        let store = AccountStore::new(scratch_path("store-missing"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn saved_file_is_ascending_and_reloads() {
        let store = AccountStore::new(scratch_path("store-roundtrip"));
        let mut index = AccountIndex::new();
        index.insert(30, "c", 3.0);
        index.insert(10, "a", 1.5);
        index.insert(20, "b", -2.0);
        store.save(&index).unwrap();

        let text = fs::read_to_string(store.path()).unwrap();
        assert_eq!(text, "10 a 1.5\n20 b -2\n30 c 3\n");

        let reloaded = store.load().unwrap();
        assert!(reloaded.iter().eq(index.iter()));
        fs::remove_file(store.path()).unwrap();
    }

    #[test]
    fn malformed_lines_do_not_abort_the_load() {
        let store = AccountStore::new(scratch_path("store-malformed"));
        fs::write(store.path(), "1 a 1\nnot a record at all\n2 b\n3 c 3\n1 dup 9\n").unwrap();

        let index = store.load().unwrap();
        assert_eq!(index.account_numbers().collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(index.get(1).unwrap().owner, "a");
        fs::remove_file(store.path()).unwrap();
    }

    #[test]
    fn non_finite_balances_are_skipped_on_load() {
        let store = AccountStore::new(scratch_path("store-non-finite"));
        fs::write(store.path(), "1 a NaN\n2 b inf\n3 c 1e400\n4 d 4\n").unwrap();

        let index = store.load().unwrap();
        assert_eq!(index.account_numbers().collect::<Vec<_>>(), vec![4]);
        fs::remove_file(store.path()).unwrap();
    }

    #[test]
    fn snapshot_reloads_to_the_same_traversal() {
        let path = scratch_path("store-snapshot");
        let index: AccountIndex = (0..100)
            .map(|n| crate::account::AccountRecord::new(n * 3, "s", n as f64))
            .collect();
        AccountStore::export_snapshot(&index, &path).unwrap();
        let reloaded = AccountStore::import_snapshot(&path).unwrap();
        assert!(reloaded.iter().eq(index.iter()));
        reloaded.validate();
        fs::remove_file(&path).unwrap();
    }
}
