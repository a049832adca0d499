use core::iter::FromIterator;
use log::debug;
use crate::account::{Account, AccountNumber, AccountRecord};
use crate::avl_node::{self, Node};

/**
 * An ordered index of accounts keyed by account number, kept height-balanced
 * after every insert and remove. Lookups, inserts and removals are
 * O(log n); traversal visits accounts in ascending account number.
 *
 * The index is storage-agnostic: `save_ordered` produces the ascending record
 * sequence and `load_bulk` consumes one, leaving file framing to the caller.
 */
#[derive(Clone, Default)]
pub struct AccountIndex {
    root: Option<Box<Node<AccountNumber, Account>>>,
}

// ============================================================================
impl AccountIndex {
    pub fn new() -> Self {
        Self { root: None }
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn len(&self) -> usize {
        self.root.as_ref().map_or(0, |root| root.len())
    }

    pub fn height(&self) -> usize {
        Node::height(&self.root)
    }

    pub fn contains(&self, account_number: AccountNumber) -> bool {
        self.root.as_ref().map_or(false, |root| root.contains(&account_number))
    }

    pub fn get(&self, account_number: AccountNumber) -> Option<&Account> {
        self.root.as_ref().and_then(|root| root.get(&account_number))
    }

    /**
     * Look up an account for in-place modification of its owner or balance.
     */
    pub fn get_mut(&mut self, account_number: AccountNumber) -> Option<&mut Account> {
        self.root.as_mut().and_then(|root| root.get_mut(&account_number))
    }

    /**
     * Insert a new account. Returns false, leaving the existing account
     * untouched, if the account number is already taken.
     */
    pub fn insert(&mut self, account_number: AccountNumber, owner: &str, balance: f64) -> bool {
        let account = Account { owner: owner.to_string(), balance };
        let inserted = Node::insert(&mut self.root, account_number, account);

        if !inserted {
            debug!("account {} already indexed; insert ignored", account_number);
        }
        inserted
    }

    /**
     * Remove an account, returning its record, or `None` if it was not
     * indexed.
     */
    pub fn remove(&mut self, account_number: AccountNumber) -> Option<AccountRecord> {
        Node::remove(&mut self.root, &account_number)
            .map(|(number, account)| AccountRecord::from_parts(number, account))
    }

    /**
     * Iterate in ascending account number without copying. Each call starts
     * a fresh traversal.
     */
    pub fn iter(&self) -> avl_node::Iter<'_, AccountNumber, Account> {
        avl_node::Iter::new(&self.root)
    }

    pub fn account_numbers(&self) -> impl Iterator<Item = AccountNumber> + '_ {
        self.iter().map(|(number, _)| *number)
    }

    /**
     * Owned copies of every record, in ascending account number.
     */
    pub fn records(&self) -> impl Iterator<Item = AccountRecord> + '_ {
        self.iter().map(|(number, account)| AccountRecord::from_parts(*number, account.clone()))
    }

    /**
     * The ascending record sequence to persist. Reloading it with
     * `load_bulk` reproduces the same traversal.
     */
    pub fn save_ordered(&self) -> impl Iterator<Item = AccountRecord> + '_ {
        self.records()
    }

    /**
     * Insert each record through the normal insert path. Records whose
     * account number is already present, including repeats within the input,
     * are skipped so the first occurrence wins. Returns the number of
     * records inserted.
     */
    pub fn load_bulk<I: IntoIterator<Item = AccountRecord>>(&mut self, records: I) -> usize {
        let mut inserted = 0;

        for record in records {
            let (number, account) = record.into_parts();

            if Node::insert(&mut self.root, number, account) {
                inserted += 1
            } else {
                debug!("bulk load: duplicate account {} skipped", number);
            }
        }
        inserted
    }

    pub fn into_sorted(self) -> impl Iterator<Item = AccountRecord> {
        self.into_iter()
    }

    #[cfg(test)]
    pub(crate) fn validate(&self) {
        if let Some(root) = &self.root {
            root.validate_order();
            root.validate_balance();
        }
    }
}

// ============================================================================
impl IntoIterator for AccountIndex {
    type Item = AccountRecord;
    type IntoIter = std::iter::Map<
        avl_node::IntoIter<AccountNumber, Account>,
        fn((AccountNumber, Account)) -> AccountRecord,
    >;

    fn into_iter(self) -> Self::IntoIter {
        let into_record: fn((AccountNumber, Account)) -> AccountRecord =
            |(number, account)| AccountRecord::from_parts(number, account);
        avl_node::IntoIter::new(self.root).map(into_record)
    }
}

// ============================================================================
impl<'a> IntoIterator for &'a AccountIndex {
    type Item = (&'a AccountNumber, &'a Account);
    type IntoIter = avl_node::Iter<'a, AccountNumber, Account>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// ============================================================================
impl FromIterator<AccountRecord> for AccountIndex {
    fn from_iter<I: IntoIterator<Item = AccountRecord>>(iter: I) -> Self {
        let mut index = Self::new();
        index.load_bulk(iter);
        index
    }
}

// ============================================================================
#[cfg(test)]
mod test {

    use crate::account::AccountRecord;
    use super::AccountIndex;

    fn stupid_random_numbers(len: usize, mut seed: u64) -> Vec<i64> {
        let mut values = Vec::new();
        for _ in 0..len {
            seed = (1103515245 * seed + 12345) % (1 << 31);
            values.push((seed % 10_000) as i64)
        }
        values
    }

    fn seven_accounts() -> AccountIndex {
        [20, 10, 30, 5, 15, 25, 35]
            .iter()
            .map(|n| AccountRecord::new(*n, &format!("owner{}", n), *n as f64))
            .collect()
    }

    #[test]
    fn search_for_a_missing_account_is_none() {
        let index = seven_accounts();
        assert!(index.get(11).is_none());
        assert!(!index.contains(11));
        assert!(AccountIndex::new().get(1).is_none());
    }

    #[test]
    fn balance_mutation_through_search_is_visible_later() {
        let mut index = seven_accounts();
        index.get_mut(15).unwrap().balance -= 40.0;
        assert_eq!(index.get(15).unwrap().balance, -25.0);
    }

    #[test]
    fn second_insert_of_a_key_is_ignored() {
        let mut index = seven_accounts();
        let before: Vec<_> = index.save_ordered().collect();
        assert!(!index.insert(10, "intruder", 1e6));
        assert_eq!(index.save_ordered().collect::<Vec<_>>(), before);
    }

    #[test]
    fn removing_the_root_promotes_its_successor() {
        let mut index = seven_accounts();
        let removed = index.remove(20).unwrap();
        assert_eq!(removed, AccountRecord::new(20, "owner20", 20.0));
        assert_eq!(index.get(25).unwrap().owner, "owner25");
        assert_eq!(index.account_numbers().collect::<Vec<_>>(), vec![5, 10, 15, 25, 30, 35]);
        index.validate();
    }

    #[test]
    fn removing_a_missing_account_changes_nothing() {
        let mut index = seven_accounts();
        let height = index.height();
        assert!(index.remove(99).is_none());
        assert_eq!(index.len(), 7);
        assert_eq!(index.height(), height);
    }

    #[test]
    fn random_inserts_and_removes_keep_traversal_strictly_ascending() {
        let mut index = AccountIndex::new();
        for n in stupid_random_numbers(2000, 31) {
            index.insert(n, "x", 0.0);
        }
        for n in stupid_random_numbers(1000, 77) {
            index.remove(n);
        }
        index.validate();
        let numbers: Vec<_> = index.account_numbers().collect();
        assert_eq!(numbers.len(), index.len());
        assert!(numbers.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn save_then_load_reproduces_the_traversal() {
        let mut index = AccountIndex::new();
        for n in stupid_random_numbers(500, 4) {
            index.insert(n, &format!("o{}", n), n as f64 / 4.0);
        }
        let reloaded: AccountIndex = index.save_ordered().collect();
        reloaded.validate();
        assert!(reloaded.iter().eq(index.iter()));
        assert_eq!(reloaded.len(), index.len());
    }

    #[test]
    fn records_are_owned_copies_in_ascending_order() {
        let mut index = seven_accounts();
        let records: Vec<_> = index.records().collect();
        index.get_mut(5).unwrap().balance = 99.0;

        assert_eq!(records.len(), 7);
        assert_eq!(records[0], AccountRecord::new(5, "owner5", 5.0));
        assert_eq!(records[6], AccountRecord::new(35, "owner35", 35.0));
        assert!(records.windows(2).all(|w| w[0].account_number < w[1].account_number));
        assert_eq!(index.records().next(), Some(AccountRecord::new(5, "owner5", 99.0)));
    }

    #[test]
    fn bulk_load_keeps_the_first_duplicate() {
        let mut index = AccountIndex::new();
        let inserted = index.load_bulk(vec![
            AccountRecord::new(1, "first", 1.0),
            AccountRecord::new(2, "other", 2.0),
            AccountRecord::new(1, "second", 3.0),
        ]);
        assert_eq!(inserted, 2);
        assert_eq!(index.get(1).unwrap().owner, "first");
    }

    #[test]
    fn traversal_is_restartable() {
        let index = seven_accounts();
        let first: Vec<_> = index.iter().take(3).map(|(n, _)| *n).collect();
        let again: Vec<_> = (&index).into_iter().map(|(n, _)| *n).collect();
        assert_eq!(first, vec![5, 10, 15]);
        assert_eq!(again, vec![5, 10, 15, 20, 25, 30, 35]);
    }

    #[test]
    fn consuming_traversal_yields_records_in_order() {
        let records: Vec<_> = seven_accounts().into_sorted().collect();
        assert_eq!(records.first(), Some(&AccountRecord::new(5, "owner5", 5.0)));
        assert_eq!(records.last(), Some(&AccountRecord::new(35, "owner35", 35.0)));
        assert_eq!(records.len(), 7);
    }
}
