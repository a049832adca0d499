//! Ledgertree keeps bank accounts in a height-balanced (AVL) binary search
//! tree keyed by account number. The tree supports point lookup with in-place
//! balance updates, insertion and removal with automatic rebalancing, and
//! ascending traversal, which doubles as the persisted form of the index:
//! saving writes the traversal and loading re-inserts it.
//!
//! Around the index sit the pieces of a small text-menu banking program: an
//! account file, a credential file, an append-only transaction log, and a
//! session layer that ties them together. Each store is an explicit handle on
//! its own file; the index itself never touches storage.

pub mod account;
pub mod account_index;
pub mod avl_node;
pub mod bank;
pub mod config;
pub mod console;
pub mod credentials;
pub mod error;
pub mod ledger;
pub mod persist;
pub mod store;
