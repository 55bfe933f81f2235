//! Persistence contracts consumed by the services.
//!
//! Lookups return `Option`; turning "absent" into a domain error is the
//! caller's job. Writes only become visible when the enclosing
//! [`Store::transaction`] returns `Ok`.

use thiserror::Error;

use crate::model::{Account, AccountId, Bank, BankId, NewAccount, NewBank};

mod memory;
pub use memory::InMemoryStore;

/// Infrastructure failure, opaque to the domain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("store lock poisoned")]
    Poisoned,

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub trait AccountStore {
    fn find_account(&self, id: AccountId) -> Result<Option<Account>, StoreError>;

    fn find_account_by_number(&self, number: &str) -> Result<Option<Account>, StoreError>;

    /// All accounts ordered by id.
    fn find_all_accounts(&self) -> Result<Vec<Account>, StoreError>;

    /// Insert a new account, assigning its identity.
    fn insert_account(&mut self, account: NewAccount) -> Result<Account, StoreError>;

    /// Replace the account stored under `account.id()`.
    fn save_account(&mut self, account: &Account) -> Result<(), StoreError>;

    /// Remove an account, returning it if it existed.
    fn delete_account(&mut self, id: AccountId) -> Result<Option<Account>, StoreError>;
}

pub trait BankStore {
    fn find_bank(&self, id: BankId) -> Result<Option<Bank>, StoreError>;

    /// All banks ordered by id.
    fn find_all_banks(&self) -> Result<Vec<Bank>, StoreError>;

    fn insert_bank(&mut self, bank: NewBank) -> Result<Bank, StoreError>;

    fn save_bank(&mut self, bank: &Bank) -> Result<(), StoreError>;
}

/// A transactional view over both tables.
pub trait UnitOfWork: AccountStore + BankStore {}

impl<T: AccountStore + BankStore> UnitOfWork for T {}

/// A store able to run a closure inside one atomic transaction.
pub trait Store: Send + Sync {
    /// Run `f` against a unit of work. Staged writes are committed iff `f`
    /// returns `Ok`. Concurrent transactions are serialized with respect to
    /// each other.
    fn transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn UnitOfWork) -> Result<T, E>,
        E: From<StoreError>;
}
