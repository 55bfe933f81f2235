use std::collections::HashMap;
use std::sync::Mutex;

use tracing::debug;

use super::{AccountStore, BankStore, Store, StoreError, UnitOfWork};
use crate::model::{Account, AccountId, Bank, BankId, NewAccount, NewBank};

/// Committed state.
#[derive(Debug, Default)]
struct Tables {
    accounts: HashMap<AccountId, Account>,
    /// Unique index on account number
    account_numbers: HashMap<String, AccountId>,
    banks: HashMap<BankId, Bank>,
    last_account_id: AccountId,
    last_bank_id: BankId,
}

/// Writes staged by one transaction. `None` marks a deleted account.
struct Journal {
    accounts: HashMap<AccountId, Option<Account>>,
    banks: HashMap<BankId, Bank>,
    last_account_id: AccountId,
    last_bank_id: BankId,
}

impl Tables {
    fn apply(&mut self, journal: Journal) {
        // Drop stale index entries first so a number moved between two
        // accounts in the same transaction is indexed correctly.
        for id in journal.accounts.keys() {
            if let Some(old) = self.accounts.remove(id) {
                self.account_numbers.remove(old.account_number());
            }
        }
        for (id, staged) in journal.accounts {
            if let Some(account) = staged {
                self.account_numbers
                    .insert(account.account_number().to_string(), id);
                self.accounts.insert(id, account);
            }
        }
        self.banks.extend(journal.banks);
        self.last_account_id = journal.last_account_id;
        self.last_bank_id = journal.last_bank_id;
    }
}

/// In-memory [`Store`] with serializable transactions.
///
/// A transaction holds the table lock from start to commit, so two transfers
/// touching the same account can never interleave.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for InMemoryStore {
    fn transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn UnitOfWork) -> Result<T, E>,
        E: From<StoreError>,
    {
        let mut tables = self.tables.lock().map_err(|_| StoreError::Poisoned)?;

        let mut tx = MemoryTx::new(&tables);
        let value = f(&mut tx)?;
        let journal = tx.into_journal();

        debug!(
            accounts = journal.accounts.len(),
            banks = journal.banks.len(),
            "transaction committed"
        );
        tables.apply(journal);

        Ok(value)
    }
}

/// Read-your-writes view over committed tables plus a private journal.
struct MemoryTx<'a> {
    tables: &'a Tables,
    accounts: HashMap<AccountId, Option<Account>>,
    banks: HashMap<BankId, Bank>,
    last_account_id: AccountId,
    last_bank_id: BankId,
}

impl<'a> MemoryTx<'a> {
    fn new(tables: &'a Tables) -> Self {
        Self {
            tables,
            accounts: HashMap::new(),
            banks: HashMap::new(),
            last_account_id: tables.last_account_id,
            last_bank_id: tables.last_bank_id,
        }
    }

    fn into_journal(self) -> Journal {
        Journal {
            accounts: self.accounts,
            banks: self.banks,
            last_account_id: self.last_account_id,
            last_bank_id: self.last_bank_id,
        }
    }
}

impl AccountStore for MemoryTx<'_> {
    fn find_account(&self, id: AccountId) -> Result<Option<Account>, StoreError> {
        Ok(match self.accounts.get(&id) {
            Some(staged) => staged.clone(),
            None => self.tables.accounts.get(&id).cloned(),
        })
    }

    fn find_account_by_number(&self, number: &str) -> Result<Option<Account>, StoreError> {
        if let Some(staged) = self
            .accounts
            .values()
            .flatten()
            .find(|account| account.account_number() == number)
        {
            return Ok(Some(staged.clone()));
        }

        // A committed match that was staged in this transaction has either
        // been renumbered or deleted.
        Ok(self
            .tables
            .account_numbers
            .get(number)
            .filter(|id| !self.accounts.contains_key(*id))
            .and_then(|id| self.tables.accounts.get(id))
            .cloned())
    }

    fn find_all_accounts(&self) -> Result<Vec<Account>, StoreError> {
        let committed = self
            .tables
            .accounts
            .values()
            .filter(|account| !self.accounts.contains_key(&account.id()));
        let mut all: Vec<Account> = committed
            .chain(self.accounts.values().flatten())
            .cloned()
            .collect();
        all.sort_by_key(Account::id);
        Ok(all)
    }

    fn insert_account(&mut self, account: NewAccount) -> Result<Account, StoreError> {
        self.last_account_id += 1;
        let account = Account::new(self.last_account_id, account);
        self.accounts.insert(account.id(), Some(account.clone()));
        Ok(account)
    }

    fn save_account(&mut self, account: &Account) -> Result<(), StoreError> {
        self.accounts.insert(account.id(), Some(account.clone()));
        Ok(())
    }

    fn delete_account(&mut self, id: AccountId) -> Result<Option<Account>, StoreError> {
        let existing = self.find_account(id)?;
        if existing.is_some() {
            self.accounts.insert(id, None);
        }
        Ok(existing)
    }
}

impl BankStore for MemoryTx<'_> {
    fn find_bank(&self, id: BankId) -> Result<Option<Bank>, StoreError> {
        Ok(self
            .banks
            .get(&id)
            .or_else(|| self.tables.banks.get(&id))
            .cloned())
    }

    fn find_all_banks(&self) -> Result<Vec<Bank>, StoreError> {
        let committed = self
            .tables
            .banks
            .values()
            .filter(|bank| !self.banks.contains_key(&bank.id()));
        let mut all: Vec<Bank> = committed.chain(self.banks.values()).cloned().collect();
        all.sort_by_key(Bank::id);
        Ok(all)
    }

    fn insert_bank(&mut self, bank: NewBank) -> Result<Bank, StoreError> {
        self.last_bank_id += 1;
        let bank = Bank::new(self.last_bank_id, bank);
        self.banks.insert(bank.id(), bank.clone());
        Ok(bank)
    }

    fn save_bank(&mut self, bank: &Bank) -> Result<(), StoreError> {
        self.banks.insert(bank.id(), bank.clone());
        Ok(())
    }
}
