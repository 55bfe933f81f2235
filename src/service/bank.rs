use std::sync::Arc;

use tracing::debug;

use super::{BankError, LedgerError};
use crate::model::{Bank, BankId, NewBank};
use crate::store::{Store, UnitOfWork};

/// Bank lookups and the per-bank transfer counter.
pub struct BankService<S> {
    store: Arc<S>,
}

impl<S: Store> BankService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn find_by_id(&self, id: BankId) -> Result<Bank, LedgerError> {
        self.store.transaction(|tx| load_bank(tx, id))
    }

    pub fn find_all(&self) -> Result<Vec<Bank>, LedgerError> {
        self.store
            .transaction(|tx| -> Result<_, LedgerError> { Ok(tx.find_all_banks()?) })
    }

    pub fn create(&self, bank: NewBank) -> Result<Bank, LedgerError> {
        self.store
            .transaction(|tx| -> Result<_, LedgerError> { Ok(tx.insert_bank(bank)?) })
    }

    /// Replace an existing bank. Fails if no bank has `bank.id()`.
    pub fn save(&self, bank: &Bank) -> Result<Bank, LedgerError> {
        self.store.transaction(|tx| -> Result<_, LedgerError> {
            load_bank(tx, bank.id())?;
            tx.save_bank(bank)?;
            Ok(bank.clone())
        })
    }

    /// Load, increment and persist the transfer counter in its own transaction.
    pub fn increment_transfer_count(&self, id: BankId) -> Result<Bank, LedgerError> {
        self.store
            .transaction(|tx| increment_transfer_count(tx, id))
    }
}

pub(super) fn load_bank(tx: &dyn UnitOfWork, id: BankId) -> Result<Bank, LedgerError> {
    tx.find_bank(id)?
        .ok_or_else(|| BankError::NotFound { id }.into())
}

/// Counter step shared with the transfer so both run in one transaction.
pub(super) fn increment_transfer_count(
    tx: &mut dyn UnitOfWork,
    id: BankId,
) -> Result<Bank, LedgerError> {
    let mut bank = load_bank(tx, id)?;
    bank.increment_transfer_count();
    tx.save_bank(&bank)?;

    debug!(bank = id, count = bank.transfer_count(), "transfer counted");
    Ok(bank)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    fn service() -> BankService<InMemoryStore> {
        BankService::new(Arc::new(InMemoryStore::new()))
    }

    fn bank(name: &str, transfer_count: u64) -> NewBank {
        NewBank {
            name: name.to_string(),
            transfer_count,
        }
    }

    #[test]
    fn create_then_find() {
        let banks = service();
        let created = banks.create(bank("Banco Uno", 0)).unwrap();
        assert_eq!(banks.find_by_id(created.id()).unwrap(), created);
    }

    #[test]
    fn find_missing_bank_fails() {
        let banks = service();
        assert_eq!(
            banks.find_by_id(99),
            Err(LedgerError::Bank(BankError::NotFound { id: 99 }))
        );
    }

    #[test]
    fn increment_transfer_count_persists() {
        let banks = service();
        let created = banks.create(bank("Banco Uno", 5)).unwrap();

        let updated = banks.increment_transfer_count(created.id()).unwrap();
        assert_eq!(updated.transfer_count(), 6);
        assert_eq!(
            banks.find_by_id(created.id()).unwrap().transfer_count(),
            6
        );
    }

    #[test]
    fn increment_missing_bank_fails() {
        let banks = service();
        assert_eq!(
            banks.increment_transfer_count(3),
            Err(LedgerError::Bank(BankError::NotFound { id: 3 }))
        );
    }

    #[test]
    fn save_replaces_existing_bank() {
        let banks = service();
        let mut created = banks.create(bank("Old", 1)).unwrap();
        created.rename("New".to_string());
        banks.save(&created).unwrap();

        assert_eq!(banks.find_by_id(created.id()).unwrap().name(), "New");
    }

    #[test]
    fn save_unknown_bank_fails() {
        let banks = service();
        let stray = Bank::new(7, bank("Stray", 0));
        assert_eq!(
            banks.save(&stray),
            Err(LedgerError::Bank(BankError::NotFound { id: 7 }))
        );
        assert!(banks.find_all().unwrap().is_empty());
    }

    #[test]
    fn find_all_lists_in_id_order() {
        let banks = service();
        banks.create(bank("A", 0)).unwrap();
        banks.create(bank("B", 0)).unwrap();

        let names: Vec<_> = banks
            .find_all()
            .unwrap()
            .iter()
            .map(|b| b.name().to_string())
            .collect();
        assert_eq!(names, vec!["A", "B"]);
    }
}
