//! Account lookups, account lifecycle and the transfer itself.

use std::sync::Arc;

use tokio_stream::{Stream, StreamExt};
use tracing::{info, warn};

use super::bank::{self, BankService};
use super::{AccountError, LedgerError, RequestError};
use crate::Amount;
use crate::model::{
    Account, AccountId, BankId, NewAccount, Transfer, TransferReceipt, TransferRequest,
};
use crate::store::{Store, UnitOfWork};

/// Outcome counts of [`AccountService::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub completed: usize,
    /// Business rejections: invalid request, unknown account or bank, balance limits.
    pub rejected: usize,
    /// Store failures.
    pub failed: usize,
}

/// Orchestrates transfers between accounts.
///
/// Every transfer runs in a single store transaction covering both account
/// writes and the bank counter, so a transfer either lands completely or
/// leaves no trace.
pub struct AccountService<S> {
    store: Arc<S>,
    banks: BankService<S>,
}

/// Public API
impl<S: Store> AccountService<S> {
    pub fn new(store: Arc<S>) -> Self {
        let banks = BankService::new(Arc::clone(&store));
        Self { store, banks }
    }

    pub fn banks(&self) -> &BankService<S> {
        &self.banks
    }

    /// Move `amount` from `source` to `target`, counting the transfer on `bank_id`.
    pub fn transfer(
        &self,
        source: AccountId,
        target: AccountId,
        amount: Amount,
        bank_id: BankId,
    ) -> Result<TransferReceipt, LedgerError> {
        self.submit(&TransferRequest::new(source, target, bank_id, amount))
    }

    /// Validate and apply a transfer request as received from a driver.
    pub fn submit(&self, request: &TransferRequest) -> Result<TransferReceipt, LedgerError> {
        let result = request
            .validate()
            .map_err(LedgerError::from)
            .and_then(|transfer| self.execute(transfer));
        Self::log_result(request, &result);
        result
    }

    /// Apply every request of the stream; failures are logged and skipped.
    pub async fn run(&self, mut stream: impl Stream<Item = TransferRequest> + Unpin) -> RunSummary {
        let mut summary = RunSummary::default();
        while let Some(request) = stream.next().await {
            match self.submit(&request) {
                Ok(_) => summary.completed += 1,
                Err(e) if e.is_rejection() => summary.rejected += 1,
                Err(_) => summary.failed += 1,
            }
        }
        summary
    }

    pub fn find_by_id(&self, id: AccountId) -> Result<Account, LedgerError> {
        self.store.transaction(|tx| load_account(tx, id))
    }

    pub fn find_by_account_number(&self, number: &str) -> Result<Account, LedgerError> {
        self.store.transaction(|tx| -> Result<_, LedgerError> {
            tx.find_account_by_number(number)?.ok_or_else(|| {
                AccountError::NotFoundByNumber {
                    number: number.to_string(),
                }
                .into()
            })
        })
    }

    pub fn find_all(&self) -> Result<Vec<Account>, LedgerError> {
        self.store
            .transaction(|tx| -> Result<_, LedgerError> { Ok(tx.find_all_accounts()?) })
    }

    pub fn get_balance(&self, id: AccountId) -> Result<Amount, LedgerError> {
        self.find_by_id(id).map(|account| account.balance())
    }

    /// Transfers counted so far on `bank_id`.
    pub fn transfer_count(&self, bank_id: BankId) -> Result<u64, LedgerError> {
        self.banks.find_by_id(bank_id).map(|bank| bank.transfer_count())
    }

    /// Create an account with a store-assigned identity.
    pub fn create(&self, account: NewAccount) -> Result<Account, LedgerError> {
        if let Some(balance) = account.balance {
            check_balance(balance)?;
        }

        let created = self.store.transaction(|tx| -> Result<_, LedgerError> {
            ensure_number_free(tx, &account.account_number, None)?;
            Ok(tx.insert_account(account)?)
        })?;

        info!(
            id = created.id(),
            number = created.account_number(),
            balance = %created.balance(),
            "account created"
        );
        Ok(created)
    }

    /// Replace an existing account. Fails if no account has `account.id()`.
    pub fn update(&self, account: &Account) -> Result<Account, LedgerError> {
        check_balance(account.balance())?;

        self.store.transaction(|tx| -> Result<_, LedgerError> {
            load_account(tx, account.id())?;
            ensure_number_free(tx, account.account_number(), Some(account.id()))?;
            tx.save_account(account)?;
            Ok(account.clone())
        })
    }

    pub fn delete(&self, id: AccountId) -> Result<Account, LedgerError> {
        let deleted = self.store.transaction(|tx| -> Result<_, LedgerError> {
            tx.delete_account(id)?
                .ok_or_else(|| AccountError::NotFound { id }.into())
        })?;

        info!(id, number = deleted.account_number(), "account deleted");
        Ok(deleted)
    }
}

/// Private API
impl<S: Store> AccountService<S> {
    /// The transfer proper. Both balance changes are checked before the first
    /// write, and the whole sequence commits or rolls back as one.
    fn execute(&self, transfer: Transfer) -> Result<TransferReceipt, LedgerError> {
        self.store.transaction(|tx| -> Result<_, LedgerError> {
            let mut source = load_account(tx, transfer.source_account_id)?;
            let mut target = load_account(tx, transfer.target_account_id)?;

            source.withdraw(transfer.amount)?;
            target.deposit(transfer.amount)?;

            tx.save_account(&source)?;
            tx.save_account(&target)?;

            let bank = bank::increment_transfer_count(tx, transfer.bank_id)?;

            Ok(TransferReceipt {
                source,
                target,
                bank,
            })
        })
    }

    /// Applied transfers and rejections log at `info`, store failures at `warn`.
    fn log_result(request: &TransferRequest, result: &Result<TransferReceipt, LedgerError>) {
        match result {
            Ok(receipt) => {
                info!(
                    transfer = %request,
                    source_balance = %receipt.source.balance(),
                    target_balance = %receipt.target.balance(),
                    bank_transfers = receipt.bank.transfer_count(),
                    "transfer applied"
                );
            }
            Err(e) if e.is_rejection() => {
                info!(transfer = %request, reason = %e, "transfer rejected");
            }
            Err(e) => {
                warn!(transfer = %request, error = %e, "transfer failed");
            }
        }
    }
}

fn load_account(tx: &dyn UnitOfWork, id: AccountId) -> Result<Account, LedgerError> {
    tx.find_account(id)?
        .ok_or_else(|| AccountError::NotFound { id }.into())
}

/// Stored balances are never negative and fit the `DECIMAL(10,2)` column.
fn check_balance(balance: Amount) -> Result<(), RequestError> {
    if balance.is_negative() {
        return Err(RequestError::NegativeBalance { balance });
    }
    if !balance.in_range() {
        return Err(RequestError::AmountOutOfRange { amount: balance });
    }
    Ok(())
}

/// Account numbers are unique; `owner` is the account allowed to hold `number`.
fn ensure_number_free(
    tx: &dyn UnitOfWork,
    number: &str,
    owner: Option<AccountId>,
) -> Result<(), LedgerError> {
    match tx.find_account_by_number(number)? {
        Some(existing) if Some(existing.id()) != owner => Err(AccountError::DuplicateNumber {
            number: number.to_string(),
        }
        .into()),
        _ => Ok(()),
    }
}
