//! Ledger services.
//!
//! [`AccountService`] owns the transfer: it loads both accounts, debits the
//! source, credits the target and bumps the bank counter through
//! [`BankService`], all inside one store transaction. Both services only see
//! the store through the contracts in [`crate::store`].

mod account;
pub use account::{AccountService, RunSummary};

mod bank;
pub use bank::BankService;

mod error;
pub use error::{AccountError, BankError, LedgerError, RequestError};
