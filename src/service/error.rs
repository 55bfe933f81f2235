//! Error types for ledger operations.
//!
//! Messages are part of the public contract: existing callers render them
//! verbatim, so the format strings below must not drift.

use thiserror::Error;

use crate::Amount;
use crate::model::{AccountId, BankId};
use crate::store::StoreError;

/// Top-level error returned by [`AccountService`](super::AccountService) and
/// [`BankService`](super::BankService).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("{0}")]
    Account(#[from] AccountError),

    #[error("{0}")]
    Bank(#[from] BankError),

    #[error("{0}")]
    Request(#[from] RequestError),

    #[error("{0}")]
    Store(#[from] StoreError),
}

impl LedgerError {
    /// True for business rejections the caller can act on, false for
    /// infrastructure failures.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, LedgerError::Store(_))
    }
}

/// Account lookup and balance failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccountError {
    #[error("Account with id '{id}' not found.")]
    NotFound { id: AccountId },

    #[error("Account with number '{number}' not found.")]
    NotFoundByNumber { number: String },

    #[error(
        "Insufficient money in account nr: {account_number}. Current balance: {current_balance}, requested amount: {requested_amount}"
    )]
    InsufficientFunds {
        account_number: String,
        current_balance: Amount,
        requested_amount: Amount,
    },

    #[error("Account with number '{number}' already exists.")]
    DuplicateNumber { number: String },

    #[error(
        "Balance of account nr: {account_number} would exceed {max}. Current balance: {current_balance}, deposit amount: {deposit_amount}",
        max = Amount::MAX
    )]
    BalanceOverflow {
        account_number: String,
        current_balance: Amount,
        deposit_amount: Amount,
    },
}

/// Bank lookup failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BankError {
    #[error("Bank with id '{id}' not found.")]
    NotFound { id: BankId },
}

/// Malformed requests, rejected before any store access.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("Transfer details are required")]
    MissingFields,

    #[error("Transfer amount must be positive, got {amount}")]
    NonPositiveAmount { amount: Amount },

    #[error("Source and target account are the same: '{id}'")]
    SameAccount { id: AccountId },

    #[error("Account balance cannot be negative, got {balance}")]
    NegativeBalance { balance: Amount },

    #[error("Amount {amount} exceeds the maximum of {max}", max = Amount::MAX)]
    AmountOutOfRange { amount: Amount },
}
