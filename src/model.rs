//! Core domain types for the ledger.

use std::fmt;

use crate::Amount;
use crate::service::{AccountError, RequestError};

/// Account identifier, assigned by the store.
pub type AccountId = u64;

/// Bank identifier, assigned by the store.
pub type BankId = u64;

/// A customer account holding a non-negative balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    id: AccountId,
    account_number: String,
    owner: String,
    balance: Amount,
}

/// Creation request for an [`Account`]. Identity is assigned on insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub account_number: String,
    pub owner: String,
    /// Opening balance, zero when absent.
    pub balance: Option<Amount>,
}

impl Account {
    /// Build a persisted account. Only stores mint identities, so this is
    /// the single place an `Account` comes into existence.
    pub fn new(id: AccountId, new: NewAccount) -> Self {
        Self {
            id,
            account_number: new.account_number,
            owner: new.owner,
            balance: new.balance.unwrap_or_default(),
        }
    }

    pub fn id(&self) -> AccountId {
        self.id
    }

    pub fn account_number(&self) -> &str {
        &self.account_number
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn balance(&self) -> Amount {
        self.balance
    }

    /// Credit the balance, leaving the account untouched if it would pass
    /// [`Amount::MAX`].
    pub fn deposit(&mut self, amount: Amount) -> Result<(), AccountError> {
        let Some(credited) = self.balance.checked_add(amount) else {
            return Err(AccountError::BalanceOverflow {
                account_number: self.account_number.clone(),
                current_balance: self.balance,
                deposit_amount: amount,
            });
        };
        self.balance = credited;
        Ok(())
    }

    /// Debit the balance, leaving the account untouched if it would go negative.
    pub fn withdraw(&mut self, amount: Amount) -> Result<(), AccountError> {
        if amount > self.balance {
            return Err(AccountError::InsufficientFunds {
                account_number: self.account_number.clone(),
                current_balance: self.balance,
                requested_amount: amount,
            });
        }
        self.balance = self.balance - amount;
        Ok(())
    }

    /// Full replacement of the mutable fields, keeping identity.
    pub fn replace_details(&mut self, account_number: String, owner: String, balance: Amount) {
        self.account_number = account_number;
        self.owner = owner;
        self.balance = balance;
    }
}

/// A bank, counting the transfers attributed to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bank {
    id: BankId,
    name: String,
    transfer_count: u64,
}

/// Creation request for a [`Bank`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewBank {
    pub name: String,
    /// Starting count, only non-zero when loading existing records.
    pub transfer_count: u64,
}

impl Bank {
    pub fn new(id: BankId, new: NewBank) -> Self {
        Self {
            id,
            name: new.name,
            transfer_count: new.transfer_count,
        }
    }

    pub fn id(&self) -> BankId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn transfer_count(&self) -> u64 {
        self.transfer_count
    }

    pub fn rename(&mut self, name: String) {
        self.name = name;
    }

    pub fn increment_transfer_count(&mut self) {
        self.transfer_count += 1;
    }
}

/// A transfer as received from a driver; any field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferRequest {
    pub source_account_id: Option<AccountId>,
    pub target_account_id: Option<AccountId>,
    pub bank_id: Option<BankId>,
    pub amount: Option<Amount>,
}

/// A validated transfer: every field present, amount in `(0, MAX]`, distinct accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transfer {
    pub source_account_id: AccountId,
    pub target_account_id: AccountId,
    pub bank_id: BankId,
    pub amount: Amount,
}

impl TransferRequest {
    pub fn new(source: AccountId, target: AccountId, bank: BankId, amount: Amount) -> Self {
        Self {
            source_account_id: Some(source),
            target_account_id: Some(target),
            bank_id: Some(bank),
            amount: Some(amount),
        }
    }

    pub fn validate(&self) -> Result<Transfer, RequestError> {
        let (Some(source), Some(target), Some(bank), Some(amount)) = (
            self.source_account_id,
            self.target_account_id,
            self.bank_id,
            self.amount,
        ) else {
            return Err(RequestError::MissingFields);
        };
        Transfer::new(source, target, bank, amount)
    }
}

impl fmt::Display for TransferRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn field<T: fmt::Display>(value: &Option<T>) -> String {
            value
                .as_ref()
                .map_or_else(|| "?".to_string(), ToString::to_string)
        }

        write!(
            f,
            "{} -> {} via bank {}: {}",
            field(&self.source_account_id),
            field(&self.target_account_id),
            field(&self.bank_id),
            field(&self.amount),
        )
    }
}

impl Transfer {
    pub fn new(
        source_account_id: AccountId,
        target_account_id: AccountId,
        bank_id: BankId,
        amount: Amount,
    ) -> Result<Self, RequestError> {
        if !amount.is_positive() {
            return Err(RequestError::NonPositiveAmount { amount });
        }
        if !amount.in_range() {
            return Err(RequestError::AmountOutOfRange { amount });
        }
        if source_account_id == target_account_id {
            return Err(RequestError::SameAccount {
                id: source_account_id,
            });
        }
        Ok(Self {
            source_account_id,
            target_account_id,
            bank_id,
            amount,
        })
    }
}

/// State of the three records after a completed transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReceipt {
    pub source: Account,
    pub target: Account,
    pub bank: Bank,
}
