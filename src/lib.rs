pub mod amount;
pub mod csv;
pub mod model;
pub mod service;
pub mod store;

pub use amount::Amount;
pub use model::{
    Account, AccountId, Bank, BankId, NewAccount, NewBank, TransferReceipt, TransferRequest,
};
pub use service::{AccountService, BankService, LedgerError};
pub use store::{InMemoryStore, Store};
