use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use std::path::Path;
use thiserror::Error;

use crate::amount::ParseAmountError;
use crate::{Account, AccountId, Amount, Bank, BankId, NewAccount, NewBank, TransferRequest};

/// Errors that can occur when reading or writing csv files
#[derive(Debug, Error)]
pub enum CsvError {
    #[error("failed to open {path}: {source}")]
    Open { path: String, source: csv::Error },

    #[error("line {line}: failed to parse row: {source}")]
    Parse { line: usize, source: csv::Error },

    #[error("line {line}: invalid amount: {source}")]
    InvalidAmount {
        line: usize,
        source: ParseAmountError,
    },

    #[error("failed to write csv: {0}")]
    Write(#[from] csv::Error),

    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Deserialize)]
struct AccountRow {
    account_number: String,
    owner: String,
    balance: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BankRow {
    name: String,
    transfer_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct TransferRow {
    source: Option<AccountId>,
    target: Option<AccountId>,
    bank: Option<BankId>,
    amount: Option<String>,
}

#[derive(Debug, Serialize)]
struct AccountOutputRow<'a> {
    id: AccountId,
    account_number: &'a str,
    owner: &'a str,
    balance: String,
}

#[derive(Debug, Serialize)]
struct BankOutputRow<'a> {
    id: BankId,
    name: &'a str,
    transfer_count: u64,
}

/// Deserialize every row of a csv file, tagging each with its line number
fn read_rows<R: DeserializeOwned>(
    path: &Path,
) -> Result<impl Iterator<Item = Result<(usize, R), CsvError>> + use<R>, CsvError> {
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| CsvError::Open {
            path: path.display().to_string(),
            source,
        })?;

    Ok(reader
        .into_deserialize::<R>()
        .enumerate()
        .map(|(idx, result)| {
            let line = idx + 2; // 1-indexed, skip header
            result
                .map(|row| (line, row))
                .map_err(|source| CsvError::Parse { line, source })
        }))
}

fn parse_amount(line: usize, raw: Option<String>) -> Result<Option<Amount>, CsvError> {
    raw.map(|raw| raw.parse::<Amount>())
        .transpose()
        .map_err(|source| CsvError::InvalidAmount { line, source })
}

/// Read accounts to create from a csv file (`account_number,owner,balance`)
pub fn read_accounts(
    path: &Path,
) -> Result<impl Iterator<Item = Result<NewAccount, CsvError>> + use<>, CsvError> {
    Ok(read_rows::<AccountRow>(path)?.map(|result| {
        let (line, row) = result?;
        Ok(NewAccount {
            account_number: row.account_number,
            owner: row.owner,
            balance: parse_amount(line, row.balance)?,
        })
    }))
}

/// Read banks to create from a csv file (`name,transfer_count`)
pub fn read_banks(
    path: &Path,
) -> Result<impl Iterator<Item = Result<NewBank, CsvError>> + use<>, CsvError> {
    Ok(read_rows::<BankRow>(path)?.map(|result| {
        let (_, row) = result?;
        Ok(NewBank {
            name: row.name,
            transfer_count: row.transfer_count.unwrap_or_default(),
        })
    }))
}

/// Read transfer requests from a csv file (`source,target,bank,amount`).
///
/// Missing values are kept as `None` so the service can reject the request;
/// only unparseable rows are reported here.
pub fn read_transfers(
    path: &Path,
) -> Result<impl Iterator<Item = Result<TransferRequest, CsvError>> + use<>, CsvError> {
    Ok(read_rows::<TransferRow>(path)?.map(|result| {
        let (line, row) = result?;
        Ok(TransferRequest {
            source_account_id: row.source,
            target_account_id: row.target,
            bank_id: row.bank,
            amount: parse_amount(line, row.amount)?,
        })
    }))
}

/// Write accounts, a blank line, then banks, each as csv with a header
pub fn write_report<W: Write>(out: W, accounts: &[Account], banks: &[Bank]) -> Result<(), CsvError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(out);

    writer.write_record(["id", "account_number", "owner", "balance"])?;
    for account in accounts {
        writer.serialize(AccountOutputRow {
            id: account.id(),
            account_number: account.account_number(),
            owner: account.owner(),
            balance: account.balance().to_string(),
        })?;
    }

    let mut out = writer.into_inner().map_err(|e| e.into_error())?;
    out.write_all(b"\n")?;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(out);

    writer.write_record(["id", "name", "transfer_count"])?;
    for bank in banks {
        writer.serialize(BankOutputRow {
            id: bank.id(),
            name: bank.name(),
            transfer_count: bank.transfer_count(),
        })?;
    }

    writer.flush()?;
    Ok(())
}
