use std::env;
use std::io;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use bank_ledger::csv::{CsvError, read_accounts, read_banks, read_transfers, write_report};
use bank_ledger::{AccountService, InMemoryStore, LedgerError};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

const USAGE: &str = "usage: bank-ledger <accounts.csv> <banks.csv> <transfers.csv>";

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .from_env_lossy(),
        )
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let [accounts_path, banks_path, transfers_path] = args.as_slice() else {
        error!("{USAGE}");
        return ExitCode::FAILURE;
    };

    for path in [accounts_path, banks_path, transfers_path] {
        if !path.ends_with(".csv") {
            warn!(path, "input file seems to not be a csv file");
        }
    }

    let service = AccountService::new(Arc::new(InMemoryStore::new()));

    if let Err(e) = seed(&service, Path::new(accounts_path), Path::new(banks_path)) {
        error!("{e}");
        return ExitCode::FAILURE;
    }

    let transfers = match read_transfers(Path::new(transfers_path)) {
        Ok(transfers) => transfers,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let (tx_sender, tx_receiver) = tokio::sync::mpsc::channel(16);

    let reader = tokio::spawn(async move {
        for result in transfers {
            match result {
                Ok(request) => {
                    if tx_sender.send(request).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("{e}");
                }
            }
        }
    });

    let summary = service.run(ReceiverStream::new(tx_receiver)).await;
    if let Err(e) = reader.await {
        error!("transfer reader stopped: {e}");
        return ExitCode::FAILURE;
    }
    info!(
        completed = summary.completed,
        rejected = summary.rejected,
        failed = summary.failed,
        "transfers processed"
    );

    let report = service
        .find_all()
        .and_then(|accounts| Ok((accounts, service.banks().find_all()?)));
    let (accounts, banks) = match report {
        Ok(tables) => tables,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = write_report(io::stdout().lock(), &accounts, &banks) {
        error!("{e}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

#[derive(Debug, thiserror::Error)]
enum SeedError {
    #[error(transparent)]
    Csv(#[from] CsvError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Load accounts and banks in file order; bad rows are skipped with a warning.
fn seed(
    service: &AccountService<InMemoryStore>,
    accounts: &Path,
    banks: &Path,
) -> Result<(), SeedError> {
    for result in read_accounts(accounts)? {
        match result.map_err(SeedError::from).and_then(|new| Ok(service.create(new)?)) {
            Ok(_) => {}
            Err(e @ SeedError::Ledger(LedgerError::Store(_))) => return Err(e),
            Err(e) => warn!("account skipped: {e}"),
        }
    }

    for result in read_banks(banks)? {
        let bank = match result {
            Ok(bank) => bank,
            Err(e) => {
                warn!("bank skipped: {e}");
                continue;
            }
        };
        service.banks().create(bank)?;
    }

    Ok(())
}
