use clap::Parser;
use emoney_wallet::application::service::WalletService;
use emoney_wallet::error::Result;
use emoney_wallet::interfaces::csv::dispatch::apply;
use emoney_wallet::interfaces::csv::operation_reader::OperationReader;
use emoney_wallet::interfaces::csv::wallet_writer::WalletWriter;
use miette::IntoDiagnostic;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input operations CSV file
    input: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Username of the bootstrap administrator account
    #[arg(long, default_value = "root")]
    admin: String,
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let service = build_service(cli.db_path.as_deref())
        .await
        .into_diagnostic()?;

    // The admin may already exist when replaying onto a persistent database.
    if service
        .accounts
        .user_by_username(&cli.admin)
        .await
        .is_err()
    {
        service
            .accounts
            .seed_admin(&cli.admin, &cli.admin)
            .await
            .into_diagnostic()?;
    }

    let file = File::open(cli.input).into_diagnostic()?;
    let reader = OperationReader::new(file);
    for op_result in reader.operations() {
        match op_result {
            Ok(op) => {
                if let Err(e) = apply(&service, op).await {
                    eprintln!("Error applying operation: {}", e);
                }
            }
            Err(e) => {
                eprintln!("Error reading operation: {}", e);
            }
        }
    }

    let (users, wallets) = service.snapshot().await.into_diagnostic()?;

    let stdout = io::stdout();
    let mut writer = WalletWriter::new(stdout.lock());
    writer.write_snapshot(users, wallets).into_diagnostic()?;

    Ok(())
}

#[cfg(feature = "storage-rocksdb")]
async fn build_service(db_path: Option<&Path>) -> Result<WalletService> {
    use emoney_wallet::application::auth::{InMemoryTokenIssuer, Sha256SecretHasher};
    use emoney_wallet::infrastructure::rocksdb::RocksDbStore;
    use std::sync::Arc;

    match db_path {
        Some(path) => {
            let store = Arc::new(RocksDbStore::open(path)?);
            WalletService::new(
                store.clone(),
                store.clone(),
                store,
                Arc::new(Sha256SecretHasher::new()),
                Arc::new(InMemoryTokenIssuer::new()),
            )
            .await
        }
        None => WalletService::in_memory().await,
    }
}

#[cfg(not(feature = "storage-rocksdb"))]
async fn build_service(db_path: Option<&Path>) -> Result<WalletService> {
    use emoney_wallet::error::WalletError;

    if db_path.is_some() {
        return Err(WalletError::InvalidInput(
            "--db-path requires the 'storage-rocksdb' feature".to_string(),
        ));
    }
    WalletService::in_memory().await
}
