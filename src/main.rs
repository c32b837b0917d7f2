use clap::Parser;
use miette::{IntoDiagnostic, Result};
use paygate::application::gateway::{Collaborators, PaymentGateway};
use paygate::config::GatewayConfig;
use paygate::domain::ports::TransactionStoreRef;
use paygate::domain::transaction::{InstrumentRef, PaymentRequest};
use paygate::error::GatewayError;
use paygate::infrastructure::catalog::StaticCatalog;
use paygate::infrastructure::fixture::Fixture;
use paygate::infrastructure::in_memory::{InMemoryKeyValueStore, InMemoryTransactionStore};
#[cfg(feature = "storage-rocksdb")]
use paygate::infrastructure::rocksdb::RocksDBStore;
use paygate::infrastructure::scripted_vendor::ScriptedVendorGateway;
use paygate::interfaces::csv::request_reader::{Command, PayCommand, RequestReader};
use paygate::interfaces::csv::response_writer::ResponseWriter;
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON fixture with payment methods, instruments, merchant configs,
    /// vendors, pricing, downtime and scripted vendor outcomes
    catalog: PathBuf,

    /// Input requests CSV file
    input: PathBuf,

    /// TOML configuration file (optional). Defaults apply otherwise.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdout carries the CSV results.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr).with_target(false))
        .with(filter)
        .init();
}

fn transaction_store(db_path: Option<PathBuf>) -> Result<TransactionStoreRef> {
    match db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(db_path) => {
            let store = RocksDBStore::open(db_path).into_diagnostic()?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(_) => {
            eprintln!(
                "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
            );
            Ok(Arc::new(InMemoryTransactionStore::new()))
        }
        None => Ok(Arc::new(InMemoryTransactionStore::new())),
    }
}

fn payment_request(
    catalog: &StaticCatalog,
    pay: &PayCommand,
    currency: &str,
) -> paygate::error::Result<PaymentRequest> {
    let instrument = catalog
        .instrument(pay.instrument_id)
        .filter(|i| i.user_id == pay.user_id)
        .ok_or_else(|| {
            GatewayError::ValidationError(format!(
                "Unknown instrument {} for user {}",
                pay.instrument_id, pay.user_id
            ))
        })?;

    Ok(PaymentRequest {
        payment_id: pay.payment_id,
        merchant_id: pay.merchant_id,
        amount: pay.amount,
        currency: currency.to_string(),
        instrument: InstrumentRef {
            instrument_id: instrument.instrument_id,
            method_id: instrument.method_id.clone(),
            masked_details: Some(instrument.masked_details.clone()),
            network: instrument.network.clone(),
            issuer: instrument.issuer.clone(),
        },
    })
}

async fn dispatch<W: Write>(
    gateway: &PaymentGateway,
    catalog: &StaticCatalog,
    config: &GatewayConfig,
    command: Command,
    writer: &mut ResponseWriter<W>,
) -> paygate::error::Result<()> {
    match command {
        Command::Checkout(request) => {
            let response = gateway.checkout_options(&request).await?;
            writer.write_checkout(request.idempotency_key, &response)
        }
        Command::Pay(pay) => {
            let request = payment_request(catalog, &pay, &config.default_currency)?;
            let response = gateway.process_payment(&request, pay.user_id).await?;
            writer.write_payment(&response)
        }
        Command::Status(payment_id) => {
            let response = gateway.payment_status(payment_id).await?;
            writer.write_status(&response)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let config = match &cli.config {
        Some(path) => GatewayConfig::from_file(path).into_diagnostic()?,
        None => GatewayConfig::default(),
    };

    let fixture = Fixture::from_reader(File::open(&cli.catalog).into_diagnostic()?).into_diagnostic()?;
    let catalog = Arc::new(fixture.catalog);
    let collaborators = Collaborators::from_catalog(
        catalog.clone(),
        Arc::new(ScriptedVendorGateway::from_script(fixture.vendor_script)),
        transaction_store(cli.db_path)?,
        Arc::new(InMemoryKeyValueStore::new()),
    );
    let gateway = PaymentGateway::new(collaborators, &config);

    let file = File::open(&cli.input).into_diagnostic()?;
    let reader = RequestReader::new(file);
    let stdout = io::stdout();
    let mut writer = ResponseWriter::new(stdout.lock());

    let mut processed = 0usize;
    for (index, command) in reader.commands().enumerate() {
        // Header is line 1.
        let line = index + 2;
        match command {
            Ok(command) => {
                match dispatch(&gateway, &catalog, &config, command, &mut writer).await {
                    Ok(()) => processed += 1,
                    Err(e) => error!(line, error = %e, "Error processing request"),
                }
            }
            Err(e) => error!(line, error = %e, "Error reading request"),
        }
    }

    writer.flush().into_diagnostic()?;
    info!(processed, "Done");
    Ok(())
}
