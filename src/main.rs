//! `disperse`: batched token transfers from the command line.
//!
//! ```text
//! disperse [--config FILE] run   --recipients FILE [--sender NAME] [--batch-size N] [--memo M] [--log-file [FILE]]
//! disperse [--config FILE] plan  --recipients FILE --sender NAME
//! disperse [--config FILE] serve
//! ```
//!
//! `run` and `serve` need a remote signer (`[signer]` section or
//! `DISPERSE_SIGNER_URL`) and check the sender's balance against
//! `[transfer] balance_url` unless it is empty. `plan` is a dry run that
//! prints the batches and their wire actions without contacting anything.

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use token_disperse::balance::{BalanceClient, BalanceError};
use token_disperse::config::{default_config, load_config, validate_config, ConfigError, DisperseConfig};
use token_disperse::http::{connector, AppState, HttpServer};
use token_disperse::lifecycle::{signals::spawn_signal_handler, Shutdown};
use token_disperse::observability::{
    events::{log_file_name, render_log_file},
    logging::init_logging,
    metrics::init_metrics,
    MemorySink,
};
use token_disperse::recipients::{parse_recipients, total_amount};
use token_disperse::session::RemoteSession;
use token_disperse::transfer::{build_batch_actions, plan_batches, Action, Disperser, PermissionLevel, RunStatus};

#[derive(Parser)]
#[command(name = "disperse")]
#[command(about = "Send a token to many accounts in paced, batched transactions", long_about = None)]
struct Cli {
    /// TOML configuration file; defaults apply when omitted.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit transfers through the configured signer
    Run {
        /// Recipient list (`name,amount[,memo]` or `name amount` per line)
        #[arg(short, long)]
        recipients: PathBuf,

        /// Account the transfers are sent from; must be the signer's account
        #[arg(short, long)]
        sender: Option<String>,

        /// Transfers per transaction
        #[arg(long)]
        batch_size: Option<usize>,

        /// Memo for recipients without one
        #[arg(long)]
        memo: Option<String>,

        /// Write the run log; without a value a dated file in the current directory
        #[arg(long)]
        log_file: Option<Option<PathBuf>>,
    },
    /// Print the batches and actions a run would submit
    Plan {
        #[arg(short, long)]
        recipients: PathBuf,

        /// Account the transfers would be sent from
        #[arg(short, long)]
        sender: String,
    },
    /// Serve the HTTP API
    Serve,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => default_config()?,
    };

    init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "disperse starting");

    match cli.command {
        Commands::Run {
            recipients,
            sender,
            batch_size,
            memo,
            log_file,
        } => {
            let mut config = config;
            if let Some(sender) = sender {
                config.transfer.sender = Some(sender);
            }
            if let Some(batch_size) = batch_size {
                config.transfer.batch_size = batch_size;
            }
            if let Some(memo) = memo {
                config.transfer.memo = memo;
            }
            validate_config(&config).map_err(ConfigError::Validation)?;

            let status = run(&config, &recipients, log_file).await?;
            if status != RunStatus::Success {
                std::process::exit(2);
            }
        }
        Commands::Plan { recipients, sender } => {
            let mut config = config;
            config.transfer.sender = Some(sender);
            plan(&config, &recipients)?
        }
        Commands::Serve => serve(config).await?,
    }

    Ok(())
}

async fn run(
    config: &DisperseConfig,
    recipients_path: &Path,
    log_file: Option<Option<PathBuf>>,
) -> Result<RunStatus, Box<dyn std::error::Error>> {
    let transfer_config = config.transfer.to_transfer_config()?;
    let recipients = parse_recipients(&std::fs::read_to_string(recipients_path)?)?;
    if let Some(total) = total_amount(&recipients) {
        tracing::info!(
            recipients = recipients.len(),
            total = %total.to_fixed(transfer_config.token_precision),
            token = %transfer_config.token_name,
            "Recipient list loaded"
        );
    }

    if config.observability.metrics_enabled {
        init_metrics(config.observability.metrics_address.parse()?);
    }

    let session = RemoteSession::connect(&config.signer).await?;
    let balances = balance_client(config)?;
    let shutdown = Arc::new(Shutdown::new());
    spawn_signal_handler(shutdown.clone());

    let sink = MemorySink::new();
    let mut disperser = Disperser::new(&session, &transfer_config)
        .with_sink(&sink)
        .with_shutdown(shutdown.signal());
    if let Some(balances) = &balances {
        disperser = disperser.with_balance_check(balances);
    }
    let outcome = disperser.run(&recipients).await;

    if let Some(path) = log_file {
        let path = path.unwrap_or_else(|| PathBuf::from(log_file_name(chrono::Utc::now())));
        std::fs::write(&path, render_log_file(&sink.events()))?;
        tracing::info!(path = %path.display(), "Run log written");
    }

    let result = outcome?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(result.status())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PlannedBatch {
    batch_number: usize,
    total_batches: usize,
    actions: Vec<Action>,
}

fn balance_client(config: &DisperseConfig) -> Result<Option<BalanceClient>, BalanceError> {
    config
        .transfer
        .balance_url()
        .map(|url| BalanceClient::new(url, Duration::from_secs(config.signer.timeout_secs)))
        .transpose()
}

fn plan(config: &DisperseConfig, recipients_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let transfer_config = config.transfer.to_transfer_config()?;
    let recipients = parse_recipients(&std::fs::read_to_string(recipients_path)?)?;
    let sender = PermissionLevel {
        actor: transfer_config.sender_name.clone(),
        permission: config.signer.permission.clone().unwrap_or_else(|| "active".to_string()),
    };

    let planned: Vec<PlannedBatch> = plan_batches(&recipients, transfer_config.batch_size)?
        .iter()
        .map(|batch| PlannedBatch {
            batch_number: batch.number,
            total_batches: batch.total,
            actions: build_batch_actions(batch, &transfer_config, &sender),
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&planned)?);
    Ok(())
}

async fn serve(config: DisperseConfig) -> Result<(), Box<dyn std::error::Error>> {
    if config.observability.metrics_enabled {
        init_metrics(config.observability.metrics_address.parse()?);
    }

    let session = match RemoteSession::connect(&config.signer).await {
        Ok(session) => Some(session),
        Err(e) => {
            tracing::warn!(
                error = %e,
                signer = %config.signer.url,
                "No signing session yet; retrying on the next request"
            );
            None
        }
    };

    let signer = config.signer.clone();
    let reconnect = connector(move || {
        let signer = signer.clone();
        async move { RemoteSession::connect(&signer).await }
    });

    let shutdown = Arc::new(Shutdown::new());
    spawn_signal_handler(shutdown.clone());

    let mut state = AppState::new(session, shutdown).with_connector(reconnect);
    if let Some(balances) = balance_client(&config)? {
        state = state.with_balance_check(balances);
    }

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    let server = HttpServer::new(&config.server, state);
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
