//! BetHouse Round Oracle - Entry Point
//!
//! Initializes configuration, logging, the ledger and content store
//! connections, then runs the round loop (or a single republish)
//! until it finishes or SIGINT arrives.
//!
//! Wiring sequence:
//! 1. Parse CLI, load config.toml + validate
//! 2. Init tracing (JSON structured logging)
//! 3. Spawn health/metrics server (/live, /ready, /metrics)
//! 4. Resolve contract addresses (env, then prompt)
//! 5. Connect ledger RPC, validate contract code, bind gateway
//! 6. Create Kubo client and publication log
//! 7. `run`: market setup → participant funding → round loop
//!    `republish`: publish one logged round again
//! 8. Wait for completion or SIGINT → shutdown

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{Instrument, error, info, info_span, warn};

use bethouse_oracle::adapters::chain::{BetHouseGateway, ContractValidator, LedgerProvider};
use bethouse_oracle::adapters::ipfs::KuboClient;
use bethouse_oracle::adapters::metrics::{HealthServer, HealthState, OracleMetrics};
use bethouse_oracle::adapters::persistence::PublicationLog;
use bethouse_oracle::adapters::render::StandardRenderer;
use bethouse_oracle::config::{self, AppConfig};
use bethouse_oracle::domain::round::RunPlan;
use bethouse_oracle::ports::content_store::ContentStore;
use bethouse_oracle::usecases::funding::ParticipantFunding;
use bethouse_oracle::usecases::publisher::ArtifactPublisher;
use bethouse_oracle::usecases::republish::Republish;
use bethouse_oracle::usecases::round_driver::{DriverDeps, RoundDriver};
use bethouse_oracle::usecases::setup::MarketSetup;

/// Round oracle for the BetHouse price market.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Path to the configuration file.
    #[arg(long, env = "BETHOUSE_CONFIG", default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Drive the fixed number of rounds (default).
    Run,
    /// Publish a logged round's artifacts again and re-anchor them.
    Republish {
        /// Round identifier.
        #[arg(long)]
        round: u64,
    },
}

/// Long-lived handles shared by both commands.
struct Services {
    gateway: Arc<BetHouseGateway>,
    store: Arc<KuboClient>,
    log: Arc<PublicationLog>,
    metrics: Arc<OracleMetrics>,
    health: Arc<HealthState>,
    addresses: config::addresses::ContractAddresses,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── 1. Load configuration ───────────────────────────────
    let config = config::loader::load_config(&cli.config).context("Failed to load configuration")?;

    // ── 2. Initialize structured JSON logging ───────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.bot.log_level)),
        )
        .json()
        .init();

    let run_id = uuid::Uuid::new_v4().to_string();
    info!(
        name = %config.bot.name,
        version = env!("CARGO_PKG_VERSION"),
        run_id = %run_id,
        "Starting BetHouse round oracle"
    );

    let span = info_span!("oracle", run_id = %run_id);
    run(cli.command.unwrap_or(Command::Run), config, run_id)
        .instrument(span)
        .await
}

async fn run(command: Command, config: AppConfig, run_id: String) -> Result<()> {
    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    // ── 3. Health + metrics server ──────────────────────────
    let metrics = Arc::new(OracleMetrics::new().context("Failed to register metrics")?);
    let health = Arc::new(HealthState::new());
    let server_handle = if config.metrics.enabled {
        let server = HealthServer::new(
            Arc::clone(&health),
            Arc::clone(&metrics),
            config.metrics.bind_address.clone(),
        );
        let shutdown_rx = shutdown_tx.subscribe();
        Some(tokio::spawn(async move {
            if let Err(e) = server.run(shutdown_rx).await {
                error!(error = %e, "Health server failed");
            }
        }))
    } else {
        None
    };

    let services = connect(&config, metrics, health).await?;

    // ── 7. Run the command until done or SIGINT ─────────────
    let work = async {
        match command {
            Command::Run => run_rounds(&services, &config, &run_id).await,
            Command::Republish { round } => republish(&services, &config, &run_id, round).await,
        }
    };

    let result = tokio::select! {
        result = work => result,
        _ = signal::ctrl_c() => {
            warn!("SIGINT received, abandoning the in-flight round");
            Ok(())
        }
    };

    // ── 8. Shutdown ─────────────────────────────────────────
    let _ = shutdown_tx.send(());
    if let Some(handle) = server_handle {
        let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
    }

    info!("Shutdown complete");
    result
}

/// Steps 4-6: addresses, ledger, content store, log.
async fn connect(
    config: &AppConfig,
    metrics: Arc<OracleMetrics>,
    health: Arc<HealthState>,
) -> Result<Services> {
    // ── 4. Contract addresses ───────────────────────────────
    let addresses = config::addresses::resolve_from_env()?;
    for (name, address) in addresses.named() {
        info!(contract = name, address = %address, "Contract address");
    }

    // ── 5. Ledger ───────────────────────────────────────────
    let provider = LedgerProvider::connect(&config.ledger).await?;
    ContractValidator::new(provider.inner())
        .validate_all(&addresses)
        .await
        .context("Contract validation failed")?;
    let gateway = Arc::new(
        BetHouseGateway::new(
            &provider,
            addresses,
            Duration::from_secs(config.ledger.tx_timeout_secs),
        )
        .await?,
    );

    // ── 6. Content store + publication log ──────────────────
    let store = Arc::new(KuboClient::new(&config.content_store)?);
    if !store.is_healthy().await {
        warn!(api_url = %config.content_store.api_url, "Content store did not answer; uploads will fail until it does");
        health
            .store_healthy
            .store(false, std::sync::atomic::Ordering::Relaxed);
    }
    let log = Arc::new(PublicationLog::new(&config.persistence.data_dir).await?);

    Ok(Services {
        gateway,
        store,
        log,
        metrics,
        health,
        addresses,
    })
}

async fn run_rounds(services: &Services, config: &AppConfig, run_id: &str) -> Result<()> {
    let context = MarketSetup::new(Arc::clone(&services.gateway))
        .prepare(&config.ledger.market_symbol, &services.addresses)
        .await?;

    ParticipantFunding::new(Arc::clone(&services.gateway))
        .fund(&context.participants)
        .await;

    let deps = DriverDeps {
        ledger: Arc::clone(&services.gateway),
        store: Arc::clone(&services.store),
        renderer: Arc::new(StandardRenderer),
        repository: Arc::clone(&services.log),
        metrics: Arc::clone(&services.metrics),
        health: Arc::clone(&services.health),
    };
    let mut driver = RoundDriver::new(
        deps,
        context,
        &config.content_store.mfs_dir,
        RunPlan::STANDARD,
        run_id,
        StdRng::from_entropy(),
    );

    let summary = driver.run().await?;
    info!(
        completed = summary.completed.len(),
        skipped = summary.skipped,
        log = %services.log.path().display(),
        "All rounds driven"
    );
    Ok(())
}

async fn republish(services: &Services, config: &AppConfig, run_id: &str, round_id: u64) -> Result<()> {
    let publisher = ArtifactPublisher::new(
        Arc::clone(&services.gateway),
        Arc::clone(&services.store),
        Arc::new(StandardRenderer),
        config.content_store.mfs_dir.as_str(),
        Arc::clone(&services.metrics),
    );
    let summary = Republish::new(publisher, Arc::clone(&services.log), run_id)
        .run(round_id)
        .await?;

    info!(
        round_id,
        uploaded = summary.artifacts.len(),
        anchored = summary.anchored.len(),
        failures = summary.failures.len(),
        "Republish finished"
    );
    anyhow::ensure!(
        summary.failures.is_empty(),
        "republish of round {round_id} finished with {} failed step(s)",
        summary.failures.len()
    );
    Ok(())
}
