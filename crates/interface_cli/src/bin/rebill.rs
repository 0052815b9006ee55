//! Billing engine CLI binary
//!
//! # Usage
//!
//! ```bash
//! # Bill everything due today for a tenant
//! rebill run-billing --tenant 0193a7e0-...
//!
//! # Bill as of a specific date
//! rebill run-billing --tenant 0193a7e0-... --date 2026-02-01
//!
//! # Inspect a contract's run history
//! rebill history --contract 0193a7e1-...
//! ```
//!
//! # Environment Variables
//!
//! * `DATABASE_URL` / `REBILL_DATABASE_URL` - PostgreSQL connection string
//! * `REBILL_LOG_LEVEL` - Log level: trace, debug, info, warn, error (default: info)
//! * `REBILL_LOCK_TIMEOUT_MS` - Bound on number range lock waits (default: 5000)

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use core_kernel::{ContractId, TenantId};
use domain_billing::BillingStore;
use infra_db::{create_pool, run_migrations, DatabaseConfig, PostgresBillingAdapter};
use interface_cli::{build_scheduler, CliConfig};

#[derive(Parser)]
#[command(name = "rebill", about = "Recurring billing engine", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate documents for every due contract of a tenant
    RunBilling {
        /// Tenant to bill
        #[arg(long)]
        tenant: Uuid,
        /// Reference date; contracts due on or before it are billed (default: today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Print the run history of a contract
    History {
        /// Contract to inspect
        #[arg(long)]
        contract: Uuid,
    },
    /// Apply pending database migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = CliConfig::load();
    init_tracing(&config.log_level);

    let cli = Cli::parse();
    let pool = create_pool(
        DatabaseConfig::new(&config.database_url)
            .lock_timeout(Duration::from_millis(config.lock_timeout_ms)),
    )
    .await
    .context("could not connect to the database")?;

    match cli.command {
        Command::RunBilling { tenant, date } => {
            let tenant = TenantId::from_uuid(tenant);
            let reference_date = date.unwrap_or_else(|| Utc::now().date_naive());
            let scheduler = build_scheduler(pool, Duration::from_millis(config.lock_timeout_ms));

            let outcomes = scheduler.run_due_billing(tenant, reference_date).await?;
            if outcomes.is_empty() {
                println!("No contracts due on {}", reference_date);
                return Ok(());
            }
            for run in &outcomes {
                match &run.document_id {
                    Some(document_id) => println!(
                        "{}  {}  {}  document {}",
                        run.contract_id, run.run_date, run.status, document_id
                    ),
                    None => println!(
                        "{}  {}  {}  {}",
                        run.contract_id,
                        run.run_date,
                        run.status,
                        run.message.as_deref().unwrap_or("-")
                    ),
                }
            }
        }
        Command::History { contract } => {
            let store = PostgresBillingAdapter::new(pool);
            let runs = store
                .runs_for_contract(ContractId::from_uuid(contract))
                .await?;
            if runs.is_empty() {
                println!("No runs recorded for contract {}", contract);
                return Ok(());
            }
            for run in &runs {
                println!(
                    "{}  {}  {}",
                    run.run_date,
                    run.status,
                    run.message
                        .as_deref()
                        .or(run.document_id.as_ref().map(|_| "document generated"))
                        .unwrap_or("-")
                );
            }
        }
        Command::Migrate => {
            run_migrations(&pool).await?;
            println!("Migrations applied");
        }
    }

    Ok(())
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}
