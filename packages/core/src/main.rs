use std::sync::Arc;

use clap::Parser;
use dotenvy::dotenv;
use tokio::net::TcpListener;
use tokio::signal;

use clinic_ledger::api;
use clinic_ledger::cli::{Cli, Command};
use clinic_ledger::config::Config;
use clinic_ledger::db::create_pool;
use clinic_ledger::error::AppError;
use clinic_ledger::ledger::{run_monthly_carry_forward, PayeeCategory, Period};
use clinic_ledger::logging::init_logging;
use clinic_ledger::metrics::AppMetrics;
use clinic_ledger::repository::SqlPayeeRepository;

#[tokio::main]
async fn main() {
    dotenv().ok();
    init_logging();

    let cli = Cli::parse();

    let config = Config::from_env(&cli)
        .map_err(AppError::Config)
        .unwrap_or_else(|err| {
            tracing::error!("{}", err);
            std::process::exit(1);
        });

    tracing::info!("Service started with config: {:?}", config);

    if let Err(err) = run(cli.command.unwrap_or(Command::Serve), config).await {
        tracing::error!("{}", err);
        std::process::exit(1);
    }
}

async fn run(command: Command, config: Config) -> Result<(), AppError> {
    let pool = create_pool(&config.database_url).await?;

    match command {
        Command::Serve => serve(pool, &config).await,
        Command::CarryForward {
            category,
            month,
            year,
        } => carry_forward_once(pool, category, month, year).await,
    }
}

async fn serve(pool: sqlx::SqlitePool, config: &Config) -> Result<(), AppError> {
    let metrics = Arc::new(
        AppMetrics::new().map_err(|err| AppError::Config(format!("metrics: {}", err)))?,
    );
    let app = api::create_router(pool, metrics);

    let listener = TcpListener::bind(config.listen_addr)
        .await
        .map_err(|err| AppError::Config(format!("cannot bind {}: {}", config.listen_addr, err)))?;
    tracing::info!("Listening on {}", config.listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            signal::ctrl_c().await.ok();
            tracing::info!("Shutdown signal received. Stopping server.");
        })
        .await
        .map_err(|err| AppError::Config(format!("server error: {}", err)))?;

    tracing::info!("Server stopped cleanly");
    Ok(())
}

async fn carry_forward_once(
    pool: sqlx::SqlitePool,
    category: PayeeCategory,
    month: u32,
    year: i32,
) -> Result<(), AppError> {
    let period = Period::new(month, year)?;
    let repository = SqlPayeeRepository::new(pool, category);
    let outcome = run_monthly_carry_forward(&repository, period).await?;

    println!(
        "{} {}: {} records processed, {} carried forward",
        category, period, outcome.records_processed, outcome.carry_forward_updates
    );
    Ok(())
}
