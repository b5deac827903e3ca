//! Runs the lead pipeline reminder sweep against `PostgreSQL`.
//!
//! Usage:
//!
//! ```text
//! leadflow-sweep <config-path>
//! ```
//!
//! `config-path` names a TOML file deserialized into
//! [`PipelineConfig`]. `DATABASE_URL` names the database holding the
//! pipeline tables and `RUST_LOG` sets the log filter (default `info`).
//! Reminders are written to the log. The process polls until interrupted.

use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool, PoolError};
use leadflow::config::{ConfigError, PipelineConfig};
use leadflow::pipeline::{
    adapters::{
        log::LogNotificationSink,
        postgres::{PipelinePgPool, PostgresPipelineRepository},
    },
    domain::{StageCatalog, StageRulesError},
    ports::{PipelineRepositoryError, StageRepository},
    services::{ReminderSweepService, SweepSettings, SweepTrigger},
};
use mockable::DefaultClock;
use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::runtime::Builder;
use tokio::sync::watch;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

const DATABASE_URL_ENV: &str = "DATABASE_URL";

/// Boxed error type for the main result.
type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can stop the sweep runner.
#[derive(Debug, Error)]
enum SweepRunnerError {
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
    #[error("DATABASE_URL is not set")]
    MissingDatabaseUrl,
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to build connection pool: {0}")]
    Pool(#[source] PoolError),
    #[error("failed to load stages: {0}")]
    Stages(#[source] PipelineRepositoryError),
    #[error("stage rules do not match the stage registry: {0}")]
    Rules(#[source] StageRulesError),
    #[error("runtime init failed: {0}")]
    RuntimeInit(#[source] std::io::Error),
}

fn main() -> Result<(), BoxError> {
    init_tracing();
    let config_path = parse_args(std::env::args_os().skip(1))?;
    let config = PipelineConfig::load(&config_path).map_err(SweepRunnerError::from)?;
    if !config.sweep.enabled {
        info!("reminder sweep disabled by configuration");
        return Ok(());
    }
    let settings = config.sweep_settings().map_err(SweepRunnerError::from)?;
    let pool = build_pool()?;

    let runtime = Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(SweepRunnerError::RuntimeInit)?;
    runtime
        .block_on(run_sweep(&config, settings, pool))
        .map_err(Into::into)
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

fn parse_args(mut args: impl Iterator<Item = OsString>) -> Result<PathBuf, SweepRunnerError> {
    let path = args.next().ok_or_else(|| {
        SweepRunnerError::InvalidArgs("usage: leadflow-sweep <config-path>".to_owned())
    })?;
    if args.next().is_some() {
        return Err(SweepRunnerError::InvalidArgs(
            "expected exactly one configuration path".to_owned(),
        ));
    }
    Ok(PathBuf::from(path))
}

fn build_pool() -> Result<PipelinePgPool, SweepRunnerError> {
    let database_url =
        std::env::var(DATABASE_URL_ENV).map_err(|_| SweepRunnerError::MissingDatabaseUrl)?;
    Pool::builder()
        .build(ConnectionManager::<PgConnection>::new(database_url))
        .map_err(SweepRunnerError::Pool)
}

async fn run_sweep(
    config: &PipelineConfig,
    settings: SweepSettings,
    pool: PipelinePgPool,
) -> Result<(), SweepRunnerError> {
    let repository = Arc::new(PostgresPipelineRepository::new(pool));
    let catalog = StageCatalog::new(
        repository
            .list_ordered()
            .await
            .map_err(SweepRunnerError::Stages)?,
    );
    config
        .rules
        .validate_against(&catalog)
        .map_err(SweepRunnerError::Rules)?;

    let mut sweep = ReminderSweepService::new(
        Arc::clone(&repository),
        Arc::clone(&repository),
        Arc::clone(&repository),
        Arc::new(LogNotificationSink),
        Arc::new(DefaultClock),
        settings,
    );
    // No push channel is wired here; passes run on the polling interval.
    let trigger = SweepTrigger::new();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let poll_interval = config.poll_interval();

    info!(stages = catalog.len(), "starting reminder sweep");
    tokio::join!(
        sweep.run(poll_interval, &trigger, shutdown_rx),
        wait_for_interrupt(&shutdown_tx),
    );
    Ok(())
}

async fn wait_for_interrupt(shutdown: &watch::Sender<bool>) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("interrupt received, stopping reminder sweep"),
        Err(err) => error!(error = %err, "failed to listen for interrupt, stopping"),
    }
    if shutdown.send(true).is_err() {
        debug!("reminder sweep already stopped");
    }
}
