//! Report Reminder entry point.

use std::sync::Arc;

use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use report_reminder::adapters::postgres::{
    run_migrations, PostgresCycleRepository, PostgresRosterDirectory, PostgresStatusStore,
};
use report_reminder::adapters::{
    ReminderScheduler, TelegramClient, TelegramNotifier, TelegramUpdatePoller,
};
use report_reminder::application::workflow::{WorkflowEngine, WorkflowSettings};
use report_reminder::application::ResponseIngress;
use report_reminder::config::{AppConfig, LoggingConfig};
use report_reminder::ports::{Clock, SystemClock};

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.log_level));
    let registry = tracing_subscriber::registry().with(filter);
    if logging.json_output() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Waits for Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(error = %err, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received SIGINT, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config.logging);
    config.validate()?;

    info!(
        production = config.is_production(),
        timezone = %config.scheduler.timezone,
        "Starting report reminder"
    );

    let pool = config.database.connect().await?;
    info!("Connected to database");
    if config.database.run_migrations {
        run_migrations(&pool).await?;
        info!("Migrations completed");
    }

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let telegram = Arc::new(TelegramClient::new(&config.telegram)?);
    let settings = WorkflowSettings {
        first_reminder_delay: config.scheduler.first_reminder_delay(),
        supervisor_chat_id: config.telegram.supervisor_chat(),
        timezone: config.scheduler.tz()?,
    };
    if settings.supervisor_chat_id.is_none() {
        warn!("Supervisor chat not configured, completion notices will be skipped");
    }

    let engine = Arc::new(WorkflowEngine::new(
        Arc::new(PostgresCycleRepository::new(pool.clone())),
        Arc::new(PostgresStatusStore::new(pool.clone())),
        Arc::new(PostgresRosterDirectory::new(pool.clone())),
        Arc::new(TelegramNotifier::new(telegram.clone())),
        clock.clone(),
        settings,
    ));
    let ingress = Arc::new(ResponseIngress::new(engine.clone()));

    let scheduler = Arc::new(ReminderScheduler::from_config(
        engine,
        clock,
        &config.scheduler,
    )?);
    let poller = TelegramUpdatePoller::new(telegram, ingress);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler_task = tokio::spawn(scheduler.run(shutdown_rx.clone()));
    let poller_task = tokio::spawn(async move { poller.run(shutdown_rx).await });

    shutdown_signal().await;
    shutdown_tx.send(true)?;

    scheduler_task.await?;
    poller_task.await??;
    pool.close().await;
    info!("Shutdown complete");
    Ok(())
}
