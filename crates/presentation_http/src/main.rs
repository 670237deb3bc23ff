//! Forecast HTTP Server
//!
//! Main entry point: serves the HTTP API, consumes observations from the
//! message channel and runs the background jobs.

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context;
use application::{
    ports::{ForecastMetricsPort, ForecastStorePort, NoopForecastMetrics, ObservationChannelPort},
    services::{
        ForecastIntakeService, ForecastProcessor, ForecastPublisher, ForecastReconciler,
        ForecastService,
    },
};
use clap::Parser;
use infrastructure::{
    AppConfig, AsyncDatabase, InMemoryObservationChannel, LogFormat, PrometheusForecastMetrics,
    RedisObservationChannel, SchedulerConfig, SqliteForecastStore, TaskScheduler,
    register_heartbeat,
};
use presentation_http::{
    create_router, set_expose_internal_errors, state::AppState, tasks::spawn_forecast_intake_task,
};
use tokio::{net::TcpListener, signal, sync::watch};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Weather forecast server
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Run database migrations and exit
    #[arg(long)]
    migrate: bool,

    /// Configuration file (defaults to ./config.toml when present)
    #[arg(long, env = "FORECAST_CONFIG")]
    config: Option<PathBuf>,
}

fn init_tracing(log_format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "forecast_server=debug,tower_http=debug,info".into());
    let registry = tracing_subscriber::registry().with(filter);

    match log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    if config.server.allowed_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        use axum::http::{HeaderValue, Method};
        let origins: Vec<HeaderValue> = config
            .server
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers(Any)
    }
}

async fn connect_channel(config: &AppConfig) -> anyhow::Result<Arc<dyn ObservationChannelPort>> {
    let queue = &config.queue;
    match &queue.redis_url {
        Some(url) => {
            let channel = RedisObservationChannel::connect(url, queue.into())
                .await
                .context("Failed to connect to Redis")?;
            info!(stream = %queue.stream_key, "Using Redis Streams observation channel");
            Ok(Arc::new(channel))
        },
        None => {
            info!("No Redis URL configured, using in-process observation channel");
            Ok(Arc::new(InMemoryObservationChannel::new(
                Duration::from_millis(queue.block_ms),
                Duration::from_millis(queue.redelivery_after_ms),
            )))
        },
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let loaded = AppConfig::load_from(args.config.as_deref());
    let config = loaded.as_ref().cloned().unwrap_or_default();
    init_tracing(config.server.log_format);
    if let Err(e) = &loaded {
        warn!("Failed to load config, using defaults: {}", e);
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment,
        "Forecast server starting"
    );
    set_expose_internal_errors(!config.is_production());

    // Database
    let db = AsyncDatabase::new(&config.database.to_pool_config())
        .await
        .context("Failed to open database")?;

    if args.migrate {
        info!("Migrating database");
        db.migrate().await.context("Migration failed")?;
        db.close().await;
        return Ok(());
    }
    if config.database.run_migrations {
        db.migrate().await.context("Migration failed")?;
    }

    let store: Arc<dyn ForecastStorePort> = Arc::new(SqliteForecastStore::new(db.pool().clone()));

    // Metrics
    let prometheus = config
        .metrics
        .enabled
        .then(|| Arc::new(PrometheusForecastMetrics::new()));
    let metrics: Arc<dyn ForecastMetricsPort> = match &prometheus {
        Some(p) => p.clone(),
        None => Arc::new(NoopForecastMetrics),
    };

    let channel = connect_channel(&config).await?;

    // Jobs
    let mut processor = ForecastProcessor::new(Arc::clone(&store), Arc::clone(&metrics))
        .with_delay(Duration::from_millis(config.scheduler.job_delay_ms));
    let scheduler = if config.scheduler.enabled {
        let scheduler = Arc::new(TaskScheduler::new(SchedulerConfig::default()).await?);
        processor = processor.with_scheduler(scheduler.clone());
        register_heartbeat(&scheduler, processor.clone(), &config.scheduler.heartbeat_cron)
            .await?;
        Some(scheduler)
    } else {
        info!("Job scheduler disabled");
        None
    };

    // Intake
    let reconciler = ForecastReconciler::new(Arc::clone(&store), Arc::clone(&metrics));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let intake_handle = config.queue.intake_enabled.then(|| {
        let intake = ForecastIntakeService::new(reconciler, Arc::clone(&channel), Arc::clone(&metrics))
            .with_max_deliveries(config.queue.max_deliveries);
        spawn_forecast_intake_task(Arc::new(intake), config.queue.batch_size, shutdown_rx)
    });

    let config = Arc::new(config);
    let state = AppState {
        forecast_service: Arc::new(ForecastService::new(Arc::clone(&store))),
        publisher: Arc::new(ForecastPublisher::new(channel)),
        processor: Arc::new(processor),
        store,
        metrics: prometheus,
        config: Arc::clone(&config),
    };

    let mut app = create_router(state).layer(TraceLayer::new_for_http());
    if config.server.cors_enabled {
        app = app.layer(cors_layer(&config));
    }

    let addr = config.server.bind_address();
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    info!("API docs: http://{}/swagger-ui/", addr);

    let shutdown_timeout = config.server.shutdown_timeout();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Background work gets the same grace period as open connections
    let _ = shutdown_tx.send(true);
    if let Some(handle) = intake_handle {
        if tokio::time::timeout(shutdown_timeout, handle).await.is_err() {
            warn!("Intake task did not stop within {:?}", shutdown_timeout);
        }
    }
    if let Some(scheduler) = scheduler {
        scheduler.stop().await?;
    }
    db.close().await;

    info!("Server shutdown complete");
    Ok(())
}

/// Wait for SIGINT or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}
