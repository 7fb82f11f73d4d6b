//! POS API server entry point.

use std::sync::Arc;

use pos_core::clock::SystemClock;
use pos_core::repository::EventRepository;
use pos_event_store::{InMemoryEventRepository, PgEventRepository, run_migrations};
use pos_orders::domain::notifications::OrderNotification;
use pos_realtime::registry::ClientInfo;
use pos_realtime::{Audience, ConnectionRegistry, RoleAudience, SocketGateway, StationAudience};
use sqlx::postgres::PgPoolOptions;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use pos_api::app::build_router;
use pos_api::config::{AppConfig, LogFormat};
use pos_api::error::AppError;
use pos_api::state::AppState;

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.pretty().init(),
    }
}

async fn event_repository(config: &AppConfig) -> Result<Arc<dyn EventRepository>, AppError> {
    let Some(database_url) = &config.database_url else {
        warn!("DATABASE_URL not set, orders are kept in memory only");
        return Ok(Arc::new(InMemoryEventRepository::new()));
    };

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(database_url)
        .await?;
    run_migrations(&pool).await?;
    info!("connected to PostgreSQL event store");
    Ok(Arc::new(PgEventRepository::new(pool)))
}

fn audience(config: &AppConfig) -> impl Audience + 'static {
    let roles = (!config.realtime_roles.is_empty())
        .then(|| RoleAudience::new(config.realtime_roles.iter().cloned()));
    let station_scoped = config.realtime_station_scoped;
    info!(
        roles = ?config.realtime_roles,
        station_scoped,
        "real-time audience configured"
    );
    move |client: &ClientInfo, notification: &OrderNotification| {
        roles
            .as_ref()
            .is_none_or(|roles| roles.includes(client, notification))
            && (!station_scoped || StationAudience.includes(client, notification))
    }
}

async fn shutdown_signal(registry: Arc<ConnectionRegistry>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received Ctrl+C"),
        () = terminate => info!("received terminate signal"),
    }

    // Open sockets would otherwise hold the graceful shutdown forever.
    registry.close_all();
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            return Err(AppError::Config(format!(".env could not be loaded: {e}")));
        }
    }
    let config = AppConfig::from_env()?;
    init_tracing(config.log_format);

    info!("starting POS API server");

    let event_repository = event_repository(&config).await?;
    let registry = Arc::new(ConnectionRegistry::new());
    let gateway = Arc::new(SocketGateway::with_audience(
        Arc::clone(&registry),
        audience(&config),
    ));
    let state = AppState::with_gateway(
        Arc::new(SystemClock),
        event_repository,
        Arc::new(config.payment_provider()),
        gateway,
    );
    let app = build_router(state);

    let addr = config.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(registry))
        .await?;

    info!("POS API server stopped");
    Ok(())
}
