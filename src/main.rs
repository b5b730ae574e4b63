use identity_service::{
    build_router,
    config::Config,
    db,
    services::{
        AuthService, LogNotifier, Notifier, SmtpNotifier, TokenCodec, TokenLedger, UserService,
    },
    store::postgres::PgStore,
    AppState,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Load configuration - fail fast if invalid
    let config = Config::from_env()?;

    identity_service::init_tracing(&config.log_level);

    tracing::info!(
        service = %config.service_name,
        environment = ?config.environment,
        "Starting identity service"
    );

    tracing::info!("Connecting to database");
    let pool = db::create_pool(&config.database).await?;
    db::run_migrations(&pool).await?;
    tracing::info!("Database ready");

    let store = Arc::new(PgStore::new(pool));

    let notifier: Arc<dyn Notifier> = match &config.smtp {
        Some(smtp) => Arc::new(SmtpNotifier::new(smtp, config.base_url.clone())?),
        None => {
            tracing::warn!("SMTP not configured, notification emails will be logged only");
            Arc::new(LogNotifier)
        }
    };

    let codec = TokenCodec::new(&config.jwt);
    let ledger = TokenLedger::new(store.clone());
    let auth = AuthService::new(
        store.clone(),
        ledger,
        codec.clone(),
        notifier,
        config.jwt.clone(),
    );
    let users = UserService::new(store.clone());

    if let Some(bootstrap) = &config.bootstrap {
        users
            .bootstrap_admin(&bootstrap.admin_email, &bootstrap.admin_password)
            .await?;
    }

    let state = AppState {
        config: config.clone(),
        store,
        codec,
        auth,
        users,
    };

    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
