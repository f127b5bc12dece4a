use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vitrine_api::auth::password::hash_password;
use vitrine_api::background::stock_sweeper::{self, SweeperHandle};
use vitrine_api::config::ServerConfig;
use vitrine_api::router::build_app_router;
use vitrine_api::state::AppState;
use vitrine_core::roles::ROLE_ADMIN;
use vitrine_db::repositories::UserRepo;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vitrine_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = vitrine_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    vitrine_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    vitrine_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Admin bootstrap ---
    bootstrap_admin(&pool).await;

    // --- Expiry sweeper ---
    let sweeper = Arc::new(SweeperHandle::new(config.inventory.sweep_enabled));
    let sweep_cancel = tokio_util::sync::CancellationToken::new();
    let sweep_handle = if config.inventory.sweep_enabled {
        Some(tokio::spawn(stock_sweeper::run(
            pool.clone(),
            Arc::clone(&sweeper),
            Duration::from_secs(config.inventory.sweep_interval_secs),
            sweep_cancel.clone(),
        )))
    } else {
        tracing::warn!("Stock sweeper disabled; expired reservations will not be released");
        None
    };

    // --- App state & router ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        sweeper,
    };
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    sweep_cancel.cancel();
    if let Some(handle) = sweep_handle {
        let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
    }
    tracing::info!("Stock sweeper stopped");

    tracing::info!("Graceful shutdown complete");
}

/// Create the first admin account from `ADMIN_EMAIL` / `ADMIN_PASSWORD`
/// when the users table is empty. Registration only creates customers,
/// so without this there would be no way to reach the admin endpoints.
async fn bootstrap_admin(pool: &vitrine_db::DbPool) {
    let count = UserRepo::count(pool)
        .await
        .expect("Failed to count users during bootstrap");
    if count > 0 {
        return;
    }

    let (Ok(email), Ok(password)) = (
        std::env::var("ADMIN_EMAIL"),
        std::env::var("ADMIN_PASSWORD"),
    ) else {
        tracing::warn!(
            "No users exist and ADMIN_EMAIL/ADMIN_PASSWORD are unset; admin endpoints unreachable"
        );
        return;
    };

    let password_hash = hash_password(&password).expect("Failed to hash bootstrap admin password");
    let user = UserRepo::create(pool, &email, &password_hash, ROLE_ADMIN)
        .await
        .expect("Failed to create bootstrap admin");
    tracing::info!(user_id = user.id, "Bootstrap admin account created");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager (e.g. systemd, Docker, Kubernetes).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
