use vitrine_core::inventory::{CheckoutStrategy, DEFAULT_LOCK_WINDOW_MINS};

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields except secrets have sensible defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// JWT token configuration (secret, expiry duration).
    pub jwt: JwtConfig,
    /// Inventory engine configuration (lock window, sweeper, checkout).
    pub inventory: InventoryConfig,
}

/// Configuration of the inventory concurrency engine.
#[derive(Debug, Clone)]
pub struct InventoryConfig {
    /// Reservation lifetime in minutes (default: `10`).
    pub lock_window_mins: i64,
    /// Whether the background expiry sweeper is spawned (default: `true`).
    pub sweep_enabled: bool,
    /// Interval between background sweep passes in seconds (default: `60`).
    pub sweep_interval_secs: u64,
    /// Minimum gap between manual sweep triggers in seconds (default: `5`).
    pub manual_sweep_min_interval_secs: u64,
    /// The single active checkout strategy (default: `pre_lock`).
    pub checkout_strategy: CheckoutStrategy,
    /// Shared secret for HMAC-signing payment confirmation webhooks.
    pub payment_webhook_secret: String,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                          | Default     |
    /// |----------------------------------|-------------|
    /// | `HOST`                           | `0.0.0.0`   |
    /// | `PORT`                           | `3000`      |
    /// | `CORS_ORIGINS`                   | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`           | `30`        |
    /// | `LOCK_WINDOW_MINS`               | `10`        |
    /// | `SWEEP_ENABLED`                  | `true`      |
    /// | `SWEEP_INTERVAL_SECS`            | `60`        |
    /// | `MANUAL_SWEEP_MIN_INTERVAL_SECS` | `5`         |
    /// | `CHECKOUT_STRATEGY`              | `pre_lock`  |
    /// | `PAYMENT_WEBHOOK_SECRET`         | -- required  |
    ///
    /// # Panics
    ///
    /// Panics on a malformed value or a missing required secret; we want
    /// misconfiguration to fail at startup, not at first request.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            jwt: JwtConfig::from_env(),
            inventory: InventoryConfig::from_env(),
        }
    }
}

impl InventoryConfig {
    /// Load inventory engine settings from environment variables.
    pub fn from_env() -> Self {
        let lock_window_mins: i64 = std::env::var("LOCK_WINDOW_MINS")
            .unwrap_or_else(|_| DEFAULT_LOCK_WINDOW_MINS.to_string())
            .parse()
            .expect("LOCK_WINDOW_MINS must be a valid i64");

        let sweep_enabled: bool = std::env::var("SWEEP_ENABLED")
            .unwrap_or_else(|_| "true".into())
            .parse()
            .expect("SWEEP_ENABLED must be true or false");

        let sweep_interval_secs: u64 = std::env::var("SWEEP_INTERVAL_SECS")
            .unwrap_or_else(|_| "60".into())
            .parse()
            .expect("SWEEP_INTERVAL_SECS must be a valid u64");

        let manual_sweep_min_interval_secs: u64 =
            std::env::var("MANUAL_SWEEP_MIN_INTERVAL_SECS")
                .unwrap_or_else(|_| "5".into())
                .parse()
                .expect("MANUAL_SWEEP_MIN_INTERVAL_SECS must be a valid u64");

        let checkout_strategy: CheckoutStrategy = std::env::var("CHECKOUT_STRATEGY")
            .unwrap_or_else(|_| "pre_lock".into())
            .parse()
            .expect("CHECKOUT_STRATEGY must be 'pre_lock' or 'pay_to_commit'");

        let payment_webhook_secret = std::env::var("PAYMENT_WEBHOOK_SECRET")
            .expect("PAYMENT_WEBHOOK_SECRET must be set in the environment");
        assert!(
            !payment_webhook_secret.is_empty(),
            "PAYMENT_WEBHOOK_SECRET must not be empty"
        );

        Self {
            lock_window_mins,
            sweep_enabled,
            sweep_interval_secs,
            manual_sweep_min_interval_secs,
            checkout_strategy,
            payment_webhook_secret,
        }
    }
}
