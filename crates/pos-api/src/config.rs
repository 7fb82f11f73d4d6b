//! Server configuration read from the environment.

use std::net::SocketAddr;

use pos_orders::application::payment::{
    DEFAULT_MOMO_URL, DEFAULT_VNPAY_URL, DEFAULT_ZALOPAY_URL, RedirectPaymentProvider,
};
use url::Url;

use crate::error::AppError;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per line.
    Json,
    /// Human-readable, for local development.
    Pretty,
}

/// Everything the server reads at start-up.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Interface to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// PostgreSQL URL; `None` selects the in-memory event store.
    pub database_url: Option<String>,
    /// Pool size for PostgreSQL.
    pub database_max_connections: u32,
    /// Log output format.
    pub log_format: LogFormat,
    /// Roles that receive order notifications; empty means everyone.
    pub realtime_roles: Vec<String>,
    /// Whether station-bound clients only see their station's orders.
    pub realtime_station_scoped: bool,
    /// VNPAY checkout base.
    pub vnpay_url: Url,
    /// MoMo checkout base.
    pub momo_url: Url,
    /// ZaloPay checkout base.
    pub zalopay_url: Url,
}

impl AppConfig {
    /// Reads the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` for values that do not parse.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name
    /// to its value.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` for values that do not parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match var("PORT") {
            Some(raw) => raw
                .parse()
                .map_err(|e| AppError::Config(format!("PORT must be a valid u16: {e}")))?,
            None => 3000,
        };
        let database_max_connections = match var("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => raw.parse().map_err(|e| {
                AppError::Config(format!(
                    "DATABASE_MAX_CONNECTIONS must be a positive integer: {e}"
                ))
            })?,
            None => 10,
        };
        let log_format = match var("LOG_FORMAT").as_deref() {
            None | Some("json") => LogFormat::Json,
            Some("pretty") => LogFormat::Pretty,
            Some(other) => {
                return Err(AppError::Config(format!(
                    "LOG_FORMAT must be json or pretty, got {other}"
                )));
            }
        };
        let realtime_station_scoped = match var("REALTIME_STATION_SCOPED").as_deref() {
            None | Some("false" | "0") => false,
            Some("true" | "1") => true,
            Some(other) => {
                return Err(AppError::Config(format!(
                    "REALTIME_STATION_SCOPED must be true or false, got {other}"
                )));
            }
        };
        let url = |key: &str, default: &str| {
            let raw = var(key).unwrap_or_else(|| default.to_owned());
            Url::parse(&raw).map_err(|e| AppError::Config(format!("{key} is not a valid URL: {e}")))
        };

        Ok(Self {
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".to_owned()),
            port,
            database_url: var("DATABASE_URL"),
            database_max_connections,
            log_format,
            realtime_roles: var("REALTIME_ROLES")
                .map(|raw| {
                    raw.split(',')
                        .map(str::trim)
                        .filter(|role| !role.is_empty())
                        .map(str::to_owned)
                        .collect()
                })
                .unwrap_or_default(),
            realtime_station_scoped,
            vnpay_url: url("VNPAY_URL", DEFAULT_VNPAY_URL)?,
            momo_url: url("MOMO_URL", DEFAULT_MOMO_URL)?,
            zalopay_url: url("ZALOPAY_URL", DEFAULT_ZALOPAY_URL)?,
        })
    }

    /// Socket address to bind.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `HOST:PORT` is not a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, AppError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))
    }

    /// Payment provider built from the configured checkout bases.
    #[must_use]
    pub fn payment_provider(&self) -> RedirectPaymentProvider {
        RedirectPaymentProvider::new(
            self.vnpay_url.clone(),
            self.momo_url.clone(),
            self.zalopay_url.clone(),
        )
    }
}
