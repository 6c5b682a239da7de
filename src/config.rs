use std::str::FromStr;

use anyhow::Context;
use sqlx::postgres::{PgConnectOptions, PgSslMode};

#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// `None` when `JWT_SECRET` is unset or empty; token calls fail until it is provided.
    pub secret: Option<String>,
    pub issuer: String,
    pub audience: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Debug,
    Release,
}

impl RunMode {
    fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "release" | "production" | "prod" => RunMode::Release,
            _ => RunMode::Debug,
        }
    }

    /// Default `RUST_LOG` filter for this mode.
    pub fn default_log_filter(self) -> &'static str {
        match self {
            RunMode::Debug => "taskmind=debug,axum=info,tower_http=info",
            RunMode::Release => "taskmind=info,axum=warn,tower_http=info",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// From `DATABASE_URL`, or built field by field from the `DB_*` variables
    /// so credentials never pass through URL parsing.
    pub database: PgConnectOptions,
    pub jwt: JwtConfig,
    pub host: String,
    pub port: u16,
    pub mode: RunMode,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database = match get("DATABASE_URL") {
            Some(url) => PgConnectOptions::from_str(&url).context("invalid DATABASE_URL")?,
            None => {
                let host = get("DB_HOST")
                    .ok_or_else(|| anyhow::anyhow!("DATABASE_URL or DB_HOST must be set"))?;
                let port = match get("DB_PORT") {
                    Some(raw) => raw
                        .parse::<u16>()
                        .map_err(|e| anyhow::anyhow!("invalid DB_PORT {raw:?}: {e}"))?,
                    None => 5432,
                };
                let ssl_mode = match get("DB_SSLMODE") {
                    Some(raw) => PgSslMode::from_str(&raw).context("invalid DB_SSLMODE")?,
                    None => PgSslMode::Disable,
                };
                let mut options = PgConnectOptions::new_without_pgpass()
                    .host(&host)
                    .port(port)
                    .username(&get("DB_USER").unwrap_or_else(|| "postgres".into()))
                    .database(&get("DB_NAME").unwrap_or_else(|| "taskmind".into()))
                    .ssl_mode(ssl_mode);
                if let Some(password) = lookup("DB_PASSWORD").filter(|p| !p.is_empty()) {
                    options = options.password(&password);
                }
                options
            }
        };

        let jwt = JwtConfig {
            secret: get("JWT_SECRET"),
            issuer: get("JWT_ISSUER").unwrap_or_else(|| "taskmind".into()),
            audience: get("JWT_AUDIENCE").unwrap_or_else(|| "taskmind-users".into()),
        };

        let port = match get("PORT").or_else(|| get("APP_PORT")) {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|e| anyhow::anyhow!("invalid PORT {raw:?}: {e}"))?,
            None => 9090,
        };

        Ok(Self {
            database,
            jwt,
            host: get("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            mode: get("APP_MODE")
                .map(|m| RunMode::parse(&m))
                .unwrap_or(RunMode::Debug),
        })
    }
}
