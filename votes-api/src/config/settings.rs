//! Settings read from the environment.
use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use tracing::warn;

use crate::errors::ApiError;

/// Default bind address.
const DEFAULT_SERVER_HOST: IpAddr = IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1));

/// Default HTTP port.
const DEFAULT_SERVER_PORT: u16 = 4000;

/// Default upper bound of pooled database connections.
const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Default number of replays of a conflicting vote transaction.
const DEFAULT_CONFLICT_RETRIES: usize = 3;

/// Default origin allowed by CORS, the web client in development.
const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human readable console output.
    Pretty,
    /// One JSON object per line.
    Json,
}

impl LogFormat {
    /// "json" in any case selects `Json`; anything else is `Pretty`.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some(f) if f.trim().eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }

    /// Reads `LOG_FORMAT` ("json" or "pretty", default pretty). Read on its own
    /// so tracing is up before `Settings` parsing logs anything.
    pub fn from_env() -> Self {
        Self::parse(env::var("LOG_FORMAT").ok().as_deref())
    }
}

/// Runtime settings of the API server.
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub host: IpAddr,
    pub port: u16,
    pub max_connections: u32,
    pub conflict_retries: usize,
    pub run_migrations: bool,
    pub cors_origin: String,
}

impl Settings {
    /// Reads settings from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `DATABASE_URL`: PostgreSQL connection string (required)
    /// - `SERVER_HOST`: Bind address (default: 127.0.0.1)
    /// - `SERVER_PORT`: HTTP port (default: 4000)
    /// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
    /// - `VOTE_CONFLICT_RETRIES`: Replays of a conflicting vote (default: 3)
    /// - `RUN_MIGRATIONS`: Apply schema migrations on startup (default: true)
    /// - `CORS_ORIGIN`: Allowed browser origin (default: http://localhost:3000)
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads settings through `lookup`, which maps a variable name to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ApiError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url =
            lookup("DATABASE_URL").ok_or_else(|| ApiError::config("DATABASE_URL must be set"))?;

        Ok(Self {
            database_url,
            host: parse_or("SERVER_HOST", &lookup, DEFAULT_SERVER_HOST),
            port: parse_or("SERVER_PORT", &lookup, DEFAULT_SERVER_PORT),
            max_connections: parse_or("DATABASE_MAX_CONNECTIONS", &lookup, DEFAULT_MAX_CONNECTIONS),
            conflict_retries: parse_or("VOTE_CONFLICT_RETRIES", &lookup, DEFAULT_CONFLICT_RETRIES),
            run_migrations: parse_or("RUN_MIGRATIONS", &lookup, true),
            cors_origin: lookup("CORS_ORIGIN").unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_string()),
        })
    }

    /// Address the HTTP server binds to.
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse_or<T, F>(key: &str, lookup: &F, default: T) -> T
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, "Invalid setting, using default");
            default
        }),
    }
}
