use std::env;
use std::time::Duration;

/// Environment variable names - single source of truth
pub mod env_vars {
    pub const PORT: &str = "PORT";
    pub const DATABASE_URL: &str = "DATABASE_URL";
    /// Maximum number of pooled SQLite connections.
    pub const DB_POOL_SIZE: &str = "DB_POOL_SIZE";
    /// Milliseconds a connection waits on a locked database before failing.
    pub const DB_BUSY_TIMEOUT_MS: &str = "DB_BUSY_TIMEOUT_MS";
    /// Lifetime of a bearer session token, pushed out again on every use.
    pub const SESSION_TTL_HOURS: &str = "SESSION_TTL_HOURS";
}

/// Default values
pub mod defaults {
    pub const PORT: u16 = 8080;
    pub const DATABASE_URL: &str = "./.db/notes.db";
    pub const DB_POOL_SIZE: u32 = 8;
    pub const DB_BUSY_TIMEOUT_MS: u64 = 5_000;
    pub const SESSION_TTL_HOURS: i64 = 24;
    /// Password given to accounts made by the bootstrap commands.
    pub const BOOTSTRAP_PASSWORD: &str = "Test@1234";
}

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub db_pool_size: u32,
    pub db_busy_timeout: Duration,
    pub session_ttl_hours: i64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: parse_env(env_vars::PORT, defaults::PORT),
            database_url: env::var(env_vars::DATABASE_URL)
                .unwrap_or_else(|_| defaults::DATABASE_URL.to_string()),
            db_pool_size: parse_env(env_vars::DB_POOL_SIZE, defaults::DB_POOL_SIZE).max(1),
            db_busy_timeout: Duration::from_millis(parse_env(
                env_vars::DB_BUSY_TIMEOUT_MS,
                defaults::DB_BUSY_TIMEOUT_MS,
            )),
            session_ttl_hours: parse_env(env_vars::SESSION_TTL_HOURS, defaults::SESSION_TTL_HOURS)
                .max(1),
        }
    }

    /// Config pointing at an arbitrary database file, everything else default.
    pub fn for_database(database_url: impl Into<String>) -> Self {
        Self {
            port: defaults::PORT,
            database_url: database_url.into(),
            db_pool_size: defaults::DB_POOL_SIZE,
            db_busy_timeout: Duration::from_millis(defaults::DB_BUSY_TIMEOUT_MS),
            session_ttl_hours: defaults::SESSION_TTL_HOURS,
        }
    }
}

/// Read and parse an env var, falling back to `default` when unset or invalid.
fn parse_env<T: std::str::FromStr + std::fmt::Display + Copy>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            log::warn!("Ignoring invalid {}={:?}, using {}", name, raw, default);
            default
        }),
        Err(_) => default,
    }
}
