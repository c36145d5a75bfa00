use anyhow::{Context, Result};
use std::{str::FromStr, time::Duration};

/// Which [`Storage`](crate::storage::Storage) implementation to run with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Sqlite,
    /// Everything is lost on restart.
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "memory" => Ok(Self::Memory),
            other => anyhow::bail!("unknown storage backend '{other}' (expected sqlite or memory)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// SQLite connection string, e.g. "sqlite:./tinylink.db"
    pub database_url: String,

    pub storage_backend: StorageBackend,

    /// Host to bind the HTTP server to, e.g. "0.0.0.0"
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Public base URL used when building short links, e.g. "https://go.example.com".
    /// Never has a trailing slash.
    pub base_url: String,

    /// Deadline for a whole API request, storage calls included.
    pub request_timeout: Duration,

    /// Deadline for one background access-count increment.
    pub increment_timeout: Duration,

    /// How many increments may wait in the queue before new ones are dropped.
    pub increment_queue_capacity: usize,
}

impl AppConfig {
    /// Load configuration from environment variables (populated by dotenvy before this is called).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup. Missing keys fall back to
    /// their defaults; present but unparsable values are errors.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let port = parse_or(&lookup, "PORT", 8081u16)
            .context("PORT must be a valid port number (1–65535)")?;

        let base_url = lookup("BASE_URL")
            .unwrap_or_else(|| format!("http://localhost:{port}"))
            .trim_end_matches('/')
            .to_owned();

        let storage_backend = match lookup("STORAGE_BACKEND") {
            Some(raw) => raw
                .parse::<StorageBackend>()
                .context("invalid STORAGE_BACKEND")?,
            None => StorageBackend::Sqlite,
        };

        let request_timeout_secs: u64 = parse_or(&lookup, "REQUEST_TIMEOUT_SECS", 5)
            .context("REQUEST_TIMEOUT_SECS must be a whole number of seconds")?;
        let increment_timeout_secs: u64 = parse_or(&lookup, "INCREMENT_TIMEOUT_SECS", 3)
            .context("INCREMENT_TIMEOUT_SECS must be a whole number of seconds")?;
        if request_timeout_secs == 0 || increment_timeout_secs == 0 {
            anyhow::bail!("timeouts must be at least one second");
        }

        let increment_queue_capacity: usize = parse_or(&lookup, "INCREMENT_QUEUE_CAPACITY", 1024)
            .context("INCREMENT_QUEUE_CAPACITY must be a positive integer")?;
        if increment_queue_capacity == 0 {
            anyhow::bail!("INCREMENT_QUEUE_CAPACITY must be a positive integer");
        }

        Ok(Self {
            database_url: lookup("DATABASE_URL").unwrap_or_else(|| "sqlite:./tinylink.db".into()),
            storage_backend,
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            base_url,
            request_timeout: Duration::from_secs(request_timeout_secs),
            increment_timeout: Duration::from_secs(increment_timeout_secs),
            increment_queue_capacity,
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => Ok(raw.trim().parse::<T>()?),
        None => Ok(default),
    }
}
