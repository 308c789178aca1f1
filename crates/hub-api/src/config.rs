use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use hub_core::{MemoryPlayerStore, PlayerService, PlayerStore};
use thiserror::Error;
use tracing::{info, warn};

use crate::persistence::SqlitePlayerStore;

pub const ADDR_VAR: &str = "HUB_ADDR";
pub const STORE_VAR: &str = "HUB_STORE";
pub const SQLITE_PATH_VAR: &str = "HUB_SQLITE_PATH";
pub const BUSY_TIMEOUT_VAR: &str = "HUB_BUSY_TIMEOUT_MS";

const DEFAULT_ADDR: &str = "127.0.0.1:8080";
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid {key} value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Sqlite,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown store backend {other}, expected sqlite or memory")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubConfig {
    pub addr: SocketAddr,
    pub store: StoreBackend,
    /// Unset means the store is unconfigured and every request takes the fallback path.
    pub sqlite_path: Option<PathBuf>,
    pub busy_timeout: Duration,
}

impl HubConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let addr = parse_or(ADDR_VAR, var(ADDR_VAR), DEFAULT_ADDR)?;
        let store = parse_or(STORE_VAR, var(STORE_VAR), "sqlite")?;
        let busy_timeout_ms: u64 = parse_or(
            BUSY_TIMEOUT_VAR,
            var(BUSY_TIMEOUT_VAR),
            &DEFAULT_BUSY_TIMEOUT_MS.to_string(),
        )?;

        Ok(Self {
            addr,
            store,
            sqlite_path: var(SQLITE_PATH_VAR).map(PathBuf::from),
            busy_timeout: Duration::from_millis(busy_timeout_ms),
        })
    }

    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    /// Builds the player service. A missing SQLite path is not an error; the
    /// service then runs with no store and serves fallback data.
    pub fn build_service(&self) -> PlayerService {
        let store: Option<Arc<dyn PlayerStore>> = match (self.store, &self.sqlite_path) {
            (StoreBackend::Memory, _) => {
                info!("using in-memory player store");
                Some(Arc::new(MemoryPlayerStore::new()))
            }
            (StoreBackend::Sqlite, Some(path)) => {
                info!(path = %path.display(), "using sqlite player store");
                Some(Arc::new(SqlitePlayerStore::new(path, self.busy_timeout)))
            }
            (StoreBackend::Sqlite, None) => {
                warn!("{SQLITE_PATH_VAR} not set, serving fallback data only");
                None
            }
        };

        PlayerService::new(store)
    }
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            store: StoreBackend::Sqlite,
            sqlite_path: None,
            busy_timeout: Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS),
        }
    }
}

fn parse_or<T>(key: &'static str, value: Option<String>, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = value.unwrap_or_else(|| default.to_string());
    raw.trim().parse().map_err(|err: T::Err| ConfigError::Invalid {
        key,
        value: raw.clone(),
        reason: err.to_string(),
    })
}
