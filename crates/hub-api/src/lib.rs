//! HTTP surface, configuration, and SQLite persistence for the character hub.

mod config;
mod persistence;
mod server;

pub use config::{ConfigError, HubConfig, StoreBackend};
pub use persistence::{PersistenceError, SqlitePlayerStore, StoredPlayerSummary};
pub use server::{router, serve, serve_on, ServerError};
