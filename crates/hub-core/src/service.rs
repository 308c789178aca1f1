//! Request-level policy for the three player endpoints.
//!
//! Configuration and connectivity failures never reach the caller: a lookup
//! falls back to the [`FallbackCatalog`] and a save is acknowledged as a
//! local-only write. Only malformed input is reported as an error.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use contracts::{
    CodeError, DataSource, DebugReport, EnvironmentReport, Player, PlayerCode, PlayerUpdate,
    StoreProbe,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::fallback::FallbackCatalog;
use crate::store::{PlayerStore, StoreError, UpsertOutcome};

const STORE_SUGGESTION: &str =
    "check the store location, that the process can reach it, and its permissions";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error(transparent)]
    InvalidCode(#[from] CodeError),
    #[error("playerCode and playerData are required")]
    MissingPlayerData,
}

/// Why a request was answered without the real store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    NotConfigured,
    StoreFailed(StoreError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Found {
        player: Player,
        source: DataSource,
        fallback: Option<FallbackReason>,
    },
    NotFound {
        code: PlayerCode,
        available_codes: Vec<String>,
    },
}

impl Lookup {
    pub fn player(&self) -> Option<&Player> {
        match self {
            Self::Found { player, .. } => Some(player),
            Self::NotFound { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveReceipt {
    Persisted {
        code: PlayerCode,
        outcome: UpsertOutcome,
        at: DateTime<Utc>,
    },
    Simulated {
        code: PlayerCode,
        reason: FallbackReason,
        at: DateTime<Utc>,
    },
}

impl SaveReceipt {
    pub fn code(&self) -> &PlayerCode {
        match self {
            Self::Persisted { code, .. } | Self::Simulated { code, .. } => code,
        }
    }

    pub fn source(&self) -> DataSource {
        match self {
            Self::Persisted { .. } => DataSource::Database,
            Self::Simulated { .. } => DataSource::MockSave,
        }
    }
}

pub struct PlayerService {
    store: Option<Arc<dyn PlayerStore>>,
    catalog: FallbackCatalog,
}

impl PlayerService {
    pub fn new(store: Option<Arc<dyn PlayerStore>>) -> Self {
        Self {
            store,
            catalog: FallbackCatalog::default(),
        }
    }

    pub fn unconfigured() -> Self {
        Self::new(None)
    }

    pub fn catalog(&self) -> &FallbackCatalog {
        &self.catalog
    }

    pub fn store_kind(&self) -> Option<&'static str> {
        self.store.as_ref().map(|store| store.kind())
    }

    pub fn get_player(&self, raw_code: &str, now: DateTime<Utc>) -> Result<Lookup, ServiceError> {
        let code = PlayerCode::parse(raw_code)?;

        let Some(store) = self.store.as_ref() else {
            info!(%code, "store not configured, serving fallback record");
            return Ok(self.fallback_lookup(code, FallbackReason::NotConfigured, now));
        };

        debug!(%code, store = store.kind(), "looking up player");
        match store.find(&code) {
            Ok(Some(player)) => {
                info!(%code, "player found");
                Ok(Lookup::Found {
                    player,
                    source: DataSource::Database,
                    fallback: None,
                })
            }
            Ok(None) => {
                info!(%code, "player not found in store");
                Ok(Lookup::NotFound {
                    code,
                    available_codes: Vec::new(),
                })
            }
            Err(err) => {
                warn!(%code, error = %err, "store lookup failed, serving fallback record");
                Ok(self.fallback_lookup(code, FallbackReason::StoreFailed(err), now))
            }
        }
    }

    pub fn save_player(
        &self,
        raw_code: Option<&str>,
        update: Option<&PlayerUpdate>,
        now: DateTime<Utc>,
    ) -> Result<SaveReceipt, ServiceError> {
        let (Some(raw_code), Some(update)) = (raw_code, update) else {
            return Err(ServiceError::MissingPlayerData);
        };
        if raw_code.trim().is_empty() {
            return Err(ServiceError::MissingPlayerData);
        }
        let code = PlayerCode::parse(raw_code)?;

        let Some(store) = self.store.as_ref() else {
            info!(%code, "store not configured, acknowledging save locally");
            return Ok(SaveReceipt::Simulated {
                code,
                reason: FallbackReason::NotConfigured,
                at: now,
            });
        };

        match store.upsert(&code, update, now) {
            Ok(outcome) => {
                info!(%code, ?outcome, "player saved");
                Ok(SaveReceipt::Persisted {
                    code,
                    outcome,
                    at: now,
                })
            }
            Err(err) => {
                warn!(%code, error = %err, "store write failed, acknowledging save locally");
                Ok(SaveReceipt::Simulated {
                    code,
                    reason: FallbackReason::StoreFailed(err),
                    at: now,
                })
            }
        }
    }

    pub fn diagnose(&self, now: DateTime<Utc>) -> DebugReport {
        let environment = EnvironmentReport {
            version: env!("CARGO_PKG_VERSION").to_string(),
            store_configured: self.store.is_some(),
            store_kind: self.store_kind().map(str::to_string),
            store_location_length: self
                .store
                .as_ref()
                .map(|store| store.location_len())
                .unwrap_or(0),
        };

        let store_test = match self.store.as_ref() {
            None => StoreProbe {
                connected: false,
                message: None,
                error: Some(StoreError::NotConfigured.to_string()),
                suggestion: None,
            },
            Some(store) => match store.ping() {
                Ok(()) => StoreProbe {
                    connected: true,
                    message: Some(format!("{} store reachable", store.kind())),
                    error: None,
                    suggestion: None,
                },
                Err(err) => {
                    warn!(error = %err, "store ping failed");
                    StoreProbe {
                        connected: false,
                        message: None,
                        error: Some(err.to_string()),
                        suggestion: Some(STORE_SUGGESTION.to_string()),
                    }
                }
            },
        };

        DebugReport {
            success: true,
            message: "diagnostics collected".to_string(),
            timestamp: now,
            environment,
            store_test,
        }
    }

    fn fallback_lookup(&self, code: PlayerCode, reason: FallbackReason, now: DateTime<Utc>) -> Lookup {
        match self.catalog.lookup(&code, now) {
            Some(player) => Lookup::Found {
                player,
                source: DataSource::MockData,
                fallback: Some(reason),
            },
            None => Lookup::NotFound {
                code,
                available_codes: self.catalog.codes(),
            },
        }
    }
}
