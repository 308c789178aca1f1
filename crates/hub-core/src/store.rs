use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use contracts::{Player, PlayerCode, PlayerUpdate, WriteResult};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("store is not configured")]
    NotConfigured,
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("stored record is corrupt: {0}")]
    Corrupt(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

impl UpsertOutcome {
    pub fn modified_count(self) -> u64 {
        match self {
            Self::Inserted => 0,
            Self::Updated => 1,
        }
    }

    pub fn upserted_count(self) -> u64 {
        match self {
            Self::Inserted => 1,
            Self::Updated => 0,
        }
    }

    pub fn write_result(self) -> WriteResult {
        WriteResult {
            modified_count: self.modified_count(),
            upserted_count: self.upserted_count(),
        }
    }
}

/// Persistence seam for player records keyed by code.
///
/// Writes are last-writer-wins: there is no version check between a read and
/// the following upsert.
pub trait PlayerStore: Send + Sync {
    fn kind(&self) -> &'static str;

    /// Length of the configured location (path or connection string).
    fn location_len(&self) -> usize {
        0
    }

    fn find(&self, code: &PlayerCode) -> Result<Option<Player>, StoreError>;

    /// Store-or-update keyed by `code`, stamping `at` as the update time.
    fn upsert(
        &self,
        code: &PlayerCode,
        update: &PlayerUpdate,
        at: DateTime<Utc>,
    ) -> Result<UpsertOutcome, StoreError>;

    fn ping(&self) -> Result<(), StoreError>;
}

/// Applies `update` over `existing` (or a blank record) and stamps it.
pub fn merge_record(
    existing: Option<Player>,
    code: &PlayerCode,
    update: &PlayerUpdate,
    at: DateTime<Utc>,
) -> (Player, UpsertOutcome) {
    let (mut player, outcome) = match existing {
        Some(player) => (player, UpsertOutcome::Updated),
        None => (Player::blank(code.clone()), UpsertOutcome::Inserted),
    };

    update.apply_to(&mut player);
    player.last_updated = Some(at);

    (player, outcome)
}

/// In-process store. `set_offline(true)` makes every call fail as if the
/// backing service were unreachable.
#[derive(Debug, Default)]
pub struct MemoryPlayerStore {
    records: RwLock<HashMap<PlayerCode, Player>>,
    offline: AtomicBool,
}

impl MemoryPlayerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|records| records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "memory store is offline".to_string(),
            ));
        }
        Ok(())
    }
}

impl PlayerStore for MemoryPlayerStore {
    fn kind(&self) -> &'static str {
        "memory"
    }

    fn find(&self, code: &PlayerCode) -> Result<Option<Player>, StoreError> {
        self.check_online()?;
        let records = self
            .records
            .read()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))?;
        Ok(records.get(code).cloned())
    }

    fn upsert(
        &self,
        code: &PlayerCode,
        update: &PlayerUpdate,
        at: DateTime<Utc>,
    ) -> Result<UpsertOutcome, StoreError> {
        self.check_online()?;
        let mut records = self
            .records
            .write()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))?;

        let (player, outcome) = merge_record(records.remove(code), code, update, at);
        records.insert(code.clone(), player);

        Ok(outcome)
    }

    fn ping(&self) -> Result<(), StoreError> {
        self.check_online()
    }
}
