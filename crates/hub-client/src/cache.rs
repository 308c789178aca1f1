use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use contracts::{Player, PlayerCode};
use serde_json::Value;
use tracing::warn;

use crate::ClientError;

const PLAYER_KEY_PREFIX: &str = "playerData_";

/// String-keyed JSON store persisted as a single file, rewritten on every
/// change. Without a path it lives only in memory.
#[derive(Debug, Default)]
pub struct LocalCache {
    path: Option<PathBuf>,
    entries: BTreeMap<String, Value>,
}

impl LocalCache {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Opens the cache file, starting empty when it does not exist yet.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(err.into()),
        };

        Ok(Self {
            path: Some(path),
            entries,
        })
    }

    pub fn player_key(code: &PlayerCode) -> String {
        format!("{PLAYER_KEY_PREFIX}{code}")
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) -> Result<(), ClientError> {
        self.entries.insert(key.into(), value);
        self.persist()
    }

    pub fn remove(&mut self, key: &str) -> Result<Option<Value>, ClientError> {
        let removed = self.entries.remove(key);
        if removed.is_some() {
            self.persist()?;
        }
        Ok(removed)
    }

    /// Cached profile for `code`. An unreadable entry is treated as absent.
    pub fn player(&self, code: &PlayerCode) -> Option<Player> {
        let value = self.get(&Self::player_key(code))?;
        match serde_json::from_value(value.clone()) {
            Ok(player) => Some(player),
            Err(err) => {
                warn!(%code, error = %err, "ignoring unreadable cached profile");
                None
            }
        }
    }

    pub fn store_player(&mut self, player: &Player) -> Result<(), ClientError> {
        let value = serde_json::to_value(player)?;
        self.set(Self::player_key(&player.code), value)
    }

    fn persist(&self) -> Result<(), ClientError> {
        let Some(path) = self.path.as_ref() else {
            return Ok(());
        };

        let raw = serde_json::to_string_pretty(&self.entries)?;
        fs::write(path, raw)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_cache_path(name: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be monotonic")
            .as_nanos();

        std::env::temp_dir().join(format!("hub_cache_{name}_{nanos}.json"))
    }

    fn player(raw: &str, name: &str) -> Player {
        let mut player = Player::blank(PlayerCode::parse(raw).expect("code"));
        player.name = name.to_string();
        player
    }

    #[test]
    fn player_key_uses_prefix() {
        let code = PlayerCode::parse("fg-test01").expect("code");
        assert_eq!(LocalCache::player_key(&code), "playerData_FG-TEST01");
    }

    #[test]
    fn stored_players_survive_reopen() {
        let path = temp_cache_path("reopen");
        {
            let mut cache = LocalCache::open(&path).expect("open");
            cache
                .store_player(&player("FG-1", "KADU"))
                .expect("store");
        }

        let cache = LocalCache::open(&path).expect("reopen");
        let code = PlayerCode::parse("FG-1").expect("code");
        assert_eq!(cache.player(&code).map(|p| p.name), Some("KADU".to_string()));

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn unreadable_entry_is_absent() {
        let mut cache = LocalCache::in_memory();
        cache
            .set("playerData_FG-1", Value::String("garbage".to_string()))
            .expect("set");

        let code = PlayerCode::parse("FG-1").expect("code");
        assert!(cache.player(&code).is_none());
        assert!(cache.remove("playerData_FG-1").expect("remove").is_some());
    }
}
