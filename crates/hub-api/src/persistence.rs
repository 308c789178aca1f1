use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use contracts::{CodeError, Player, PlayerCode, PlayerUpdate, Servant};
use hub_core::{merge_record, PlayerStore, StoreError, UpsertOutcome};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("stored code is invalid: {0}")]
    Code(#[from] CodeError),
    #[error("stored timestamp {value:?} is invalid: {source}")]
    Timestamp {
        value: String,
        source: chrono::ParseError,
    },
}

impl From<PersistenceError> for StoreError {
    fn from(value: PersistenceError) -> Self {
        match value {
            PersistenceError::Sqlite(err) => Self::Unavailable(err.to_string()),
            other => Self::Corrupt(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPlayerSummary {
    pub code: PlayerCode,
    pub name: String,
    pub last_updated: Option<DateTime<Utc>>,
}

/// SQLite-backed player table. Every call opens its own connection, so the
/// store holds no handle between requests.
#[derive(Debug, Clone)]
pub struct SqlitePlayerStore {
    path: PathBuf,
    busy_timeout: Duration,
}

impl SqlitePlayerStore {
    pub fn new(path: impl AsRef<Path>, busy_timeout: Duration) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            busy_timeout,
        }
    }

    pub fn load(&self, code: &PlayerCode) -> Result<Option<Player>, PersistenceError> {
        let conn = self.connect()?;
        load_player(&conn, code)
    }

    pub fn save(
        &self,
        code: &PlayerCode,
        update: &PlayerUpdate,
        at: DateTime<Utc>,
    ) -> Result<UpsertOutcome, PersistenceError> {
        let mut conn = self.connect()?;
        // Take the write lock up front; a deferred read cannot upgrade under WAL contention.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing = load_player(&tx, code)?;
        let (player, outcome) = merge_record(existing, code, update, at);
        upsert_player(&tx, &player)?;

        tx.commit()?;
        debug!(%code, ?outcome, "sqlite upsert committed");
        Ok(outcome)
    }

    pub fn list_players(&self, limit: usize) -> Result<Vec<StoredPlayerSummary>, PersistenceError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT code, name, last_updated
             FROM players
             ORDER BY last_updated DESC, code ASC
             LIMIT ?1",
        )?;

        let rows = stmt.query_map(
            params![i64::try_from(limit).unwrap_or(i64::MAX)],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                ))
            },
        )?;

        let mut players = Vec::new();
        for row in rows {
            let (code, name, last_updated) = row?;
            players.push(StoredPlayerSummary {
                code: PlayerCode::parse(&code)?,
                name,
                last_updated: parse_timestamp(last_updated)?,
            });
        }

        Ok(players)
    }

    fn connect(&self) -> Result<Connection, PersistenceError> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(self.busy_timeout)?;
        configure(&conn)?;
        migrate(&conn)?;
        Ok(conn)
    }
}

impl PlayerStore for SqlitePlayerStore {
    fn kind(&self) -> &'static str {
        "sqlite"
    }

    fn location_len(&self) -> usize {
        self.path.as_os_str().len()
    }

    fn find(&self, code: &PlayerCode) -> Result<Option<Player>, StoreError> {
        Ok(self.load(code)?)
    }

    fn upsert(
        &self,
        code: &PlayerCode,
        update: &PlayerUpdate,
        at: DateTime<Utc>,
    ) -> Result<UpsertOutcome, StoreError> {
        Ok(self.save(code, update, at)?)
    }

    fn ping(&self) -> Result<(), StoreError> {
        let conn = self.connect().map_err(StoreError::from)?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;
        Ok(())
    }
}

fn configure(conn: &Connection) -> Result<(), PersistenceError> {
    conn.pragma_update(None, "journal_mode", "WAL")?;
    Ok(())
}

fn migrate(conn: &Connection) -> Result<(), PersistenceError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS players (
            code TEXT PRIMARY KEY,
            name TEXT NOT NULL DEFAULT '',
            origin TEXT NOT NULL DEFAULT '',
            profile TEXT NOT NULL DEFAULT '',
            nature TEXT NOT NULL DEFAULT '',
            motivation TEXT NOT NULL DEFAULT '',
            servant_class TEXT NOT NULL DEFAULT '',
            servant_name TEXT NOT NULL DEFAULT '',
            servant_alignment TEXT NOT NULL DEFAULT '',
            servant_bond TEXT NOT NULL DEFAULT '',
            last_updated TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_players_last_updated ON players(last_updated);
        ",
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_migrations(version, name) VALUES(1, 'players_v1')",
        [],
    )?;

    Ok(())
}

fn load_player(conn: &Connection, code: &PlayerCode) -> Result<Option<Player>, PersistenceError> {
    let raw = conn
        .query_row(
            "SELECT code, name, origin, profile, nature, motivation,
                    servant_class, servant_name, servant_alignment, servant_bond,
                    last_updated
             FROM players
             WHERE code = ?1",
            params![code.as_str()],
            RawPlayerRow::from_row,
        )
        .optional()?;

    raw.map(RawPlayerRow::into_player).transpose()
}

fn upsert_player(conn: &Connection, player: &Player) -> Result<(), PersistenceError> {
    conn.execute(
        "INSERT INTO players (
            code,
            name,
            origin,
            profile,
            nature,
            motivation,
            servant_class,
            servant_name,
            servant_alignment,
            servant_bond,
            last_updated
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        ON CONFLICT(code) DO UPDATE SET
            name = excluded.name,
            origin = excluded.origin,
            profile = excluded.profile,
            nature = excluded.nature,
            motivation = excluded.motivation,
            servant_class = excluded.servant_class,
            servant_name = excluded.servant_name,
            servant_alignment = excluded.servant_alignment,
            servant_bond = excluded.servant_bond,
            last_updated = excluded.last_updated",
        params![
            player.code.as_str(),
            player.name,
            player.origin,
            player.profile,
            player.nature,
            player.motivation,
            player.servant.class,
            player.servant.name,
            player.servant.alignment,
            player.servant.bond,
            player.last_updated.map(|at| at.to_rfc3339()),
        ],
    )?;

    Ok(())
}

struct RawPlayerRow {
    code: String,
    name: String,
    origin: String,
    profile: String,
    nature: String,
    motivation: String,
    servant: Servant,
    last_updated: Option<String>,
}

impl RawPlayerRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            code: row.get(0)?,
            name: row.get(1)?,
            origin: row.get(2)?,
            profile: row.get(3)?,
            nature: row.get(4)?,
            motivation: row.get(5)?,
            servant: Servant {
                class: row.get(6)?,
                name: row.get(7)?,
                alignment: row.get(8)?,
                bond: row.get(9)?,
            },
            last_updated: row.get(10)?,
        })
    }

    fn into_player(self) -> Result<Player, PersistenceError> {
        Ok(Player {
            code: PlayerCode::parse(&self.code)?,
            name: self.name,
            origin: self.origin,
            profile: self.profile,
            nature: self.nature,
            motivation: self.motivation,
            servant: self.servant,
            last_updated: parse_timestamp(self.last_updated)?,
        })
    }
}

fn parse_timestamp(value: Option<String>) -> Result<Option<DateTime<Utc>>, PersistenceError> {
    value
        .map(|raw| {
            DateTime::parse_from_rfc3339(&raw)
                .map(|at| at.with_timezone(&Utc))
                .map_err(|source| PersistenceError::Timestamp { value: raw, source })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_db_path(name: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be monotonic")
            .as_nanos();

        std::env::temp_dir().join(format!("hub_players_{name}_{nanos}.sqlite"))
    }

    fn cleanup(path: &Path) {
        let _ = std::fs::remove_file(path);
        let _ = std::fs::remove_file(path.with_extension("sqlite-wal"));
        let _ = std::fs::remove_file(path.with_extension("sqlite-shm"));
    }

    #[test]
    fn corrupt_timestamp_maps_to_corrupt_store_error() {
        let path = temp_db_path("corrupt");
        let store = SqlitePlayerStore::new(&path, Duration::from_millis(100));
        let conn = store.connect().expect("connect");
        conn.execute(
            "INSERT INTO players (code, last_updated) VALUES ('FG-BAD', 'yesterday')",
            [],
        )
        .expect("insert raw row");

        let code = PlayerCode::parse("FG-BAD").expect("code");
        let err = store.find(&code).expect_err("timestamp should not parse");
        assert!(matches!(err, StoreError::Corrupt(_)));

        cleanup(&path);
    }

    #[test]
    fn migrate_is_repeatable() {
        let path = temp_db_path("migrate");
        let store = SqlitePlayerStore::new(&path, Duration::from_millis(100));
        store.ping().expect("first connect migrates");
        store.ping().expect("second connect migrates again");

        let conn = store.connect().expect("connect");
        let versions: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| row.get(0))
            .expect("count");
        assert_eq!(versions, 1);

        cleanup(&path);
    }
}
