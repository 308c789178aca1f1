use chrono::Utc;
use contracts::{DataSource, Player, PlayerCode, PlayerUpdate};
use hub_core::FallbackCatalog;
use tracing::{info, warn};

use crate::{ClientError, HubClient, LocalCache};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileSource {
    Backend,
    LocalCache,
    Seed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    pub player: Player,
    pub source: ProfileSource,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveState {
    Synced { source: DataSource },
    /// Written to the local cache only; the backend call failed.
    LocalOnly { reason: String },
}

/// Logged-in user and their profile. Only codes known to the seed catalog may
/// log in.
pub struct Session {
    client: HubClient,
    cache: LocalCache,
    seeds: FallbackCatalog,
    current: Option<Player>,
}

impl Session {
    pub fn new(client: HubClient, cache: LocalCache) -> Self {
        Self {
            client,
            cache,
            seeds: FallbackCatalog::default(),
            current: None,
        }
    }

    pub fn current_user(&self) -> Option<&PlayerCode> {
        self.current.as_ref().map(|player| &player.code)
    }

    /// Loads the profile from the backend, then the local cache, then the seed record.
    pub async fn login(&mut self, raw_code: &str) -> Result<LoginOutcome, ClientError> {
        let code = PlayerCode::parse(raw_code)?;
        let Some(mut seed) = self.seeds.lookup(&code, Utc::now()) else {
            return Err(ClientError::UnknownCode(code.to_string()));
        };
        seed.last_updated = None;

        let (player, source) = match self.client.load_player(&code).await {
            Ok(Some(response)) => (response.data, ProfileSource::Backend),
            Ok(None) => self.local_or_seed(&code, seed),
            Err(err) => {
                warn!(%code, error = %err, "backend offline, loading local profile");
                self.local_or_seed(&code, seed)
            }
        };

        info!(%code, ?source, "logged in");
        self.current = Some(player.clone());
        Ok(LoginOutcome { player, source })
    }

    pub fn logout(&mut self) {
        if let Some(player) = self.current.take() {
            info!(code = %player.code, "logged out");
        }
    }

    /// Applies `update` to the current profile, caches it locally, then pushes
    /// the full profile to the backend.
    pub async fn save(&mut self, update: &PlayerUpdate) -> Result<SaveState, ClientError> {
        let Some(player) = self.current.as_mut() else {
            return Err(ClientError::NotLoggedIn);
        };

        update.apply_to(player);
        player.last_updated = Some(Utc::now());
        self.cache.store_player(player)?;

        let full = PlayerUpdate::from_player(player);
        match self.client.save_player(&player.code, &full).await {
            Ok(response) => Ok(SaveState::Synced {
                source: response.source,
            }),
            Err(err) => {
                warn!(code = %player.code, error = %err, "backend save failed, kept local copy");
                Ok(SaveState::LocalOnly {
                    reason: err.to_string(),
                })
            }
        }
    }

    fn local_or_seed(&self, code: &PlayerCode, seed: Player) -> (Player, ProfileSource) {
        match self.cache.player(code) {
            Some(player) => (player, ProfileSource::LocalCache),
            None => (seed, ProfileSource::Seed),
        }
    }
}
