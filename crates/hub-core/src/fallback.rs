//! Static player records served when the real store cannot answer.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use contracts::{Player, PlayerCode, Servant};

#[derive(Debug, Clone)]
pub struct FallbackCatalog {
    players: BTreeMap<PlayerCode, Player>,
}

impl FallbackCatalog {
    pub fn empty() -> Self {
        Self {
            players: BTreeMap::new(),
        }
    }

    pub fn with_player(mut self, player: Player) -> Self {
        self.players.insert(player.code.clone(), player);
        self
    }

    /// Copy of the predefined record, stamped with `now`.
    pub fn lookup(&self, code: &PlayerCode, now: DateTime<Utc>) -> Option<Player> {
        self.players.get(code).map(|player| {
            let mut player = player.clone();
            player.last_updated = Some(now);
            player
        })
    }

    pub fn codes(&self) -> Vec<String> {
        self.players
            .keys()
            .map(|code| code.as_str().to_string())
            .collect()
    }
}

impl Default for FallbackCatalog {
    fn default() -> Self {
        let mut catalog = Self::empty();
        if let Some(player) = seed(
            "FG-8V501Y",
            ["KADU", "KUROGANE", "ADULTO", "MAGO", "SALVAR ALGUÉM QUE PERDI"],
            ["SABER", "CLASSIFICADO", "LEAL E BOM", "INICIAL"],
        ) {
            catalog = catalog.with_player(player);
        }
        if let Some(player) = seed(
            "FG-TEST01",
            ["JOGADOR TESTE", "EXTERNA", "ESTUDANTE", "HUMANO COMUM", "MUDAR O MUNDO"],
            ["ARCHER", "CLASSIFICADO", "NEUTRO", "INICIAL"],
        ) {
            catalog = catalog.with_player(player);
        }
        catalog
    }
}

fn seed(code: &str, profile: [&str; 5], servant: [&str; 4]) -> Option<Player> {
    let code = PlayerCode::parse(code).ok()?;
    let [name, origin, profile, nature, motivation] = profile.map(str::to_string);
    let [class, servant_name, alignment, bond] = servant.map(str::to_string);

    Some(Player {
        code,
        name,
        origin,
        profile,
        nature,
        motivation,
        servant: Servant {
            class,
            name: servant_name,
            alignment,
            bond,
        },
        last_updated: None,
    })
}
