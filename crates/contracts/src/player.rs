use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodeError {
    #[error("player code is required")]
    Empty,
    #[error("player code is too long ({len} > {})", PlayerCode::MAX_LEN)]
    TooLong { len: usize },
    #[error("player code contains invalid character {ch:?}")]
    InvalidCharacter { ch: char },
}

/// Lookup key of a player record. Always trimmed and upper-cased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PlayerCode(String);

impl PlayerCode {
    pub const MAX_LEN: usize = 64;

    pub fn parse(raw: &str) -> Result<Self, CodeError> {
        let normalized = raw.trim().to_ascii_uppercase();
        if normalized.is_empty() {
            return Err(CodeError::Empty);
        }

        let len = normalized.chars().count();
        if len > Self::MAX_LEN {
            return Err(CodeError::TooLong { len });
        }

        if let Some(ch) = normalized
            .chars()
            .find(|ch| !(ch.is_ascii_alphanumeric() || *ch == '-' || *ch == '_'))
        {
            return Err(CodeError::InvalidCharacter { ch });
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PlayerCode {
    type Err = CodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PlayerCode {
    type Error = CodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PlayerCode> for String {
    fn from(value: PlayerCode) -> Self {
        value.0
    }
}

/// In-fiction companion bound to a player.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Servant {
    #[serde(default)]
    pub class: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub alignment: String,
    #[serde(default)]
    pub bond: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub code: PlayerCode,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub origin: String,
    #[serde(default)]
    pub profile: String,
    #[serde(default)]
    pub nature: String,
    #[serde(default)]
    pub motivation: String,
    #[serde(default)]
    pub servant: Servant,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

impl Player {
    /// A record with every attribute blank, as created by a first partial save.
    pub fn blank(code: PlayerCode) -> Self {
        Self {
            code,
            name: String::new(),
            origin: String::new(),
            profile: String::new(),
            nature: String::new(),
            motivation: String::new(),
            servant: Servant::default(),
            last_updated: None,
        }
    }

    /// Attributes equal, ignoring the update stamp.
    pub fn same_attributes(&self, other: &Player) -> bool {
        self.code == other.code
            && self.name == other.name
            && self.origin == other.origin
            && self.profile == other.profile
            && self.nature == other.nature
            && self.motivation == other.motivation
            && self.servant == other.servant
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServantUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bond: Option<String>,
}

/// Body of a save request. Absent attributes keep their stored value.
///
/// Servant attributes arrive either nested under `servant` or flattened as
/// `servantClass`, `servantName`, `servantAlignment` and `servantBond`. When
/// both forms carry the same attribute the nested one wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motivation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servant: Option<ServantUpdate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servant_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servant_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servant_alignment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servant_bond: Option<String>,
}

impl PlayerUpdate {
    /// Full update carrying every attribute of `player`.
    pub fn from_player(player: &Player) -> Self {
        Self {
            name: Some(player.name.clone()),
            origin: Some(player.origin.clone()),
            profile: Some(player.profile.clone()),
            nature: Some(player.nature.clone()),
            motivation: Some(player.motivation.clone()),
            servant: Some(ServantUpdate {
                class: Some(player.servant.class.clone()),
                name: Some(player.servant.name.clone()),
                alignment: Some(player.servant.alignment.clone()),
                bond: Some(player.servant.bond.clone()),
            }),
            ..Self::default()
        }
    }

    pub fn servant_fields(&self) -> ServantUpdate {
        let nested = self.servant.clone().unwrap_or_default();
        ServantUpdate {
            class: nested.class.or_else(|| self.servant_class.clone()),
            name: nested.name.or_else(|| self.servant_name.clone()),
            alignment: nested.alignment.or_else(|| self.servant_alignment.clone()),
            bond: nested.bond.or_else(|| self.servant_bond.clone()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.origin.is_none()
            && self.profile.is_none()
            && self.nature.is_none()
            && self.motivation.is_none()
            && self.servant_fields() == ServantUpdate::default()
    }

    pub fn apply_to(&self, player: &mut Player) {
        overwrite(&mut player.name, &self.name);
        overwrite(&mut player.origin, &self.origin);
        overwrite(&mut player.profile, &self.profile);
        overwrite(&mut player.nature, &self.nature);
        overwrite(&mut player.motivation, &self.motivation);

        let servant = self.servant_fields();
        overwrite(&mut player.servant.class, &servant.class);
        overwrite(&mut player.servant.name, &servant.name);
        overwrite(&mut player.servant.alignment, &servant.alignment);
        overwrite(&mut player.servant.bond, &servant.bond);
    }

    /// Later update wins attribute by attribute.
    pub fn merge(&mut self, later: PlayerUpdate) {
        let mut servant = self.servant_fields();
        let later_servant = later.servant_fields();
        servant.class = later_servant.class.or(servant.class);
        servant.name = later_servant.name.or(servant.name);
        servant.alignment = later_servant.alignment.or(servant.alignment);
        servant.bond = later_servant.bond.or(servant.bond);

        self.name = later.name.or(self.name.take());
        self.origin = later.origin.or(self.origin.take());
        self.profile = later.profile.or(self.profile.take());
        self.nature = later.nature.or(self.nature.take());
        self.motivation = later.motivation.or(self.motivation.take());
        self.servant = Some(servant);
        self.servant_class = None;
        self.servant_name = None;
        self.servant_alignment = None;
        self.servant_bond = None;
    }
}

fn overwrite(target: &mut String, value: &Option<String>) {
    if let Some(value) = value {
        target.clone_from(value);
    }
}
