//! Wire contracts shared by the hub server, client, and CLI.

mod player;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use player::{CodeError, Player, PlayerCode, PlayerUpdate, Servant, ServantUpdate};

pub const GET_PLAYER_PATH: &str = "/api/get-player";
pub const SAVE_PLAYER_PATH: &str = "/api/save-player";
pub const DEBUG_PATH: &str = "/api/debug";

/// Where the data in a response came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum DataSource {
    Database,
    MockData,
    MockSave,
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Database => "database",
            Self::MockData => "mock-data",
            Self::MockSave => "mock-save",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidRequest,
    PlayerNotFound,
    InternalError,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiError {
    pub success: bool,
    pub error_code: ErrorCode,
    pub error: String,
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(error_code: ErrorCode, message: impl Into<String>, details: Option<String>) -> Self {
        Self {
            success: false,
            error_code,
            error: message.into(),
            details,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SavePlayerRequest {
    #[serde(default)]
    pub player_code: Option<String>,
    #[serde(default)]
    pub player_data: Option<PlayerUpdate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GetPlayerResponse {
    pub success: bool,
    pub data: Player,
    pub source: DataSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerNotFoundResponse {
    pub success: bool,
    pub error: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub available_codes: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WriteResult {
    pub modified_count: u64,
    pub upserted_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SavePlayerResponse {
    pub success: bool,
    pub message: String,
    pub player_code: String,
    pub timestamp: DateTime<Utc>,
    pub source: DataSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<WriteResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnvironmentReport {
    pub version: String,
    pub store_configured: bool,
    pub store_kind: Option<String>,
    /// Length of the configured store location; the location itself is not echoed.
    pub store_location_length: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoreProbe {
    pub connected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DebugReport {
    pub success: bool,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub environment: EnvironmentReport,
    pub store_test: StoreProbe,
}
