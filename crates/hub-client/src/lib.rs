//! Client side of the hub: endpoint calls, a local profile cache used when the
//! backend is offline, the login session, and debounced saves.

mod cache;
mod client;
mod debounce;
mod session;

use contracts::CodeError;
use thiserror::Error;

pub use cache::LocalCache;
pub use client::HubClient;
pub use debounce::DebouncedSaver;
pub use session::{LoginOutcome, ProfileSource, SaveState, Session};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("backend answered {status}: {body}")]
    Status { status: u16, body: String },
    #[error("cache io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cache json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    InvalidCode(#[from] CodeError),
    #[error("unknown access code {0}")]
    UnknownCode(String),
    #[error("no user is logged in")]
    NotLoggedIn,
}
