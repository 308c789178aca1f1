//! Player lookup and save with a static fallback when the store is unconfigured or unreachable.

pub mod fallback;
pub mod service;
pub mod store;

pub use fallback::FallbackCatalog;
pub use service::{FallbackReason, Lookup, PlayerService, SaveReceipt, ServiceError};
pub use store::{merge_record, MemoryPlayerStore, PlayerStore, StoreError, UpsertOutcome};
