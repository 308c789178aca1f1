use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, Request, State};
use axum::http::header::{HeaderName, HeaderValue};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use contracts::{
    ApiError, DebugReport, ErrorCode, GetPlayerResponse, PlayerNotFoundResponse,
    SavePlayerRequest, SavePlayerResponse, DEBUG_PATH, GET_PLAYER_PATH, SAVE_PLAYER_PATH,
};
use hub_core::{FallbackReason, Lookup, PlayerService, SaveReceipt, ServiceError};
use serde::Deserialize;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::HubConfig;

include!("error.rs");
include!("state.rs");
include!("routes/player.rs");
include!("routes/debug.rs");
include!("util.rs");

pub async fn serve(config: &HubConfig) -> Result<(), ServerError> {
    let service = Arc::new(config.build_service());
    let listener = TcpListener::bind(config.addr).await?;
    serve_on(listener, service).await
}

/// Runs the hub on an already bound listener until Ctrl+C or SIGTERM.
pub async fn serve_on(listener: TcpListener, service: Arc<PlayerService>) -> Result<(), ServerError> {
    let addr: SocketAddr = listener.local_addr()?;
    info!(%addr, store = service.store_kind().unwrap_or("none"), "serving hub api");

    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("hub api shut down");
    Ok(())
}

pub fn router(service: Arc<PlayerService>) -> Router {
    Router::new()
        .route(GET_PLAYER_PATH, get(get_player))
        .route(SAVE_PLAYER_PATH, post(save_player))
        .route(DEBUG_PATH, get(debug_report))
        .layer(middleware::from_fn(no_cache_middleware))
        .with_state(AppState::new(service))
}

async fn no_cache_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    apply_no_cache_headers(response.headers_mut());
    response
}
