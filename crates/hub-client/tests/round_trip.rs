use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use contracts::{DataSource, PlayerCode, PlayerUpdate, GET_PLAYER_PATH};
use hub_client::{DebouncedSaver, HubClient, LocalCache, ProfileSource, SaveState, Session};
use hub_core::{MemoryPlayerStore, PlayerService, PlayerStore};
use tokio::net::TcpListener;

async fn spawn_hub(service: PlayerService) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(hub_api::serve_on(listener, Arc::new(service)));
    addr
}

async fn memory_hub() -> (Arc<MemoryPlayerStore>, HubClient) {
    let store = Arc::new(MemoryPlayerStore::new());
    let service = PlayerService::new(Some(store.clone() as Arc<dyn PlayerStore>));
    let addr = spawn_hub(service).await;
    let client = HubClient::new(format!("http://{addr}")).expect("client");
    (store, client)
}

/// Address nothing listens on.
async fn dead_address() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{addr}")
}

fn code(raw: &str) -> PlayerCode {
    PlayerCode::parse(raw).expect("code")
}

#[tokio::test]
async fn save_then_load_over_http() {
    let (store, client) = memory_hub().await;
    let update = PlayerUpdate {
        name: Some("KADU".to_string()),
        nature: Some("MAGO".to_string()),
        ..PlayerUpdate::default()
    };

    let saved = client
        .save_player(&code("FG-8V501Y"), &update)
        .await
        .expect("save should succeed");
    assert_eq!(saved.source, DataSource::Database);
    assert_eq!(store.len(), 1);

    let loaded = client
        .load_player(&code("FG-8V501Y"))
        .await
        .expect("load should succeed")
        .expect("record should exist");
    assert_eq!(loaded.source, DataSource::Database);
    assert_eq!(loaded.data.name, "KADU");
    assert_eq!(loaded.data.nature, "MAGO");

    let missing = client
        .load_player(&code("FG-UNSAVED"))
        .await
        .expect("load should succeed");
    assert!(missing.is_none());

    assert!(client.debug().await.expect("debug").store_test.connected);
}

#[tokio::test]
async fn responses_carry_no_cache_headers() {
    let (_, client) = memory_hub().await;

    let response = reqwest::get(format!("{}{}?code=FG-TEST01", client.base_url(), GET_PLAYER_PATH))
        .await
        .expect("request");
    let headers = response.headers();

    assert_eq!(
        headers.get("cache-control").and_then(|v| v.to_str().ok()),
        Some("no-cache, no-store, must-revalidate")
    );
    assert_eq!(
        headers.get("x-content-type-options").and_then(|v| v.to_str().ok()),
        Some("nosniff")
    );
}

#[tokio::test]
async fn unconfigured_hub_serves_mock_data() {
    let addr = spawn_hub(PlayerService::unconfigured()).await;
    let client = HubClient::new(format!("http://{addr}")).expect("client");

    assert!(client.ping().await);

    let loaded = client
        .load_player(&code("FG-TEST01"))
        .await
        .expect("load")
        .expect("mock record");
    assert_eq!(loaded.source, DataSource::MockData);

    let saved = client
        .save_player(&code("FG-TEST01"), &PlayerUpdate::default())
        .await
        .expect("save");
    assert_eq!(saved.source, DataSource::MockSave);
}

#[tokio::test]
async fn session_uses_backend_when_online() {
    let (_, client) = memory_hub().await;
    let mut session = Session::new(client, LocalCache::in_memory());

    let outcome = session.login(" fg-test01 ").await.expect("login");
    assert_eq!(outcome.source, ProfileSource::Seed);
    assert_eq!(session.current_user(), Some(&code("FG-TEST01")));

    let state = session
        .save(&PlayerUpdate {
            motivation: Some("PROTEGER".to_string()),
            ..PlayerUpdate::default()
        })
        .await
        .expect("save");
    assert_eq!(
        state,
        SaveState::Synced {
            source: DataSource::Database
        }
    );

    session.logout();
    assert!(session.current_user().is_none());

    let outcome = session.login("FG-TEST01").await.expect("second login");
    assert_eq!(outcome.source, ProfileSource::Backend);
    assert_eq!(outcome.player.motivation, "PROTEGER");
    assert_eq!(outcome.player.name, "JOGADOR TESTE");
}

#[tokio::test]
async fn session_falls_back_to_local_cache_when_offline() {
    let client = HubClient::new(dead_address().await).expect("client");
    assert!(!client.ping().await);

    let mut session = Session::new(client, LocalCache::in_memory());
    let outcome = session.login("FG-8V501Y").await.expect("login");
    assert_eq!(outcome.source, ProfileSource::Seed);

    let state = session
        .save(&PlayerUpdate {
            name: Some("KADU II".to_string()),
            ..PlayerUpdate::default()
        })
        .await
        .expect("save should keep a local copy");
    assert!(matches!(state, SaveState::LocalOnly { .. }));

    session.logout();
    let outcome = session.login("FG-8V501Y").await.expect("login");
    assert_eq!(outcome.source, ProfileSource::LocalCache);
    assert_eq!(outcome.player.name, "KADU II");
}

#[tokio::test]
async fn session_rejects_unknown_codes() {
    let client = HubClient::new(dead_address().await).expect("client");
    let mut session = Session::new(client, LocalCache::in_memory());

    assert!(session.login("FG-NOPE").await.is_err());
    assert!(session
        .save(&PlayerUpdate::default())
        .await
        .is_err());
}

#[tokio::test]
async fn debounced_saver_reaches_backend() {
    let (store, client) = memory_hub().await;
    let saver = DebouncedSaver::for_client(client.clone(), Duration::from_millis(50));

    for name in ["A", "B", "C"] {
        saver.submit(
            code("FG-DEB"),
            PlayerUpdate {
                name: Some(name.to_string()),
                ..PlayerUpdate::default()
            },
        );
    }
    saver.shutdown().await;

    assert_eq!(store.len(), 1);
    let stored = store
        .find(&code("FG-DEB"))
        .expect("find")
        .expect("record");
    assert_eq!(stored.name, "C");
}
