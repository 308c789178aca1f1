use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use contracts::{PlayerCode, PlayerUpdate, ServantUpdate};
use hub_core::{Lookup, MemoryPlayerStore, PlayerService, PlayerStore, SaveReceipt};
use proptest::prelude::*;

fn service() -> PlayerService {
    let store: Arc<dyn PlayerStore> = Arc::new(MemoryPlayerStore::new());
    PlayerService::new(Some(store))
}

fn base_time() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).expect("valid timestamp")
}

fn attribute() -> impl Strategy<Value = Option<String>> {
    proptest::option::of("[A-Z ]{0,12}")
}

fn update_strategy() -> impl Strategy<Value = PlayerUpdate> {
    (
        attribute(),
        attribute(),
        attribute(),
        attribute(),
        attribute(),
        attribute(),
        attribute(),
    )
        .prop_map(|(name, origin, profile, nature, motivation, class, bond)| PlayerUpdate {
            name,
            origin,
            profile,
            nature,
            motivation,
            servant: Some(ServantUpdate {
                class,
                bond,
                ..ServantUpdate::default()
            }),
            ..PlayerUpdate::default()
        })
}

#[test]
fn unknown_code_never_errors() {
    let configured = service();
    let unconfigured = PlayerService::unconfigured();

    for svc in [&configured, &unconfigured] {
        let lookup = svc
            .get_player("FG-DOES-NOT-EXIST", base_time())
            .expect("unknown code should not error");
        assert!(matches!(lookup, Lookup::NotFound { .. }));
    }
}

#[test]
fn missing_configuration_degrades_to_mock_path() {
    let svc = PlayerService::unconfigured();
    let update = PlayerUpdate {
        name: Some("KADU".to_string()),
        ..PlayerUpdate::default()
    };

    let receipt = svc
        .save_player(Some("FG-8V501Y"), Some(&update), base_time())
        .expect("save should be acknowledged");
    assert!(matches!(receipt, SaveReceipt::Simulated { .. }));

    let lookup = svc
        .get_player("FG-8V501Y", base_time())
        .expect("lookup should succeed");
    assert!(lookup.player().is_some());
}

proptest! {
    #[test]
    fn save_then_get_returns_most_recent(updates in proptest::collection::vec(update_strategy(), 1..6)) {
        let svc = service();
        let mut expected = None;

        for (offset, update) in updates.iter().enumerate() {
            let at = base_time() + Duration::seconds(offset as i64);
            svc.save_player(Some("FG-PROP"), Some(update), at).expect("save");

            let mut player = expected
                .take()
                .unwrap_or_else(|| contracts::Player::blank(PlayerCode::parse("FG-PROP").expect("code")));
            update.apply_to(&mut player);
            player.last_updated = Some(at);
            expected = Some(player);
        }

        let lookup = svc.get_player("fg-prop", base_time()).expect("lookup");
        prop_assert_eq!(lookup.player(), expected.as_ref());
    }

    #[test]
    fn identical_saves_are_idempotent(update in update_strategy(), repeats in 1_usize..5) {
        let svc = service();
        svc.save_player(Some("FG-IDEM"), Some(&update), base_time()).expect("save");
        let first = svc.get_player("FG-IDEM", base_time()).expect("lookup");

        for _ in 0..repeats {
            svc.save_player(Some("FG-IDEM"), Some(&update), base_time()).expect("save");
        }
        let later = svc.get_player("FG-IDEM", base_time()).expect("lookup");

        let first = first.player().expect("record");
        let later = later.player().expect("record");
        prop_assert!(first.same_attributes(later));
    }

    #[test]
    fn code_parsing_is_idempotent(raw in "[ a-zA-Z0-9_-]{1,40}") {
        if let Ok(code) = PlayerCode::parse(&raw) {
            let again = PlayerCode::parse(code.as_str()).expect("normalized code reparses");
            prop_assert_eq!(code, again);
        }
    }
}
