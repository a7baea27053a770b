use chrono::NaiveDate;

use hoops_analytics::clutch::ClutchFilter;
use hoops_analytics::model::{AttrValue, SituationKey};
use hoops_analytics::situational::SituationalFilter;
use hoops_analytics::sqlite_store::SqliteStore;
use hoops_analytics::store::{EventStore, GameStore, StatsStore};
use hoops_analytics::synthetic::{self, SyntheticGame};
use hoops_analytics::{Analytics, AnalyticsError};

fn seeded() -> (Vec<SyntheticGame>, SqliteStore) {
    let season = synthetic::generate_season(
        21,
        2024,
        &[1, 2, 3],
        500,
        NaiveDate::from_ymd_opt(2024, 10, 22).unwrap(),
    );
    let mut store = SqliteStore::open_in_memory().expect("in-memory db should open");
    for g in &season {
        store.upsert_game(&g.game).unwrap();
        store.insert_events(&g.events).unwrap();
        store.upsert_player_stats(&g.player_stats).unwrap();
        store.upsert_team_stats(&g.team_stats).unwrap();
    }
    (season, store)
}

#[test]
fn events_round_trip_in_order() {
    let (season, store) = seeded();
    for g in &season {
        let events = store.fetch_events(g.game.game_id).unwrap();
        assert_eq!(events, g.events);
        assert_eq!(store.fetch_game(g.game.game_id).unwrap(), Some(g.game.clone()));
    }
    assert!(store.fetch_events(1).unwrap().is_empty());
    assert_eq!(store.fetch_game(1).unwrap(), None);
}

#[test]
fn attributes_survive_storage() {
    let (season, store) = seeded();
    let stored = store.fetch_events(season[0].game.game_id).unwrap();
    let with_type = stored
        .iter()
        .find(|e| e.attributes.get(SituationKey::ShotType).is_some())
        .expect("synthetic shots carry a shot type");
    assert!(matches!(
        with_type.attributes.get(SituationKey::ShotType),
        Some(AttrValue::Text(_))
    ));
}

#[test]
fn sqlite_and_memory_stores_agree() {
    let (season, sqlite) = seeded();
    let memory = synthetic::memory_store(&season);
    let from_sqlite = Analytics::new(&sqlite);
    let from_memory = Analytics::new(&memory);
    let filter = ClutchFilter::default();
    let game_ids: Vec<u32> = season.iter().map(|g| g.game.game_id).collect();

    for id in &game_ids {
        assert_eq!(
            from_sqlite.score_at_time(*id, 4, 120).unwrap(),
            from_memory.score_at_time(*id, 4, 120).unwrap()
        );
        assert_eq!(
            from_sqlite.clutch_events(*id, &filter).unwrap(),
            from_memory.clutch_events(*id, &filter).unwrap()
        );
    }

    let shots = SituationalFilter::default().contested(true);
    assert_eq!(
        from_sqlite.situational_stats(&game_ids, 201, &shots).unwrap(),
        from_memory.situational_stats(&game_ids, 201, &shots).unwrap()
    );
    assert_eq!(
        from_sqlite.home_away_split(301, 2024).unwrap(),
        from_memory.home_away_split(301, 2024).unwrap()
    );
    assert_eq!(
        from_sqlite.games_vs_opponent(1, 3, Some(2024)).unwrap(),
        from_memory.games_vs_opponent(1, 3, Some(2024)).unwrap()
    );
    assert_eq!(
        from_sqlite.team_record_vs_opponent(2, 3, None).unwrap(),
        from_memory.team_record_vs_opponent(2, 3, None).unwrap()
    );
    assert_eq!(
        sqlite.fetch_player_game_stats(101, Some(2024)).unwrap().len(),
        4
    );
}

#[test]
fn leaders_rank_by_average_and_reject_unknown_categories() {
    let (_, store) = seeded();
    let analytics = Analytics::new(&store);

    let leaders = analytics.season_leaders(2024, "points", 5, 1).unwrap();
    assert_eq!(leaders.len(), 5);
    assert_eq!(leaders[0].rank, 1);
    for pair in leaders.windows(2) {
        assert!(pair[0].per_game >= pair[1].per_game);
    }

    assert!(analytics.season_leaders(2024, "rebounds", 100, 5).unwrap().is_empty());

    let err = analytics.season_leaders(2024, "dunks", 5, 1).unwrap_err();
    assert!(matches!(err, AnalyticsError::UnknownStatCategory(ref c) if c == "dunks"));
    assert!(err.is_user_error());
}

#[test]
fn odd_attribute_values_do_not_hide_the_game() {
    let path = std::env::temp_dir().join(format!(
        "hoops_analytics_attrs_{}.sqlite",
        std::process::id()
    ));
    let _ = std::fs::remove_file(&path);
    let store = SqliteStore::open(&path).expect("file db should open");
    store
        .upsert_game(&hoops_analytics::model::Game {
            game_id: 1,
            home_team_id: 10,
            away_team_id: 20,
            season_id: 2024,
            game_date: NaiveDate::from_ymd_opt(2024, 11, 1).unwrap(),
        })
        .unwrap();

    let raw = rusqlite::Connection::open(&path).unwrap();
    raw.execute_batch(
        r#"
        INSERT INTO play_by_play (game_id, event_number, period, clock, event_type,
            event_subtype, success, team_id, player_id, attributes_json)
        VALUES (1, 1, 4, '5:00', 'SHOT', '3PT', 1, 10, 1001, '{}');
        INSERT INTO play_by_play (game_id, event_number, period, clock, event_type,
            event_subtype, success, team_id, player_id, attributes_json)
        VALUES (1, 2, 4, '4:40', 'REBOUND', 'DEFENSIVE', NULL, 20, 2001, '{"distance":23}');
        INSERT INTO play_by_play (game_id, event_number, period, clock, event_type,
            event_subtype, success, team_id, player_id, attributes_json)
        VALUES (1, 3, 4, '4:20', 'SHOT', '2PT', 1, 20, 2001, 'not json');
        "#,
    )
    .unwrap();
    drop(raw);

    let events = store.fetch_events(1).unwrap();
    assert_eq!(events.len(), 3);
    assert_eq!(
        events[1].attributes.extra("distance"),
        Some(&AttrValue::Other(serde_json::json!(23)))
    );
    assert!(events[2].attributes.is_empty());

    let analytics = Analytics::new(&store);
    let score = analytics.score_at_time(1, 4, 0).unwrap();
    assert_eq!(score.as_tuple(), (3, 2));

    drop(analytics);
    drop(store);
    let _ = std::fs::remove_file(&path);
}
