use chrono::NaiveDate;

use hoops_analytics::model::{EventAttributes, EventKind, PlayByPlayEvent, SituationKey};
use hoops_analytics::situational::{
    SituationalFilter, SituationalStats, matches, situational_shots,
};
use hoops_analytics::store::MemoryStore;
use hoops_analytics::{Analytics, synthetic};

fn shot(n: u32, player: u32, team: u32, made: bool, attrs: EventAttributes) -> PlayByPlayEvent {
    PlayByPlayEvent {
        game_id: 1,
        event_number: n,
        period: 2,
        clock: "6:00".to_string(),
        event_type: EventKind::Shot,
        event_subtype: Some("2PT".to_string()),
        success: Some(made),
        team_id: Some(team),
        player_id: Some(player),
        attributes: attrs,
    }
}

#[test]
fn missing_attribute_never_matches() {
    let event = shot(1, 7, 1, true, EventAttributes::new().with(SituationKey::Contested, true));
    assert!(!matches(&event, &SituationalFilter::default().fast_break(true)));
    assert!(!matches(&event, &SituationalFilter::default().fast_break(false)));
    assert!(matches(&event, &SituationalFilter::default()));
    assert!(matches(&event, &SituationalFilter::default().contested(true)));
}

#[test]
fn false_is_a_constraint_not_unset() {
    let open_look = shot(1, 7, 1, true, EventAttributes::new().with(SituationKey::Contested, false));
    let contested = shot(2, 7, 1, true, EventAttributes::new().with(SituationKey::Contested, true));
    let filter = SituationalFilter::default().contested(false);
    assert!(matches(&open_look, &filter));
    assert!(!matches(&contested, &filter));
    assert!(!filter.is_unconstrained());
}

#[test]
fn shot_type_and_combined_predicates() {
    let attrs = EventAttributes::new()
        .with(SituationKey::FastBreak, true)
        .with(SituationKey::ShotType, "layup");
    let event = shot(1, 7, 1, true, attrs);
    assert!(matches(&event, &SituationalFilter::default().fast_break(true).shot_type("layup")));
    assert!(!matches(&event, &SituationalFilter::default().fast_break(true).shot_type("dunk")));
}

#[test]
fn shots_are_filtered_by_type_player_and_team_in_order() {
    let fb = || EventAttributes::new().with(SituationKey::FastBreak, true);
    let mut rebound = shot(2, 7, 1, false, fb());
    rebound.event_type = EventKind::Rebound;
    let events = vec![
        shot(1, 7, 1, true, fb()),
        rebound,
        shot(3, 8, 1, false, fb()),
        shot(4, 7, 1, false, fb()),
        shot(5, 9, 2, true, fb()),
    ];
    let filter = SituationalFilter::default().fast_break(true);

    let all: Vec<u32> = situational_shots(&events, None, None, &filter)
        .iter()
        .map(|e| e.event_number)
        .collect();
    assert_eq!(all, vec![1, 3, 4, 5]);

    let player: Vec<u32> = situational_shots(&events, Some(7), None, &filter)
        .iter()
        .map(|e| e.event_number)
        .collect();
    assert_eq!(player, vec![1, 4]);

    let team: Vec<u32> = situational_shots(&events, None, Some(2), &filter)
        .iter()
        .map(|e| e.event_number)
        .collect();
    assert_eq!(team, vec![5]);
}

#[test]
fn zero_attempts_is_zero_pct() {
    let stats = SituationalStats::from_counts(0, 0);
    assert_eq!(stats.pct, 0.0);
    let stats = SituationalStats::from_counts(4, 1).combine(SituationalStats::from_counts(0, 0));
    assert_eq!((stats.attempted, stats.made), (4, 1));
    assert!((stats.pct - 0.25).abs() < 1e-9);
}

#[test]
fn stats_across_games_stay_within_bounds() {
    let season = synthetic::generate_season(
        11,
        2024,
        &[1, 2, 3],
        1,
        NaiveDate::from_ymd_opt(2024, 10, 22).unwrap(),
    );
    let store = synthetic::memory_store(&season);
    let analytics = Analytics::new(&store).with_parallelism(2);
    let game_ids: Vec<u32> = season.iter().map(|g| g.game.game_id).collect();

    let filters = [
        SituationalFilter::default(),
        SituationalFilter::default().fast_break(true),
        SituationalFilter::default().contested(false).shot_type("dunk"),
        SituationalFilter::default().second_chance(true),
    ];
    for player in synthetic::roster(1) {
        for filter in &filters {
            let stats = analytics.situational_stats(&game_ids, player, filter).unwrap();
            assert!(stats.made <= stats.attempted);
            assert!((0.0..=1.0).contains(&stats.pct));
            if stats.attempted == 0 {
                assert_eq!(stats.pct, 0.0);
            }

            let expected: u32 = season
                .iter()
                .map(|g| situational_shots(&g.events, Some(player), None, filter).len() as u32)
                .sum();
            assert_eq!(stats.attempted, expected);
        }
    }

    // Unconstrained attempts equal the player's box-score field goal attempts.
    let player = synthetic::roster(2)[0];
    let stats = analytics
        .situational_stats(&game_ids, player, &SituationalFilter::default())
        .unwrap();
    let fga: u32 = season
        .iter()
        .flat_map(|g| g.player_stats.iter())
        .filter(|r| r.player_id == player)
        .map(|r| r.fga)
        .sum();
    assert_eq!(stats.attempted, fga);

    // Repeated ids are counted once.
    let once = analytics.situational_stats(&game_ids[..1], player, &SituationalFilter::default()).unwrap();
    let twice = analytics
        .situational_stats(&[game_ids[0], game_ids[0]], player, &SituationalFilter::default())
        .unwrap();
    assert_eq!(once, twice);
}

#[test]
fn unknown_games_yield_empty_stats() {
    let store = MemoryStore::new();
    let analytics = Analytics::new(&store);
    let stats = analytics
        .situational_stats(&[1, 2, 3], 7, &SituationalFilter::default().fast_break(true))
        .unwrap();
    assert_eq!(stats, SituationalStats::default());
    assert!(analytics
        .situational_shots(1, None, None, &SituationalFilter::default())
        .unwrap()
        .is_empty());
}

#[test]
fn filter_json_distinguishes_false_from_missing() {
    let filter: SituationalFilter =
        serde_json::from_str(r#"{"fast_break":false}"#).expect("filter json should parse");
    assert_eq!(filter.fast_break, Some(false));
    assert_eq!(filter.contested, None);
}
