//! Seeded synthetic play-by-play for demos, property checks and benches.

use std::collections::HashMap;

use chrono::{Duration as ChronoDuration, NaiveDate};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::clock::format_clock;
use crate::model::{
    EventAttributes, EventKind, Game, GameId, PlayByPlayEvent, PlayerGameStats, PlayerId,
    SeasonId, SituationKey, TeamGameStats, TeamId, REGULATION_PERIODS,
};
use crate::score::{Score, points_for};
use crate::store::MemoryStore;

const REGULATION_PERIOD_SECS: u32 = 720;
const OVERTIME_PERIOD_SECS: u32 = 300;
const MAX_OVERTIMES: u32 = 3;
const ROSTER_SIZE: u32 = 5;
const SHOT_TYPES: [&str; 4] = ["jumper", "layup", "dunk", "hook"];

#[derive(Debug, Clone)]
pub struct SyntheticGame {
    pub game: Game,
    pub events: Vec<PlayByPlayEvent>,
    pub player_stats: Vec<PlayerGameStats>,
    pub team_stats: Vec<TeamGameStats>,
}

pub fn roster(team_id: TeamId) -> Vec<PlayerId> {
    (1..=ROSTER_SIZE).map(|n| team_id * 100 + n).collect()
}

struct Builder<'a, R: Rng> {
    rng: &'a mut R,
    game: Game,
    events: Vec<PlayByPlayEvent>,
    score: Score,
    box_scores: HashMap<PlayerId, PlayerGameStats>,
}

impl<R: Rng> Builder<'_, R> {
    #[allow(clippy::too_many_arguments)]
    fn push(
        &mut self,
        period: u32,
        seconds: u32,
        kind: EventKind,
        subtype: Option<&str>,
        success: Option<bool>,
        team_id: Option<TeamId>,
        player_id: Option<PlayerId>,
        attributes: EventAttributes,
    ) {
        let event = PlayByPlayEvent {
            game_id: self.game.game_id,
            event_number: self.events.len() as u32 + 1,
            period,
            clock: format_clock(seconds),
            event_type: kind,
            event_subtype: subtype.map(str::to_string),
            success,
            team_id,
            player_id,
            attributes,
        };
        let points = points_for(&event);
        if let Some(team) = team_id {
            if team == self.game.home_team_id {
                self.score.home += points;
            } else {
                self.score.away += points;
            }
        }
        if let (Some(team), Some(player)) = (team_id, player_id) {
            let row = self.box_row(player, team);
            row.points += points;
            match event.event_type {
                EventKind::Shot => {
                    row.fga += 1;
                    row.fgm += u32::from(event.is_made());
                    if event.is_three() {
                        row.fg3a += 1;
                        row.fg3m += u32::from(event.is_made());
                    }
                }
                EventKind::FreeThrow => {
                    row.fta += 1;
                    row.ftm += u32::from(event.is_made());
                }
                EventKind::Rebound => row.rebounds += 1,
                _ => {}
            }
        }
        self.events.push(event);
    }

    fn box_row(&mut self, player_id: PlayerId, team_id: TeamId) -> &mut PlayerGameStats {
        let game_id = self.game.game_id;
        let season_id = self.game.season_id;
        self.box_scores
            .entry(player_id)
            .or_insert_with(|| PlayerGameStats {
                player_id,
                game_id,
                team_id,
                season_id,
                ..PlayerGameStats::default()
            })
    }

    fn shot_attributes(&mut self, second_chance: bool) -> EventAttributes {
        let mut attrs = EventAttributes::new();
        // Providers leave keys out when they do not know the value.
        if self.rng.gen_bool(0.9) {
            attrs = attrs.with(SituationKey::FastBreak, self.rng.gen_bool(0.12));
        }
        if self.rng.gen_bool(0.9) {
            attrs = attrs.with(SituationKey::SecondChance, second_chance);
        }
        if self.rng.gen_bool(0.85) {
            attrs = attrs.with(SituationKey::Contested, self.rng.gen_bool(0.5));
        }
        if let Some(shot_type) = SHOT_TYPES.choose(&mut *self.rng) {
            attrs = attrs.with(SituationKey::ShotType, *shot_type);
        }
        attrs
    }

    fn play_period(&mut self, period: u32) {
        let mut seconds = if period > REGULATION_PERIODS {
            OVERTIME_PERIOD_SECS
        } else {
            REGULATION_PERIOD_SECS
        };
        let mut offense = if self.rng.gen_bool(0.5) {
            self.game.home_team_id
        } else {
            self.game.away_team_id
        };
        let mut second_chance = false;

        loop {
            let step = self.rng.gen_range(4..=24);
            if step >= seconds {
                break;
            }
            seconds -= step;
            let defense = if offense == self.game.home_team_id {
                self.game.away_team_id
            } else {
                self.game.home_team_id
            };

            if self.rng.gen_bool(0.03) {
                self.push(
                    period,
                    seconds,
                    EventKind::Timeout,
                    None,
                    None,
                    Some(offense),
                    None,
                    EventAttributes::new(),
                );
                continue;
            }

            let shooter = self.pick_player(offense);
            if self.rng.gen_bool(0.12) {
                for _ in 0..2 {
                    let made = self.rng.gen_bool(0.76);
                    self.push(
                        period,
                        seconds,
                        EventKind::FreeThrow,
                        None,
                        Some(made),
                        Some(offense),
                        Some(shooter),
                        EventAttributes::new(),
                    );
                }
                offense = defense;
                second_chance = false;
                continue;
            }

            let three = self.rng.gen_bool(0.38);
            let made = self.rng.gen_bool(if three { 0.36 } else { 0.52 });
            let attrs = self.shot_attributes(second_chance);
            self.push(
                period,
                seconds,
                EventKind::Shot,
                Some(if three { "3PT" } else { "2PT" }),
                Some(made),
                Some(offense),
                Some(shooter),
                attrs,
            );
            if made {
                if self.rng.gen_bool(0.6) {
                    let passer = self.pick_player(offense);
                    if passer != shooter {
                        self.box_row(passer, offense).assists += 1;
                    }
                }
                offense = defense;
                second_chance = false;
                continue;
            }

            let offensive = self.rng.gen_bool(0.25);
            let rebounder_team = if offensive { offense } else { defense };
            let rebounder = self.pick_player(rebounder_team);
            self.push(
                period,
                seconds,
                EventKind::Rebound,
                Some(if offensive { "OFFENSIVE" } else { "DEFENSIVE" }),
                None,
                Some(rebounder_team),
                Some(rebounder),
                EventAttributes::new(),
            );
            second_chance = offensive;
            if !offensive {
                offense = defense;
            }
        }
    }

    fn pick_player(&mut self, team_id: TeamId) -> PlayerId {
        team_id * 100 + self.rng.gen_range(1..=ROSTER_SIZE)
    }

    fn finish(mut self) -> SyntheticGame {
        let game = self.game.clone();
        for team in [game.home_team_id, game.away_team_id] {
            for player in roster(team) {
                let minutes = self.rng.gen_range(18..=40);
                let steals = self.rng.gen_range(0..=3);
                let blocks = self.rng.gen_range(0..=2);
                let turnovers = self.rng.gen_range(0..=4);
                let row = self.box_row(player, team);
                row.minutes = minutes;
                row.steals = steals;
                row.blocks = blocks;
                row.turnovers = turnovers;
            }
        }

        let mut player_stats: Vec<PlayerGameStats> = self.box_scores.into_values().collect();
        player_stats.sort_by_key(|r| r.player_id);

        let team_stats = [game.home_team_id, game.away_team_id]
            .into_iter()
            .map(|team_id| {
                let rows = player_stats.iter().filter(|r| r.team_id == team_id);
                let mut out = TeamGameStats {
                    team_id,
                    game_id: game.game_id,
                    season_id: game.season_id,
                    ..TeamGameStats::default()
                };
                for r in rows {
                    out.points += r.points;
                    out.rebounds += r.rebounds;
                    out.assists += r.assists;
                    out.turnovers += r.turnovers;
                }
                out
            })
            .collect();

        SyntheticGame {
            game,
            events: self.events,
            player_stats,
            team_stats,
        }
    }
}

/// Simulate one game. Overtime periods are added while the score is level.
pub fn generate_game<R: Rng>(rng: &mut R, game: Game) -> SyntheticGame {
    let mut builder = Builder {
        rng,
        game,
        events: Vec::new(),
        score: Score::default(),
        box_scores: HashMap::new(),
    };
    for period in 1..=REGULATION_PERIODS {
        builder.play_period(period);
    }
    let mut period = REGULATION_PERIODS;
    while builder.score.home == builder.score.away && period < REGULATION_PERIODS + MAX_OVERTIMES {
        period += 1;
        builder.play_period(period);
    }
    builder.finish()
}

/// Double round-robin between `team_ids`, one game every other day.
pub fn generate_season(
    seed: u64,
    season_id: SeasonId,
    team_ids: &[TeamId],
    first_game_id: GameId,
    start: NaiveDate,
) -> Vec<SyntheticGame> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut out = Vec::new();
    let mut game_id = first_game_id;
    let mut date = start;
    for &home in team_ids {
        for &away in team_ids {
            if home == away {
                continue;
            }
            let game = Game {
                game_id,
                home_team_id: home,
                away_team_id: away,
                season_id,
                game_date: date,
            };
            out.push(generate_game(&mut rng, game));
            game_id += 1;
            date += ChronoDuration::days(2);
        }
    }
    out
}

pub fn memory_store(games: &[SyntheticGame]) -> MemoryStore {
    let mut store = MemoryStore::new();
    for g in games {
        store.insert_game(g.game.clone());
        store.insert_events(g.events.iter().cloned());
        store.insert_player_stats(g.player_stats.iter().cloned());
        store.insert_team_stats(g.team_stats.iter().cloned());
    }
    store
}
