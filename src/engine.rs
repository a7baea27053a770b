use std::collections::HashSet;

use rayon::prelude::*;
use tracing::debug;

use crate::clutch::{self, ClutchFilter, ClutchSummary};
use crate::error::Result;
use crate::leaders::{self, LeaderEntry, StatCategory};
use crate::model::{Game, GameId, PlayByPlayEvent, PlayerGameStats, PlayerId, SeasonId, TeamId};
use crate::opponent::{self, HomeAwaySplit, OpponentFilter, TeamRecord, index_games};
use crate::score::{self, Score, ScoreTimeline};
use crate::situational::{self, SituationalFilter, SituationalStats};
use crate::store::{EventStore, GameStore, StatsStore};

const DEFAULT_PARALLELISM: usize = 4;

/// Stateless analytics facade over a read-only store.
///
/// Every call fetches what it needs once and computes from that snapshot;
/// nothing is cached between calls. A missing game or player yields neutral
/// values (zero score, empty lists, zeroed aggregates), never an error.
pub struct Analytics<S> {
    store: S,
    parallelism: usize,
}

impl<S> Analytics<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            parallelism: DEFAULT_PARALLELISM,
        }
    }

    pub fn with_parallelism(mut self, threads: usize) -> Self {
        self.parallelism = threads.max(1);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: EventStore + GameStore> Analytics<S> {
    fn load_game(&self, game_id: GameId) -> Result<Option<(Game, Vec<PlayByPlayEvent>)>> {
        let Some(game) = self.store.fetch_game(game_id)? else {
            debug!(game_id, "game not found");
            return Ok(None);
        };
        let events = self.store.fetch_events(game_id)?;
        Ok(Some((game, events)))
    }

    pub fn score_at_time(&self, game_id: GameId, period: u32, seconds_remaining: u32) -> Result<Score> {
        Ok(match self.load_game(game_id)? {
            Some((game, events)) => score::score_at_time(&events, &game, period, seconds_remaining),
            None => Score::default(),
        })
    }

    pub fn final_score(&self, game_id: GameId) -> Result<Score> {
        Ok(match self.load_game(game_id)? {
            Some((game, events)) => ScoreTimeline::build(&events, &game).final_score(),
            None => Score::default(),
        })
    }

    pub fn is_clutch_moment(
        &self,
        game_id: GameId,
        period: u32,
        seconds_remaining: u32,
        margin_threshold: u32,
        min_period: u32,
    ) -> Result<bool> {
        if period < min_period {
            return Ok(false);
        }
        // A missing game reconstructs to 0-0.
        let Some((game, events)) = self.load_game(game_id)? else {
            return Ok(Score::default().margin() <= margin_threshold);
        };
        Ok(clutch::is_clutch_moment(
            &events,
            &game,
            period,
            seconds_remaining,
            margin_threshold,
            min_period,
        ))
    }

    pub fn clutch_events(&self, game_id: GameId, filter: &ClutchFilter) -> Result<Vec<PlayByPlayEvent>> {
        let Some((game, events)) = self.load_game(game_id)? else {
            return Ok(Vec::new());
        };
        let out = clutch::clutch_events(&events, &game, filter);
        debug!(game_id, total = events.len(), clutch = out.len(), "filtered clutch events");
        Ok(out)
    }

    pub fn clutch_player_summary(
        &self,
        game_ids: &[GameId],
        player_id: PlayerId,
        filter: &ClutchFilter,
    ) -> Result<ClutchSummary> {
        let mut loaded = Vec::new();
        for game_id in dedup_ids(game_ids) {
            if let Some(pair) = self.load_game(game_id)? {
                loaded.push(pair);
            }
        }
        Ok(with_pool(self.parallelism, || {
            loaded
                .par_iter()
                .map(|(game, events)| clutch::clutch_player_summary(events, game, player_id, filter))
                .reduce(ClutchSummary::default, |mut acc, next| {
                    acc.merge(&next);
                    acc
                })
        }))
    }
}

impl<S: EventStore> Analytics<S> {
    pub fn situational_shots(
        &self,
        game_id: GameId,
        player_id: Option<PlayerId>,
        team_id: Option<TeamId>,
        filter: &SituationalFilter,
    ) -> Result<Vec<PlayByPlayEvent>> {
        let events = self.store.fetch_events(game_id)?;
        Ok(situational::situational_shots(&events, player_id, team_id, filter)
            .into_iter()
            .cloned()
            .collect())
    }

    pub fn situational_stats(
        &self,
        game_ids: &[GameId],
        player_id: PlayerId,
        filter: &SituationalFilter,
    ) -> Result<SituationalStats> {
        let mut per_game = Vec::new();
        for game_id in dedup_ids(game_ids) {
            per_game.push(self.store.fetch_events(game_id)?);
        }
        Ok(with_pool(self.parallelism, || {
            per_game
                .par_iter()
                .map(|events| situational::situational_stats_for_game(events, player_id, filter))
                .reduce(SituationalStats::default, SituationalStats::combine)
        }))
    }
}

impl<S: GameStore + StatsStore> Analytics<S> {
    pub fn games_vs_opponent(
        &self,
        team_id: TeamId,
        opponent_id: TeamId,
        season_id: Option<SeasonId>,
    ) -> Result<Vec<Game>> {
        let games = self.store.fetch_team_games(team_id, season_id)?;
        Ok(opponent::games_vs_opponent(&games, team_id, opponent_id, season_id))
    }

    pub fn player_stats_vs_opponent(
        &self,
        player_id: PlayerId,
        opponent_id: TeamId,
        season_id: Option<SeasonId>,
    ) -> Result<Vec<PlayerGameStats>> {
        let rows = self.store.fetch_player_game_stats(player_id, season_id)?;
        let games = self.games_for_rows(&rows)?;
        Ok(opponent::player_stats_vs_opponent(&rows, &games, opponent_id, season_id))
    }

    pub fn home_away_split(&self, player_id: PlayerId, season_id: SeasonId) -> Result<HomeAwaySplit> {
        let rows = self.store.fetch_player_game_stats(player_id, Some(season_id))?;
        if rows.is_empty() {
            return Ok(HomeAwaySplit::default());
        }
        let games = self.games_for_rows(&rows)?;
        Ok(opponent::home_away_split(&rows, &games))
    }

    pub fn player_game_log(
        &self,
        player_id: PlayerId,
        season_id: Option<SeasonId>,
        filter: &OpponentFilter,
    ) -> Result<Vec<PlayerGameStats>> {
        let rows = self.store.fetch_player_game_stats(player_id, season_id)?;
        let games = self.games_for_rows(&rows)?;
        Ok(opponent::filter_game_log(&rows, &games, filter))
    }

    pub fn team_record_vs_opponent(
        &self,
        team_id: TeamId,
        opponent_id: TeamId,
        season_id: Option<SeasonId>,
    ) -> Result<TeamRecord> {
        let games = self.games_vs_opponent(team_id, opponent_id, season_id)?;
        let ids: Vec<GameId> = games.iter().map(|g| g.game_id).collect();
        let team_stats = self.store.fetch_team_game_stats(&ids)?;
        Ok(opponent::team_record_vs_opponent(&games, &team_stats, team_id, opponent_id))
    }

    /// Rejects an unknown category before touching the store.
    pub fn season_leaders(
        &self,
        season_id: SeasonId,
        category: &str,
        limit: usize,
        min_games: u32,
    ) -> Result<Vec<LeaderEntry>> {
        let category: StatCategory = category.parse()?;
        let rows = self.store.fetch_season_player_stats(season_id)?;
        Ok(leaders::season_leaders(&rows, category, limit, min_games))
    }

    fn games_for_rows(&self, rows: &[PlayerGameStats]) -> Result<opponent::GameIndex> {
        let ids = dedup_ids(&rows.iter().map(|r| r.game_id).collect::<Vec<_>>());
        Ok(index_games(self.store.fetch_games(&ids)?))
    }
}

fn dedup_ids(ids: &[GameId]) -> Vec<GameId> {
    let mut seen = HashSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

fn with_pool<T>(threads: usize, action: impl FnOnce() -> T + Send) -> T
where
    T: Send,
{
    match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
        Ok(pool) => pool.install(action),
        Err(_) => action(),
    }
}
