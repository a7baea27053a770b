use std::collections::HashMap;

use anyhow::Result;

use crate::model::{
    Game, GameId, PlayByPlayEvent, PlayerGameStats, PlayerId, SeasonId, TeamGameStats, TeamId,
};

/// Read access to play-by-play. Events come back ordered by `event_number`
/// in one snapshot read.
pub trait EventStore {
    fn fetch_events(&self, game_id: GameId) -> Result<Vec<PlayByPlayEvent>>;
}

pub trait GameStore {
    fn fetch_game(&self, game_id: GameId) -> Result<Option<Game>>;

    fn fetch_team_games(&self, team_id: TeamId, season_id: Option<SeasonId>) -> Result<Vec<Game>>;

    fn fetch_games(&self, game_ids: &[GameId]) -> Result<Vec<Game>> {
        let mut out = Vec::with_capacity(game_ids.len());
        for id in game_ids {
            if let Some(game) = self.fetch_game(*id)? {
                out.push(game);
            }
        }
        Ok(out)
    }
}

pub trait StatsStore {
    fn fetch_player_game_stats(
        &self,
        player_id: PlayerId,
        season_id: Option<SeasonId>,
    ) -> Result<Vec<PlayerGameStats>>;

    fn fetch_season_player_stats(&self, season_id: SeasonId) -> Result<Vec<PlayerGameStats>>;

    fn fetch_team_game_stats(&self, game_ids: &[GameId]) -> Result<Vec<TeamGameStats>>;
}

impl<T: EventStore + ?Sized> EventStore for &T {
    fn fetch_events(&self, game_id: GameId) -> Result<Vec<PlayByPlayEvent>> {
        (**self).fetch_events(game_id)
    }
}

impl<T: GameStore + ?Sized> GameStore for &T {
    fn fetch_game(&self, game_id: GameId) -> Result<Option<Game>> {
        (**self).fetch_game(game_id)
    }

    fn fetch_team_games(&self, team_id: TeamId, season_id: Option<SeasonId>) -> Result<Vec<Game>> {
        (**self).fetch_team_games(team_id, season_id)
    }

    fn fetch_games(&self, game_ids: &[GameId]) -> Result<Vec<Game>> {
        (**self).fetch_games(game_ids)
    }
}

impl<T: StatsStore + ?Sized> StatsStore for &T {
    fn fetch_player_game_stats(
        &self,
        player_id: PlayerId,
        season_id: Option<SeasonId>,
    ) -> Result<Vec<PlayerGameStats>> {
        (**self).fetch_player_game_stats(player_id, season_id)
    }

    fn fetch_season_player_stats(&self, season_id: SeasonId) -> Result<Vec<PlayerGameStats>> {
        (**self).fetch_season_player_stats(season_id)
    }

    fn fetch_team_game_stats(&self, game_ids: &[GameId]) -> Result<Vec<TeamGameStats>> {
        (**self).fetch_team_game_stats(game_ids)
    }
}

/// Store backed by plain collections; used by tests and the synthetic demo.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    games: HashMap<GameId, Game>,
    events: HashMap<GameId, Vec<PlayByPlayEvent>>,
    player_stats: Vec<PlayerGameStats>,
    team_stats: Vec<TeamGameStats>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_game(&mut self, game: Game) {
        self.games.insert(game.game_id, game);
    }

    /// Events are kept sorted by `event_number`.
    pub fn insert_events(&mut self, events: impl IntoIterator<Item = PlayByPlayEvent>) {
        for event in events {
            self.events.entry(event.game_id).or_default().push(event);
        }
        for list in self.events.values_mut() {
            list.sort_by_key(|e| e.event_number);
        }
    }

    pub fn insert_player_stats(&mut self, rows: impl IntoIterator<Item = PlayerGameStats>) {
        self.player_stats.extend(rows);
    }

    pub fn insert_team_stats(&mut self, rows: impl IntoIterator<Item = TeamGameStats>) {
        self.team_stats.extend(rows);
    }
}

impl EventStore for MemoryStore {
    fn fetch_events(&self, game_id: GameId) -> Result<Vec<PlayByPlayEvent>> {
        Ok(self.events.get(&game_id).cloned().unwrap_or_default())
    }
}

impl GameStore for MemoryStore {
    fn fetch_game(&self, game_id: GameId) -> Result<Option<Game>> {
        Ok(self.games.get(&game_id).cloned())
    }

    fn fetch_team_games(&self, team_id: TeamId, season_id: Option<SeasonId>) -> Result<Vec<Game>> {
        let mut out: Vec<Game> = self
            .games
            .values()
            .filter(|g| g.involves(team_id))
            .filter(|g| season_id.is_none_or(|s| g.season_id == s))
            .cloned()
            .collect();
        out.sort_by_key(|g| (g.game_date, g.game_id));
        Ok(out)
    }
}

impl StatsStore for MemoryStore {
    fn fetch_player_game_stats(
        &self,
        player_id: PlayerId,
        season_id: Option<SeasonId>,
    ) -> Result<Vec<PlayerGameStats>> {
        Ok(self
            .player_stats
            .iter()
            .filter(|r| r.player_id == player_id)
            .filter(|r| season_id.is_none_or(|s| r.season_id == s))
            .cloned()
            .collect())
    }

    fn fetch_season_player_stats(&self, season_id: SeasonId) -> Result<Vec<PlayerGameStats>> {
        Ok(self
            .player_stats
            .iter()
            .filter(|r| r.season_id == season_id)
            .cloned()
            .collect())
    }

    fn fetch_team_game_stats(&self, game_ids: &[GameId]) -> Result<Vec<TeamGameStats>> {
        Ok(self
            .team_stats
            .iter()
            .filter(|r| game_ids.contains(&r.game_id))
            .cloned()
            .collect())
    }
}
