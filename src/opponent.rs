use std::cmp::Reverse;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{AnalyticsError, Result};
use crate::model::{Game, GameId, PlayerGameStats, SeasonId, Side, TeamGameStats, TeamId};

pub type GameIndex = HashMap<GameId, Game>;

pub fn index_games(games: impl IntoIterator<Item = Game>) -> GameIndex {
    games.into_iter().map(|g| (g.game_id, g)).collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawOpponentFilter")]
pub struct OpponentFilter {
    opponent_team_id: Option<TeamId>,
    home_only: bool,
    away_only: bool,
}

impl OpponentFilter {
    pub fn new(opponent_team_id: Option<TeamId>, home_only: bool, away_only: bool) -> Result<Self> {
        if home_only && away_only {
            return Err(AnalyticsError::invalid(
                "home_only",
                "home_only and away_only cannot both be set",
            ));
        }
        Ok(Self {
            opponent_team_id,
            home_only,
            away_only,
        })
    }

    pub fn opponent_team_id(&self) -> Option<TeamId> {
        self.opponent_team_id
    }

    pub fn home_only(&self) -> bool {
        self.home_only
    }

    pub fn away_only(&self) -> bool {
        self.away_only
    }

    fn accepts(&self, game: &Game, own_team: TeamId) -> bool {
        let Some(side) = game.side_of(own_team) else {
            return false;
        };
        if self.home_only && side != Side::Home {
            return false;
        }
        if self.away_only && side != Side::Away {
            return false;
        }
        match self.opponent_team_id {
            Some(opp) => own_team != opp && game.opponent_of(own_team) == Some(opp),
            None => true,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawOpponentFilter {
    opponent_team_id: Option<TeamId>,
    home_only: bool,
    away_only: bool,
}

impl TryFrom<RawOpponentFilter> for OpponentFilter {
    type Error = AnalyticsError;

    fn try_from(raw: RawOpponentFilter) -> Result<Self> {
        OpponentFilter::new(raw.opponent_team_id, raw.home_only, raw.away_only)
    }
}

/// Games between two teams regardless of who hosted, newest first.
pub fn games_vs_opponent(
    games: &[Game],
    team_id: TeamId,
    opponent_id: TeamId,
    season_id: Option<SeasonId>,
) -> Vec<Game> {
    let mut out: Vec<Game> = games
        .iter()
        .filter(|g| g.is_matchup(team_id, opponent_id))
        .filter(|g| season_id.is_none_or(|s| g.season_id == s))
        .cloned()
        .collect();
    out.sort_by_key(|g| (Reverse(g.game_date), Reverse(g.game_id)));
    out
}

/// Stat rows from games where the player's team faced `opponent_id`. Rows
/// from the opponent's own roster, or whose team played neither side, are
/// left out.
pub fn player_stats_vs_opponent(
    rows: &[PlayerGameStats],
    games: &GameIndex,
    opponent_id: TeamId,
    season_id: Option<SeasonId>,
) -> Vec<PlayerGameStats> {
    rows.iter()
        .filter(|r| season_id.is_none_or(|s| r.season_id == s))
        .filter(|r| {
            games
                .get(&r.game_id)
                .is_some_and(|g| g.opponent_of(r.team_id) == Some(opponent_id))
        })
        .cloned()
        .collect()
}

/// A player's game log narrowed by an [`OpponentFilter`].
pub fn filter_game_log(
    rows: &[PlayerGameStats],
    games: &GameIndex,
    filter: &OpponentFilter,
) -> Vec<PlayerGameStats> {
    rows.iter()
        .filter(|r| games.get(&r.game_id).is_some_and(|g| filter.accepts(g, r.team_id)))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SplitLine {
    pub games: u32,
    pub points: u32,
    pub rebounds: u32,
    pub assists: u32,
    pub avg_points: f64,
    pub avg_rebounds: f64,
    pub avg_assists: f64,
}

impl SplitLine {
    fn add(&mut self, row: &PlayerGameStats) {
        self.games += 1;
        self.points += row.points;
        self.rebounds += row.rebounds;
        self.assists += row.assists;
    }

    fn finish(mut self) -> Self {
        self.avg_points = per_game(self.points, self.games);
        self.avg_rebounds = per_game(self.rebounds, self.games);
        self.avg_assists = per_game(self.assists, self.games);
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct HomeAwaySplit {
    pub home: SplitLine,
    pub away: SplitLine,
}

impl HomeAwaySplit {
    pub fn total_games(&self) -> u32 {
        self.home.games + self.away.games
    }
}

/// Partition a player's rows by whether their team hosted the game.
pub fn home_away_split(rows: &[PlayerGameStats], games: &GameIndex) -> HomeAwaySplit {
    let mut home = SplitLine::default();
    let mut away = SplitLine::default();
    for row in rows {
        let Some(game) = games.get(&row.game_id) else {
            warn!(game_id = row.game_id, player_id = row.player_id, "stat row without game");
            continue;
        };
        match game.side_of(row.team_id) {
            Some(Side::Home) => home.add(row),
            Some(Side::Away) => away.add(row),
            None => warn!(
                game_id = row.game_id,
                team_id = row.team_id,
                "stat row team is neither home nor away"
            ),
        }
    }
    HomeAwaySplit {
        home: home.finish(),
        away: away.finish(),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TeamRecord {
    pub games: u32,
    pub wins: u32,
    pub losses: u32,
    pub points_for: u32,
    pub points_against: u32,
    pub avg_margin: f64,
}

/// Head-to-head record built from team box scores of the given games.
/// Games missing either side's box score are left out.
pub fn team_record_vs_opponent(
    matchups: &[Game],
    team_stats: &[TeamGameStats],
    team_id: TeamId,
    opponent_id: TeamId,
) -> TeamRecord {
    let by_key: HashMap<(GameId, TeamId), &TeamGameStats> = team_stats
        .iter()
        .map(|s| ((s.game_id, s.team_id), s))
        .collect();

    let mut out = TeamRecord::default();
    for game in matchups.iter().filter(|g| g.is_matchup(team_id, opponent_id)) {
        let (Some(own), Some(opp)) = (
            by_key.get(&(game.game_id, team_id)),
            by_key.get(&(game.game_id, opponent_id)),
        ) else {
            continue;
        };
        out.games += 1;
        out.points_for += own.points;
        out.points_against += opp.points;
        if own.points > opp.points {
            out.wins += 1;
        } else if own.points < opp.points {
            out.losses += 1;
        }
    }
    if out.games > 0 {
        out.avg_margin =
            (out.points_for as f64 - out.points_against as f64) / out.games as f64;
    }
    out
}

fn per_game(total: u32, games: u32) -> f64 {
    if games == 0 {
        0.0
    } else {
        total as f64 / games as f64
    }
}
