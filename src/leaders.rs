use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::AnalyticsError;
use crate::model::{PlayerGameStats, PlayerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatCategory {
    Points,
    Rebounds,
    Assists,
    Steals,
    Blocks,
    Turnovers,
    Minutes,
}

impl StatCategory {
    pub const ALL: [StatCategory; 7] = [
        StatCategory::Points,
        StatCategory::Rebounds,
        StatCategory::Assists,
        StatCategory::Steals,
        StatCategory::Blocks,
        StatCategory::Turnovers,
        StatCategory::Minutes,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StatCategory::Points => "points",
            StatCategory::Rebounds => "rebounds",
            StatCategory::Assists => "assists",
            StatCategory::Steals => "steals",
            StatCategory::Blocks => "blocks",
            StatCategory::Turnovers => "turnovers",
            StatCategory::Minutes => "minutes",
        }
    }

    pub fn value(self, row: &PlayerGameStats) -> u32 {
        match self {
            StatCategory::Points => row.points,
            StatCategory::Rebounds => row.rebounds,
            StatCategory::Assists => row.assists,
            StatCategory::Steals => row.steals,
            StatCategory::Blocks => row.blocks,
            StatCategory::Turnovers => row.turnovers,
            StatCategory::Minutes => row.minutes,
        }
    }
}

impl FromStr for StatCategory {
    type Err = AnalyticsError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let wanted = raw.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| AnalyticsError::UnknownStatCategory(raw.to_string()))
    }
}

impl fmt::Display for StatCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderEntry {
    pub rank: usize,
    pub player_id: PlayerId,
    pub games: u32,
    pub total: u32,
    pub per_game: f64,
}

/// Rank players by per-game average in `category`.
pub fn season_leaders(
    rows: &[PlayerGameStats],
    category: StatCategory,
    limit: usize,
    min_games: u32,
) -> Vec<LeaderEntry> {
    let mut totals: HashMap<PlayerId, (u32, u32)> = HashMap::new();
    for row in rows {
        let entry = totals.entry(row.player_id).or_insert((0, 0));
        entry.0 += 1;
        entry.1 += category.value(row);
    }

    let mut entries: Vec<LeaderEntry> = totals
        .into_iter()
        .filter(|(_, (games, _))| *games > 0 && *games >= min_games)
        .map(|(player_id, (games, total))| LeaderEntry {
            rank: 0,
            player_id,
            games,
            total,
            per_game: total as f64 / games as f64,
        })
        .collect();

    entries.sort_by(|a, b| {
        b.per_game
            .total_cmp(&a.per_game)
            .then(a.player_id.cmp(&b.player_id))
    });
    entries.truncate(limit);
    for (idx, entry) in entries.iter_mut().enumerate() {
        entry.rank = idx + 1;
    }
    entries
}
