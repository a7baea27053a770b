use serde::{Deserialize, Serialize};

use crate::model::{AttrValue, PlayByPlayEvent, PlayerId, SituationKey, TeamId};

/// Situational predicates for shot filtering. `None` means "do not filter";
/// `Some(false)` is a real constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SituationalFilter {
    pub fast_break: Option<bool>,
    pub second_chance: Option<bool>,
    pub contested: Option<bool>,
    pub shot_type: Option<String>,
}

impl SituationalFilter {
    pub fn fast_break(mut self, v: bool) -> Self {
        self.fast_break = Some(v);
        self
    }

    pub fn second_chance(mut self, v: bool) -> Self {
        self.second_chance = Some(v);
        self
    }

    pub fn contested(mut self, v: bool) -> Self {
        self.contested = Some(v);
        self
    }

    pub fn shot_type(mut self, v: impl Into<String>) -> Self {
        self.shot_type = Some(v.into());
        self
    }

    pub fn is_unconstrained(&self) -> bool {
        self.constraints().is_empty()
    }

    fn constraints(&self) -> Vec<(SituationKey, AttrValue)> {
        let mut out = Vec::with_capacity(4);
        if let Some(v) = self.fast_break {
            out.push((SituationKey::FastBreak, AttrValue::Bool(v)));
        }
        if let Some(v) = self.second_chance {
            out.push((SituationKey::SecondChance, AttrValue::Bool(v)));
        }
        if let Some(v) = self.contested {
            out.push((SituationKey::Contested, AttrValue::Bool(v)));
        }
        if let Some(v) = &self.shot_type {
            out.push((SituationKey::ShotType, AttrValue::Text(v.clone())));
        }
        out
    }
}

/// Strict equality on every configured field; a missing attribute never matches.
pub fn matches(event: &PlayByPlayEvent, filter: &SituationalFilter) -> bool {
    filter
        .constraints()
        .iter()
        .all(|(key, want)| event.attributes.get(*key) == Some(want))
}

pub fn situational_shots<'a>(
    events: &'a [PlayByPlayEvent],
    player_id: Option<PlayerId>,
    team_id: Option<TeamId>,
    filter: &SituationalFilter,
) -> Vec<&'a PlayByPlayEvent> {
    events
        .iter()
        .filter(|e| e.is_shot())
        .filter(|e| player_id.is_none_or(|p| e.player_id == Some(p)))
        .filter(|e| team_id.is_none_or(|t| e.team_id == Some(t)))
        .filter(|e| matches(e, filter))
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SituationalStats {
    pub attempted: u32,
    pub made: u32,
    pub pct: f64,
}

impl SituationalStats {
    pub fn from_counts(attempted: u32, made: u32) -> Self {
        let pct = if attempted > 0 {
            made as f64 / attempted as f64
        } else {
            0.0
        };
        Self {
            attempted,
            made,
            pct,
        }
    }

    pub fn combine(self, other: SituationalStats) -> Self {
        Self::from_counts(self.attempted + other.attempted, self.made + other.made)
    }
}

/// Attempts and makes for one game's matching shots.
pub fn situational_stats_for_game(
    events: &[PlayByPlayEvent],
    player_id: PlayerId,
    filter: &SituationalFilter,
) -> SituationalStats {
    let shots = situational_shots(events, Some(player_id), None, filter);
    let made = shots.iter().filter(|e| e.is_made()).count() as u32;
    SituationalStats::from_counts(shots.len() as u32, made)
}
