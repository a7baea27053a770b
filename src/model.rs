use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::clock;
use crate::error::Result;

pub type GameId = u32;
pub type TeamId = u32;
pub type PlayerId = u32;
pub type SeasonId = u32;

/// Last regulation period; anything above is overtime.
pub const REGULATION_PERIODS: u32 = 4;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
    Shot,
    FreeThrow,
    Rebound,
    Timeout,
    Other(String),
}

impl EventKind {
    pub fn as_str(&self) -> &str {
        match self {
            EventKind::Shot => "SHOT",
            EventKind::FreeThrow => "FREE_THROW",
            EventKind::Rebound => "REBOUND",
            EventKind::Timeout => "TIMEOUT",
            EventKind::Other(raw) => raw.as_str(),
        }
    }
}

impl From<&str> for EventKind {
    fn from(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "SHOT" => EventKind::Shot,
            "FREE_THROW" => EventKind::FreeThrow,
            "REBOUND" => EventKind::Rebound,
            "TIMEOUT" => EventKind::Timeout,
            _ => EventKind::Other(raw.trim().to_string()),
        }
    }
}

impl From<String> for EventKind {
    fn from(raw: String) -> Self {
        EventKind::from(raw.as_str())
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Situational flags the engine knows how to filter on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SituationKey {
    FastBreak,
    SecondChance,
    Contested,
    ShotType,
}

impl SituationKey {
    pub const ALL: [SituationKey; 4] = [
        SituationKey::FastBreak,
        SituationKey::SecondChance,
        SituationKey::Contested,
        SituationKey::ShotType,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SituationKey::FastBreak => "fast_break",
            SituationKey::SecondChance => "second_chance",
            SituationKey::Contested => "contested",
            SituationKey::ShotType => "shot_type",
        }
    }

    pub fn from_key(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == raw)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Text(String),
    /// Numbers, nulls and nested values from provider extensions. Never
    /// satisfies a situational filter.
    Other(serde_json::Value),
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        AttrValue::Bool(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        AttrValue::Text(v.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        AttrValue::Text(v)
    }
}

/// Situational attributes attached to an event.
///
/// Known keys are routed into a typed map; anything else a provider sends is
/// kept verbatim in `extra`. A key that is absent means the flag does not
/// satisfy any filter on it, not that it is unknown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, AttrValue>",
    into = "BTreeMap<String, AttrValue>"
)]
pub struct EventAttributes {
    known: BTreeMap<SituationKey, AttrValue>,
    extra: BTreeMap<String, AttrValue>,
}

impl EventAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: SituationKey, value: impl Into<AttrValue>) -> Self {
        self.known.insert(key, value.into());
        self
    }

    pub fn insert_raw(&mut self, key: &str, value: AttrValue) {
        match SituationKey::from_key(key) {
            Some(known) => {
                self.known.insert(known, value);
            }
            None => {
                self.extra.insert(key.to_string(), value);
            }
        }
    }

    pub fn get(&self, key: SituationKey) -> Option<&AttrValue> {
        self.known.get(&key)
    }

    pub fn extra(&self, key: &str) -> Option<&AttrValue> {
        self.extra.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty() && self.extra.is_empty()
    }
}

impl From<BTreeMap<String, AttrValue>> for EventAttributes {
    fn from(raw: BTreeMap<String, AttrValue>) -> Self {
        let mut out = EventAttributes::default();
        for (key, value) in raw {
            out.insert_raw(&key, value);
        }
        out
    }
}

impl From<EventAttributes> for BTreeMap<String, AttrValue> {
    fn from(attrs: EventAttributes) -> Self {
        let mut out = attrs.extra;
        for (key, value) in attrs.known {
            out.insert(key.as_str().to_string(), value);
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayByPlayEvent {
    pub game_id: GameId,
    pub event_number: u32,
    pub period: u32,
    pub clock: String,
    pub event_type: EventKind,
    #[serde(default)]
    pub event_subtype: Option<String>,
    /// `None` when the event is not a scoring attempt.
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub team_id: Option<TeamId>,
    #[serde(default)]
    pub player_id: Option<PlayerId>,
    #[serde(default)]
    pub attributes: EventAttributes,
}

impl PlayByPlayEvent {
    pub fn seconds_remaining(&self) -> Result<u32> {
        clock::parse_clock(&self.clock)
    }

    pub fn is_shot(&self) -> bool {
        self.event_type == EventKind::Shot
    }

    pub fn is_three(&self) -> bool {
        self.is_shot() && self.event_subtype.as_deref() == Some("3PT")
    }

    pub fn is_made(&self) -> bool {
        self.success == Some(true)
    }

    pub fn is_overtime(&self) -> bool {
        self.period > REGULATION_PERIODS
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Home,
    Away,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    pub game_id: GameId,
    pub home_team_id: TeamId,
    pub away_team_id: TeamId,
    pub season_id: SeasonId,
    pub game_date: NaiveDate,
}

impl Game {
    pub fn side_of(&self, team_id: TeamId) -> Option<Side> {
        if team_id == self.home_team_id {
            Some(Side::Home)
        } else if team_id == self.away_team_id {
            Some(Side::Away)
        } else {
            None
        }
    }

    pub fn involves(&self, team_id: TeamId) -> bool {
        self.side_of(team_id).is_some()
    }

    /// Symmetric pairing check; home/away order does not matter.
    pub fn is_matchup(&self, a: TeamId, b: TeamId) -> bool {
        (self.home_team_id == a && self.away_team_id == b)
            || (self.home_team_id == b && self.away_team_id == a)
    }

    pub fn opponent_of(&self, team_id: TeamId) -> Option<TeamId> {
        match self.side_of(team_id)? {
            Side::Home => Some(self.away_team_id),
            Side::Away => Some(self.home_team_id),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerGameStats {
    pub player_id: PlayerId,
    pub game_id: GameId,
    pub team_id: TeamId,
    pub season_id: SeasonId,
    pub minutes: u32,
    pub points: u32,
    pub rebounds: u32,
    pub assists: u32,
    pub steals: u32,
    pub blocks: u32,
    pub turnovers: u32,
    pub fgm: u32,
    pub fga: u32,
    pub fg3m: u32,
    pub fg3a: u32,
    pub ftm: u32,
    pub fta: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamGameStats {
    pub team_id: TeamId,
    pub game_id: GameId,
    pub season_id: SeasonId,
    pub points: u32,
    pub rebounds: u32,
    pub assists: u32,
    pub turnovers: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attributes_route_known_and_extra_keys() {
        let raw = BTreeMap::from([
            ("fast_break".to_string(), AttrValue::Bool(true)),
            ("shot_type".to_string(), AttrValue::Text("layup".to_string())),
            ("provider_zone".to_string(), AttrValue::Text("paint".to_string())),
        ]);
        let attrs = EventAttributes::from(raw.clone());
        assert_eq!(attrs.get(SituationKey::FastBreak), Some(&AttrValue::Bool(true)));
        assert_eq!(attrs.get(SituationKey::Contested), None);
        assert_eq!(
            attrs.extra("provider_zone"),
            Some(&AttrValue::Text("paint".to_string()))
        );
        let back: BTreeMap<String, AttrValue> = attrs.into();
        assert_eq!(back, raw);
    }

    #[test]
    fn non_text_extension_values_still_decode() {
        let attrs: EventAttributes =
            serde_json::from_str(r#"{"distance":23,"zone":null,"contested":true}"#)
                .expect("extension values should decode");
        assert_eq!(attrs.get(SituationKey::Contested), Some(&AttrValue::Bool(true)));
        assert_eq!(
            attrs.extra("distance"),
            Some(&AttrValue::Other(serde_json::json!(23)))
        );
        assert_eq!(
            attrs.extra("zone"),
            Some(&AttrValue::Other(serde_json::Value::Null))
        );
    }

    #[test]
    fn event_kind_normalizes_case() {
        assert_eq!(EventKind::from("shot"), EventKind::Shot);
        assert_eq!(EventKind::from("Free_Throw"), EventKind::FreeThrow);
        assert_eq!(
            EventKind::from("JUMP_BALL"),
            EventKind::Other("JUMP_BALL".to_string())
        );
    }

    #[test]
    fn opponent_is_symmetric() {
        let game = Game {
            game_id: 1,
            home_team_id: 10,
            away_team_id: 20,
            season_id: 2024,
            game_date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
        };
        assert_eq!(game.opponent_of(10), Some(20));
        assert_eq!(game.opponent_of(20), Some(10));
        assert_eq!(game.opponent_of(30), None);
        assert!(game.is_matchup(20, 10));
    }
}
