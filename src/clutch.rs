use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AnalyticsError, Result};
use crate::model::{EventKind, Game, PlayByPlayEvent, PlayerId};
use crate::score::{ScoreTimeline, points_for, score_at_time};

pub const MAX_TIME_REMAINING_SECONDS: u32 = 720;
pub const MAX_SCORE_MARGIN: u32 = 50;
pub const MAX_MIN_PERIOD: u32 = 10;

/// Definition of a clutch window. Construct through [`ClutchFilter::new`] or
/// `Default`; deserialization runs the same validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawClutchFilter")]
pub struct ClutchFilter {
    time_remaining_seconds: u32,
    score_margin: u32,
    include_overtime: bool,
    min_period: u32,
}

impl Default for ClutchFilter {
    fn default() -> Self {
        Self {
            time_remaining_seconds: 300,
            score_margin: 5,
            include_overtime: true,
            min_period: 4,
        }
    }
}

impl ClutchFilter {
    pub fn new(
        time_remaining_seconds: u32,
        score_margin: u32,
        include_overtime: bool,
        min_period: u32,
    ) -> Result<Self> {
        if time_remaining_seconds > MAX_TIME_REMAINING_SECONDS {
            return Err(AnalyticsError::invalid(
                "time_remaining_seconds",
                format!("{time_remaining_seconds} is outside [0, {MAX_TIME_REMAINING_SECONDS}]"),
            ));
        }
        if score_margin > MAX_SCORE_MARGIN {
            return Err(AnalyticsError::invalid(
                "score_margin",
                format!("{score_margin} is outside [0, {MAX_SCORE_MARGIN}]"),
            ));
        }
        if !(1..=MAX_MIN_PERIOD).contains(&min_period) {
            return Err(AnalyticsError::invalid(
                "min_period",
                format!("{min_period} is outside [1, {MAX_MIN_PERIOD}]"),
            ));
        }
        Ok(Self {
            time_remaining_seconds,
            score_margin,
            include_overtime,
            min_period,
        })
    }

    pub fn time_remaining_seconds(&self) -> u32 {
        self.time_remaining_seconds
    }

    pub fn score_margin(&self) -> u32 {
        self.score_margin
    }

    pub fn include_overtime(&self) -> bool {
        self.include_overtime
    }

    pub fn min_period(&self) -> u32 {
        self.min_period
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawClutchFilter {
    time_remaining_seconds: u32,
    score_margin: u32,
    include_overtime: bool,
    min_period: u32,
}

impl Default for RawClutchFilter {
    fn default() -> Self {
        let d = ClutchFilter::default();
        Self {
            time_remaining_seconds: d.time_remaining_seconds,
            score_margin: d.score_margin,
            include_overtime: d.include_overtime,
            min_period: d.min_period,
        }
    }
}

impl TryFrom<RawClutchFilter> for ClutchFilter {
    type Error = AnalyticsError;

    fn try_from(raw: RawClutchFilter) -> Result<Self> {
        ClutchFilter::new(
            raw.time_remaining_seconds,
            raw.score_margin,
            raw.include_overtime,
            raw.min_period,
        )
    }
}

/// Whether the score at `(period, seconds_remaining)` is within `margin_threshold`.
/// Periods before `min_period` are never clutch.
pub fn is_clutch_moment(
    events: &[PlayByPlayEvent],
    game: &Game,
    period: u32,
    seconds_remaining: u32,
    margin_threshold: u32,
    min_period: u32,
) -> bool {
    if period < min_period {
        return false;
    }
    score_at_time(events, game, period, seconds_remaining).margin() <= margin_threshold
}

/// Events that happened in clutch time, in their original order.
///
/// The margin is taken one second before each event, so an event's own points
/// never decide whether it counts. The look-back score is cumulative: at the
/// start of a period it already holds every point from earlier periods.
pub fn clutch_events(
    events: &[PlayByPlayEvent],
    game: &Game,
    filter: &ClutchFilter,
) -> Vec<PlayByPlayEvent> {
    let timeline = ScoreTimeline::build(events, game);
    let mut out = Vec::new();
    for event in events {
        if event.period < filter.min_period {
            continue;
        }
        if event.is_overtime() && !filter.include_overtime {
            continue;
        }
        let Ok(seconds) = event.seconds_remaining() else {
            debug!(
                game_id = game.game_id,
                event_number = event.event_number,
                "clutch filter skipping unparseable clock"
            );
            continue;
        };
        if seconds > filter.time_remaining_seconds {
            continue;
        }
        let before = timeline.score_at(event.period, seconds.saturating_add(1));
        if before.margin() > filter.score_margin {
            continue;
        }
        out.push(event.clone());
    }
    out
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ClutchSummary {
    pub events: u32,
    pub points: u32,
    pub fgm: u32,
    pub fga: u32,
    pub fg3m: u32,
    pub fg3a: u32,
    pub ftm: u32,
    pub fta: u32,
    pub fg_pct: f64,
}

/// One player's production across the clutch events of a game.
pub fn clutch_player_summary(
    events: &[PlayByPlayEvent],
    game: &Game,
    player_id: PlayerId,
    filter: &ClutchFilter,
) -> ClutchSummary {
    let mut out = ClutchSummary::default();
    for event in clutch_events(events, game, filter) {
        if event.player_id != Some(player_id) {
            continue;
        }
        out.events += 1;
        out.points += points_for(&event);
        match event.event_type {
            EventKind::Shot => {
                out.fga += 1;
                out.fgm += u32::from(event.is_made());
                if event.is_three() {
                    out.fg3a += 1;
                    out.fg3m += u32::from(event.is_made());
                }
            }
            EventKind::FreeThrow => {
                out.fta += 1;
                out.ftm += u32::from(event.is_made());
            }
            _ => {}
        }
    }
    out.fg_pct = ratio(out.fgm, out.fga);
    out
}

impl ClutchSummary {
    pub fn merge(&mut self, other: &ClutchSummary) {
        self.events += other.events;
        self.points += other.points;
        self.fgm += other.fgm;
        self.fga += other.fga;
        self.fg3m += other.fg3m;
        self.fg3a += other.fg3a;
        self.ftm += other.ftm;
        self.fta += other.fta;
        self.fg_pct = ratio(self.fgm, self.fga);
    }
}

fn ratio(made: u32, attempted: u32) -> f64 {
    if attempted == 0 {
        0.0
    } else {
        made as f64 / attempted as f64
    }
}
