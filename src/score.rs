use std::cmp::Reverse;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{EventKind, Game, PlayByPlayEvent, Side};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub home: u32,
    pub away: u32,
}

impl Score {
    pub fn new(home: u32, away: u32) -> Self {
        Self { home, away }
    }

    pub fn margin(&self) -> u32 {
        self.home.abs_diff(self.away)
    }

    pub fn as_tuple(&self) -> (u32, u32) {
        (self.home, self.away)
    }

    fn credit(&mut self, side: Side, points: u32) {
        match side {
            Side::Home => self.home += points,
            Side::Away => self.away += points,
        }
    }
}

/// Points credited for a single event under the scoring table.
pub fn points_for(event: &PlayByPlayEvent) -> u32 {
    if !event.is_made() {
        return 0;
    }
    match event.event_type {
        EventKind::FreeThrow => 1,
        EventKind::Shot if event.is_three() => 3,
        EventKind::Shot => 2,
        _ => 0,
    }
}

/// Seconds remaining decrease as time passes, so more seconds means earlier.
/// An event at exactly the query instant is included.
fn occurred_by(event_period: u32, event_seconds: u32, period: u32, seconds_remaining: u32) -> bool {
    event_period < period || (event_period == period && event_seconds >= seconds_remaining)
}

fn scoring_side(event: &PlayByPlayEvent, game: &Game) -> Option<Side> {
    event.team_id.and_then(|team| game.side_of(team))
}

/// Running score at `(period, seconds_remaining)` by a single scan of the events.
pub fn score_at_time(
    events: &[PlayByPlayEvent],
    game: &Game,
    period: u32,
    seconds_remaining: u32,
) -> Score {
    let mut score = Score::default();
    for event in events {
        let Ok(event_seconds) = event.seconds_remaining() else {
            debug!(
                game_id = game.game_id,
                event_number = event.event_number,
                clock = %event.clock,
                "skipping event with unparseable clock"
            );
            continue;
        };
        if !occurred_by(event.period, event_seconds, period, seconds_remaining) {
            continue;
        }
        let points = points_for(event);
        if points == 0 {
            continue;
        }
        if let Some(side) = scoring_side(event, game) {
            score.credit(side, points);
        }
    }
    score
}

#[derive(Debug, Clone, Copy)]
struct Mark {
    period: u32,
    seconds: u32,
    total: Score,
}

/// Cumulative score keyed by game coordinate.
///
/// Answers every query exactly like [`score_at_time`] but in O(log n), which
/// keeps per-event look-ups (clutch filtering) linear overall.
#[derive(Debug, Clone, Default)]
pub struct ScoreTimeline {
    marks: Vec<Mark>,
}

impl ScoreTimeline {
    pub fn build(events: &[PlayByPlayEvent], game: &Game) -> Self {
        let mut marks: Vec<Mark> = Vec::new();
        for event in events {
            let points = points_for(event);
            if points == 0 {
                continue;
            }
            let Some(side) = scoring_side(event, game) else {
                continue;
            };
            let Ok(seconds) = event.seconds_remaining() else {
                continue;
            };
            let mut delta = Score::default();
            delta.credit(side, points);
            marks.push(Mark {
                period: event.period,
                seconds,
                total: delta,
            });
        }

        // Order by coordinate so that "occurred by" is always a prefix.
        marks.sort_by_key(|m| (m.period, Reverse(m.seconds)));
        let mut running = Score::default();
        for mark in &mut marks {
            running.home += mark.total.home;
            running.away += mark.total.away;
            mark.total = running;
        }
        Self { marks }
    }

    pub fn score_at(&self, period: u32, seconds_remaining: u32) -> Score {
        let idx = self
            .marks
            .partition_point(|m| occurred_by(m.period, m.seconds, period, seconds_remaining));
        match idx {
            0 => Score::default(),
            n => self.marks[n - 1].total,
        }
    }

    pub fn final_score(&self) -> Score {
        self.marks.last().map(|m| m.total).unwrap_or_default()
    }

    /// Number of scoring events that were placed on the timeline.
    pub fn scoring_events(&self) -> usize {
        self.marks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EventAttributes;

    fn event(kind: &str, subtype: Option<&str>, success: Option<bool>) -> PlayByPlayEvent {
        PlayByPlayEvent {
            game_id: 1,
            event_number: 1,
            period: 1,
            clock: "10:00".to_string(),
            event_type: EventKind::from(kind),
            event_subtype: subtype.map(str::to_string),
            success,
            team_id: Some(1),
            player_id: None,
            attributes: EventAttributes::default(),
        }
    }

    #[test]
    fn scoring_table() {
        assert_eq!(points_for(&event("FREE_THROW", None, Some(true))), 1);
        assert_eq!(points_for(&event("SHOT", Some("3PT"), Some(true))), 3);
        assert_eq!(points_for(&event("SHOT", Some("LAYUP"), Some(true))), 2);
        assert_eq!(points_for(&event("SHOT", None, Some(true))), 2);
        assert_eq!(points_for(&event("SHOT", Some("3PT"), Some(false))), 0);
        assert_eq!(points_for(&event("SHOT", Some("3PT"), None)), 0);
        assert_eq!(points_for(&event("REBOUND", None, Some(true))), 0);
    }
}
