use chrono::NaiveDate;
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use hoops_analytics::clutch::{ClutchFilter, clutch_events};
use hoops_analytics::score::{ScoreTimeline, score_at_time};
use hoops_analytics::situational::{SituationalFilter, situational_stats_for_game};
use hoops_analytics::synthetic::{self, SyntheticGame};

fn sample_games() -> Vec<SyntheticGame> {
    synthetic::generate_season(
        2024,
        2024,
        &[1, 2, 3, 4],
        1,
        NaiveDate::from_ymd_opt(2024, 10, 22).expect("valid date"),
    )
}

fn bench_score_scan(c: &mut Criterion) {
    let games = sample_games();
    let g = &games[0];
    c.bench_function("score_at_time_scan", |b| {
        b.iter(|| {
            let score = score_at_time(black_box(&g.events), &g.game, 4, black_box(120));
            black_box(score.margin());
        })
    });
}

fn bench_score_timeline(c: &mut Criterion) {
    let games = sample_games();
    let g = &games[0];
    c.bench_function("score_timeline_build_and_query", |b| {
        b.iter(|| {
            let timeline = ScoreTimeline::build(black_box(&g.events), &g.game);
            for seconds in (0..720).step_by(30) {
                black_box(timeline.score_at(4, seconds));
            }
        })
    });
}

fn bench_clutch_filter(c: &mut Criterion) {
    let games = sample_games();
    let filter = ClutchFilter::new(720, 10, true, 1).expect("valid filter");
    c.bench_function("clutch_events_season", |b| {
        b.iter(|| {
            let mut total = 0usize;
            for g in &games {
                total += clutch_events(black_box(&g.events), &g.game, &filter).len();
            }
            black_box(total);
        })
    });
}

fn bench_situational(c: &mut Criterion) {
    let games = sample_games();
    let filter = SituationalFilter::default().contested(true).fast_break(false);
    c.bench_function("situational_stats_season", |b| {
        b.iter(|| {
            let mut attempted = 0u32;
            for g in &games {
                attempted += situational_stats_for_game(black_box(&g.events), 101, &filter).attempted;
            }
            black_box(attempted);
        })
    });
}

criterion_group!(
    benches,
    bench_score_scan,
    bench_score_timeline,
    bench_clutch_filter,
    bench_situational
);
criterion_main!(benches);
