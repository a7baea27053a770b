use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use hoops_analytics::clock::parse_clock;
use hoops_analytics::clutch::ClutchFilter;
use hoops_analytics::config::AppConfig;
use hoops_analytics::model::GameId;
use hoops_analytics::situational::SituationalFilter;
use hoops_analytics::sqlite_store::SqliteStore;
use hoops_analytics::{Analytics, synthetic};

const USAGE: &str = "\
usage: hoops_analytics <command> [args]

  seed [--seed N] [--season S]               write a synthetic season into the db
  score <game> <period> <clock>              score at an instant
  final <game>                               final score
  clutch <game> [--seconds N] [--margin N] [--min-period N] [--no-overtime]
  situational <player> <game,game,..> [--fast-break B] [--second-chance B]
              [--contested B] [--shot-type T]
  vs <team> <opponent> [--season S]          head-to-head games and record
  split <player> <season>                    home/away split
  leaders <season> <category> [--limit N] [--min-games N]";

fn main() -> Result<()> {
    let config = AppConfig::from_env()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let Some((command, rest)) = args.split_first() else {
        println!("{USAGE}");
        return Ok(());
    };

    let mut store = SqliteStore::open(&config.db_path)?;
    if command == "seed" {
        return seed(&mut store, rest);
    }
    let analytics = Analytics::new(&store).with_parallelism(config.parallelism);

    match command.as_str() {
        "score" => {
            let game = positional_u32(rest, 0, "game")?;
            let period = positional_u32(rest, 1, "period")?;
            let clock = positional(rest, 2).ok_or_else(|| anyhow!("missing clock"))?;
            let seconds = parse_clock(clock)?;
            print_json(&analytics.score_at_time(game, period, seconds)?)
        }
        "final" => {
            let game = positional_u32(rest, 0, "game")?;
            print_json(&analytics.final_score(game)?)
        }
        "clutch" => {
            let game = positional_u32(rest, 0, "game")?;
            let defaults = config.clutch;
            let filter = ClutchFilter::new(
                flag_u32(rest, "--seconds")?.unwrap_or(defaults.time_remaining_seconds()),
                flag_u32(rest, "--margin")?.unwrap_or(defaults.score_margin()),
                defaults.include_overtime() && !has_flag(rest, "--no-overtime"),
                flag_u32(rest, "--min-period")?.unwrap_or(defaults.min_period()),
            )?;
            let events = analytics.clutch_events(game, &filter)?;
            info!(game, clutch_events = events.len(), "clutch filter done");
            print_json(&events)
        }
        "situational" => {
            let player = positional_u32(rest, 0, "player")?;
            let games = parse_game_list(positional(rest, 1).unwrap_or_default())?;
            let filter = SituationalFilter {
                fast_break: flag_bool(rest, "--fast-break")?,
                second_chance: flag_bool(rest, "--second-chance")?,
                contested: flag_bool(rest, "--contested")?,
                shot_type: flag_value(rest, "--shot-type").map(str::to_string),
            };
            print_json(&analytics.situational_stats(&games, player, &filter)?)
        }
        "vs" => {
            let team = positional_u32(rest, 0, "team")?;
            let opponent = positional_u32(rest, 1, "opponent")?;
            let season = flag_u32(rest, "--season")?;
            #[derive(Serialize)]
            struct Report {
                games: Vec<hoops_analytics::model::Game>,
                record: hoops_analytics::opponent::TeamRecord,
            }
            print_json(&Report {
                games: analytics.games_vs_opponent(team, opponent, season)?,
                record: analytics.team_record_vs_opponent(team, opponent, season)?,
            })
        }
        "split" => {
            let player = positional_u32(rest, 0, "player")?;
            let season = positional_u32(rest, 1, "season")?;
            print_json(&analytics.home_away_split(player, season)?)
        }
        "leaders" => {
            let season = positional_u32(rest, 0, "season")?;
            let category = positional(rest, 1).ok_or_else(|| anyhow!("missing category"))?;
            let limit = flag_u32(rest, "--limit")?.unwrap_or(10) as usize;
            let min_games = flag_u32(rest, "--min-games")?.unwrap_or(1);
            print_json(&analytics.season_leaders(season, category, limit, min_games)?)
        }
        other => Err(anyhow!("unknown command {other:?}\n\n{USAGE}")),
    }
}

fn seed(store: &mut SqliteStore, args: &[String]) -> Result<()> {
    let seed = flag_u32(args, "--seed")?.unwrap_or(7) as u64;
    let season = flag_u32(args, "--season")?.unwrap_or(2024);
    let start = NaiveDate::from_ymd_opt(season as i32, 10, 22)
        .ok_or_else(|| anyhow!("invalid season {season}"))?;
    let games = synthetic::generate_season(seed, season, &[1, 2, 3, 4], season * 1000, start);

    let mut events = 0usize;
    for g in &games {
        store.upsert_game(&g.game)?;
        events += store.insert_events(&g.events)?;
        store.upsert_player_stats(&g.player_stats)?;
        store.upsert_team_stats(&g.team_stats)?;
    }
    println!("Synthetic season {season} seeded");
    println!("Games: {}", games.len());
    println!("Events: {events}");
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("serialize output")?
    );
    Ok(())
}

// Flags that do not take a value; every other `--flag` consumes the next token.
const SWITCHES: [&str; 1] = ["--no-overtime"];

fn positionals(args: &[String]) -> Vec<&str> {
    let mut out = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg.starts_with("--") {
            if !SWITCHES.contains(&arg.as_str()) {
                iter.next();
            }
            continue;
        }
        out.push(arg.as_str());
    }
    out
}

fn positional(args: &[String], idx: usize) -> Option<&str> {
    positionals(args).get(idx).copied()
}

fn positional_u32(args: &[String], idx: usize, name: &str) -> Result<u32> {
    let raw = positional(args, idx).ok_or_else(|| anyhow!("missing {name}"))?;
    raw.parse::<u32>()
        .with_context(|| format!("{name} must be a number, got {raw:?}"))
}

fn flag_value<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    let idx = args.iter().position(|a| a == name)?;
    args.get(idx + 1).map(String::as_str)
}

fn has_flag(args: &[String], name: &str) -> bool {
    args.iter().any(|a| a == name)
}

fn flag_u32(args: &[String], name: &str) -> Result<Option<u32>> {
    flag_value(args, name)
        .map(|raw| {
            raw.parse::<u32>()
                .with_context(|| format!("{name} must be a number, got {raw:?}"))
        })
        .transpose()
}

fn flag_bool(args: &[String], name: &str) -> Result<Option<bool>> {
    flag_value(args, name)
        .map(|raw| {
            raw.parse::<bool>()
                .with_context(|| format!("{name} must be true or false, got {raw:?}"))
        })
        .transpose()
}

fn parse_game_list(raw: &str) -> Result<Vec<GameId>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<GameId>()
                .with_context(|| format!("invalid game id {s:?}"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn flag_values_are_not_positionals() {
        let rest = args(&["--seconds", "60", "5", "--no-overtime", "--margin", "3"]);
        assert_eq!(positional_u32(&rest, 0, "game").unwrap(), 5);
        assert!(positional(&rest, 1).is_none());
        assert_eq!(flag_u32(&rest, "--seconds").unwrap(), Some(60));
        assert!(has_flag(&rest, "--no-overtime"));
    }

    #[test]
    fn situational_game_list_skips_flag_values() {
        let rest = args(&["--contested", "true", "101", "7,8", "--shot-type", "dunk"]);
        assert_eq!(positional_u32(&rest, 0, "player").unwrap(), 101);
        let games = parse_game_list(positional(&rest, 1).unwrap_or_default()).unwrap();
        assert_eq!(games, vec![7, 8]);
        assert_eq!(flag_bool(&rest, "--contested").unwrap(), Some(true));
    }
}
