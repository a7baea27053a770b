use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::{debug, info, warn};

use crate::model::{
    EventAttributes, EventKind, Game, GameId, PlayByPlayEvent, PlayerGameStats, PlayerId,
    SeasonId, TeamGameStats, TeamId,
};
use crate::store::{EventStore, GameStore, StatsStore};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// SQLite-backed store. The engine only reads; the write helpers exist to load
/// fixtures and demo data.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let conn =
            Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
        init_schema(&conn)?;
        info!(path = %path.display(), "opened analytics store");
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory sqlite db")?;
        init_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn upsert_game(&self, game: &Game) -> Result<()> {
        self.conn
            .execute(
                r#"
                INSERT INTO games (game_id, home_team_id, away_team_id, season_id, game_date)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT(game_id) DO UPDATE SET
                    home_team_id = excluded.home_team_id,
                    away_team_id = excluded.away_team_id,
                    season_id = excluded.season_id,
                    game_date = excluded.game_date
                "#,
                params![
                    game.game_id as i64,
                    game.home_team_id as i64,
                    game.away_team_id as i64,
                    game.season_id as i64,
                    game.game_date.format(DATE_FORMAT).to_string(),
                ],
            )
            .context("upsert game")?;
        Ok(())
    }

    pub fn insert_events(&mut self, events: &[PlayByPlayEvent]) -> Result<usize> {
        let tx = self.conn.transaction().context("begin event transaction")?;
        for e in events {
            let attributes =
                serde_json::to_string(&e.attributes).context("serialize event attributes")?;
            tx.execute(
                r#"
                INSERT OR REPLACE INTO play_by_play (
                    game_id, event_number, period, clock, event_type, event_subtype,
                    success, team_id, player_id, attributes_json
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                "#,
                params![
                    e.game_id as i64,
                    e.event_number as i64,
                    e.period as i64,
                    e.clock,
                    e.event_type.as_str(),
                    e.event_subtype,
                    e.success.map(bool_to_i64),
                    e.team_id.map(|v| v as i64),
                    e.player_id.map(|v| v as i64),
                    attributes,
                ],
            )
            .context("insert play-by-play event")?;
        }
        tx.commit().context("commit event transaction")?;
        Ok(events.len())
    }

    pub fn upsert_player_stats(&mut self, rows: &[PlayerGameStats]) -> Result<usize> {
        let tx = self.conn.transaction().context("begin stats transaction")?;
        for r in rows {
            tx.execute(
                r#"
                INSERT OR REPLACE INTO player_game_stats (
                    player_id, game_id, team_id, season_id, minutes,
                    points, rebounds, assists, steals, blocks, turnovers,
                    fgm, fga, fg3m, fg3a, ftm, fta
                ) VALUES (
                    ?1, ?2, ?3, ?4, ?5,
                    ?6, ?7, ?8, ?9, ?10, ?11,
                    ?12, ?13, ?14, ?15, ?16, ?17
                )
                "#,
                params![
                    r.player_id as i64,
                    r.game_id as i64,
                    r.team_id as i64,
                    r.season_id as i64,
                    r.minutes as i64,
                    r.points as i64,
                    r.rebounds as i64,
                    r.assists as i64,
                    r.steals as i64,
                    r.blocks as i64,
                    r.turnovers as i64,
                    r.fgm as i64,
                    r.fga as i64,
                    r.fg3m as i64,
                    r.fg3a as i64,
                    r.ftm as i64,
                    r.fta as i64,
                ],
            )
            .context("upsert player game stats")?;
        }
        tx.commit().context("commit stats transaction")?;
        Ok(rows.len())
    }

    pub fn upsert_team_stats(&mut self, rows: &[TeamGameStats]) -> Result<usize> {
        let tx = self.conn.transaction().context("begin team stats transaction")?;
        for r in rows {
            tx.execute(
                r#"
                INSERT OR REPLACE INTO team_game_stats (
                    team_id, game_id, season_id, points, rebounds, assists, turnovers
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
                params![
                    r.team_id as i64,
                    r.game_id as i64,
                    r.season_id as i64,
                    r.points as i64,
                    r.rebounds as i64,
                    r.assists as i64,
                    r.turnovers as i64,
                ],
            )
            .context("upsert team game stats")?;
        }
        tx.commit().context("commit team stats transaction")?;
        Ok(rows.len())
    }
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS games (
            game_id INTEGER PRIMARY KEY,
            home_team_id INTEGER NOT NULL,
            away_team_id INTEGER NOT NULL,
            season_id INTEGER NOT NULL,
            game_date TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_games_home ON games(home_team_id);
        CREATE INDEX IF NOT EXISTS idx_games_away ON games(away_team_id);
        CREATE INDEX IF NOT EXISTS idx_games_season ON games(season_id);

        CREATE TABLE IF NOT EXISTS play_by_play (
            game_id INTEGER NOT NULL,
            event_number INTEGER NOT NULL,
            period INTEGER NOT NULL,
            clock TEXT NOT NULL,
            event_type TEXT NOT NULL,
            event_subtype TEXT NULL,
            success INTEGER NULL,
            team_id INTEGER NULL,
            player_id INTEGER NULL,
            attributes_json TEXT NOT NULL DEFAULT '{}',
            PRIMARY KEY (game_id, event_number)
        );

        CREATE TABLE IF NOT EXISTS player_game_stats (
            player_id INTEGER NOT NULL,
            game_id INTEGER NOT NULL,
            team_id INTEGER NOT NULL,
            season_id INTEGER NOT NULL,
            minutes INTEGER NOT NULL,
            points INTEGER NOT NULL,
            rebounds INTEGER NOT NULL,
            assists INTEGER NOT NULL,
            steals INTEGER NOT NULL,
            blocks INTEGER NOT NULL,
            turnovers INTEGER NOT NULL,
            fgm INTEGER NOT NULL,
            fga INTEGER NOT NULL,
            fg3m INTEGER NOT NULL,
            fg3a INTEGER NOT NULL,
            ftm INTEGER NOT NULL,
            fta INTEGER NOT NULL,
            PRIMARY KEY (player_id, game_id)
        );
        CREATE INDEX IF NOT EXISTS idx_player_stats_season ON player_game_stats(season_id);

        CREATE TABLE IF NOT EXISTS team_game_stats (
            team_id INTEGER NOT NULL,
            game_id INTEGER NOT NULL,
            season_id INTEGER NOT NULL,
            points INTEGER NOT NULL,
            rebounds INTEGER NOT NULL,
            assists INTEGER NOT NULL,
            turnovers INTEGER NOT NULL,
            PRIMARY KEY (team_id, game_id)
        );
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

impl EventStore for SqliteStore {
    fn fetch_events(&self, game_id: GameId) -> Result<Vec<PlayByPlayEvent>> {
        let mut stmt = self
            .conn
            .prepare_cached(
                r#"
                SELECT
                    game_id, event_number, period, clock, event_type, event_subtype,
                    success, team_id, player_id, attributes_json
                FROM play_by_play
                WHERE game_id = ?1
                ORDER BY event_number ASC
                "#,
            )
            .context("prepare events query")?;

        let rows = stmt
            .query_map(params![game_id as i64], |row| {
                let event_number: u32 = row.get(1)?;
                let attributes_json: String = row.get(9)?;
                // Unreadable attributes drop to empty; the event itself still loads.
                let attributes = serde_json::from_str::<EventAttributes>(&attributes_json)
                    .unwrap_or_else(|err| {
                        warn!(
                            game_id,
                            event_number,
                            error = %err,
                            "dropping unreadable event attributes"
                        );
                        EventAttributes::default()
                    });
                Ok(PlayByPlayEvent {
                    game_id: row.get(0)?,
                    event_number,
                    period: row.get(2)?,
                    clock: row.get(3)?,
                    event_type: EventKind::from(row.get::<_, String>(4)?),
                    event_subtype: row.get(5)?,
                    success: row.get::<_, Option<i64>>(6)?.map(|v| v != 0),
                    team_id: row.get(7)?,
                    player_id: row.get(8)?,
                    attributes,
                })
            })
            .context("query events")?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row.context("decode event row")?);
        }
        debug!(game_id, events = out.len(), "fetched play-by-play");
        Ok(out)
    }
}

impl GameStore for SqliteStore {
    fn fetch_game(&self, game_id: GameId) -> Result<Option<Game>> {
        self.conn
            .query_row(
                "SELECT game_id, home_team_id, away_team_id, season_id, game_date
                 FROM games WHERE game_id = ?1",
                params![game_id as i64],
                game_from_row,
            )
            .optional()
            .context("query game")
    }

    fn fetch_team_games(&self, team_id: TeamId, season_id: Option<SeasonId>) -> Result<Vec<Game>> {
        let mut stmt = self
            .conn
            .prepare_cached(
                r#"
                SELECT game_id, home_team_id, away_team_id, season_id, game_date
                FROM games
                WHERE (home_team_id = ?1 OR away_team_id = ?1)
                  AND (?2 IS NULL OR season_id = ?2)
                ORDER BY game_date ASC, game_id ASC
                "#,
            )
            .context("prepare team games query")?;
        let rows = stmt
            .query_map(
                params![team_id as i64, season_id.map(|s| s as i64)],
                game_from_row,
            )
            .context("query team games")?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row.context("decode game row")?);
        }
        Ok(out)
    }
}

impl StatsStore for SqliteStore {
    fn fetch_player_game_stats(
        &self,
        player_id: PlayerId,
        season_id: Option<SeasonId>,
    ) -> Result<Vec<PlayerGameStats>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!(
                "SELECT {PLAYER_STATS_COLUMNS} FROM player_game_stats
                 WHERE player_id = ?1 AND (?2 IS NULL OR season_id = ?2)
                 ORDER BY game_id ASC"
            ))
            .context("prepare player stats query")?;
        let rows = stmt
            .query_map(
                params![player_id as i64, season_id.map(|s| s as i64)],
                player_stats_from_row,
            )
            .context("query player stats")?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row.context("decode player stats row")?);
        }
        Ok(out)
    }

    fn fetch_season_player_stats(&self, season_id: SeasonId) -> Result<Vec<PlayerGameStats>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!(
                "SELECT {PLAYER_STATS_COLUMNS} FROM player_game_stats
                 WHERE season_id = ?1
                 ORDER BY player_id ASC, game_id ASC"
            ))
            .context("prepare season stats query")?;
        let rows = stmt
            .query_map(params![season_id as i64], player_stats_from_row)
            .context("query season stats")?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row.context("decode player stats row")?);
        }
        Ok(out)
    }

    fn fetch_team_game_stats(&self, game_ids: &[GameId]) -> Result<Vec<TeamGameStats>> {
        let mut stmt = self
            .conn
            .prepare_cached(
                "SELECT team_id, game_id, season_id, points, rebounds, assists, turnovers
                 FROM team_game_stats WHERE game_id = ?1 ORDER BY team_id ASC",
            )
            .context("prepare team stats query")?;

        let mut out = Vec::new();
        for game_id in game_ids {
            let rows = stmt
                .query_map(params![*game_id as i64], |row| {
                    Ok(TeamGameStats {
                        team_id: row.get(0)?,
                        game_id: row.get(1)?,
                        season_id: row.get(2)?,
                        points: row.get(3)?,
                        rebounds: row.get(4)?,
                        assists: row.get(5)?,
                        turnovers: row.get(6)?,
                    })
                })
                .context("query team stats")?;
            for row in rows {
                out.push(row.context("decode team stats row")?);
            }
        }
        Ok(out)
    }
}

const PLAYER_STATS_COLUMNS: &str = "player_id, game_id, team_id, season_id, minutes, \
     points, rebounds, assists, steals, blocks, turnovers, fgm, fga, fg3m, fg3a, ftm, fta";

fn player_stats_from_row(row: &Row<'_>) -> rusqlite::Result<PlayerGameStats> {
    Ok(PlayerGameStats {
        player_id: row.get(0)?,
        game_id: row.get(1)?,
        team_id: row.get(2)?,
        season_id: row.get(3)?,
        minutes: row.get(4)?,
        points: row.get(5)?,
        rebounds: row.get(6)?,
        assists: row.get(7)?,
        steals: row.get(8)?,
        blocks: row.get(9)?,
        turnovers: row.get(10)?,
        fgm: row.get(11)?,
        fga: row.get(12)?,
        fg3m: row.get(13)?,
        fg3a: row.get(14)?,
        ftm: row.get(15)?,
        fta: row.get(16)?,
    })
}

fn game_from_row(row: &Row<'_>) -> rusqlite::Result<Game> {
    let raw_date: String = row.get(4)?;
    let game_date =
        NaiveDate::parse_from_str(&raw_date, DATE_FORMAT).map_err(|err| conversion_err(4, err))?;
    Ok(Game {
        game_id: row.get(0)?,
        home_team_id: row.get(1)?,
        away_team_id: row.get(2)?,
        season_id: row.get(3)?,
        game_date,
    })
}

fn conversion_err<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn bool_to_i64(v: bool) -> i64 {
    if v { 1 } else { 0 }
}
