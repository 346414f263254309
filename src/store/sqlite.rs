//! SQLite persistence for the roster, current teams, and player statistics.

use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use uuid::Uuid;

use crate::models::{
    CommitmentId, OutcomeField, Player, PlayerId, Position, ScoringRules, TeamId, TeamRecord,
    TeamResult,
};
use crate::store::{Roster, StatisticsRecalculator, StoreError, TeamStore};

const PLAYER_COLUMNS: &str = "id, name, position, rating, secondary_position, secondary_rating,
     games, wins, losses, draws, score, active, available";

const TEAM_COLUMNS: &str =
    "id, commitment_id, idx, name, is_reserve, strategy, created_at, wins, losses, draws";

/// SQLite-backed store. Implements every collaborator the lifecycle manager needs.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    scoring: ScoringRules,
}

impl SqliteStore {
    /// Open (or create) a database at `path` and ensure all tables exist. Pass `":memory:"`
    /// for an ephemeral database.
    pub fn open(path: &str) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;
             PRAGMA foreign_keys = ON;",
        )?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS players (
                id                 TEXT PRIMARY KEY,
                name               TEXT NOT NULL UNIQUE COLLATE NOCASE,
                position           TEXT NOT NULL,
                rating             INTEGER NOT NULL,
                secondary_position TEXT,
                secondary_rating   INTEGER,
                games              INTEGER NOT NULL DEFAULT 0,
                wins               INTEGER NOT NULL DEFAULT 0,
                losses             INTEGER NOT NULL DEFAULT 0,
                draws              INTEGER NOT NULL DEFAULT 0,
                score              INTEGER NOT NULL DEFAULT 0,
                active             INTEGER NOT NULL DEFAULT 1,
                available          INTEGER NOT NULL DEFAULT 1
            );

            CREATE TABLE IF NOT EXISTS teams (
                id            TEXT PRIMARY KEY,
                commitment_id TEXT NOT NULL,
                idx           INTEGER NOT NULL,
                name          TEXT NOT NULL,
                is_reserve    INTEGER NOT NULL,
                strategy      TEXT NOT NULL,
                created_at    TEXT NOT NULL,
                wins          INTEGER NOT NULL DEFAULT 0,
                losses        INTEGER NOT NULL DEFAULT 0,
                draws         INTEGER NOT NULL DEFAULT 0,
                current       INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS team_players (
                team_id   TEXT NOT NULL REFERENCES teams(id),
                slot      INTEGER NOT NULL,
                player_id TEXT NOT NULL,
                PRIMARY KEY (team_id, player_id)
            );

            CREATE TABLE IF NOT EXISTS applied_commitments (
                commitment_id TEXT PRIMARY KEY,
                applied_at    TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_teams_current ON teams(current);
            ",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
            scoring: ScoringRules::default(),
        })
    }

    /// Use `scoring` when applying results to player scores.
    pub fn with_scoring(mut self, scoring: ScoringRules) -> Self {
        self.scoring = scoring;
        self
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("database lock poisoned".into()))
    }

    /// Register a player. Names are unique (case-insensitive); returns false if the name is taken.
    pub fn add_player(&self, player: &Player) -> Result<bool, StoreError> {
        let conn = self.conn()?;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO players
                (id, name, position, rating, secondary_position, secondary_rating,
                 games, wins, losses, draws, score, active, available)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                player.id.to_string(),
                player.name.trim(),
                player.position.as_str(),
                player.rating,
                player.secondary_position.map(Position::as_str),
                player.secondary_rating,
                player.games,
                player.wins,
                player.losses,
                player.draws,
                player.score,
                player.active,
                player.available,
            ],
        )?;
        Ok(inserted == 1)
    }

    /// Look up one player by id.
    pub fn player(&self, id: PlayerId) -> Result<Option<Player>, StoreError> {
        let conn = self.conn()?;
        let player = conn
            .query_row(
                &format!("SELECT {PLAYER_COLUMNS} FROM players WHERE id = ?1"),
                params![id.to_string()],
                player_from_row,
            )
            .optional()?;
        Ok(player)
    }

    /// Set whether a player shows up for the next draw.
    pub fn set_available(&self, id: PlayerId, available: bool) -> Result<(), StoreError> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE players SET available = ?1 WHERE id = ?2",
            params![available, id.to_string()],
        )?;
        Ok(())
    }
}

impl TeamStore for SqliteStore {
    fn save_current_teams(&self, teams: &[TeamRecord]) -> Result<(), StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute("UPDATE teams SET current = 0 WHERE current = 1", [])?;
        for team in teams {
            insert_team(&tx, team)?;
        }
        tx.commit()?;
        Ok(())
    }

    fn clear_current_marker(&self) -> Result<(), StoreError> {
        let conn = self.conn()?;
        conn.execute("UPDATE teams SET current = 0 WHERE current = 1", [])?;
        Ok(())
    }

    fn adjust_team_record(
        &self,
        team_id: TeamId,
        field: OutcomeField,
        delta: i32,
    ) -> Result<TeamRecord, StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let column = field.column();
        let updated = tx.execute(
            &format!(
                "UPDATE teams SET {column} = MAX(0, {column} + ?1) WHERE id = ?2 AND current = 1"
            ),
            params![delta, team_id.to_string()],
        )?;
        if updated == 0 {
            return Err(StoreError::TeamNotFound(team_id));
        }
        let record = load_team(&tx, team_id)?.ok_or(StoreError::TeamNotFound(team_id))?;
        tx.commit()?;
        Ok(record)
    }

    fn load_current_teams(&self) -> Result<Vec<TeamRecord>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {TEAM_COLUMNS} FROM teams WHERE current = 1 ORDER BY idx"
        ))?;
        let mut teams = stmt
            .query_map([], team_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        for team in &mut teams {
            team.player_ids = load_team_players(&conn, team.id)?;
        }
        Ok(teams)
    }
}

impl Roster for SqliteStore {
    fn active_players(&self) -> Result<Vec<Player>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {PLAYER_COLUMNS} FROM players
             WHERE active = 1 AND available = 1 ORDER BY name"
        ))?;
        let players = stmt
            .query_map([], player_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(players)
    }
}

impl StatisticsRecalculator for SqliteStore {
    fn apply_outcomes(
        &self,
        commitment_id: CommitmentId,
        results: &[TeamResult],
    ) -> Result<(), StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let recorded = tx.execute(
            "INSERT OR IGNORE INTO applied_commitments (commitment_id, applied_at) VALUES (?1, ?2)",
            params![commitment_id.to_string(), Utc::now().to_rfc3339()],
        )?;
        if recorded == 0 {
            log::info!("Statistics for draw {} already applied; skipping", commitment_id);
            return Ok(());
        }

        for result in results {
            let games = result
                .wins
                .saturating_add(result.losses)
                .saturating_add(result.draws);
            let points = self.scoring.points(result.wins, result.draws, result.losses);
            for player_id in &result.player_ids {
                let updated = tx.execute(
                    "UPDATE players SET
                        games = MIN(games + ?1, ?7), wins = MIN(wins + ?2, ?7),
                        losses = MIN(losses + ?3, ?7), draws = MIN(draws + ?4, ?7),
                        score = score + ?5
                     WHERE id = ?6",
                    params![
                        games,
                        result.wins,
                        result.losses,
                        result.draws,
                        points,
                        player_id.to_string(),
                        u32::MAX
                    ],
                )?;
                if updated == 0 {
                    log::warn!("Player {} of team {} is not in the roster", player_id, result.team_id);
                }
            }
        }
        tx.commit()?;
        Ok(())
    }
}

fn insert_team(tx: &Transaction<'_>, team: &TeamRecord) -> Result<(), StoreError> {
    tx.execute(
        "INSERT INTO teams
            (id, commitment_id, idx, name, is_reserve, strategy, created_at, wins, losses, draws, current)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 1)",
        params![
            team.id.to_string(),
            team.commitment_id.to_string(),
            team.index,
            team.name,
            team.is_reserve,
            team.strategy,
            team.created_at.to_rfc3339(),
            team.wins,
            team.losses,
            team.draws,
        ],
    )?;
    for (slot, player_id) in team.player_ids.iter().enumerate() {
        tx.execute(
            "INSERT INTO team_players (team_id, slot, player_id) VALUES (?1, ?2, ?3)",
            params![team.id.to_string(), slot, player_id.to_string()],
        )?;
    }
    Ok(())
}

fn load_team(conn: &Connection, team_id: TeamId) -> Result<Option<TeamRecord>, StoreError> {
    let team = conn
        .query_row(
            &format!("SELECT {TEAM_COLUMNS} FROM teams WHERE id = ?1"),
            params![team_id.to_string()],
            team_from_row,
        )
        .optional()?;
    match team {
        Some(mut team) => {
            team.player_ids = load_team_players(conn, team.id)?;
            Ok(Some(team))
        }
        None => Ok(None),
    }
}

fn load_team_players(conn: &Connection, team_id: TeamId) -> Result<Vec<PlayerId>, StoreError> {
    let mut stmt =
        conn.prepare("SELECT player_id FROM team_players WHERE team_id = ?1 ORDER BY slot")?;
    let ids = stmt
        .query_map(params![team_id.to_string()], |row| {
            parse_text(row, 0, Uuid::parse_str)
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ids)
}

/// Read a TEXT column and parse it, reporting parse failures as conversion errors.
fn parse_text<T, E>(
    row: &Row<'_>,
    idx: usize,
    parse: impl FnOnce(&str) -> Result<T, E>,
) -> rusqlite::Result<T>
where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let raw: String = row.get(idx)?;
    parse(&raw).map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into()))
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw).map(|t| t.with_timezone(&Utc))
}

fn player_from_row(row: &Row<'_>) -> rusqlite::Result<Player> {
    let secondary_position: Option<String> = row.get(4)?;
    let secondary_position = secondary_position
        .map(|raw| Position::from_str(&raw))
        .transpose()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, e.into()))?;
    Ok(Player {
        id: parse_text(row, 0, Uuid::parse_str)?,
        name: row.get(1)?,
        position: parse_text(row, 2, Position::from_str)?,
        rating: row.get(3)?,
        secondary_position,
        secondary_rating: row.get(5)?,
        games: row.get(6)?,
        wins: row.get(7)?,
        losses: row.get(8)?,
        draws: row.get(9)?,
        score: row.get(10)?,
        active: row.get(11)?,
        available: row.get(12)?,
    })
}

fn team_from_row(row: &Row<'_>) -> rusqlite::Result<TeamRecord> {
    Ok(TeamRecord {
        id: parse_text(row, 0, Uuid::parse_str)?,
        commitment_id: parse_text(row, 1, Uuid::parse_str)?,
        index: row.get(2)?,
        name: row.get(3)?,
        is_reserve: row.get(4)?,
        strategy: row.get(5)?,
        created_at: parse_text(row, 6, parse_timestamp)?,
        player_ids: Vec::new(),
        wins: row.get(7)?,
        losses: row.get(8)?,
        draws: row.get(9)?,
    })
}
