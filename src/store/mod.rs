//! Collaborators of the lifecycle manager: team persistence, roster, statistics.

mod roster_csv;
mod sqlite;

pub use roster_csv::read_players_csv;
pub use sqlite::SqliteStore;

use crate::models::{CommitmentId, OutcomeField, Player, TeamId, TeamRecord, TeamResult};
use std::sync::Arc;
use thiserror::Error;

/// Errors from the persistence, roster, and statistics collaborators.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("roster file error: {0}")]
    Csv(#[from] csv::Error),
    #[error("corrupt record: {0}")]
    Corrupt(String),
    #[error("team {0} not found among current teams")]
    TeamNotFound(TeamId),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Durable record of the current (confirmed, unfinished) teams.
pub trait TeamStore: Send + Sync {
    /// Store `teams` as the current teams. Any previously current teams lose their marker
    /// in the same atomic step.
    fn save_current_teams(&self, teams: &[TeamRecord]) -> Result<(), StoreError>;

    /// Remove the current marker from every team.
    fn clear_current_marker(&self) -> Result<(), StoreError>;

    /// Add `delta` to one counter of a current team, clamped at zero. Returns the updated record.
    fn adjust_team_record(
        &self,
        team_id: TeamId,
        field: OutcomeField,
        delta: i32,
    ) -> Result<TeamRecord, StoreError>;

    /// Teams currently marked current, in team order. Empty when no draw is active.
    fn load_current_teams(&self) -> Result<Vec<TeamRecord>, StoreError>;
}

/// Source of players eligible for a draw.
pub trait Roster: Send + Sync {
    /// Active and available players.
    fn active_players(&self) -> Result<Vec<Player>, StoreError>;
}

/// Applies finished team results to individual player totals.
pub trait StatisticsRecalculator: Send + Sync {
    /// Apply every result of `commitment_id`. Calling twice for the same commitment must not
    /// count the results twice.
    fn apply_outcomes(
        &self,
        commitment_id: CommitmentId,
        results: &[TeamResult],
    ) -> Result<(), StoreError>;
}

impl<T: TeamStore + ?Sized> TeamStore for Arc<T> {
    fn save_current_teams(&self, teams: &[TeamRecord]) -> Result<(), StoreError> {
        (**self).save_current_teams(teams)
    }

    fn clear_current_marker(&self) -> Result<(), StoreError> {
        (**self).clear_current_marker()
    }

    fn adjust_team_record(
        &self,
        team_id: TeamId,
        field: OutcomeField,
        delta: i32,
    ) -> Result<TeamRecord, StoreError> {
        (**self).adjust_team_record(team_id, field, delta)
    }

    fn load_current_teams(&self) -> Result<Vec<TeamRecord>, StoreError> {
        (**self).load_current_teams()
    }
}

impl<T: Roster + ?Sized> Roster for Arc<T> {
    fn active_players(&self) -> Result<Vec<Player>, StoreError> {
        (**self).active_players()
    }
}

impl<T: StatisticsRecalculator + ?Sized> StatisticsRecalculator for Arc<T> {
    fn apply_outcomes(
        &self,
        commitment_id: CommitmentId,
        results: &[TeamResult],
    ) -> Result<(), StoreError> {
        (**self).apply_outcomes(commitment_id, results)
    }
}
