//! Drawn teams, draw results, and the persisted team records of a commitment.

use crate::models::player::{Player, PlayerId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a persisted team.
pub type TeamId = Uuid;

/// Unique identifier for a confirmed draw (one commitment = the teams of one pelada).
pub type CommitmentId = Uuid;

/// A team produced by a draw.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub index: usize,
    pub name: String,
    pub players: Vec<Player>,
    /// Set only when the pool could not fill every configured team.
    pub is_reserve: bool,
}

impl Team {
    /// Empty playing team named after its 1-based position.
    pub fn numbered(index: usize) -> Self {
        Self {
            index,
            name: format!("Team {}", index + 1),
            players: Vec::new(),
            is_reserve: false,
        }
    }

    /// Reserve team holding leftover players.
    pub fn reserve(index: usize, players: Vec<Player>) -> Self {
        Self {
            index,
            name: "Reserve".to_string(),
            players,
            is_reserve: true,
        }
    }

    pub fn player_ids(&self) -> Vec<PlayerId> {
        self.players.iter().map(|p| p.id).collect()
    }
}

/// Output of one draw. Immutable once produced.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct DrawResult {
    pub teams: Vec<Team>,
    /// Which ordering produced the teams, e.g. "Random" or "Score+Position".
    pub strategy: String,
    pub created_at: DateTime<Utc>,
}

impl DrawResult {
    pub fn new(teams: Vec<Team>, strategy: impl Into<String>) -> Self {
        Self {
            teams,
            strategy: strategy.into(),
            created_at: Utc::now(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }

    pub fn player_count(&self) -> usize {
        self.teams.iter().map(|t| t.players.len()).sum()
    }
}

/// Which result counter of a team to change.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeField {
    Wins,
    Losses,
    Draws,
}

impl OutcomeField {
    /// Column name in the teams table.
    pub fn column(self) -> &'static str {
        match self {
            OutcomeField::Wins => "wins",
            OutcomeField::Losses => "losses",
            OutcomeField::Draws => "draws",
        }
    }
}

/// A team persisted as part of a confirmed draw, with its running results.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TeamRecord {
    pub id: TeamId,
    pub commitment_id: CommitmentId,
    pub index: usize,
    pub name: String,
    pub is_reserve: bool,
    pub strategy: String,
    pub created_at: DateTime<Utc>,
    pub player_ids: Vec<PlayerId>,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
}

impl TeamRecord {
    /// Fresh record for a drawn team (ids assigned here, counters at zero).
    pub fn from_team(team: &Team, commitment_id: CommitmentId, result: &DrawResult) -> Self {
        Self {
            id: Uuid::new_v4(),
            commitment_id,
            index: team.index,
            name: team.name.clone(),
            is_reserve: team.is_reserve,
            strategy: result.strategy.clone(),
            created_at: result.created_at,
            player_ids: team.player_ids(),
            wins: 0,
            losses: 0,
            draws: 0,
        }
    }

    /// Apply a signed change to one counter, clamped at zero.
    pub fn apply_delta(&mut self, field: OutcomeField, delta: i32) {
        let counter = match field {
            OutcomeField::Wins => &mut self.wins,
            OutcomeField::Losses => &mut self.losses,
            OutcomeField::Draws => &mut self.draws,
        };
        *counter = clamped_add(*counter, delta);
    }
}

fn clamped_add(value: u32, delta: i32) -> u32 {
    let next = i64::from(value) + i64::from(delta);
    next.clamp(0, i64::from(u32::MAX)) as u32
}

/// Final result of one team, as given to `finalize`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct TeamOutcome {
    pub team_id: TeamId,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
}

/// What the statistics collaborator receives: a finished team and its players.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TeamResult {
    pub team_id: TeamId,
    pub player_ids: Vec<PlayerId>,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
}

impl TeamResult {
    pub fn new(record: &TeamRecord, outcome: &TeamOutcome) -> Self {
        Self {
            team_id: record.id,
            player_ids: record.player_ids.clone(),
            wins: outcome.wins,
            losses: outcome.losses,
            draws: outcome.draws,
        }
    }
}
