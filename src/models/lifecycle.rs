//! DrawLifecycleState and DrawError.

use crate::models::team::{CommitmentId, DrawResult, TeamId, TeamRecord};
use crate::store::StoreError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from the draw engine and the lifecycle manager.
#[derive(Debug, Error)]
pub enum DrawError {
    /// Pool empty or too small for even one team.
    #[error("not enough players to draw teams")]
    InsufficientPlayers,
    /// Non-positive shape, or a non-random configuration without criteria.
    #[error("invalid draw configuration: {0}")]
    InvalidConfiguration(String),
    /// Operation not allowed in the current state.
    #[error("cannot {operation} while {state}")]
    InvalidTransition {
        operation: &'static str,
        state: &'static str,
    },
    /// A confirmed draw is still running; finalize or discard it first.
    #[error("a confirmed draw is active; finalize or discard it first")]
    AlreadyActive,
    /// Persistence collaborator failed; state was left unchanged.
    #[error("persistence failure: {0}")]
    Persistence(#[source] StoreError),
    /// Statistics collaborator failed during finalize; the draw itself was closed.
    #[error("statistics recalculation failed: {0}")]
    StatisticsRecalc(#[source] StoreError),
    /// Finalize needs an outcome for every playing team.
    #[error("missing outcome for {missing} team(s)")]
    IncompleteOutcomes { missing: usize },
    /// Team id is not part of the active draw.
    #[error("team {0} is not part of the active draw")]
    UnknownTeam(TeamId),
    /// `retry_statistics` was called with nothing to retry.
    #[error("no failed statistics recalculation to retry")]
    NoFailedStatistics,
}

/// The confirmed draw currently standing.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ActiveDraw {
    pub commitment_id: CommitmentId,
    pub teams: Vec<TeamRecord>,
}

impl ActiveDraw {
    pub fn team(&self, team_id: TeamId) -> Option<&TeamRecord> {
        self.teams.iter().find(|t| t.id == team_id)
    }

    pub fn team_mut(&mut self, team_id: TeamId) -> Option<&mut TeamRecord> {
        self.teams.iter_mut().find(|t| t.id == team_id)
    }
}

/// Where the current draw is in its life.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "draw", rename_all = "snake_case")]
pub enum DrawLifecycleState {
    /// No uncommitted draw exists.
    #[default]
    Idle,
    /// A draw is being computed (busy indicator only).
    InProgress,
    /// Computed and held in memory, not yet persisted.
    PendingConfirmation(DrawResult),
    /// Confirmed and persisted as the current teams.
    Active(ActiveDraw),
}

impl DrawLifecycleState {
    /// Short name used in logs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            DrawLifecycleState::Idle => "idle",
            DrawLifecycleState::InProgress => "drawing",
            DrawLifecycleState::PendingConfirmation(_) => "pending confirmation",
            DrawLifecycleState::Active(_) => "active",
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, DrawLifecycleState::Active(_))
    }

    pub fn pending(&self) -> Option<&DrawResult> {
        match self {
            DrawLifecycleState::PendingConfirmation(result) => Some(result),
            _ => None,
        }
    }

    pub fn active(&self) -> Option<&ActiveDraw> {
        match self {
            DrawLifecycleState::Active(active) => Some(active),
            _ => None,
        }
    }
}
