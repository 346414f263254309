//! Data structures for the team draw: players, configuration, teams, lifecycle state.

mod config;
mod lifecycle;
mod player;
mod team;

pub use config::{Criterion, DrawConfiguration, ScoringRules};
pub use lifecycle::{ActiveDraw, DrawError, DrawLifecycleState};
pub use player::{Player, PlayerId, Position};
pub use team::{
    CommitmentId, DrawResult, OutcomeField, Team, TeamId, TeamOutcome, TeamRecord, TeamResult,
};
