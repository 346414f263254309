//! Pelada team draw: library with models, draw logic, and persistence collaborators.

pub mod logic;
pub mod models;
pub mod store;

pub use logic::{allocate, draw, order_players, DrawLifecycleManager, DrawShape};
pub use models::{
    ActiveDraw, CommitmentId, Criterion, DrawConfiguration, DrawError, DrawLifecycleState,
    DrawResult, OutcomeField, Player, PlayerId, Position, ScoringRules, Team, TeamId, TeamOutcome,
    TeamRecord, TeamResult,
};
pub use store::{
    read_players_csv, Roster, SqliteStore, StatisticsRecalculator, StoreError, TeamStore,
};
