//! DrawConfiguration, ordering criteria, and scoring rules.

use crate::models::lifecycle::DrawError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Extra ordering criterion. Declaration order is the order used in strategy labels.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    /// Accumulated score, descending.
    Score,
    /// Primary position, grouped in enum order.
    Position,
    /// Primary rating, descending.
    Rating,
}

impl Criterion {
    pub fn label(self) -> &'static str {
        match self {
            Criterion::Score => "Score",
            Criterion::Position => "Position",
            Criterion::Rating => "Rating",
        }
    }
}

/// Shape and ordering strategy of a draw.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct DrawConfiguration {
    pub players_per_team: usize,
    pub team_count: usize,
    /// When true, `criteria` is ignored and the pool is shuffled.
    pub random: bool,
    pub criteria: BTreeSet<Criterion>,
}

impl DrawConfiguration {
    /// Random draw with the given shape.
    pub fn random(players_per_team: usize, team_count: usize) -> Self {
        Self {
            players_per_team,
            team_count,
            random: true,
            criteria: BTreeSet::new(),
        }
    }

    /// Criteria-ordered draw with the given shape.
    pub fn by_criteria(
        players_per_team: usize,
        team_count: usize,
        criteria: impl IntoIterator<Item = Criterion>,
    ) -> Self {
        Self {
            players_per_team,
            team_count,
            random: false,
            criteria: criteria.into_iter().collect(),
        }
    }

    pub fn has(&self, criterion: Criterion) -> bool {
        !self.random && self.criteria.contains(&criterion)
    }

    /// Shape check only. This is all the engine itself enforces.
    pub fn check_shape(&self) -> Result<(), DrawError> {
        if self.players_per_team == 0 {
            return Err(DrawError::InvalidConfiguration(
                "players per team must be at least 1".into(),
            ));
        }
        if self.team_count == 0 {
            return Err(DrawError::InvalidConfiguration(
                "team count must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Full check done by whoever owns the configuration: positive shape, and a
    /// non-random draw needs at least one criterion.
    pub fn validate(&self) -> Result<(), DrawError> {
        self.check_shape()?;
        if !self.random && self.criteria.is_empty() {
            return Err(DrawError::InvalidConfiguration(
                "select at least one criterion or enable random".into(),
            ));
        }
        Ok(())
    }

    /// Label describing which ordering produced a draw, e.g. "Random" or "Score+Position".
    pub fn strategy_label(&self) -> String {
        if self.random || self.criteria.is_empty() {
            return "Random".to_string();
        }
        self.criteria
            .iter()
            .map(|c| c.label())
            .collect::<Vec<_>>()
            .join("+")
    }
}

/// Points credited to every player of a team per result.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ScoringRules {
    pub win: i64,
    pub draw: i64,
    pub loss: i64,
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            win: 3,
            draw: 1,
            loss: 0,
        }
    }
}

impl ScoringRules {
    pub fn points(&self, wins: u32, draws: u32, losses: u32) -> i64 {
        self.win
            .saturating_mul(i64::from(wins))
            .saturating_add(self.draw.saturating_mul(i64::from(draws)))
            .saturating_add(self.loss.saturating_mul(i64::from(losses)))
    }
}
