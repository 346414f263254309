//! Player snapshot and Position as seen by the draw engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for a player (used in teams and lookups).
pub type PlayerId = Uuid;

/// Field position. Declaration order is the grouping order used when drawing by position.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    Goalkeeper,
    Defender,
    Midfielder,
    Forward,
}

impl Position {
    pub fn as_str(self) -> &'static str {
        match self {
            Position::Goalkeeper => "goalkeeper",
            Position::Defender => "defender",
            Position::Midfielder => "midfielder",
            Position::Forward => "forward",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Position {
    type Err = String;

    /// Case-insensitive; accepts the snake_case names and the short forms GK/DEF/MID/FWD.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "goalkeeper" | "gk" => Ok(Position::Goalkeeper),
            "defender" | "def" => Ok(Position::Defender),
            "midfielder" | "mid" => Ok(Position::Midfielder),
            "forward" | "fwd" => Ok(Position::Forward),
            other => Err(format!("unknown position '{other}'")),
        }
    }
}

/// A registered player. The draw engine reads snapshots and never mutates them.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub position: Position,
    /// Primary rating, 1..=5.
    pub rating: u8,
    pub secondary_position: Option<Position>,
    pub secondary_rating: Option<u8>,
    pub games: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    /// Accumulated score under the configured scoring rules.
    pub score: i64,
    pub active: bool,
    pub available: bool,
}

impl Player {
    /// Create a new active, available player with zeroed totals. Rating is clamped to 1..=5.
    pub fn new(name: impl Into<String>, position: Position, rating: u8) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            position,
            rating: clamp_rating(rating),
            secondary_position: None,
            secondary_rating: None,
            games: 0,
            wins: 0,
            losses: 0,
            draws: 0,
            score: 0,
            active: true,
            available: true,
        }
    }

    /// Builder-style secondary position.
    pub fn with_secondary(mut self, position: Position, rating: u8) -> Self {
        self.secondary_position = Some(position);
        self.secondary_rating = Some(clamp_rating(rating));
        self
    }

    /// Builder-style accumulated score.
    pub fn with_score(mut self, score: i64) -> Self {
        self.score = score;
        self
    }
}

pub(crate) fn clamp_rating(rating: u8) -> u8 {
    rating.clamp(1, 5)
}
