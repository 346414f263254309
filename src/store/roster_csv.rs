//! Roster import from CSV: `name,position,rating[,secondary_position,secondary_rating]`.

use crate::models::{Player, Position};
use crate::store::StoreError;
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize)]
struct RosterRow {
    name: String,
    position: String,
    rating: u8,
    #[serde(default)]
    secondary_position: Option<String>,
    #[serde(default)]
    secondary_rating: Option<u8>,
}

/// Parse a roster file (with header row) into fresh players. Blank names are skipped.
pub fn read_players_csv<R: Read>(reader: R) -> Result<Vec<Player>, StoreError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut players = Vec::new();
    for (line, row) in rdr.deserialize::<RosterRow>().enumerate() {
        let row = row?;
        if row.name.is_empty() {
            continue;
        }
        let position: Position = row
            .position
            .parse()
            .map_err(|e| StoreError::Corrupt(format!("roster row {}: {}", line + 1, e)))?;
        let mut player = Player::new(row.name, position, row.rating);
        if let Some(raw) = row.secondary_position.filter(|s| !s.is_empty()) {
            let secondary: Position = raw
                .parse()
                .map_err(|e| StoreError::Corrupt(format!("roster row {}: {}", line + 1, e)))?;
            player = player.with_secondary(secondary, row.secondary_rating.unwrap_or(row.rating));
        }
        players.push(player);
    }
    Ok(players)
}
