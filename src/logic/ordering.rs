//! Ordering strategy: sort the pool by the configured criteria before allocation.

use crate::models::{Criterion, DrawConfiguration, Player};
use rand::seq::SliceRandom;
use rand::Rng;

/// Reorder `players` for a draw. Same elements, new order.
///
/// Random draws (and, as a fallback, non-random draws without criteria) shuffle with `rng`.
/// Otherwise the ordering is deterministic:
/// 1. Score selected: descending accumulated score.
/// 2. Position and Rating: grouped by position (enum order), descending rating in each group.
/// 3. Position only: ascending position.
/// 4. Rating only: descending rating.
///
/// All sorts are stable, so steps 2-4 keep the score order (or pool order) for ties.
pub fn order_players<R: Rng + ?Sized>(
    players: &[Player],
    config: &DrawConfiguration,
    rng: &mut R,
) -> Vec<Player> {
    let mut ordered = players.to_vec();

    if config.random || config.criteria.is_empty() {
        ordered.shuffle(rng);
        return ordered;
    }

    if config.has(Criterion::Score) {
        ordered.sort_by(|a, b| b.score.cmp(&a.score));
    }

    match (config.has(Criterion::Position), config.has(Criterion::Rating)) {
        (true, true) => {
            ordered.sort_by(|a, b| a.position.cmp(&b.position).then(b.rating.cmp(&a.rating)))
        }
        (true, false) => ordered.sort_by_key(|p| p.position),
        (false, true) => ordered.sort_by(|a, b| b.rating.cmp(&a.rating)),
        (false, false) => {}
    }

    ordered
}
