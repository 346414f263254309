//! Draw engine: shape adjustment, ordering, and allocation in one pure call.

use crate::logic::allocation::allocate;
use crate::logic::ordering::order_players;
use crate::models::{DrawConfiguration, DrawError, DrawResult, Player, Team};
use rand::Rng;

/// Team shape actually used for a pool, after shrinking for short supply.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DrawShape {
    pub team_count: usize,
    /// How many players of the ordering go to playing teams; the rest form the reserve.
    pub playing: usize,
}

impl DrawShape {
    /// Shape for `pool_size` players under `config` (shape must already be checked).
    ///
    /// - Enough players: configured team count, everyone plays (surplus spread by the snake).
    /// - Short: `pool_size / per_team` full teams, leftovers go to a reserve team.
    /// - Short of even one team: a single team with the whole pool.
    pub fn for_pool(pool_size: usize, config: &DrawConfiguration) -> Self {
        let per_team = config.players_per_team;
        if pool_size >= per_team.saturating_mul(config.team_count) {
            return Self {
                team_count: config.team_count,
                playing: pool_size,
            };
        }
        match pool_size / per_team {
            0 => Self {
                team_count: 1,
                playing: pool_size,
            },
            team_count => Self {
                team_count,
                playing: team_count * per_team,
            },
        }
    }
}

/// Draw teams from `pool`.
///
/// An empty pool yields a result with no teams. A zero shape is rejected with
/// `InvalidConfiguration`; a non-random configuration without criteria is not (it falls
/// back to a shuffle).
pub fn draw<R: Rng + ?Sized>(
    pool: &[Player],
    config: &DrawConfiguration,
    rng: &mut R,
) -> Result<DrawResult, DrawError> {
    config.check_shape()?;
    let strategy = config.strategy_label();
    if pool.is_empty() {
        return Ok(DrawResult::new(Vec::new(), strategy));
    }

    let shape = DrawShape::for_pool(pool.len(), config);
    if shape.team_count != config.team_count {
        log::warn!(
            "Pool of {} is short for {}x{}; drawing {} team(s)",
            pool.len(),
            config.team_count,
            config.players_per_team,
            shape.team_count
        );
    }

    let ordered = order_players(pool, config, rng);
    let (playing, leftover) = ordered.split_at(shape.playing);
    let mut teams = allocate(playing, shape.team_count);
    if !leftover.is_empty() {
        teams.push(Team::reserve(shape.team_count, leftover.to_vec()));
    }

    Ok(DrawResult::new(teams, strategy))
}
