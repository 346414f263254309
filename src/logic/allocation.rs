//! Draft allocator: deal an ordered pool into teams in snake order.

use crate::models::{Player, Team};

/// Deal `ordered` into `team_count` teams, walking indices 0,1,..,n-1,n-1,..,1,0,0,1,...
///
/// Each boundary team takes two picks in a row when the walk turns, so the top of the
/// ordering is spread across teams instead of stacking on the first one. Teams are not
/// capped: every player is placed and sizes differ by at most one.
pub fn allocate(ordered: &[Player], team_count: usize) -> Vec<Team> {
    let mut teams: Vec<Team> = (0..team_count).map(Team::numbered).collect();
    if teams.is_empty() {
        return teams;
    }

    let last = team_count - 1;
    let mut index = 0usize;
    let mut forward = true;

    for player in ordered {
        teams[index].players.push(player.clone());

        if last == 0 {
            continue;
        }
        if forward {
            if index == last {
                forward = false;
            } else {
                index += 1;
            }
        } else if index == 0 {
            forward = true;
        } else {
            index -= 1;
        }
    }

    teams
}
