//! Top-N ranking by length.

use crate::entity::Player;
use protocol::LeaderboardEntry;

/// Rank players by descending length and keep the first `size`.
///
/// Ties keep their input order.
pub fn build(players: &[Player], size: usize) -> Vec<LeaderboardEntry> {
    let mut ranked: Vec<&Player> = players.iter().collect();
    // sort_by is stable
    ranked.sort_by(|a, b| b.length.total_cmp(&a.length));

    ranked
        .into_iter()
        .take(size)
        .map(|player| LeaderboardEntry {
            name: player.name.clone(),
            score: player.score(),
        })
        .collect()
}
