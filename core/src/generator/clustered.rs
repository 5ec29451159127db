use core::ops::Range;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::*;

/// Generation strategy that skews mines into clusters: the board is split
/// into 4 quadrants and mines are dealt round-robin across them before any
/// leftover is spread uniformly over the remaining free cells. The skew is
/// a deliberate difficulty choice inherited from the original game; only
/// the distributional shape matters, not the exact random sequence.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClusteredGenerator {
    seed: u64,
}

/// Rejection-sampling attempts per quadrant, as a multiple of its area.
const QUADRANT_ATTEMPT_FACTOR: u32 = 8;

impl ClusteredGenerator {
    pub const fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl MineGenerator for ClusteredGenerator {
    fn generate(self, config: GameConfig, exclude: Option<Coord2>) -> MineLayout {
        use rand::prelude::*;

        let (rows, cols) = config.size;
        let total_cells = config.total_cells();
        let blocked: CellCount = exclude
            .map(|center| iter_safe_zone(center, config.size).count() as CellCount)
            .unwrap_or(0);
        let available = total_cells - blocked;

        let mut requested = config.mines;
        if requested > available {
            log::warn!(
                "Requested {} mines but only {} cells are placeable, clamping",
                requested,
                available
            );
            requested = available;
        }

        let in_safe_zone =
            |pos: Coord2| exclude.is_some_and(|center| chebyshev(center, pos) <= 1);

        let mut mine_mask: Array2<bool> = Array2::default(config.size.to_nd_index());
        let mut placements: Vec<MinePlacement> = Vec::with_capacity(requested as usize);
        let mut rng = SmallRng::seed_from_u64(self.seed);

        // quadrant pass: round-robin targets of ceil(requested / 4)
        let half_r = rows / 2;
        let half_c = cols / 2;
        let quadrants: [(Range<Coord>, Range<Coord>); 4] = [
            (0..half_r, 0..half_c),
            (0..half_r, half_c..cols),
            (half_r..rows, 0..half_c),
            (half_r..rows, half_c..cols),
        ];
        let per_quadrant = requested.div_ceil(4);

        for (row_range, col_range) in quadrants {
            if row_range.is_empty() || col_range.is_empty() {
                continue;
            }

            let max_attempts = (row_range.len() * col_range.len()) as u32 * QUADRANT_ATTEMPT_FACTOR;
            let mut placed_here: CellCount = 0;
            let mut attempts: u32 = 0;

            while placed_here < per_quadrant
                && (placements.len() as CellCount) < requested
                && attempts < max_attempts
            {
                attempts += 1;
                let pos = (
                    rng.random_range(row_range.clone()),
                    rng.random_range(col_range.clone()),
                );
                if mine_mask[pos.to_nd_index()] || in_safe_zone(pos) {
                    continue;
                }
                mine_mask[pos.to_nd_index()] = true;
                placements.push(MinePlacement {
                    coords: pos,
                    reward_index: placements.len() as RewardIndex,
                });
                placed_here += 1;
            }
        }

        // leftover pass: uniform over whatever is still free
        let leftover = requested as usize - placements.len();
        if leftover > 0 {
            log::debug!(
                "Quadrant pass placed {} mines, spreading {} uniformly",
                placements.len(),
                leftover
            );
            let mut free: Vec<Coord2> = (0..rows)
                .flat_map(|r| (0..cols).map(move |c| (r, c)))
                .filter(|&pos| !mine_mask[pos.to_nd_index()] && !in_safe_zone(pos))
                .collect();
            let (chosen, _) = free.partial_shuffle(&mut rng, leftover);
            for &pos in chosen.iter() {
                mine_mask[pos.to_nd_index()] = true;
                placements.push(MinePlacement {
                    coords: pos,
                    reward_index: placements.len() as RewardIndex,
                });
            }
        }

        if placements.len() as CellCount != requested {
            log::warn!(
                "Generated layout count mismatch, actual: {}, requested: {}",
                placements.len(),
                requested
            );
        }

        MineLayout::from_parts(mine_mask, placements)
    }
}
