use core::ops::Index;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

pub use cell::*;
pub use engine::*;
pub use error::*;
pub use gate::*;
pub use generator::*;
pub use rewards::*;
pub use session::*;
pub use types::*;

mod cell;
mod engine;
mod error;
mod gate;
mod generator;
mod rewards;
mod session;
mod types;

/// Side length of the gift board used by the original game.
pub const DEFAULT_SIZE: Coord = 20;

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    pub size: Coord2,
    pub mines: CellCount,
}

impl GameConfig {
    pub const fn new_unchecked(size: Coord2, mines: CellCount) -> Self {
        Self { size, mines }
    }

    pub fn new((rows, cols): Coord2, mines: CellCount) -> Self {
        let rows = rows.clamp(1, Coord::MAX);
        let cols = cols.clamp(1, Coord::MAX);
        let mines = mines.clamp(1, mult(rows, cols));
        Self::new_unchecked((rows, cols), mines)
    }

    /// The default square board, one mine per reward item.
    pub fn gift(mines: CellCount) -> Self {
        Self::new((DEFAULT_SIZE, DEFAULT_SIZE), mines)
    }

    pub const fn total_cells(&self) -> CellCount {
        mult(self.size.0, self.size.1)
    }

    pub fn validate_coords(&self, coords: Coord2) -> Result<Coord2> {
        if coords.0 < self.size.0 && coords.1 < self.size.1 {
            Ok(coords)
        } else {
            Err(GameError::InvalidCoords)
        }
    }
}

/// One placed mine and the reward item it unlocks.
///
/// Reward indices are assigned in placement order, `0..mine_count`, dense
/// and unique, so the placement list doubles as the join table between the
/// board and the reward content store.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinePlacement {
    pub coords: Coord2,
    pub reward_index: RewardIndex,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MineLayout {
    mine_mask: Array2<bool>,
    placements: Vec<MinePlacement>,
}

impl MineLayout {
    /// A board with no mines yet; placement happens on the first reveal.
    pub fn empty(size: Coord2) -> Self {
        Self {
            mine_mask: Array2::default(size.to_nd_index()),
            placements: Vec::new(),
        }
    }

    /// Builds a layout from explicit mine coordinates, assigning reward
    /// indices in the order given.
    pub fn from_mine_coords(size: Coord2, mine_coords: &[Coord2]) -> Result<Self> {
        let mut mine_mask: Array2<bool> = Array2::default(size.to_nd_index());
        let mut placements = Vec::with_capacity(mine_coords.len());

        for (i, &coords) in mine_coords.iter().enumerate() {
            if coords.0 >= size.0 || coords.1 >= size.1 {
                return Err(GameError::InvalidCoords);
            }
            if mine_mask[coords.to_nd_index()] {
                return Err(GameError::DuplicateMine);
            }
            mine_mask[coords.to_nd_index()] = true;
            placements.push(MinePlacement {
                coords,
                reward_index: i as RewardIndex,
            });
        }

        Ok(Self {
            mine_mask,
            placements,
        })
    }

    pub(crate) fn from_parts(mine_mask: Array2<bool>, placements: Vec<MinePlacement>) -> Self {
        Self {
            mine_mask,
            placements,
        }
    }

    pub fn size(&self) -> Coord2 {
        let dim = self.mine_mask.dim();
        (dim.0.try_into().unwrap(), dim.1.try_into().unwrap())
    }

    pub fn mine_count(&self) -> CellCount {
        self.placements.len().try_into().unwrap()
    }

    pub fn safe_cell_count(&self) -> CellCount {
        self.total_cells() - self.mine_count()
    }

    pub fn total_cells(&self) -> CellCount {
        self.mine_mask.len().try_into().unwrap()
    }

    pub fn contains_mine(&self, coords: Coord2) -> bool {
        self[coords]
    }

    /// Mines placed so far, in placement (reward-index) order.
    pub fn placements(&self) -> &[MinePlacement] {
        &self.placements
    }

    pub fn adjacent_mine_count(&self, coords: Coord2) -> u8 {
        self.mine_mask
            .iter_neighbors(coords)
            .filter(|&pos| self[pos])
            .count()
            .try_into()
            .unwrap()
    }

    pub(crate) fn iter_neighbors(&self, coords: Coord2) -> NeighborIter {
        self.mine_mask.iter_neighbors(coords)
    }
}

impl Index<Coord2> for MineLayout {
    type Output = bool;

    fn index(&self, (r, c): Coord2) -> &Self::Output {
        &self.mine_mask[(r as usize, c as usize)]
    }
}

/// Outcome of a flag gesture.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum MarkOutcome {
    NoChange,
    Changed,
    Won,
}

impl MarkOutcome {
    pub const fn has_update(self) -> bool {
        match self {
            Self::NoChange => false,
            Self::Changed => true,
            Self::Won => true,
        }
    }
}

/// Outcome of a reveal gesture.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum RevealOutcome {
    NoChange,
    Revealed,
    HitMine,
    Won,
}

impl RevealOutcome {
    pub const fn has_update(self) -> bool {
        use RevealOutcome::*;
        match self {
            NoChange => false,
            Revealed => true,
            HitMine => true,
            Won => true,
        }
    }
}
