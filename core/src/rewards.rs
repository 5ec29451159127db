use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::*;

/// Ordered reward content unlocked one item per mine. The item count of
/// the store decides the mine count of a fresh board.
pub trait RewardStore {
    fn item_count(&self) -> usize;
    fn item_at(&self, index: usize) -> Option<&str>;
}

/// In-memory reward content, the way the original game keeps its list of
/// memory texts in a static module.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MemoryStore {
    items: Vec<String>,
}

impl MemoryStore {
    pub fn new(items: Vec<String>) -> Self {
        Self { items }
    }
}

impl RewardStore for MemoryStore {
    fn item_count(&self) -> usize {
        self.items.len()
    }

    fn item_at(&self, index: usize) -> Option<&str> {
        self.items.get(index).map(String::as_str)
    }
}

impl FromIterator<String> for MemoryStore {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Sparse row-major mapping from grid cell to reward-content index, built
/// from the win-time placement list for the reveal UI.
///
/// Placements whose reward index falls outside the content list are
/// dropped silently; that only happens when mine count and content count
/// diverge, which must degrade rather than crash.
pub fn reward_map(
    placements: &[MinePlacement],
    item_count: usize,
    size: Coord2,
) -> Array2<Option<RewardIndex>> {
    let mut map: Array2<Option<RewardIndex>> = Array2::default(size.to_nd_index());

    for p in placements {
        if usize::from(p.reward_index) >= item_count {
            log::debug!(
                "dropping placement at {:?}: reward index {} exceeds {} items",
                p.coords,
                p.reward_index,
                item_count
            );
            continue;
        }
        map[p.coords.to_nd_index()] = Some(p.reward_index);
    }

    map
}
