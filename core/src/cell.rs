use serde::{Deserialize, Serialize};

/// Canonical player-visible state of one grid cell.
///
/// Revealed and flagged are mutually exclusive by construction, and the
/// adjacent-mine count is only carried once a cell is actually revealed
/// (mines are never revealed, so the count always refers to a safe cell).
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Cell {
    Hidden,
    Revealed(u8),
    Flagged,
}

impl Cell {
    pub const fn is_revealed(self) -> bool {
        matches!(self, Self::Revealed(_))
    }

    pub const fn is_flagged(self) -> bool {
        matches!(self, Self::Flagged)
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::Hidden
    }
}
