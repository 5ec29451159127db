use crate::*;
pub use clustered::*;

mod clustered;

/// Produces a mine layout for a fresh board.
///
/// `exclude` marks the first-revealed cell: no mine may land inside the
/// 3x3 safe zone centered on it. `None` means no safe zone (forced win on
/// an untouched board).
pub trait MineGenerator {
    fn generate(self, config: GameConfig, exclude: Option<Coord2>) -> MineLayout;
}
