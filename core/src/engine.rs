use hashbrown::HashSet;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::*;

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum EngineState {
    /// Board exists but mines have not been placed yet.
    Ready,
    /// Mines placed, gestures accepted.
    Active,
    Won,
    Lost,
}

impl EngineState {
    pub const fn is_ready(self) -> bool {
        matches!(self, Self::Ready)
    }

    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

impl Default for EngineState {
    fn default() -> Self {
        Self::Ready
    }
}

/// One playable board from creation to win or loss.
///
/// The board starts with no mines; the first reveal gesture triggers
/// placement with a 3x3 safe zone around the revealed cell, so the first
/// reveal can never hit a mine. Gestures arriving after the game finished
/// are silent no-ops rather than errors: the UI drives this object off
/// raw clicks and an ignored late click is normal flow.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridEngine {
    config: GameConfig,
    generator: ClusteredGenerator,
    layout: MineLayout,
    board: Array2<Cell>,
    flags_left: CellCount,
    flagged_count: CellCount,
    revealed_count: CellCount,
    state: EngineState,
    triggered_mine: Option<Coord2>,
}

impl GridEngine {
    pub fn new(config: GameConfig, seed: u64) -> Self {
        Self {
            config,
            generator: ClusteredGenerator::new(seed),
            layout: MineLayout::empty(config.size),
            board: Array2::default(config.size.to_nd_index()),
            flags_left: config.mines,
            flagged_count: 0,
            revealed_count: 0,
            state: Default::default(),
            triggered_mine: None,
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    /// Whether the first reveal has already consumed its deferred
    /// mine placement.
    pub fn mines_placed(&self) -> bool {
        !self.state.is_ready()
    }

    pub fn size(&self) -> Coord2 {
        self.config.size
    }

    pub fn config(&self) -> GameConfig {
        self.config
    }

    pub fn total_mines(&self) -> CellCount {
        if self.state.is_ready() {
            self.config.mines
        } else {
            self.layout.mine_count()
        }
    }

    pub fn flags_left(&self) -> CellCount {
        self.flags_left
    }

    pub fn cell_at(&self, coords: Coord2) -> Cell {
        self.board[coords.to_nd_index()]
    }

    /// The mine that ended the game, if it ended in a loss. The cell
    /// itself is left unrevealed so the loss snapshot stays playable.
    pub fn triggered_mine(&self) -> Option<Coord2> {
        self.triggered_mine
    }

    /// Mines placed so far, in reward-index order. Empty until the first
    /// reveal or a forced win.
    pub fn placements(&self) -> &[MinePlacement] {
        self.layout.placements()
    }

    pub fn reveal(&mut self, coords: Coord2) -> Result<RevealOutcome> {
        use RevealOutcome::*;

        let coords = self.config.validate_coords(coords)?;

        if self.state.is_finished() {
            return Ok(NoChange);
        }
        if !matches!(self.board[coords.to_nd_index()], Cell::Hidden) {
            return Ok(NoChange);
        }

        if self.state.is_ready() {
            self.place_mines(Some(coords));
        }

        if self.layout.contains_mine(coords) {
            // the board is left untouched so the loss snapshot can be
            // restored as an identical playable grid
            self.triggered_mine = Some(coords);
            self.state = EngineState::Lost;
            return Ok(HitMine);
        }

        self.flood_reveal(coords);

        Ok(if self.evaluate_win() {
            self.state = EngineState::Won;
            Won
        } else {
            Revealed
        })
    }

    pub fn toggle_flag(&mut self, coords: Coord2) -> Result<MarkOutcome> {
        use MarkOutcome::*;

        let coords = self.config.validate_coords(coords)?;

        if self.state.is_finished() {
            return Ok(NoChange);
        }

        Ok(match self.board[coords.to_nd_index()] {
            Cell::Revealed(_) => NoChange,
            Cell::Flagged => {
                self.board[coords.to_nd_index()] = Cell::Hidden;
                self.flagged_count -= 1;
                self.flags_left += 1;
                Changed
            }
            // flagging with an exhausted budget is refused, not an error
            Cell::Hidden if self.flags_left == 0 => NoChange,
            Cell::Hidden => {
                self.board[coords.to_nd_index()] = Cell::Flagged;
                self.flagged_count += 1;
                self.flags_left -= 1;
                if self.evaluate_win() {
                    self.state = EngineState::Won;
                    Won
                } else {
                    Changed
                }
            }
        })
    }

    /// Win condition: every safe cell revealed OR every mine flagged.
    ///
    /// The OR is intentional (it matches the original game's docs): the
    /// player may win purely by flagging without clearing a single cell.
    pub fn evaluate_win(&self) -> bool {
        if self.state.is_ready() {
            return false;
        }
        if self.revealed_count == self.layout.safe_cell_count() {
            return true;
        }
        !self.layout.placements().is_empty()
            && self
                .layout
                .placements()
                .iter()
                .all(|p| self.board[p.coords.to_nd_index()].is_flagged())
    }

    /// Debug escape hatch: completes the game immediately. Places mines
    /// with no safe zone if they were never placed, flags every mine,
    /// reveals every safe cell, and drains the flag budget.
    pub fn force_win(&mut self) -> Vec<MinePlacement> {
        if self.state.is_finished() {
            return self.layout.placements().to_vec();
        }
        if self.state.is_ready() {
            self.place_mines(None);
        }

        let (rows, cols) = self.config.size;
        self.flagged_count = 0;
        self.revealed_count = 0;
        for r in 0..rows {
            for c in 0..cols {
                let pos = (r, c);
                if self.layout.contains_mine(pos) {
                    self.board[pos.to_nd_index()] = Cell::Flagged;
                    self.flagged_count += 1;
                } else {
                    self.board[pos.to_nd_index()] =
                        Cell::Revealed(self.layout.adjacent_mine_count(pos));
                    self.revealed_count += 1;
                }
            }
        }
        self.flags_left = 0;
        self.triggered_mine = None;
        self.state = EngineState::Won;
        log::debug!("forced win, {} rewards unlocked", self.layout.mine_count());
        self.layout.placements().to_vec()
    }

    /// Immutable capture of the whole in-flight game, taken at the moment
    /// of loss and handed to the revival gate.
    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            engine: self.clone(),
        }
    }

    fn place_mines(&mut self, exclude: Option<Coord2>) {
        debug_assert!(self.state.is_ready(), "mines placed twice");

        self.layout = self.generator.generate(self.config, exclude);
        // reconcile the budget with the (possibly clamped) actual count;
        // flags placed before the first reveal keep their spend
        self.flags_left = self
            .layout
            .mine_count()
            .saturating_sub(self.flagged_count);
        self.state = EngineState::Active;
        log::debug!(
            "placed {} mines (exclude: {:?})",
            self.layout.mine_count(),
            exclude
        );
    }

    /// Work-list flood fill: reveals the connected zero-count region plus
    /// its nonzero frontier, skipping flagged cells. Iterative so deep
    /// regions never touch recursion limits.
    fn flood_reveal(&mut self, start: Coord2) {
        let count = self.layout.adjacent_mine_count(start);
        self.board[start.to_nd_index()] = Cell::Revealed(count);
        self.revealed_count += 1;
        log::trace!("revealed {:?}, adjacent mines: {}", start, count);

        if count > 0 {
            return;
        }

        let mut visited: HashSet<Coord2> = HashSet::new();
        visited.insert(start);
        let mut to_visit: VecDeque<_> = self
            .layout
            .iter_neighbors(start)
            .filter(|&pos| matches!(self.board[pos.to_nd_index()], Cell::Hidden))
            .collect();

        while let Some(visit_coords) = to_visit.pop_front() {
            if !visited.insert(visit_coords) {
                continue;
            }
            if !matches!(self.board[visit_coords.to_nd_index()], Cell::Hidden) {
                continue;
            }

            let visit_count = self.layout.adjacent_mine_count(visit_coords);
            self.board[visit_coords.to_nd_index()] = Cell::Revealed(visit_count);
            self.revealed_count += 1;
            log::trace!("flood revealed {:?}, adjacent mines: {}", visit_coords, visit_count);

            if visit_count == 0 {
                to_visit.extend(
                    self.layout
                        .iter_neighbors(visit_coords)
                        .filter(|&pos| matches!(self.board[pos.to_nd_index()], Cell::Hidden))
                        .filter(|pos| !visited.contains(pos)),
                );
            }
        }
    }
}

/// Loss-time capture of a [`GridEngine`], restored verbatim when the
/// revival gate grants a second chance. No mine re-placement happens on
/// resume; the grid comes back bit-for-bit identical.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    engine: GridEngine,
}

impl ProgressSnapshot {
    pub fn engine(&self) -> &GridEngine {
        &self.engine
    }

    /// Turns the capture back into the live board. A lost engine resumes
    /// play; the triggered-mine marker is cleared.
    pub fn resume(self) -> GridEngine {
        let mut engine = self.engine;
        engine.state = match engine.state {
            EngineState::Lost => EngineState::Active,
            other => other,
        };
        engine.triggered_mine = None;
        engine
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Engine with a deterministic hand-built layout, mines already placed.
    fn engine_with_mines(size: Coord2, mines: &[Coord2]) -> GridEngine {
        let layout = MineLayout::from_mine_coords(size, mines).unwrap();
        let mut engine = GridEngine::new(
            GameConfig::new_unchecked(size, mines.len() as CellCount),
            0,
        );
        engine.layout = layout;
        engine.state = EngineState::Active;
        engine
    }

    #[test]
    fn first_reveal_places_mines_outside_safe_zone() {
        let mut engine = GridEngine::new(GameConfig::gift(12), 7);
        assert!(!engine.mines_placed());

        let outcome = engine.reveal((10, 10)).unwrap();

        assert!(engine.mines_placed());
        assert_ne!(outcome, RevealOutcome::HitMine);
        for pos in iter_safe_zone((10, 10), engine.size()) {
            assert!(!engine.placements().iter().any(|p| p.coords == pos));
        }
        assert!(engine.cell_at((10, 10)).is_revealed());
    }

    #[test]
    fn reveal_hits_mine_without_mutating_the_cell() {
        let mut engine = engine_with_mines((3, 3), &[(0, 0)]);

        let outcome = engine.reveal((0, 0)).unwrap();

        assert_eq!(outcome, RevealOutcome::HitMine);
        assert_eq!(engine.state(), EngineState::Lost);
        assert_eq!(engine.triggered_mine(), Some((0, 0)));
        assert_eq!(engine.cell_at((0, 0)), Cell::Hidden);
    }

    #[test]
    fn reveal_is_idempotent_on_revealed_cells() {
        let mut engine = engine_with_mines((4, 4), &[(0, 0), (0, 1)]);

        // (1, 1) borders both mines, so this reveals exactly one cell
        assert_eq!(engine.reveal((1, 1)).unwrap(), RevealOutcome::Revealed);
        assert_eq!(engine.cell_at((1, 1)), Cell::Revealed(2));
        let before = engine.clone();

        assert_eq!(engine.reveal((1, 1)).unwrap(), RevealOutcome::NoChange);
        assert_eq!(engine, before);
    }

    #[test]
    fn flood_fill_opens_zero_region_and_its_frontier() {
        // single mine in a corner; revealing the far corner floods the
        // whole board up to the nonzero frontier around the mine
        let mut engine = engine_with_mines((4, 4), &[(0, 0)]);

        let outcome = engine.reveal((3, 3)).unwrap();

        assert_eq!(outcome, RevealOutcome::Won);
        assert_eq!(engine.cell_at((0, 0)), Cell::Hidden);
        assert_eq!(engine.cell_at((1, 1)), Cell::Revealed(1));
        assert_eq!(engine.cell_at((0, 1)), Cell::Revealed(1));
        assert_eq!(engine.cell_at((2, 2)), Cell::Revealed(0));
        assert_eq!(engine.cell_at((3, 3)), Cell::Revealed(0));
    }

    #[test]
    fn flood_fill_does_not_cross_nonzero_cells() {
        // mines wall off the right column; flooding from the left must
        // stop at the nonzero band
        let mines = &[(0, 2), (1, 2), (2, 2)];
        let mut engine = engine_with_mines((3, 4), mines);

        engine.reveal((0, 0)).unwrap();

        assert!(engine.cell_at((0, 0)).is_revealed());
        assert!(engine.cell_at((2, 1)).is_revealed());
        assert_eq!(engine.cell_at((0, 3)), Cell::Hidden);
        assert_eq!(engine.cell_at((2, 3)), Cell::Hidden);
    }

    #[test]
    fn flood_fill_skips_flagged_cells() {
        let mut engine = engine_with_mines((4, 4), &[(0, 0)]);

        engine.toggle_flag((2, 2)).unwrap();
        engine.reveal((3, 3)).unwrap();

        assert_eq!(engine.cell_at((2, 2)), Cell::Flagged);
    }

    #[test]
    fn flag_budget_is_consumed_and_refunded() {
        let mut engine = engine_with_mines((3, 3), &[(0, 0), (1, 1)]);
        assert_eq!(engine.flags_left(), 2);

        assert_eq!(engine.toggle_flag((2, 2)).unwrap(), MarkOutcome::Changed);
        assert_eq!(engine.toggle_flag((2, 1)).unwrap(), MarkOutcome::Changed);
        assert_eq!(engine.flags_left(), 0);

        // exhausted budget: silently refused
        assert_eq!(engine.toggle_flag((2, 0)).unwrap(), MarkOutcome::NoChange);
        assert_eq!(engine.cell_at((2, 0)), Cell::Hidden);

        // unflagging refunds
        assert_eq!(engine.toggle_flag((2, 2)).unwrap(), MarkOutcome::Changed);
        assert_eq!(engine.flags_left(), 1);
    }

    #[test]
    fn flagging_a_revealed_cell_is_a_no_op() {
        let mut engine = engine_with_mines((3, 3), &[(0, 0)]);
        engine.reveal((2, 2)).unwrap();

        assert_eq!(engine.toggle_flag((2, 2)).unwrap(), MarkOutcome::NoChange);
    }

    #[test]
    fn win_by_flagging_all_mines_alone() {
        // 3x3, one mine: flagging just the mine wins without revealing
        // a single safe cell
        let mut engine = engine_with_mines((3, 3), &[(1, 1)]);

        let outcome = engine.toggle_flag((1, 1)).unwrap();

        assert_eq!(outcome, MarkOutcome::Won);
        assert_eq!(engine.state(), EngineState::Won);
        assert!(!engine.cell_at((0, 0)).is_revealed());
    }

    #[test]
    fn win_by_revealing_all_safe_cells() {
        let mut engine = engine_with_mines((2, 1), &[(0, 0)]);

        assert_eq!(engine.reveal((1, 0)).unwrap(), RevealOutcome::Won);
        assert_eq!(engine.state(), EngineState::Won);
    }

    #[test]
    fn misplaced_flags_do_not_win() {
        let mut engine = engine_with_mines((3, 3), &[(1, 1)]);

        assert_eq!(engine.toggle_flag((0, 0)).unwrap(), MarkOutcome::Changed);
        assert!(!engine.evaluate_win());
    }

    #[test]
    fn gestures_after_game_over_are_ignored() {
        let mut engine = engine_with_mines((3, 3), &[(0, 0)]);
        engine.reveal((0, 0)).unwrap();
        let frozen = engine.clone();

        assert_eq!(engine.reveal((2, 2)).unwrap(), RevealOutcome::NoChange);
        assert_eq!(engine.toggle_flag((2, 2)).unwrap(), MarkOutcome::NoChange);
        assert_eq!(engine, frozen);
    }

    #[test]
    fn out_of_range_coordinates_are_an_error() {
        let mut engine = engine_with_mines((3, 3), &[(0, 0)]);

        assert_eq!(engine.reveal((3, 0)), Err(GameError::InvalidCoords));
        assert_eq!(engine.toggle_flag((0, 3)), Err(GameError::InvalidCoords));
    }

    #[test]
    fn force_win_on_untouched_board_places_without_safe_zone() {
        let mut engine = GridEngine::new(GameConfig::gift(12), 3);

        let placements = engine.force_win();

        assert_eq!(placements.len(), 12);
        assert_eq!(engine.state(), EngineState::Won);
        assert_eq!(engine.flags_left(), 0);
        for p in &placements {
            assert_eq!(engine.cell_at(p.coords), Cell::Flagged);
        }
        let (rows, cols) = engine.size();
        for r in 0..rows {
            for c in 0..cols {
                if !placements.iter().any(|p| p.coords == (r, c)) {
                    assert!(engine.cell_at((r, c)).is_revealed());
                }
            }
        }
    }

    #[test]
    fn force_win_reward_indices_are_dense() {
        let mut engine = GridEngine::new(GameConfig::gift(5), 21);

        let mut indices: Vec<_> = engine
            .force_win()
            .iter()
            .map(|p| p.reward_index)
            .collect();
        indices.sort_unstable();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn snapshot_restores_the_loss_time_grid_verbatim() {
        let mut engine = GridEngine::new(GameConfig::gift(12), 5);
        engine.reveal((10, 10)).unwrap();

        // flag some hidden non-mine cell
        let (rows, cols) = engine.size();
        let flag_pos = (0..rows)
            .flat_map(|r| (0..cols).map(move |c| (r, c)))
            .find(|&pos| {
                engine.cell_at(pos) == Cell::Hidden
                    && !engine.placements().iter().any(|p| p.coords == pos)
            })
            .unwrap();
        engine.toggle_flag(flag_pos).unwrap();

        // walk into a mine
        let mine = engine.placements()[0].coords;
        assert_eq!(engine.reveal(mine).unwrap(), RevealOutcome::HitMine);

        let snapshot = engine.snapshot();
        let restored = snapshot.resume();

        assert_eq!(restored.state(), EngineState::Active);
        assert_eq!(restored.triggered_mine(), None);
        assert_eq!(restored.placements(), engine.placements());
        assert_eq!(restored.flags_left(), engine.flags_left());
        let (rows, cols) = engine.size();
        for r in 0..rows {
            for c in 0..cols {
                assert_eq!(restored.cell_at((r, c)), engine.cell_at((r, c)));
            }
        }
        assert!(restored.mines_placed());
    }

    #[test]
    fn snapshot_serde_round_trip() {
        let mut engine = GridEngine::new(GameConfig::gift(8), 13);
        engine.reveal((5, 5)).unwrap();
        engine.reveal(engine.placements()[0].coords).unwrap();

        let snapshot = engine.snapshot();
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: ProgressSnapshot = serde_json::from_str(&json).unwrap();

        assert_eq!(back, snapshot);
    }

    #[test]
    fn flags_placed_before_first_reveal_survive_placement() {
        let mut engine = GridEngine::new(GameConfig::gift(12), 17);

        engine.toggle_flag((0, 0)).unwrap();
        assert!(!engine.mines_placed());
        assert_eq!(engine.flags_left(), 11);

        engine.reveal((10, 10)).unwrap();

        assert_eq!(engine.cell_at((0, 0)), Cell::Flagged);
        // budget reconciles so spend + remaining == mine count
        assert_eq!(engine.flags_left() + 1, engine.total_mines());
    }
}
