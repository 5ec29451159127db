use serde::{Deserialize, Serialize};

use crate::*;

/// Phase of one sitting of the game, each variant carrying the state that
/// phase owns. The live board belongs to `Playing` alone; a loss moves a
/// frozen snapshot into `Lost`/`Revival`; a win keeps only the placement
/// list the reward UI needs.
///
/// Valid transitions:
/// - Playing -> Lost (reveal hit a mine)
/// - Lost -> Revival (gate engaged)
/// - Lost | Revival -> Playing (revival granted, snapshot restored)
/// - Lost | Revival -> Playing (restart, fresh board)
/// - Playing -> Won (win evaluated true, or forced win)
/// - Won -> Playing (restart)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Phase {
    Playing(GridEngine),
    Lost { snapshot: ProgressSnapshot },
    Revival { snapshot: ProgressSnapshot },
    Won { placements: Vec<MinePlacement> },
}

impl Phase {
    pub fn kind(&self) -> PhaseKind {
        match self {
            Self::Playing(_) => PhaseKind::Playing,
            Self::Lost { .. } => PhaseKind::Lost,
            Self::Revival { .. } => PhaseKind::Revival,
            Self::Won { .. } => PhaseKind::Won,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhaseKind {
    Playing,
    Lost,
    Revival,
    Won,
}

/// Decision delivered back by the revival gate, exactly one per loss.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RevivalDecision {
    RevivalGranted,
    RestartChosen,
}

/// Sequences game phases across losses, revivals, and restarts.
///
/// All gestures funnel through here; anything that arrives in the wrong
/// phase is silently dropped, so the engine below never sees a gesture it
/// should not (the engine refuses on its own as well).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Session {
    config: GameConfig,
    next_seed: u64,
    phase: Phase,
}

impl Session {
    pub fn new(config: GameConfig, seed: u64) -> Self {
        let mut session = Self {
            config,
            next_seed: seed,
            phase: Phase::Won {
                placements: Vec::new(),
            },
        };
        session.phase = Phase::Playing(session.fresh_engine());
        session
    }

    /// A session sized off the reward content: one mine per reward item.
    pub fn for_rewards<S: RewardStore + ?Sized>(store: &S, seed: u64) -> Self {
        let mines = store.item_count().min(CellCount::MAX as usize) as CellCount;
        Self::new(GameConfig::gift(mines), seed)
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn phase_kind(&self) -> PhaseKind {
        self.phase.kind()
    }

    /// The live board, present only while `Playing`.
    pub fn engine(&self) -> Option<&GridEngine> {
        match &self.phase {
            Phase::Playing(engine) => Some(engine),
            _ => None,
        }
    }

    /// The placement list carried by `Won`, for the reward reveal UI.
    pub fn won_placements(&self) -> Option<&[MinePlacement]> {
        match &self.phase {
            Phase::Won { placements } => Some(placements),
            _ => None,
        }
    }

    /// The loss-time snapshot, present while the revival gate decides.
    pub fn loss_snapshot(&self) -> Option<&ProgressSnapshot> {
        match &self.phase {
            Phase::Lost { snapshot } | Phase::Revival { snapshot } => Some(snapshot),
            _ => None,
        }
    }

    pub fn reveal(&mut self, coords: Coord2) -> Result<RevealOutcome> {
        let Phase::Playing(engine) = &mut self.phase else {
            return Ok(RevealOutcome::NoChange);
        };

        let outcome = engine.reveal(coords)?;
        match outcome {
            RevealOutcome::HitMine => {
                let snapshot = engine.snapshot();
                log::debug!("mine hit at {:?}, loss snapshot taken", engine.triggered_mine());
                self.phase = Phase::Lost { snapshot };
            }
            RevealOutcome::Won => {
                let placements = engine.placements().to_vec();
                self.phase = Phase::Won { placements };
            }
            _ => {}
        }
        Ok(outcome)
    }

    pub fn toggle_flag(&mut self, coords: Coord2) -> Result<MarkOutcome> {
        let Phase::Playing(engine) = &mut self.phase else {
            return Ok(MarkOutcome::NoChange);
        };

        let outcome = engine.toggle_flag(coords)?;
        if outcome == MarkOutcome::Won {
            let placements = engine.placements().to_vec();
            self.phase = Phase::Won { placements };
        }
        Ok(outcome)
    }

    /// Hands the loss over to the revival gate. No-op outside `Lost`.
    pub fn offer_revival(&mut self) {
        let snapshot = match &self.phase {
            Phase::Lost { snapshot } => snapshot.clone(),
            _ => return,
        };
        self.phase = Phase::Revival { snapshot };
    }

    /// Applies the gate's decision. No-op outside `Lost`/`Revival`.
    pub fn decide_revival(&mut self, decision: RevivalDecision) {
        match decision {
            RevivalDecision::RevivalGranted => self.revival_granted(),
            RevivalDecision::RestartChosen => self.restart(),
        }
    }

    /// Resumes the loss-time board verbatim. No-op outside `Lost`/`Revival`.
    pub fn revival_granted(&mut self) {
        let snapshot = match &self.phase {
            Phase::Lost { snapshot } | Phase::Revival { snapshot } => snapshot.clone(),
            _ => return,
        };
        log::debug!("revival granted, resuming saved progress");
        self.phase = Phase::Playing(snapshot.resume());
    }

    /// Discards whatever the current phase holds and starts a fresh board.
    pub fn restart(&mut self) {
        log::debug!("restart, fresh board");
        self.phase = Phase::Playing(self.fresh_engine());
    }

    /// Debug escape hatch; same entry point whether it comes from the
    /// hidden keystroke detector or anywhere else. No-op outside `Playing`.
    pub fn force_win(&mut self) {
        let Phase::Playing(engine) = &mut self.phase else {
            return;
        };
        let placements = engine.force_win();
        self.phase = Phase::Won { placements };
    }

    fn fresh_engine(&mut self) -> GridEngine {
        let seed = self.next_seed;
        self.next_seed = self.next_seed.wrapping_add(1);
        GridEngine::new(self.config, seed)
    }
}
