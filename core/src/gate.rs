use rand::prelude::*;
use smallvec::SmallVec;
use web_time::{Duration, Instant};

/// Minimum watch time before a revival may be granted.
pub const MIN_WATCH: Duration = Duration::from_secs(15);

/// Bookkeeping side of the revival gate: which clip to show next and
/// whether enough of it has been watched to earn a revival.
///
/// The gate never touches the board. It receives the loss (the snapshot
/// stays with the session) and eventually produces one
/// [`crate::RevivalDecision`]. Clip rotation prefers clips the player has not
/// seen this session and starts over once every clip has played.
#[derive(Clone, Debug)]
pub struct RevivalGate {
    media_count: usize,
    min_watch: Duration,
    played: SmallVec<[usize; 8]>,
    watching: Option<(usize, Instant)>,
    rng: SmallRng,
}

impl RevivalGate {
    pub fn new(media_count: usize, seed: u64) -> Self {
        Self::with_min_watch(media_count, seed, MIN_WATCH)
    }

    pub fn with_min_watch(media_count: usize, seed: u64, min_watch: Duration) -> Self {
        Self {
            media_count,
            min_watch,
            played: SmallVec::new(),
            watching: None,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Picks the clip to show and starts the watch timer. Returns `None`
    /// when there is no media at all (the gate then cannot grant).
    pub fn begin_watch(&mut self) -> Option<usize> {
        if self.media_count == 0 {
            return None;
        }

        let unplayed: Vec<usize> = (0..self.media_count)
            .filter(|index| !self.played.contains(index))
            .collect();
        let index = match unplayed.as_slice() {
            // everything has been seen: fully random
            [] => self.rng.random_range(0..self.media_count),
            rest => *rest.choose(&mut self.rng).unwrap_or(&rest[0]),
        };

        log::debug!("revival clip {} selected ({} seen)", index, self.played.len());
        self.watching = Some((index, Instant::now()));
        Some(index)
    }

    /// Whether the current clip has been watched long enough.
    pub fn eligible(&self) -> bool {
        self.watching
            .is_some_and(|(_, started)| started.elapsed() >= self.min_watch)
    }

    /// Completes the watch: marks the clip as seen (resetting the rotation
    /// once every clip has played) and reports whether the revival may be
    /// granted. Finishing early just leaves the gate armed.
    pub fn finish_watch(&mut self) -> bool {
        if !self.eligible() {
            return false;
        }
        if let Some((index, _)) = self.watching.take() {
            self.played.push(index);
            if self.played.len() >= self.media_count {
                log::debug!("all {} clips seen, rotation reset", self.media_count);
                self.played.clear();
            }
        }
        true
    }

    /// Restart wipes the rotation history along with everything else.
    pub fn reset(&mut self) {
        self.played.clear();
        self.watching = None;
    }
}
