use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// The single seeded random stream that drives a game.
///
/// Every piece of game randomness is drawn from this stream, so a seed fully
/// determines a game's evolution given identical player decisions. The state
/// serializes with the rest of the game, which means a snapshotted game
/// resumes on exactly the same sequence.
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct GameRng(rand_chacha::ChaCha8Rng);

impl GameRng {
    pub fn seeded(seed: u64) -> Self {
        Self(rand_chacha::ChaCha8Rng::seed_from_u64(seed))
    }

    /// The next value in `[0, 1)`.
    pub fn unit(&mut self) -> f64 {
        self.0.gen::<f64>()
    }

    /// Rolls a probability gate: true with probability `p`.
    pub fn chance(&mut self, p: f64) -> bool {
        self.unit() < p
    }

    /// A uniform index into a slice of the given length. `len` must be nonzero.
    pub fn index(&mut self, len: usize) -> usize {
        self.0.gen_range(0..len)
    }

    /// Picks a uniformly random element, or `None` when the slice is empty.
    pub fn choice<T: Copy>(&mut self, items: &[T]) -> Option<T> {
        if items.is_empty() {
            return None;
        }
        Some(items[self.index(items.len())])
    }

    /// Fisher-Yates shuffle over the whole slice.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.0);
    }

    /// Picks an index with probability proportional to its weight.
    ///
    /// Zero or negative total weight degenerates to index 0.
    pub fn weighted_index(&mut self, weights: &[f64]) -> usize {
        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            return 0;
        }
        let mut roll = self.unit() * total;
        for (idx, &w) in weights.iter().enumerate() {
            roll -= w;
            if roll < 0.0 {
                return idx;
            }
        }
        weights.len() - 1
    }
}
