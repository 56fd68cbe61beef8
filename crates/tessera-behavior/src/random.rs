//! Per-worker random number generators.

use std::sync::{Mutex, MutexGuard, PoisonError};

use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// One seeded ChaCha8 generator per worker thread, plus one for callers
/// outside the pool.
///
/// Each generator is seeded from the simulation seed and placed on its own
/// stream, so workers never share a sequence. A task locks its worker's
/// generator for the task's duration; since a worker runs one task at a
/// time the lock is uncontended.
///
/// Draws are reproducible only for a fixed worker count.
#[derive(Debug)]
pub struct RandomPool {
    seed: u64,
    generators: Vec<Mutex<ChaCha8Rng>>,
}

/// Outcome of [`RandomPool::restore`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RngRestoreReport {
    /// Generators whose state was copied from the checkpoint.
    pub copied: usize,
    /// `true` when the checkpoint held a different number of generators.
    pub lossy: bool,
}

impl RandomPool {
    /// Create a pool for `workers` pool threads.
    pub fn new(seed: u64, workers: usize) -> Self {
        let generators = (0..=workers)
            .map(|slot| Mutex::new(seeded(seed, slot)))
            .collect();
        Self { seed, generators }
    }

    /// The seed the pool was created with.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of pool workers (excluding the outside-caller slot).
    pub fn workers(&self) -> usize {
        self.generators.len() - 1
    }

    /// Generator slot for the calling thread.
    ///
    /// Threads of the current rayon pool map to their worker index; any
    /// other thread maps to the trailing outside-caller slot.
    pub fn current_slot(&self) -> usize {
        let outside = self.workers();
        rayon::current_thread_index()
            .filter(|&i| i < outside)
            .unwrap_or(outside)
    }

    /// Lock the calling thread's generator.
    pub fn lock_current(&self) -> MutexGuard<'_, ChaCha8Rng> {
        self.lock(self.current_slot())
    }

    /// Lock the generator in `slot`. Out-of-range slots map to the
    /// outside-caller slot.
    pub fn lock(&self, slot: usize) -> MutexGuard<'_, ChaCha8Rng> {
        let slot = slot.min(self.workers());
        // A poisoned generator is still a valid generator.
        self.generators[slot]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot every generator's state, in slot order.
    pub fn states(&self) -> Vec<ChaCha8Rng> {
        (0..self.generators.len())
            .map(|slot| self.lock(slot).clone())
            .collect()
    }

    /// Overwrite generator states from a snapshot.
    ///
    /// The common prefix of slots is copied; remaining slots keep their
    /// current state. A length mismatch is reported as lossy.
    pub fn restore(&mut self, states: &[ChaCha8Rng]) -> RngRestoreReport {
        let copied = states.len().min(self.generators.len());
        for (slot, state) in states.iter().take(copied).enumerate() {
            let generator = self.generators[slot]
                .get_mut()
                .unwrap_or_else(PoisonError::into_inner);
            *generator = state.clone();
        }
        RngRestoreReport {
            copied,
            lossy: states.len() != self.generators.len(),
        }
    }
}

fn seeded(seed: u64, slot: usize) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(slot as u64);
    rng
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn slots_draw_independent_sequences() {
        let pool = RandomPool::new(42, 2);
        let a: u64 = pool.lock(0).random();
        let b: u64 = pool.lock(1).random();
        assert_ne!(a, b);
    }

    #[test]
    fn same_seed_same_sequence() {
        let p1 = RandomPool::new(7, 3);
        let p2 = RandomPool::new(7, 3);
        for slot in 0..=3 {
            let a: f64 = p1.lock(slot).random();
            let b: f64 = p2.lock(slot).random();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn outside_threads_use_trailing_slot() {
        let pool = RandomPool::new(1, 4);
        assert_eq!(pool.current_slot(), 4);
        assert_eq!(pool.workers(), 4);
    }

    #[test]
    fn restore_copies_common_prefix() {
        let source = RandomPool::new(3, 3);
        let _: u32 = source.lock(0).random();
        let states = source.states();

        let mut target = RandomPool::new(99, 1);
        let report = target.restore(&states);
        assert_eq!(report, RngRestoreReport { copied: 2, lossy: true });
        let a: u64 = target.lock(0).random();
        let b: u64 = source.lock(0).random();
        assert_eq!(a, b);
    }

    #[test]
    fn restore_same_size_is_exact() {
        let source = RandomPool::new(3, 2);
        let mut target = RandomPool::new(4, 2);
        let report = target.restore(&source.states());
        assert!(!report.lossy);
        assert_eq!(target.states(), source.states());
    }
}
