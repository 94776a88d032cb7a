//! Randomness, encapsulated. Every sampling call in this crate takes its
//! `Rng` as an explicit parameter — global `thread_rng()` would make
//! weighted selection unreproducible in tests and unseedable for replay.
use rand::rngs::StdRng;
use rand::SeedableRng;

/// A reproducible RNG seeded from a fixed value. Tests and any caller
/// that wants deterministic answer selection use this.
pub fn seeded(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// A process-entropy RNG for production answer selection.
pub fn from_entropy() -> StdRng {
    StdRng::from_entropy()
}
