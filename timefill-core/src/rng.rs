//! Random number generator construction for weekly plans.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Generator for one run: reproducible when `seed` is given, entropy-seeded otherwise.
#[must_use]
pub fn plan_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    }
}
