//! Deterministic per-instance random streams.
//!
//! Derivation order decides the output, so plants generated concurrently must
//! never share a generator. Each instance gets its own ChaCha stream derived
//! from the species seed and the instance number.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// SplitMix64 finalizer. Fixed arithmetic, so seeds reproduce across
/// toolchains and platforms.
fn splitmix64(x: u64) -> u64 {
    let mut z = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Derive a u64 seed for one plant instance from a species seed.
pub fn derive_instance_seed(species_seed: u64, instance: u64) -> u64 {
    splitmix64(species_seed ^ splitmix64(instance))
}

/// Deterministic RNG for a single plant instance.
pub fn instance_rng(species_seed: u64, instance: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(derive_instance_seed(species_seed, instance))
}
