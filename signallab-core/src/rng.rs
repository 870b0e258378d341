//! Seeded random streams.
//!
//! Each consumer of randomness names a stream. The stream's RNG is seeded
//! from BLAKE3(seed, name), so a given seed reproduces the same draws on
//! every run and platform, and adding a stream never perturbs another.

use rand::rngs::StdRng;
use rand::SeedableRng;

/// Stream used by the regression train/test split.
pub const SPLIT_STREAM: &str = "train_test_split";

/// Sub-seed for `stream` under a user seed.
pub fn stream_seed(seed: u64, stream: &str) -> u64 {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&seed.to_le_bytes());
    hasher.update(stream.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hasher.finalize().as_bytes()[..8]);
    u64::from_le_bytes(bytes)
}

pub fn stream_rng(seed: u64, stream: &str) -> StdRng {
    StdRng::seed_from_u64(stream_seed(seed, stream))
}
