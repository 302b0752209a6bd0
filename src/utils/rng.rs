use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

/// Deterministic RNG for one independent stream derived from a master seed.
pub fn stream_rng(master: u64, stream: usize) -> ChaCha20Rng {
    let mut x = master ^ ((stream as u64).wrapping_mul(0x9E3779B97F4A7C15));
    x = (x ^ (x >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94D049BB133111EB);
    x ^= x >> 31;
    ChaCha20Rng::seed_from_u64(x)
}

/// Seeded when a seed is given, otherwise drawn from OS entropy.
pub fn run_rng(seed: Option<u64>) -> ChaCha20Rng {
    match seed {
        Some(s) => stream_rng(s, 0),
        None => ChaCha20Rng::from_entropy(),
    }
}
