//! Randomness adapter.
//!
//! The engines never own a random source; they take any `CryptoRng + Rng`
//! so the caller injects it. The `CryptoRng` bound is load-bearing: a
//! guessable source makes the first share component guessable and with it
//! the secret.

use rand::{CryptoRng, Rng};

/// Draw one uniform 64-bit word. The primitive draw; the bit and masked
/// draws below are carved from it.
pub fn gen_word<RNG: CryptoRng + Rng>(rng: &mut RNG) -> u64 {
    rng.gen::<u64>()
}

/// Draw a single uniform bit, stored in the low bit of a u32 cell.
pub fn gen_bit<RNG: CryptoRng + Rng>(rng: &mut RNG) -> u32 {
    (gen_word(rng) & 1) as u32
}

/// Draw a value uniform over the low bits selected by `mask`.
///
/// `mask` must be of the form 2^k - 1 with k <= 32; the result is the low
/// k bits of a fresh word, so it is exactly uniform over [0, 2^k).
pub fn gen_masked<RNG: CryptoRng + Rng>(rng: &mut RNG, mask: u64) -> u32 {
    (gen_word(rng) & mask) as u32
}
