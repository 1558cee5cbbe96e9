//! Hashing helpers
//!
//! Cardano hashes transaction bodies with Blake2b-256 and identifies
//! verification keys by their Blake2b-224 digest.

use blake2::digest::consts::{U28, U32};
use blake2::{Blake2b, Digest};

type Blake2b256 = Blake2b<U32>;
type Blake2b224 = Blake2b<U28>;

/// Blake2b-256 digest (transaction ids, signing hash)
pub fn blake2b256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Blake2b-224 digest (verification key hashes)
pub fn blake2b224(data: &[u8]) -> [u8; 28] {
    let mut hasher = Blake2b224::new();
    hasher.update(data);
    hasher.finalize().into()
}
