//! Double-hashing Bloom filter encoder.
//!
//! Every shingle is hashed once with SHA-256 over
//! `salt \0 label \0 token` (the salt segment is omitted when unset); the
//! first sixteen digest bytes provide two independent little-endian 64-bit
//! values `h1` and `h2`, and position `i` of `k` is `(h1 + i * h2) mod m`.
//! Double hashing yields `k` effectively independent positions from a
//! single digest, and the nil separators keep label, token, and salt from
//! bleeding into one another.

use sha2::{Digest, Sha256};

use features::Shingle;

/// Two independent 64-bit digests for one shingle.
pub fn shingle_digests(shingle: &Shingle, salt: Option<&str>) -> (u64, u64) {
    let mut hasher = Sha256::new();
    if let Some(salt) = salt {
        hasher.update(salt.as_bytes());
        hasher.update([0u8]);
    }
    hasher.update(shingle.label.as_bytes());
    hasher.update([0u8]);
    hasher.update(shingle.token.as_bytes());
    let digest = hasher.finalize();

    let mut h1 = [0u8; 8];
    let mut h2 = [0u8; 8];
    h1.copy_from_slice(&digest[0..8]);
    h2.copy_from_slice(&digest[8..16]);
    (u64::from_le_bytes(h1), u64::from_le_bytes(h2))
}

/// Bit positions set by one shingle: `(h1 + i * h2) mod m` for `i in 0..k`.
pub fn shingle_positions(shingle: &Shingle, salt: Option<&str>, m: usize, k: u32) -> Vec<u32> {
    let (h1, h2) = shingle_digests(shingle, salt);
    (0..k as u64)
        .map(|i| (h1.wrapping_add(i.wrapping_mul(h2)) % m as u64) as u32)
        .collect()
}

/// Encode a whole feature bag into its sorted, deduplicated index set.
pub fn bag_indices(bag: &[Shingle], salt: Option<&str>, m: usize, k: u32) -> Vec<u32> {
    let mut indices: Vec<u32> = bag
        .iter()
        .flat_map(|shingle| shingle_positions(shingle, salt, m, k))
        .collect();
    indices.sort_unstable();
    indices.dedup();
    indices
}
