//! The bucket-assignment hash.
//!
//! `h(k) = Σ k[i]·i mod 2^32`, then reduced mod the bucket count. This is a weak hash — a linear
//! combination of byte values and their indices — but it is preserved exactly for bit-compatible
//! bucket assignment: changing it would relocate every existing key's chain and break
//! open-after-create across versions.

/// Computes the bucket-assignment hash of `key` modulo `hash_buckets`.
///
/// `hash_buckets` must be at least 1; a configuration requesting zero buckets is normalized to a
/// single chain-only bucket by the caller (see [`crate::db::Db`]) before it ever reaches here.
pub fn bucket_of(key: &[u8], hash_buckets: u32) -> usize {
    debug_assert!(hash_buckets > 0);
    let mut sum: u32 = 0;
    for (i, &byte) in key.iter().enumerate() {
        sum = sum.wrapping_add((byte as u32).wrapping_mul(i as u32));
    }
    (sum % hash_buckets) as usize
}
