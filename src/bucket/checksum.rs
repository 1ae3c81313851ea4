//! CRC32 checksums for bucket entries
//!
//! Every entry read back from a bucket file is checksum-verified; a
//! mismatch makes the whole bucket corrupt.

use crc32fast::Hasher;

/// CRC32 (IEEE) over `data`
pub fn compute_checksum(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

pub fn verify_checksum(data: &[u8], expected: u32) -> bool {
    compute_checksum(data) == expected
}
