//! Deterministic fingerprints for terms and document keys

use std::io::Cursor;

/// Fixed seed shared by every build and every reader
pub const FINGERPRINT_SEED: u32 = 19861202;

/// 64-bit fingerprint of raw bytes.
///
/// Low half of MurmurHash3 x64/128 with a fixed seed, so the value is
/// stable across runs and processes.
pub fn fingerprint(bytes: &[u8]) -> u64 {
    // Reading from an in-memory cursor cannot fail.
    murmur3::murmur3_x64_128(&mut Cursor::new(bytes), FINGERPRINT_SEED)
        .map(|hash| hash as u64)
        .unwrap_or(0)
}

/// Global identifier for a document key from the source
pub fn global_doc_id(key: &str) -> u64 {
    fingerprint(key.as_bytes())
}
