//! The two 16-bit fingerprints of the record format
//!
//! Both functions are part of the on-media format: changing either of them
//! makes every record written by an older firmware unreadable.

/// The seed of [hash_str]
pub const IDENTITY_SEED: u16 = 0x5A5A;
/// The seed of [checksum]
pub const CHECKSUM_SEED: u16 = 0xA5A5;

/// Folds `value` into `hash`
pub const fn hash_combine(hash: u16, value: u16) -> u16 {
    hash ^ value
        .wrapping_add(0x9E37)
        .wrapping_add(hash << 6)
        .wrapping_add(hash >> 2)
}

/// Hashes the bytes of `name` one by one, starting from [IDENTITY_SEED]
pub const fn hash_str(name: &str) -> u16 {
    let bytes = name.as_bytes();
    let mut hash = IDENTITY_SEED;
    let mut index = 0;
    while index < bytes.len() {
        hash = hash_combine(hash, bytes[index] as u16);
        index += 1;
    }
    hash
}

/// The identity tag of a variable called `name` holding a value of `size` bytes.
///
/// Only the low 16 bits of `size` take part in the tag.
pub const fn identity_tag(name: &str, size: usize) -> u16 {
    hash_combine(hash_str(name), size as u16)
}

/// The checksum stored behind the payload of a record
pub fn checksum(payload: &[u8]) -> u16 {
    payload.iter().fold(CHECKSUM_SEED, |sum, &byte| {
        let sum = sum.wrapping_add(byte as u16);
        sum ^ (sum >> 8)
    })
}
