//! FNV-1a/32 checksum over payload bytes (`spec.md` §6, §9 Open Questions).
//!
//! The teacher's method-id hash (`conformance::protocol::compute_method_id`)
//! is FNV-1a/64 folded to 32 bits; this wire checksum uses the canonical
//! 32-bit FNV-1a constants directly, since the two hashes serve different
//! purposes and are never compared against each other.

const FNV_OFFSET_BASIS: u32 = 0x811C_9DC5;
const FNV_PRIME: u32 = 0x0100_0193;

/// Computes the FNV-1a/32 checksum over `payload`. Metadata is not covered.
pub fn checksum(payload: &[u8]) -> u32 {
    let mut hash = FNV_OFFSET_BASIS;
    for &byte in payload {
        hash ^= byte as u32;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_payload_is_the_offset_basis() {
        assert_eq!(checksum(&[]), FNV_OFFSET_BASIS);
    }

    #[test]
    fn single_bit_flip_changes_the_checksum() {
        let a = checksum(b"libpolycall");
        let mut tampered = *b"libpolycall";
        tampered[0] ^= 0x01;
        let b = checksum(&tampered);
        assert_ne!(a, b);
    }
}
