//! CRC-32 (IEEE 802.3 polynomial) used for frame integrity checks.
//!
//! Every call hashes its input from a fresh state. The prelude CRC and the
//! message CRC are two independent computations over overlapping ranges.

/// Compute the CRC-32 of `bytes`.
#[inline]
pub fn crc32(bytes: &[u8]) -> u32 {
    crc32fast::hash(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_value() {
        // Standard CRC-32 check value.
        assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(crc32(&[]), 0);
    }

    #[test]
    fn test_independent_equals_chained() {
        let data = b"prelude-bytes+headers+payload";
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&data[..8]);
        hasher.update(&data[8..]);
        assert_eq!(hasher.finalize(), crc32(data));
    }
}
