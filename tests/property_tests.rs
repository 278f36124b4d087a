//! Property-based tests
//!
//! Randomized inputs across the supported width range: whatever the packer
//! emits must unpack to the original bytes, unpacking must never panic on
//! arbitrary input, and packing must be deterministic.

use lzwpack::{pack_bytes, unpack_bytes, MaxBits};
use proptest::prelude::*;

proptest! {
    #[test]
    fn test_round_trip_random_data(
        data in prop::collection::vec(any::<u8>(), 0..4000),
        bits in 9u8..=15,
    ) {
        let packed = pack_bytes(&data, MaxBits::for_pack(bits).unwrap()).unwrap();
        let unpacked = unpack_bytes(&packed).unwrap();
        prop_assert_eq!(unpacked, data);
    }
}

proptest! {
    #[test]
    fn test_round_trip_repetitive_data(
        pattern in prop::collection::vec(any::<u8>(), 1..24),
        repeats in 2usize..400,
        bits in 9u8..=15,
    ) {
        let mut data = Vec::with_capacity(pattern.len() * repeats);
        for _ in 0..repeats {
            data.extend_from_slice(&pattern);
        }
        let packed = pack_bytes(&data, MaxBits::for_pack(bits).unwrap()).unwrap();
        let unpacked = unpack_bytes(&packed).unwrap();
        prop_assert_eq!(unpacked, data);
    }
}

proptest! {
    #[test]
    fn test_unpacking_never_panics(data in prop::collection::vec(any::<u8>(), 0..600)) {
        // Arbitrary bytes are not a valid container; the decoder must
        // reject them with an error, not a panic.
        let _ = unpack_bytes(&data);
    }
}

proptest! {
    #[test]
    fn test_packing_is_deterministic(
        data in prop::collection::vec(any::<u8>(), 0..2000),
    ) {
        let a = pack_bytes(&data, MaxBits::DEFAULT).unwrap();
        let b = pack_bytes(&data, MaxBits::DEFAULT).unwrap();
        prop_assert_eq!(a, b);
    }
}

proptest! {
    #[test]
    fn test_narrow_width_resets_round_trip(
        data in prop::collection::vec(any::<u8>(), 2000..6000),
    ) {
        // 9-bit streams exhaust their 254-entry code space constantly, so
        // this exercises the reset path on every run.
        let packed = pack_bytes(&data, MaxBits::for_pack(9).unwrap()).unwrap();
        let unpacked = unpack_bytes(&packed).unwrap();
        prop_assert_eq!(unpacked, data);
    }
}
