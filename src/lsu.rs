//! Load/store formatting between register values and 32-bit bus words.
//!
//! Stores produce a byte-enable mask plus write data already shifted
//! into the addressed lanes; the memory merges the enabled bytes. The
//! unit never sees the old memory contents.

use crate::opcodes::*;
use crate::utils::{extract_field, interpret_u32_as_signed, sign_extend};

/// Access width and signedness, as carried in funct3 of loads and
/// stores
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessWidth {
    Byte,
    ByteUnsigned,
    Half,
    HalfUnsigned,
    Word,
}

impl AccessWidth {
    /// Returns None for the funct3 values RV32I leaves unassigned
    pub fn from_funct3(funct3: u32) -> Option<Self> {
        match funct3 {
            FUNCT3_B => Some(AccessWidth::Byte),
            FUNCT3_H => Some(AccessWidth::Half),
            FUNCT3_W => Some(AccessWidth::Word),
            FUNCT3_BU => Some(AccessWidth::ByteUnsigned),
            FUNCT3_HU => Some(AccessWidth::HalfUnsigned),
            _ => None,
        }
    }
}

/// Extract and extend the addressed lane of a raw memory word
pub fn format_load(raw_word: u32, addr_low2: u32, width: AccessWidth) -> i32 {
    let byte_shift = 8 * (addr_low2 & 0b11);
    let half_shift = 16 * extract_field(addr_low2, 1, 1);
    let value = match width {
        AccessWidth::Byte => sign_extend((raw_word >> byte_shift) & 0xff, 7),
        AccessWidth::ByteUnsigned => (raw_word >> byte_shift) & 0xff,
        AccessWidth::Half => sign_extend((raw_word >> half_shift) & 0xffff, 15),
        AccessWidth::HalfUnsigned => (raw_word >> half_shift) & 0xffff,
        AccessWidth::Word => raw_word,
    };
    interpret_u32_as_signed(value)
}

/// Byte-enable mask and lane-shifted data for a store. The signedness
/// of the width does not matter for stores.
pub fn format_store(write_word: u32, addr_low2: u32, width: AccessWidth) -> (u8, u32) {
    match width {
        AccessWidth::Word => (0b1111, write_word),
        AccessWidth::Half | AccessWidth::HalfUnsigned => {
            if extract_field(addr_low2, 1, 1) == 0 {
                (0b0011, write_word & 0xffff)
            } else {
                (0b1100, (write_word & 0xffff) << 16)
            }
        }
        AccessWidth::Byte | AccessWidth::ByteUnsigned => {
            let lane = addr_low2 & 0b11;
            (1 << lane, (write_word & 0xff) << (8 * lane))
        }
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::utils::merge_bytes;

    const TEST_DATA: u32 = 0x1122_aa80;

    fn load_funct3(raw_word: u32, addr_low2: u32, funct3: u32) -> i32 {
        format_load(raw_word, addr_low2, AccessWidth::from_funct3(funct3).unwrap())
    }

    #[test]
    fn check_byte_loads() {
        assert_eq!(load_funct3(TEST_DATA, 0b00, FUNCT3_B), -128);
        assert_eq!(load_funct3(TEST_DATA, 0b01, FUNCT3_B), -86);
        assert_eq!(load_funct3(TEST_DATA, 0b10, FUNCT3_B), 34);
        assert_eq!(load_funct3(TEST_DATA, 0b00, FUNCT3_BU), 128);
        assert_eq!(load_funct3(0x89ab_cdef, 0b11, FUNCT3_B) as u32, 0xffff_ff89);
        assert_eq!(load_funct3(0x89ab_cdef, 0b11, FUNCT3_BU), 0x89);
    }

    #[test]
    fn check_half_loads() {
        assert_eq!(load_funct3(TEST_DATA, 0b00, FUNCT3_H), -21888);
        assert_eq!(load_funct3(TEST_DATA, 0b10, FUNCT3_H), 4386);
        assert_eq!(load_funct3(TEST_DATA, 0b00, FUNCT3_HU), 43648);
        assert_eq!(load_funct3(0x89ab_cdef, 0b10, FUNCT3_H) as u32, 0xffff_89ab);
        // Only bit 1 of the address picks the half
        assert_eq!(load_funct3(0x89ab_cdef, 0b11, FUNCT3_HU), 0x89ab);
    }

    #[test]
    fn check_word_load_ignores_low_bits() {
        assert_eq!(load_funct3(0x89ab_cdef, 0b11, FUNCT3_W) as u32, 0x89ab_cdef);
    }

    #[test]
    fn check_unassigned_widths() {
        assert_eq!(AccessWidth::from_funct3(0b011), None);
        assert_eq!(AccessWidth::from_funct3(0b110), None);
        assert_eq!(AccessWidth::from_funct3(0b111), None);
    }

    #[test]
    fn check_store_lanes() {
        let word = 0x1122_3344;
        assert_eq!(format_store(word, 0b00, AccessWidth::Word), (0b1111, word));
        assert_eq!(format_store(word, 0b00, AccessWidth::Half), (0b0011, 0x3344));
        assert_eq!(format_store(word, 0b10, AccessWidth::Half), (0b1100, 0x3344_0000));
        assert_eq!(format_store(word, 0b00, AccessWidth::Byte), (0b0001, 0x44));
        assert_eq!(format_store(word, 0b01, AccessWidth::Byte), (0b0010, 0x4400));
        assert_eq!(format_store(word, 0b11, AccessWidth::Byte), (0b1000, 0x4400_0000));
    }

    #[test]
    fn check_store_merge_against_reference() {
        let mem = 0xaaaa_aaaa;
        let (be, data) = format_store(0x1234_5678, 0b00, AccessWidth::Half);
        assert_eq!(merge_bytes(mem, data, be), 0xaaaa_5678);
        let (be, data) = format_store(0x1234_5678, 0b01, AccessWidth::Byte);
        assert_eq!(merge_bytes(mem, data, be), 0xaaaa_78aa);
        let (be, data) = format_store(0x1122_3344, 0b10, AccessWidth::Half);
        assert_eq!(merge_bytes(mem, data, be), 0x3344_aaaa);
    }

    #[test]
    fn random_store_then_load_recovers_value() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let widths = [
            (AccessWidth::Byte, 0xff, 7),
            (AccessWidth::ByteUnsigned, 0xff, 32),
            (AccessWidth::Half, 0xffff, 15),
            (AccessWidth::HalfUnsigned, 0xffff, 32),
            (AccessWidth::Word, 0xffff_ffff, 32),
        ];
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let mem: u32 = rng.random();
            let value: u32 = rng.random();
            let addr_low2 = rng.random_range(0..4);
            for (width, lane_mask, sign_bit) in widths {
                let (be, data) = format_store(value, addr_low2, width);
                let merged = merge_bytes(mem, data, be);
                let expected = if sign_bit < 32 {
                    sign_extend(value & lane_mask, sign_bit)
                } else {
                    value & lane_mask
                };
                assert_eq!(format_load(merged, addr_low2, width) as u32, expected);
            }
        }
    }
}
