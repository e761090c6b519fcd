//! Bit-level helpers shared by the datapath and the memory models.

use std::ops::{BitAnd, Shl, Shr};

use num::Integer;

/// Make an n_bits-long mask (all ones)
pub fn mask<T>(n_bits: T) -> T
where
    T: Integer + Shl<Output = T>,
{
    (T::one() << n_bits) - T::one()
}

/// Obtain value[end:start] (verilog notation) from value
pub fn extract_field<T>(value: T, end: T, start: T) -> T
where
    T: Copy + Integer + Shl<Output = T> + Shr<Output = T> + BitAnd<Output = T>,
{
    mask(end - start + T::one()) & (value >> start)
}

pub fn interpret_u32_as_signed(value: u32) -> i32 {
    i32::from_ne_bytes(value.to_ne_bytes())
}

pub fn interpret_i32_as_unsigned(value: i32) -> u32 {
    u32::from_ne_bytes(value.to_ne_bytes())
}

/// Copy bit `sign_bit_position` of value into all the higher bits
/// of the u32.
pub fn sign_extend<T: Into<u32>>(value: T, sign_bit_position: u32) -> u32 {
    let value: u32 = value.into();
    if sign_bit_position >= 31 {
        return value;
    }
    let sign_bit = 1 & (value >> sign_bit_position);
    let value = value & mask(sign_bit_position + 1);
    if sign_bit == 1 {
        value | !mask(sign_bit_position + 1)
    } else {
        value
    }
}

/// Expand a 4-bit byte-enable mask into a 32-bit bit mask
/// (bit n of the enable covers bits [8n+7:8n]).
pub fn byte_mask(byte_enable: u8) -> u32 {
    (0..4)
        .filter(|lane| byte_enable & (1 << lane) != 0)
        .fold(0, |acc, lane| acc | (0xff << (8 * lane)))
}

/// Merge the enabled byte lanes of new into old.
pub fn merge_bytes(old: u32, new: u32, byte_enable: u8) -> u32 {
    let bits = byte_mask(byte_enable);
    (old & !bits) | (new & bits)
}
