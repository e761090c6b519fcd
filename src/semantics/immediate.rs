use super::fields::opcode;
use crate::opcodes::*;
use crate::utils::{extract_field, interpret_u32_as_signed, sign_extend};

/// Immediate encoding formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImmFormat {
    I,
    S,
    B,
    U,
    J,
    /// R-type and unrecognised opcodes carry no immediate
    None,
}

impl ImmFormat {
    pub fn of(instr: u32) -> Self {
        match opcode(instr) {
            OP_IMM | OP_LOAD | OP_JALR | OP_MISC_MEM | OP_SYSTEM => ImmFormat::I,
            OP_STORE => ImmFormat::S,
            OP_BRANCH => ImmFormat::B,
            OP_LUI | OP_AUIPC => ImmFormat::U,
            OP_JAL => ImmFormat::J,
            _ => ImmFormat::None,
        }
    }
}

pub fn imm_itype(instr: u32) -> i32 {
    interpret_u32_as_signed(sign_extend(extract_field(instr, 31, 20), 11))
}

pub fn imm_stype(instr: u32) -> i32 {
    let imm11_5 = extract_field(instr, 31, 25);
    let imm4_0 = extract_field(instr, 11, 7);
    interpret_u32_as_signed(sign_extend((imm11_5 << 5) | imm4_0, 11))
}

pub fn imm_btype(instr: u32) -> i32 {
    let imm12 = extract_field(instr, 31, 31);
    let imm11 = extract_field(instr, 7, 7);
    let imm10_5 = extract_field(instr, 30, 25);
    let imm4_1 = extract_field(instr, 11, 8);
    let imm = (imm12 << 12) | (imm11 << 11) | (imm10_5 << 5) | (imm4_1 << 1);
    interpret_u32_as_signed(sign_extend(imm, 12))
}

pub fn imm_utype(instr: u32) -> i32 {
    interpret_u32_as_signed(instr & 0xffff_f000)
}

pub fn imm_jtype(instr: u32) -> i32 {
    let imm20 = extract_field(instr, 31, 31);
    let imm19_12 = extract_field(instr, 19, 12);
    let imm11 = extract_field(instr, 20, 20);
    let imm10_1 = extract_field(instr, 30, 21);
    let imm = (imm20 << 20) | (imm19_12 << 12) | (imm11 << 11) | (imm10_1 << 1);
    interpret_u32_as_signed(sign_extend(imm, 20))
}

/// Sign-extended immediate of an instruction, in the format its
/// opcode selects (0 when the opcode has no immediate)
pub fn decode_immediate(instr: u32) -> i32 {
    match ImmFormat::of(instr) {
        ImmFormat::I => imm_itype(instr),
        ImmFormat::S => imm_stype(instr),
        ImmFormat::B => imm_btype(instr),
        ImmFormat::U => imm_utype(instr),
        ImmFormat::J => imm_jtype(instr),
        ImmFormat::None => 0,
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::encode::*;

    #[test]
    fn check_itype_boundaries() {
        assert_eq!(decode_immediate(addi(1, 2, -2048)), -2048);
        assert_eq!(decode_immediate(addi(1, 2, 2047)), 2047);
        assert_eq!(decode_immediate(lw(1, 2, -4)), -4);
        assert_eq!(decode_immediate(jalr(1, 2, 12)), 12);
    }

    #[test]
    fn check_stype_boundaries() {
        assert_eq!(decode_immediate(sw(1, 2, -2048)), -2048);
        assert_eq!(decode_immediate(sb(1, 2, 2047)), 2047);
        assert_eq!(decode_immediate(sh(1, 2, -1)), -1);
    }

    #[test]
    fn check_btype_boundaries() {
        assert_eq!(decode_immediate(beq(1, 2, -4096)), -4096);
        assert_eq!(decode_immediate(bne(1, 2, 4094)), 4094);
        assert_eq!(decode_immediate(bgeu(1, 2, -20)), -20);
    }

    #[test]
    fn check_utype() {
        assert_eq!(decode_immediate(lui(1, 0x80000)), i32::MIN);
        assert_eq!(decode_immediate(auipc(1, 0x12345)), 0x1234_5000);
    }

    #[test]
    fn check_jtype_boundaries() {
        assert_eq!(decode_immediate(jal(1, -1_048_576)), -1_048_576);
        assert_eq!(decode_immediate(jal(1, 1_048_574)), 1_048_574);
        assert_eq!(decode_immediate(jal(0, -20)), -20);
    }

    #[test]
    fn check_rtype_has_no_immediate() {
        assert_eq!(decode_immediate(sub(1, 2, 3)), 0);
    }

    #[test]
    fn random_immediates_survive_encoding() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let mut rng = StdRng::seed_from_u64(12);
        for _ in 0..1000 {
            let i = rng.random_range(-2048..2048);
            assert_eq!(decode_immediate(xori(3, 4, i)), i);
            assert_eq!(decode_immediate(sh(3, 4, i)), i);
            let b = 2 * rng.random_range(-2048..2048);
            assert_eq!(decode_immediate(blt(3, 4, b)), b);
            let j = 2 * rng.random_range(-524_288..524_288);
            assert_eq!(decode_immediate(jal(3, j)), j);
        }
    }
}
