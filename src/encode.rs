//! Instruction encoders used to build program images.
//!
//! Register arguments are register numbers (0..=31). Immediates are
//! truncated to the width of their field, so out-of-range values wrap
//! rather than corrupt neighbouring fields.

use crate::utils::{extract_field, interpret_i32_as_unsigned, mask};

pub use super::opcodes::*;

/// Make an I-type instruction.
pub fn itype(imm: u32, rs1: u32, funct3: u32, rd: u32, opcode: u32) -> u32 {
    (imm & mask(12)) << 20 | (rs1 & 0x1f) << 15 | funct3 << 12 | (rd & 0x1f) << 7 | opcode
}

/// Make an U- or J-type instruction (if you are making
/// a J-type instruction, make sure to construct the
/// immediate field correctly using jtype_imm_field)
pub fn ujtype(imm: u32, rd: u32, opcode: u32) -> u32 {
    (imm & mask(20)) << 12 | (rd & 0x1f) << 7 | opcode
}

/// Make an R- or S-type instruction. The meaning of a and b is:
///
/// R-type: a = funct7, b = rd
/// S-type: a = imm[11:5], b = imm[4:0]
pub fn rstype(a: u32, rs2: u32, rs1: u32, funct3: u32, b: u32, opcode: u32) -> u32 {
    a << 25 | (rs2 & 0x1f) << 20 | (rs1 & 0x1f) << 15 | funct3 << 12 | (b & 0x1f) << 7 | opcode
}

/// The shift-by-immediate instructions use I-type with the
/// shift amount in the lower 5 bits and funct7 in the upper 7 bits
/// of the immediate.
pub fn shifts_imm_field(shamt: u32, upper: u32) -> u32 {
    let shamt = extract_field(shamt, 4, 0);
    (upper << 5) | shamt
}

/// Shuffle a byte offset into the 20-bit field of a J-type
/// instruction
pub fn jtype_imm_field(imm: i32) -> u32 {
    let imm = interpret_i32_as_unsigned(imm);
    let imm20 = extract_field(imm, 20, 20);
    let imm19_12 = extract_field(imm, 19, 12);
    let imm11 = extract_field(imm, 11, 11);
    let imm10_1 = extract_field(imm, 10, 1);
    (imm20 << 19) | (imm10_1 << 9) | (imm11 << 8) | imm19_12
}

/// Returns (a, b) suitable for use with rstype for
/// the conditional branch instructions (btype)
pub fn btype_imm_fields(imm: i32) -> (u32, u32) {
    let imm = interpret_i32_as_unsigned(imm);
    let imm12 = extract_field(imm, 12, 12);
    let imm11 = extract_field(imm, 11, 11);
    let imm10_5 = extract_field(imm, 10, 5);
    let imm4_1 = extract_field(imm, 4, 1);
    let a = (imm12 << 6) | imm10_5;
    let b = (imm4_1 << 1) | imm11;
    (a, b)
}

/// Returns (imm[11:5], imm[4:0]) for an S-type store
pub fn stype_imm_fields(imm: i32) -> (u32, u32) {
    let imm = interpret_i32_as_unsigned(imm);
    (extract_field(imm, 11, 5), extract_field(imm, 4, 0))
}

macro_rules! itype_instr {
    ($instruction:ident, $funct3:expr, $opcode:expr) => {
        #[doc = concat!("Encode `", stringify!($instruction), " rd, rs1, imm`")]
        pub fn $instruction(rd: u32, rs1: u32, imm: i32) -> u32 {
            itype(interpret_i32_as_unsigned(imm), rs1, $funct3, rd, $opcode)
        }
    };
}

macro_rules! shift_instr {
    ($instruction:ident, $upper:expr, $funct3:expr) => {
        #[doc = concat!("Encode `", stringify!($instruction), " rd, rs1, shamt`")]
        pub fn $instruction(rd: u32, rs1: u32, shamt: u32) -> u32 {
            itype(shifts_imm_field(shamt, $upper), rs1, $funct3, rd, OP_IMM)
        }
    };
}

macro_rules! rtype_instr {
    ($instruction:ident, $funct7:expr, $funct3:expr) => {
        #[doc = concat!("Encode `", stringify!($instruction), " rd, rs1, rs2`")]
        pub fn $instruction(rd: u32, rs1: u32, rs2: u32) -> u32 {
            rstype($funct7, rs2, rs1, $funct3, rd, OP)
        }
    };
}

macro_rules! stype_instr {
    ($instruction:ident, $funct3:expr) => {
        #[doc = concat!("Encode `", stringify!($instruction), " rs2, imm(rs1)`")]
        pub fn $instruction(rs2: u32, rs1: u32, imm: i32) -> u32 {
            let (imm11_5, imm4_0) = stype_imm_fields(imm);
            rstype(imm11_5, rs2, rs1, $funct3, imm4_0, OP_STORE)
        }
    };
}

macro_rules! btype_instr {
    ($instruction:ident, $funct3:expr) => {
        #[doc = concat!("Encode `", stringify!($instruction), " rs1, rs2, offset`")]
        pub fn $instruction(rs1: u32, rs2: u32, imm: i32) -> u32 {
            let (a, b) = btype_imm_fields(imm);
            rstype(a, rs2, rs1, $funct3, b, OP_BRANCH)
        }
    };
}

itype_instr!(addi, FUNCT3_ADD, OP_IMM);
itype_instr!(slti, FUNCT3_SLT, OP_IMM);
itype_instr!(sltiu, FUNCT3_SLTU, OP_IMM);
itype_instr!(xori, FUNCT3_XOR, OP_IMM);
itype_instr!(ori, FUNCT3_OR, OP_IMM);
itype_instr!(andi, FUNCT3_AND, OP_IMM);
itype_instr!(lb, FUNCT3_B, OP_LOAD);
itype_instr!(lh, FUNCT3_H, OP_LOAD);
itype_instr!(lw, FUNCT3_W, OP_LOAD);
itype_instr!(lbu, FUNCT3_BU, OP_LOAD);
itype_instr!(lhu, FUNCT3_HU, OP_LOAD);
itype_instr!(jalr, 0b000, OP_JALR);

shift_instr!(slli, 0, FUNCT3_SLL);
shift_instr!(srli, 0, FUNCT3_SRL);
shift_instr!(srai, FUNCT7_SRA, FUNCT3_SRL);

rtype_instr!(add, 0, FUNCT3_ADD);
rtype_instr!(sub, FUNCT7_SUB, FUNCT3_ADD);
rtype_instr!(sll, 0, FUNCT3_SLL);
rtype_instr!(slt, 0, FUNCT3_SLT);
rtype_instr!(sltu, 0, FUNCT3_SLTU);
rtype_instr!(xor, 0, FUNCT3_XOR);
rtype_instr!(srl, 0, FUNCT3_SRL);
rtype_instr!(sra, FUNCT7_SRA, FUNCT3_SRL);
rtype_instr!(or, 0, FUNCT3_OR);
rtype_instr!(and, 0, FUNCT3_AND);

stype_instr!(sb, FUNCT3_B);
stype_instr!(sh, FUNCT3_H);
stype_instr!(sw, FUNCT3_W);

btype_instr!(beq, FUNCT3_BEQ);
btype_instr!(bne, FUNCT3_BNE);
btype_instr!(blt, FUNCT3_BLT);
btype_instr!(bge, FUNCT3_BGE);
btype_instr!(bltu, FUNCT3_BLTU);
btype_instr!(bgeu, FUNCT3_BGEU);

/// Encode `jal rd, offset`
pub fn jal(rd: u32, imm: i32) -> u32 {
    ujtype(jtype_imm_field(imm), rd, OP_JAL)
}

/// Encode `lui rd, imm` where imm is the upper 20 bits of the result
pub fn lui(rd: u32, imm: u32) -> u32 {
    ujtype(imm, rd, OP_LUI)
}

/// Encode `auipc rd, imm` where imm is the upper 20 bits of the offset
pub fn auipc(rd: u32, imm: u32) -> u32 {
    ujtype(imm, rd, OP_AUIPC)
}

pub fn nop() -> u32 {
    addi(0, 0, 0)
}

/// `fence iorw, iorw`
pub fn fence() -> u32 {
    itype(0b0000_1111_1111, 0, FUNCT3_FENCE, 0, OP_MISC_MEM)
}

pub fn ecall() -> u32 {
    itype(0, 0, FUNCT3_PRIV, 0, OP_SYSTEM)
}
