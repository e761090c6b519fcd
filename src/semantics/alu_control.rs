use super::alu::AluOp;
use crate::opcodes::*;

/// The 2-bit operation class the main decoder hands to ALU control
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum AluOpClass {
    /// Address calculation for loads, stores, jumps and upper immediates
    #[default]
    LoadStore,
    Branch,
    Register,
    Immediate,
}

impl AluOpClass {
    pub fn bits(self) -> u8 {
        match self {
            AluOpClass::LoadStore => 0b00,
            AluOpClass::Branch => 0b01,
            AluOpClass::Register => 0b10,
            AluOpClass::Immediate => 0b11,
        }
    }

    pub fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0b00 => AluOpClass::LoadStore,
            0b01 => AluOpClass::Branch,
            0b10 => AluOpClass::Register,
            _ => AluOpClass::Immediate,
        }
    }
}

/// Select the ALU operation from the operation class, funct3 and
/// instruction bit 30.
///
/// Branches compare with SUB (BEQ/BNE) or SLT/SLTU (the ordered
/// comparisons) so that the branch unit only has to look at the
/// zero flag. The two funct3 values with no branch assigned fall back
/// to ADD.
pub fn decode_alu_op(class: AluOpClass, funct3: u32, bit30: bool) -> AluOp {
    match class {
        AluOpClass::LoadStore => AluOp::Add,
        AluOpClass::Branch => match funct3 {
            FUNCT3_BEQ | FUNCT3_BNE => AluOp::Sub,
            FUNCT3_BLT | FUNCT3_BGE => AluOp::Slt,
            FUNCT3_BLTU | FUNCT3_BGEU => AluOp::Sltu,
            _ => AluOp::Add,
        },
        AluOpClass::Register | AluOpClass::Immediate => match funct3 & 0b111 {
            FUNCT3_ADD if bit30 && class == AluOpClass::Register => AluOp::Sub,
            FUNCT3_ADD => AluOp::Add,
            FUNCT3_SLL => AluOp::Sll,
            FUNCT3_SLT => AluOp::Slt,
            FUNCT3_SLTU => AluOp::Sltu,
            FUNCT3_XOR => AluOp::Xor,
            FUNCT3_SRL if bit30 => AluOp::Sra,
            FUNCT3_SRL => AluOp::Srl,
            FUNCT3_OR => AluOp::Or,
            _ => AluOp::And,
        },
    }
}
