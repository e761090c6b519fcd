use crate::opcodes::*;

/// Decide whether a conditional branch is taken from the ALU zero
/// flag. Relies on ALU control having selected SUB for BEQ/BNE and
/// SLT/SLTU for the ordered comparisons.
pub fn branch_taken(branch_enable: bool, funct3: u32, alu_zero: bool) -> bool {
    if !branch_enable {
        return false;
    }
    match funct3 {
        FUNCT3_BEQ | FUNCT3_BGE | FUNCT3_BGEU => alu_zero,
        FUNCT3_BNE | FUNCT3_BLT | FUNCT3_BLTU => !alu_zero,
        _ => false,
    }
}
