use crate::utils::{interpret_i32_as_unsigned, interpret_u32_as_signed};

/// ALU operation, with the 4-bit control code the hardware uses
/// ({funct7 bit 5, funct3} for the register-register forms)
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AluOp {
    #[default]
    Add,
    Sub,
    Sll,
    Slt,
    Sltu,
    Xor,
    Srl,
    Sra,
    Or,
    And,
}

impl AluOp {
    pub const ALL: [AluOp; 10] = [
        AluOp::Add,
        AluOp::Sub,
        AluOp::Sll,
        AluOp::Slt,
        AluOp::Sltu,
        AluOp::Xor,
        AluOp::Srl,
        AluOp::Sra,
        AluOp::Or,
        AluOp::And,
    ];

    pub fn code(self) -> u8 {
        match self {
            AluOp::Add => 0b0000,
            AluOp::Sub => 0b1000,
            AluOp::Sll => 0b0001,
            AluOp::Slt => 0b0010,
            AluOp::Sltu => 0b0011,
            AluOp::Xor => 0b0100,
            AluOp::Srl => 0b0101,
            AluOp::Sra => 0b1101,
            AluOp::Or => 0b0110,
            AluOp::And => 0b0111,
        }
    }

    /// Returns None for the six unassigned control codes
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.code() == code)
    }
}

/// Compute op(a, b), returning the result and whether it is zero
pub fn alu(op: AluOp, a: u32, b: u32) -> (u32, bool) {
    let shamt = b & 0x1f;
    let result = match op {
        AluOp::Add => a.wrapping_add(b),
        AluOp::Sub => a.wrapping_sub(b),
        AluOp::Sll => a << shamt,
        AluOp::Slt => u32::from(interpret_u32_as_signed(a) < interpret_u32_as_signed(b)),
        AluOp::Sltu => u32::from(a < b),
        AluOp::Xor => a ^ b,
        AluOp::Srl => a >> shamt,
        AluOp::Sra => interpret_i32_as_unsigned(interpret_u32_as_signed(a) >> shamt),
        AluOp::Or => a | b,
        AluOp::And => a & b,
    };
    (result, result == 0)
}

#[cfg(test)]
mod tests {

    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn check_subtract_to_zero() {
        assert_eq!(alu(AluOp::Sub, 10, 10), (0, true));
        assert_eq!(alu(AluOp::Sub, 0, 1), (0xffff_ffff, false));
    }

    #[test]
    fn check_signed_and_unsigned_compare() {
        assert_eq!(alu(AluOp::Slt, 0xffff_ffff, 1), (1, false));
        assert_eq!(alu(AluOp::Sltu, 0xffff_ffff, 1), (0, true));
        assert_eq!(alu(AluOp::Slt, 5, 5), (0, true));
    }

    #[test]
    fn check_shifts_use_low_five_bits() {
        assert_eq!(alu(AluOp::Sll, 1, 33).0, 2);
        assert_eq!(alu(AluOp::Srl, 0x8000_0000, 31).0, 1);
        assert_eq!(alu(AluOp::Sra, 0x8000_0000, 31).0, 0xffff_ffff);
        assert_eq!(alu(AluOp::Sra, 0x4000_0000, 0x41f).0, 0);
    }

    #[test]
    fn check_control_codes() {
        assert_eq!(AluOp::from_code(0b1101), Some(AluOp::Sra));
        assert_eq!(AluOp::from_code(0b1000), Some(AluOp::Sub));
        assert_eq!(AluOp::from_code(0b1111), None);
        for op in AluOp::ALL {
            assert_eq!(AluOp::from_code(op.code()), Some(op));
        }
    }

    #[test]
    fn random_operands_match_reference_arithmetic() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..2000 {
            let a: u32 = rng.random();
            let b: u32 = rng.random();
            let (sa, sb) = (a as i32, b as i32);
            let expected = [
                (AluOp::Add, a.wrapping_add(b)),
                (AluOp::Sub, a.wrapping_sub(b)),
                (AluOp::Sll, a.wrapping_shl(b)),
                (AluOp::Slt, (sa < sb) as u32),
                (AluOp::Sltu, (a < b) as u32),
                (AluOp::Xor, a ^ b),
                (AluOp::Srl, a.wrapping_shr(b)),
                (AluOp::Sra, sa.wrapping_shr(b) as u32),
                (AluOp::Or, a | b),
                (AluOp::And, a & b),
            ];
            for (op, want) in expected {
                assert_eq!(alu(op, a, b), (want, want == 0), "{op:?} {a:#x} {b:#x}");
            }
        }
    }
}
