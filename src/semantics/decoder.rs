use super::alu::AluOp;
use super::alu_control::{decode_alu_op, AluOpClass};
use super::fields::{bit30, funct3, opcode};
use crate::opcodes::*;

/// First ALU operand
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum AluSrcA {
    #[default]
    Rs1,
    Pc,
    Zero,
}

/// Second ALU operand
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum AluSrcB {
    #[default]
    Rs2,
    Imm,
}

/// Source of the register write-back value when the instruction is
/// not a load
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum WriteDataSrc {
    #[default]
    AluResult,
    PcPlus4,
}

/// Output of the main decoder. The default value is the all-zero
/// no-op tuple.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ControlFields {
    pub reg_write: bool,
    pub alu_src_a: AluSrcA,
    pub alu_src_b: AluSrcB,
    pub mem_to_reg: bool,
    pub mem_write: bool,
    pub write_data_src: WriteDataSrc,
    pub branch: bool,
    pub jump: bool,
    pub alu_op: AluOpClass,
}

/// Map an opcode to its control fields. FENCE, SYSTEM and anything
/// unrecognised decode to the no-op tuple.
pub fn decode(opcode: u32) -> ControlFields {
    let writes = ControlFields {
        reg_write: true,
        ..Default::default()
    };
    match opcode {
        OP => ControlFields {
            alu_op: AluOpClass::Register,
            ..writes
        },
        OP_IMM => ControlFields {
            alu_src_b: AluSrcB::Imm,
            alu_op: AluOpClass::Immediate,
            ..writes
        },
        OP_LOAD => ControlFields {
            alu_src_b: AluSrcB::Imm,
            mem_to_reg: true,
            ..writes
        },
        OP_STORE => ControlFields {
            alu_src_b: AluSrcB::Imm,
            mem_write: true,
            ..Default::default()
        },
        OP_BRANCH => ControlFields {
            branch: true,
            alu_op: AluOpClass::Branch,
            ..Default::default()
        },
        OP_JAL => ControlFields {
            write_data_src: WriteDataSrc::PcPlus4,
            jump: true,
            ..writes
        },
        OP_JALR => ControlFields {
            alu_src_b: AluSrcB::Imm,
            write_data_src: WriteDataSrc::PcPlus4,
            jump: true,
            ..writes
        },
        OP_LUI => ControlFields {
            alu_src_a: AluSrcA::Zero,
            alu_src_b: AluSrcB::Imm,
            ..writes
        },
        OP_AUIPC => ControlFields {
            alu_src_a: AluSrcA::Pc,
            alu_src_b: AluSrcB::Imm,
            ..writes
        },
        _ => ControlFields::default(),
    }
}

/// The full decoded control word of one instruction: main decoder
/// fields plus the ALU operation they select.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ControlWord {
    pub fields: ControlFields,
    pub alu_control: AluOp,
}

impl ControlWord {
    pub fn decode(instr: u32) -> Self {
        let fields = decode(opcode(instr));
        let alu_control = decode_alu_op(fields.alu_op, funct3(instr), bit30(instr));
        Self {
            fields,
            alu_control,
        }
    }

    /// True for instructions that need a data-bus transaction
    pub fn accesses_memory(&self) -> bool {
        self.fields.mem_to_reg || self.fields.mem_write
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::encode;

    #[test]
    fn check_rtype_control() {
        let c = decode(OP);
        assert!(c.reg_write);
        assert_eq!(c.alu_src_b, AluSrcB::Rs2);
        assert_eq!(c.alu_op, AluOpClass::Register);
        assert!(!c.mem_write && !c.branch && !c.jump);
    }

    #[test]
    fn check_memory_control() {
        let load = decode(OP_LOAD);
        assert!(load.reg_write && load.mem_to_reg && !load.mem_write);
        assert_eq!(load.alu_src_b, AluSrcB::Imm);
        let store = decode(OP_STORE);
        assert!(!store.reg_write && store.mem_write && !store.mem_to_reg);
        assert_eq!(store.alu_op, AluOpClass::LoadStore);
    }

    #[test]
    fn check_jump_and_upper_control() {
        let jal = decode(OP_JAL);
        assert!(jal.jump && jal.reg_write);
        assert_eq!(jal.alu_src_b, AluSrcB::Rs2);
        assert_eq!(jal.write_data_src, WriteDataSrc::PcPlus4);
        let jalr = decode(OP_JALR);
        assert_eq!(jalr.alu_src_b, AluSrcB::Imm);
        assert_eq!(decode(OP_LUI).alu_src_a, AluSrcA::Zero);
        assert_eq!(decode(OP_AUIPC).alu_src_a, AluSrcA::Pc);
        let branch = decode(OP_BRANCH);
        assert!(branch.branch && !branch.reg_write);
        assert_eq!(branch.alu_op, AluOpClass::Branch);
    }

    #[test]
    fn check_unrecognised_opcodes_are_noops() {
        assert_eq!(decode(OP_MISC_MEM), ControlFields::default());
        assert_eq!(decode(OP_SYSTEM), ControlFields::default());
        assert_eq!(decode(0), ControlFields::default());
        assert_eq!(decode(0b1111111), ControlFields::default());
    }

    #[test]
    fn check_control_word() {
        let word = ControlWord::decode(encode::sub(1, 2, 3));
        assert_eq!(word.alu_control, AluOp::Sub);
        let word = ControlWord::decode(encode::srai(1, 2, 3));
        assert_eq!(word.alu_control, AluOp::Sra);
        let word = ControlWord::decode(encode::bltu(1, 2, 8));
        assert_eq!(word.alu_control, AluOp::Sltu);
        assert!(!word.accesses_memory());
        assert!(ControlWord::decode(encode::lbu(1, 2, 0)).accesses_memory());
        assert_eq!(ControlWord::decode(encode::ecall()), ControlWord::default());
    }
}
