//! Instruction semantics core: the pure, combinational part of the
//! datapath. Nothing in here holds state; every function is a function
//! of an instruction word and (for the ALU) two operands.

pub mod alu;
pub mod alu_control;
pub mod branch;
pub mod decoder;
pub mod fields;
pub mod immediate;

pub use alu::{alu, AluOp};
pub use alu_control::{decode_alu_op, AluOpClass};
pub use branch::branch_taken;
pub use decoder::{decode, AluSrcA, AluSrcB, ControlFields, ControlWord, WriteDataSrc};
pub use immediate::decode_immediate;
