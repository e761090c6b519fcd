use std::fmt;

use tracing::trace;

use crate::bus::{BusRequest, BusResponse};
use crate::lsu::{format_load, format_store, AccessWidth};
use crate::opcodes::OP_JALR;
use crate::register_file::RegisterFile;
use crate::semantics::fields::{funct3, opcode, rd, rs1, rs2};
use crate::semantics::{
    alu, branch_taken, decode_immediate, AluSrcA, AluSrcB, ControlWord, WriteDataSrc,
};
use crate::utils::interpret_i32_as_unsigned;

/// A data-bus access waiting to complete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryAccess {
    pub request: BusRequest,
    /// Destination register and width for loads
    pub load: Option<(u8, Option<AccessWidth>)>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Instruction port request at the PC
    #[default]
    Fetch,
    /// Instruction register holds the fetched word
    Execute(u32),
    Memory(MemoryAccess),
}

/// Multi-cycle RV32I hardware thread.
///
/// Each instruction takes a fetch stage (request on the instruction
/// port until the word arrives), an execute stage (decode, register
/// read, ALU, branch resolution and write-back of non-memory results)
/// and, for loads and stores, a memory stage on the data port. The
/// data port is bus master 0.
///
/// FENCE, ECALL/EBREAK and any opcode the decoder does not recognise
/// retire as no-ops. There are no traps.
#[derive(Debug, Default)]
pub struct Hart {
    pc: u32,
    registers: RegisterFile,
    stage: Stage,
    retired: u64,
}

impl Hart {
    pub fn new(boot_pc: u32) -> Self {
        Self {
            pc: boot_pc,
            ..Default::default()
        }
    }

    pub fn pc(&self) -> u32 {
        self.pc
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn registers(&self) -> &RegisterFile {
        &self.registers
    }

    /// Number of instructions completed
    pub fn retired(&self) -> u64 {
        self.retired
    }

    pub fn fetch_request(&self) -> BusRequest {
        match self.stage {
            Stage::Fetch => BusRequest::read(self.pc),
            _ => BusRequest::idle(),
        }
    }

    pub fn data_request(&self) -> BusRequest {
        match self.stage {
            Stage::Memory(access) => access.request,
            _ => BusRequest::idle(),
        }
    }

    pub fn clock_edge(&mut self, fetch: &BusResponse, data: &BusResponse) {
        match self.stage {
            Stage::Fetch => {
                if fetch.ready {
                    self.stage = Stage::Execute(fetch.rdata);
                }
            }
            Stage::Execute(instr) => self.execute(instr),
            Stage::Memory(access) => {
                if data.ready {
                    self.complete_access(&access, data.rdata);
                }
            }
        }
        self.registers.clock_edge();
    }

    fn execute(&mut self, instr: u32) {
        let control = ControlWord::decode(instr);
        let c = control.fields;
        let rs1_value = self.registers.read(rs1(instr));
        let rs2_value = self.registers.read(rs2(instr));
        let imm = interpret_i32_as_unsigned(decode_immediate(instr));

        let a = match c.alu_src_a {
            AluSrcA::Rs1 => rs1_value,
            AluSrcA::Pc => self.pc,
            AluSrcA::Zero => 0,
        };
        let b = match c.alu_src_b {
            AluSrcB::Rs2 => rs2_value,
            AluSrcB::Imm => imm,
        };
        let (result, zero) = alu(control.alu_control, a, b);

        if control.accesses_memory() {
            let width = AccessWidth::from_funct3(funct3(instr));
            let addr_low2 = result & 0b11;
            let access = if c.mem_write {
                let (we, wdata) = width
                    .map(|w| format_store(rs2_value, addr_low2, w))
                    .unwrap_or((0, 0));
                MemoryAccess {
                    request: BusRequest::write(result, wdata, we),
                    load: None,
                }
            } else {
                MemoryAccess {
                    request: BusRequest::read(result),
                    load: Some((rd(instr), width)),
                }
            };
            trace!(
                pc = format_args!("{:#010x}", self.pc),
                addr = format_args!("{:#010x}", result),
                we = access.request.we,
                "memory access"
            );
            self.stage = Stage::Memory(access);
            return;
        }

        let pc_plus_4 = self.pc.wrapping_add(4);
        let write_data = match c.write_data_src {
            WriteDataSrc::AluResult => result,
            WriteDataSrc::PcPlus4 => pc_plus_4,
        };
        self.registers.write(rd(instr), write_data, c.reg_write);

        let next_pc = if c.jump && opcode(instr) == OP_JALR {
            result & !1
        } else if c.jump || branch_taken(c.branch, funct3(instr), zero) {
            self.pc.wrapping_add(imm)
        } else {
            pc_plus_4
        };
        self.retire(instr, next_pc);
    }

    fn complete_access(&mut self, access: &MemoryAccess, rdata: u32) {
        if let Some((rd, width)) = access.load {
            let addr_low2 = access.request.addr & 0b11;
            let value = width
                .map(|w| interpret_i32_as_unsigned(format_load(rdata, addr_low2, w)))
                .unwrap_or(0);
            self.registers.write(rd, value, true);
        }
        self.retire(0, self.pc.wrapping_add(4));
    }

    fn retire(&mut self, instr: u32, next_pc: u32) {
        trace!(
            pc = format_args!("{:#010x}", self.pc),
            instr = format_args!("{:#010x}", instr),
            next_pc = format_args!("{:#010x}", next_pc),
            "retire"
        );
        self.pc = next_pc;
        self.retired += 1;
        self.stage = Stage::Fetch;
    }
}

impl fmt::Display for Hart {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "pc: {:#010x} ({:?}), retired {}", self.pc, self.stage, self.retired)?;
        write!(f, "{}", self.registers)
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::encode::*;
    use crate::periph::{Ram, Rom};

    /// Hart with its instruction port on a ROM and its data port
    /// straight onto a RAM (no arbiter)
    struct Rig {
        hart: Hart,
        rom: Rom,
        ram: Ram,
    }

    impl Rig {
        fn new(program: &[u32]) -> Self {
            let mut rom = Rom::new(256);
            rom.load(program).unwrap();
            Self {
                hart: Hart::new(0),
                rom,
                ram: Ram::new(256),
            }
        }

        fn step(&mut self) {
            let fetch_resp = self.rom.fetch_response();
            let data_resp = self.ram.data_response();
            let fetch_req = self.hart.fetch_request();
            let data_req = self.hart.data_request();
            self.hart.clock_edge(&fetch_resp, &data_resp);
            self.rom.clock_edge(&fetch_req, &BusRequest::idle());
            self.ram.clock_edge(&BusRequest::idle(), &data_req);
        }

        /// Run until n more instructions have retired
        fn retire(&mut self, n: u64) {
            let target = self.hart.retired() + n;
            for _ in 0..10_000 {
                if self.hart.retired() == target {
                    // Let the last register write land
                    self.step();
                    return;
                }
                self.step();
            }
            panic!("hart did not retire {n} instructions");
        }

        fn x(&self, n: u8) -> u32 {
            self.hart.registers().read(n)
        }
    }

    #[test]
    fn check_arithmetic() {
        let mut rig = Rig::new(&[
            addi(1, 0, 5),
            addi(2, 0, -3),
            add(3, 1, 2),
            sub(4, 2, 1),
            slt(5, 2, 1),
            sltu(6, 2, 1),
            srai(7, 2, 1),
            srli(8, 2, 28),
            xori(9, 1, -1),
        ]);
        rig.retire(9);
        assert_eq!(rig.x(3), 2);
        assert_eq!(rig.x(4) as i32, -8);
        assert_eq!(rig.x(5), 1);
        assert_eq!(rig.x(6), 0);
        assert_eq!(rig.x(7) as i32, -2);
        assert_eq!(rig.x(8), 0xf);
        assert_eq!(rig.x(9) as i32, -6);
        assert_eq!(rig.hart.pc(), 36);
    }

    #[test]
    fn check_x0_stays_zero() {
        let mut rig = Rig::new(&[addi(0, 0, 7), add(1, 0, 0)]);
        rig.retire(2);
        assert_eq!(rig.x(0), 0);
        assert_eq!(rig.x(1), 0);
    }

    #[test]
    fn check_upper_immediates() {
        let mut rig = Rig::new(&[nop(), lui(1, 0x12345), auipc(2, 1)]);
        rig.retire(3);
        assert_eq!(rig.x(1), 0x1234_5000);
        assert_eq!(rig.x(2), 0x1000 + 8);
    }

    #[test]
    fn check_jal_and_jalr_link() {
        let mut rig = Rig::new(&[
            jal(1, 12),      // 0: -> 12
            addi(5, 0, 1),   // 4: skipped
            addi(5, 0, 2),   // 8: skipped
            addi(6, 0, 25),  // 12
            jalr(2, 6, 0),   // 16: -> 24 (bit 0 cleared)
            addi(5, 0, 3),   // 20: skipped
            addi(7, 0, 9),   // 24
        ]);
        rig.retire(4);
        assert_eq!(rig.x(1), 4);
        assert_eq!(rig.x(2), 20);
        assert_eq!(rig.x(5), 0);
        assert_eq!(rig.x(7), 9);
    }

    #[test]
    fn check_branches() {
        let mut rig = Rig::new(&[
            addi(1, 0, -1),
            addi(2, 0, 1),
            blt(1, 2, 8),    // taken (signed)
            addi(3, 0, 1),
            bltu(1, 2, 8),   // not taken (unsigned)
            addi(4, 0, 1),
            bge(2, 1, 8),    // taken
            addi(5, 0, 1),
            beq(1, 1, 8),    // taken, skips the last instruction
            addi(6, 0, 1),
        ]);
        // Executed: 0, 4, 8, 16, 20, 24, 32
        rig.retire(7);
        assert_eq!(rig.x(3), 0);
        assert_eq!(rig.x(4), 1);
        assert_eq!(rig.x(5), 0);
        assert_eq!(rig.x(6), 0);
        assert_eq!(rig.hart.pc(), 40);
    }

    #[test]
    fn check_loop_counts_down() {
        let mut rig = Rig::new(&[
            addi(1, 0, 5),
            addi(2, 2, 3),
            addi(1, 1, -1),
            bne(1, 0, -8),
        ]);
        rig.retire(1 + 3 * 5);
        assert_eq!(rig.x(2), 15);
        assert_eq!(rig.hart.pc(), 16);
    }

    #[test]
    fn check_loads_and_stores() {
        let mut rig = Rig::new(&[
            lui(1, 0x80000),
            lui(2, 0x89abd),
            addi(2, 2, -0x211), // 0x89abcdef
            sw(2, 1, 0),
            lb(3, 1, 3),
            lbu(4, 1, 3),
            lh(5, 1, 0),
            lhu(6, 1, 2),
            sb(0, 1, 1),
            sh(2, 1, 6),
            lw(7, 1, 0),
            lw(8, 1, 4),
        ]);
        rig.retire(12);
        assert_eq!(rig.x(2), 0x89ab_cdef);
        assert_eq!(rig.x(3), 0xffff_ff89);
        assert_eq!(rig.x(4), 0x89);
        assert_eq!(rig.x(5), 0xffff_cdef);
        assert_eq!(rig.x(6), 0x89ab);
        assert_eq!(rig.x(7), 0x89ab_00ef);
        assert_eq!(rig.x(8), 0xcdef_0000);
    }

    #[test]
    fn check_system_and_fence_are_noops() {
        let mut rig = Rig::new(&[fence(), ecall(), addi(1, 0, 1), 0xffff_ffff]);
        rig.retire(4);
        assert_eq!(rig.x(1), 1);
        assert_eq!(rig.hart.pc(), 16);
    }

    #[test]
    fn check_register_read_sees_previous_instruction() {
        let mut rig = Rig::new(&[addi(1, 0, 1), addi(1, 1, 1), addi(1, 1, 1)]);
        rig.retire(3);
        assert_eq!(rig.x(1), 3);
    }
}
