use std::fmt;

use thiserror::Error;

#[derive(Error, PartialEq, Eq, Debug)]
pub enum RegisterError {
    #[error("register index {0} exceeds 31")]
    InvalidRegister(usize),
}

/// A write waiting for the next clock edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingWrite {
    which: usize,
    value: u32,
}

/// 32 x 32-bit integer registers with two combinational read ports
/// and one write port that commits on the clock edge.
///
/// Register addresses are 5-bit port values, so only the low five
/// bits of an index are used by read and write.
#[derive(Debug, Default)]
pub struct RegisterFile {
    registers: [u32; 32],
    pending: Option<PendingWrite>,
}

impl RegisterFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value as of the last completed clock edge. x0 always reads 0.
    pub fn read(&self, which: u8) -> u32 {
        self.registers[usize::from(which & 0x1f)]
    }

    /// Stage a write for the next clock edge. Ignored unless enable
    /// is set and the target is not x0. A second write before the edge
    /// replaces the first (there is only one write port).
    pub fn write(&mut self, which: u8, value: u32, enable: bool) {
        let which = usize::from(which & 0x1f);
        self.pending = (enable && which != 0).then_some(PendingWrite { which, value });
    }

    pub fn clock_edge(&mut self) {
        if let Some(PendingWrite { which, value }) = self.pending.take() {
            self.registers[which] = value;
        }
    }

    /// Checked read for harness access by full index
    pub fn try_read(&self, which: usize) -> Result<u32, RegisterError> {
        self.registers
            .get(which)
            .copied()
            .ok_or(RegisterError::InvalidRegister(which))
    }
}

impl fmt::Display for RegisterFile {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Non-zero registers {{")?;
        for (n, value) in self.registers.iter().enumerate() {
            if *value != 0 {
                writeln!(f, " x{n}: {value:#010x}")?;
            }
        }
        writeln!(f, "}}")
    }
}
