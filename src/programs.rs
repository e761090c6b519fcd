//! Small RV32I programs assembled with the encoder, used as built-in
//! demos by `socsim` and as end-to-end test images.

use clap::ValueEnum;

use crate::config::{SocConfig, CONSOLE_OFFSET, DEBUG_INT_OFFSET, HALT_OFFSET};
use crate::dma::{CTRL_START, DMA_CNT, DMA_CTRL, DMA_DST, DMA_SRC, STATUS_BUSY};
use crate::encode::*;
use crate::periph::uart::{STATUS_TX_BUSY, UART_DATA, UART_STATUS};

pub const UART_BASE: u32 = 0x1000_0000;
pub const DMA_BASE: u32 = 0x4000_0000;
pub const RAM_BASE: u32 = 0x8000_0000;
pub const NPU_BASE: u32 = 0x9000_0000;

pub const HELLO_MESSAGE: &str = "Hello!\n";
pub const FIBONACCI_TERMS: u32 = 20;
pub const DMA_DEMO_WORDS: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Demo {
    /// Fibonacci terms to the debug-int register
    Fibonacci,
    /// Greeting on the console and the UART
    Hello,
    /// Copy a Fibonacci program from ROM to RAM and jump to it
    Bootloader,
    /// CPU-programmed DMA copy inside RAM
    Dma,
}

impl Demo {
    /// ROM image of the demo for a given system configuration
    pub fn image(&self, config: &SocConfig) -> Vec<u32> {
        match self {
            Demo::Fibonacci => fibonacci(config, FIBONACCI_TERMS),
            Demo::Hello => hello(config, HELLO_MESSAGE),
            Demo::Bootloader => bootloader(&fibonacci(config, FIBONACCI_TERMS)),
            Demo::Dma => dma_copy(config, DMA_DEMO_WORDS),
        }
    }
}

/// `lui` + `addi` pair loading an arbitrary 32-bit value into rd.
/// Always two words so branch offsets around it stay fixed.
pub fn load_immediate(rd: u32, value: u32) -> [u32; 2] {
    let lower = ((value << 20) as i32) >> 20;
    let upper = value.wrapping_sub(lower as u32) >> 12;
    [lui(rd, upper), addi(rd, rd, lower)]
}

/// Write the first `terms` Fibonacci numbers to the debug-int
/// register, then halt. Position independent.
pub fn fibonacci(config: &SocConfig, terms: u32) -> Vec<u32> {
    let mut program = load_immediate(5, config.mmio_base).to_vec();
    program.extend([
        addi(6, 0, 0),
        addi(7, 0, 1),
        addi(8, 0, terms.clamp(1, 2047) as i32),
        // loop:
        sw(6, 5, DEBUG_INT_OFFSET as i32),
        add(9, 6, 7),
        addi(6, 7, 0),
        addi(7, 9, 0),
        addi(8, 8, -1),
        bne(8, 0, -20),
        sw(0, 5, HALT_OFFSET as i32),
        jal(0, 0),
    ]);
    program
}

/// Print a message one byte at a time. Console writes land on the
/// UART data register as well, so each byte waits for the transmitter
/// to go idle first.
pub fn hello(config: &SocConfig, message: &str) -> Vec<u32> {
    let wait_tx = [
        lw(7, 10, UART_STATUS as i32),
        andi(7, 7, STATUS_TX_BUSY as i32),
        bne(7, 0, -8),
    ];
    let mut program = load_immediate(5, config.mmio_base).to_vec();
    program.extend(load_immediate(10, UART_BASE + UART_DATA));
    for byte in message.bytes() {
        program.extend(wait_tx);
        program.extend([
            addi(6, 0, i32::from(byte)),
            sb(6, 5, CONSOLE_OFFSET as i32),
        ]);
    }
    program.extend(wait_tx);
    program.extend([sw(0, 5, HALT_OFFSET as i32), jal(0, 0)]);
    program
}

/// Copy `payload` (stored in ROM straight after the loader) to the
/// start of RAM and jump there
pub fn bootloader(payload: &[u32]) -> Vec<u32> {
    const LOADER_WORDS: i32 = 12;
    let words = payload.len().clamp(1, 2047) as i32;
    let mut program = vec![
        lui(10, RAM_BASE >> 12),
        auipc(11, 0),
        addi(11, 11, 4 * LOADER_WORDS - 4),
        addi(12, 0, words),
        // copy:
        lw(13, 11, 0),
        sw(13, 10, 0),
        addi(11, 11, 4),
        addi(10, 10, 4),
        addi(12, 12, -1),
        bne(12, 0, -20),
        lui(10, RAM_BASE >> 12),
        jalr(0, 10, 0),
    ];
    debug_assert_eq!(program.len(), LOADER_WORDS as usize);
    program.extend_from_slice(payload);
    program
}

/// Fill a RAM buffer with 100, 111, 122, ..., copy it with the DMA,
/// poll STATUS until idle, then report the copy through the debug-int
/// register
pub fn dma_copy(config: &SocConfig, words: u32) -> Vec<u32> {
    let words = words.clamp(1, 2047) as i32;
    let mut program = load_immediate(5, config.mmio_base).to_vec();
    program.extend(load_immediate(10, RAM_BASE + 0x1000));
    program.extend(load_immediate(11, RAM_BASE + 0x2000));
    program.extend(load_immediate(12, DMA_BASE));
    program.extend([
        addi(13, 0, words),
        addi(14, 0, 100),
        addi(15, 10, 0),
        // fill:
        sw(14, 15, 0),
        addi(14, 14, 11),
        addi(15, 15, 4),
        addi(13, 13, -1),
        bne(13, 0, -16),
        sw(10, 12, DMA_SRC as i32),
        sw(11, 12, DMA_DST as i32),
        addi(13, 0, words),
        sw(13, 12, DMA_CNT as i32),
        addi(13, 0, CTRL_START as i32),
        sw(13, 12, DMA_CTRL as i32),
        // poll:
        lw(13, 12, DMA_CTRL as i32),
        andi(13, 13, STATUS_BUSY as i32),
        bne(13, 0, -8),
        addi(13, 0, words),
        addi(15, 11, 0),
        // report:
        lw(14, 15, 0),
        sw(14, 5, DEBUG_INT_OFFSET as i32),
        addi(15, 15, 4),
        addi(13, 13, -1),
        bne(13, 0, -16),
        sw(0, 5, HALT_OFFSET as i32),
        jal(0, 0),
    ]);
    program
}
