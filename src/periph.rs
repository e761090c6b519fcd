//! Memory and peripheral models hanging off the bus fabric.
//!
//! Every model here has one cycle of latency: requests are sampled on
//! a clock edge and the response is presented during the next cycle.

use thiserror::Error;

pub mod gpio;
pub mod npu;
pub mod ram;
pub mod rom;
pub mod uart;
pub mod vga;

pub use gpio::Gpio;
pub use npu::NpuSink;
pub use ram::{DualPortRam, Ram, RamPort};
pub use rom::Rom;
pub use uart::{UartController, UartRx, UartTx};
pub use vga::Vga;

#[derive(Error, PartialEq, Eq, Debug)]
pub enum MemoryError {
    #[error("image of {words} words does not fit in {capacity} words at word offset {offset}")]
    ImageTooLarge {
        words: usize,
        capacity: usize,
        offset: usize,
    },
    #[error("{0} must hold at least one word")]
    Empty(&'static str),
}

/// Word index of a byte address in an array of `len` words. The
/// region-select nibble is dropped and offsets wrap modulo the array
/// size, which must be non-zero.
pub(crate) fn word_index(addr: u32, len: usize) -> usize {
    ((addr & 0x0fff_ffff) >> 2) as usize % len
}

/// Copy an image into a word array starting at a word offset
pub(crate) fn load_image(
    cells: &mut [u32],
    offset: usize,
    image: &[u32],
) -> Result<(), MemoryError> {
    let capacity = cells.len();
    let end = offset
        .checked_add(image.len())
        .filter(|end| *end <= capacity)
        .ok_or(MemoryError::ImageTooLarge {
            words: image.len(),
            capacity,
            offset,
        })?;
    cells[offset..end].copy_from_slice(image);
    Ok(())
}
