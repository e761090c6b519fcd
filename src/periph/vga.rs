//! VGA framebuffer: 320x240 pixels of 4 bits, packed eight to a word
//! with pixel 0 in the low nibble.

use super::word_index;
use crate::bus::{BusRequest, BusResponse, RegisteredReady};
use crate::utils::{extract_field, merge_bytes};

pub const VGA_WIDTH: usize = 320;
pub const VGA_HEIGHT: usize = 240;
const PIXELS_PER_WORD: usize = 8;
const FRAMEBUFFER_WORDS: usize = VGA_WIDTH * VGA_HEIGHT / PIXELS_PER_WORD;

#[derive(Debug, Clone)]
pub struct Vga {
    framebuffer: Vec<u32>,
    rdata: u32,
    handshake: RegisteredReady,
}

impl Default for Vga {
    fn default() -> Self {
        Self {
            framebuffer: vec![0; FRAMEBUFFER_WORDS],
            rdata: 0,
            handshake: RegisteredReady::default(),
        }
    }
}

impl Vga {
    pub fn new() -> Self {
        Self::default()
    }

    /// 4-bit colour of a pixel
    pub fn pixel(&self, x: usize, y: usize) -> u8 {
        let n = y * VGA_WIDTH + x;
        let word = self.framebuffer[(n / PIXELS_PER_WORD) % FRAMEBUFFER_WORDS];
        let shift = 4 * (n % PIXELS_PER_WORD) as u32;
        extract_field(word, shift + 3, shift) as u8
    }

    pub fn response(&self) -> BusResponse {
        BusResponse {
            rdata: self.rdata,
            ready: self.handshake.ready(),
        }
    }

    pub fn clock_edge(&mut self, req: &BusRequest) {
        if !self.handshake.clock_edge(req) {
            return;
        }
        let cell = &mut self.framebuffer[word_index(req.addr, FRAMEBUFFER_WORDS)];
        self.rdata = *cell;
        *cell = merge_bytes(*cell, req.wdata, req.we);
    }
}
