use tracing::warn;

use super::{load_image, word_index, MemoryError};
use crate::bus::{BusRequest, BusResponse, RegisteredReady};

/// Boot ROM with an instruction port and a data port, both with one
/// cycle of read latency. Contents only change through `load`.
#[derive(Debug, Clone)]
pub struct Rom {
    cells: Vec<u32>,
    fetch_out: u32,
    data_out: u32,
    fetch_ready: RegisteredReady,
    data_ready: RegisteredReady,
}

impl Rom {
    pub fn new(words: usize) -> Self {
        Self {
            cells: vec![0; words],
            fetch_out: 0,
            data_out: 0,
            fetch_ready: RegisteredReady::default(),
            data_ready: RegisteredReady::default(),
        }
    }

    pub fn load(&mut self, image: &[u32]) -> Result<(), MemoryError> {
        load_image(&mut self.cells, 0, image)
    }

    pub fn words(&self) -> usize {
        self.cells.len()
    }

    pub fn peek(&self, addr: u32) -> u32 {
        self.cells[word_index(addr, self.cells.len())]
    }

    pub fn fetch_response(&self) -> BusResponse {
        BusResponse {
            rdata: self.fetch_out,
            ready: self.fetch_ready.ready(),
        }
    }

    pub fn data_response(&self) -> BusResponse {
        BusResponse {
            rdata: self.data_out,
            ready: self.data_ready.ready(),
        }
    }

    pub fn clock_edge(&mut self, fetch: &BusRequest, data: &BusRequest) {
        let len = self.cells.len();
        if self.fetch_ready.clock_edge(fetch) {
            self.fetch_out = self.cells[word_index(fetch.addr, len)];
        }
        if self.data_ready.clock_edge(data) {
            if data.we != 0 {
                warn!(
                    addr = format_args!("{:#010x}", data.addr),
                    "write to ROM ignored"
                );
            }
            self.data_out = self.cells[word_index(data.addr, len)];
        }
    }
}
