//! Input side of the neural accelerator, reduced to a FIFO that
//! captures every word written into its region. Reads return zero.

use queues::{IsQueue, Queue};

use crate::bus::{BusRequest, BusResponse, RegisteredReady};

#[derive(Debug, Default)]
pub struct NpuSink {
    fifo: Queue<u32>,
    handshake: RegisteredReady,
}

impl NpuSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.fifo.size()
    }

    pub fn is_empty(&self) -> bool {
        self.fifo.size() == 0
    }

    /// Remove and return everything written so far, oldest first
    pub fn drain(&mut self) -> Vec<u32> {
        let mut words = Vec::with_capacity(self.fifo.size());
        while let Ok(word) = self.fifo.remove() {
            words.push(word);
        }
        words
    }

    pub fn response(&self) -> BusResponse {
        BusResponse {
            rdata: 0,
            ready: self.handshake.ready(),
        }
    }

    pub fn clock_edge(&mut self, req: &BusRequest) {
        if self.handshake.clock_edge(req) && req.we != 0 {
            // Queue::add only fails for bounded queues
            let _ = self.fifo.add(req.wdata);
        }
    }
}
