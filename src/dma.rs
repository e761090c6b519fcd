//! Memory-to-memory DMA engine.
//!
//! Programmed through four CSRs on the data bus and moves data as bus
//! master 1, one word at a time (read from the source, then write to the
//! destination).
//!
//! | Offset | Write                          | Read          |
//! |--------|--------------------------------|---------------|
//! | 0x0    | SRC                            | SRC           |
//! | 0x4    | DST                            | DST           |
//! | 0x8    | CNT (words)                    | CNT           |
//! | 0xC    | CTRL: bit0 START, bit1 FIXED_DST | STATUS: bit0 BUSY |

use tracing::debug;

use crate::bus::{BusRequest, BusResponse, RegisteredReady};
use crate::utils::merge_bytes;

pub const DMA_SRC: u32 = 0x0;
pub const DMA_DST: u32 = 0x4;
pub const DMA_CNT: u32 = 0x8;
pub const DMA_CTRL: u32 = 0xc;

pub const CTRL_START: u32 = 1 << 0;
pub const CTRL_FIXED_DST: u32 = 1 << 1;
pub const STATUS_BUSY: u32 = 1 << 0;

/// A burst: where to copy from and to, and how many words
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DmaDescriptor {
    pub src: u32,
    pub dst: u32,
    pub count: u32,
    /// Keep writing to the same destination (FIFO-style sinks)
    pub fixed_dst: bool,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum Phase {
    #[default]
    Idle,
    Read,
    Write(u32),
}

#[derive(Debug, Default)]
pub struct Dma {
    /// Values as last written through the CSRs
    programmed: DmaDescriptor,
    /// Transfer in flight: current addresses and words remaining
    active: DmaDescriptor,
    phase: Phase,
    csr_rdata: u32,
    handshake: RegisteredReady,
}

impl Dma {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn busy(&self) -> bool {
        self.phase != Phase::Idle
    }

    pub fn programmed(&self) -> DmaDescriptor {
        self.programmed
    }

    /// Response of the CSR block to the data bus
    pub fn csr_response(&self) -> BusResponse {
        BusResponse {
            rdata: self.csr_rdata,
            ready: self.handshake.ready(),
        }
    }

    /// Master-side request for this cycle, held until its response
    pub fn master_request(&self) -> BusRequest {
        match self.phase {
            Phase::Idle => BusRequest::idle(),
            Phase::Read => BusRequest::read(self.active.src),
            Phase::Write(data) => BusRequest::write(self.active.dst, data, 0b1111),
        }
    }

    pub fn clock_edge(&mut self, csr_req: &BusRequest, master_resp: &BusResponse) {
        if master_resp.ready {
            self.advance(master_resp.rdata);
        }
        if self.handshake.clock_edge(csr_req) {
            self.csr_access(csr_req);
        }
    }

    fn advance(&mut self, rdata: u32) {
        match self.phase {
            Phase::Read => self.phase = Phase::Write(rdata),
            Phase::Write(_) => {
                self.active.count -= 1;
                self.active.src = self.active.src.wrapping_add(4);
                if !self.active.fixed_dst {
                    self.active.dst = self.active.dst.wrapping_add(4);
                }
                if self.active.count == 0 {
                    debug!("dma transfer complete");
                    self.phase = Phase::Idle;
                } else {
                    self.phase = Phase::Read;
                }
            }
            Phase::Idle => {}
        }
    }

    fn csr_access(&mut self, req: &BusRequest) {
        let offset = req.addr & 0xf;
        self.csr_rdata = match offset {
            DMA_SRC => self.programmed.src,
            DMA_DST => self.programmed.dst,
            DMA_CNT => self.programmed.count,
            _ if self.busy() => STATUS_BUSY,
            _ => 0,
        };
        if req.we == 0 {
            return;
        }
        let p = &mut self.programmed;
        match offset {
            DMA_SRC => p.src = merge_bytes(p.src, req.wdata, req.we),
            DMA_DST => p.dst = merge_bytes(p.dst, req.wdata, req.we),
            DMA_CNT => p.count = merge_bytes(p.count, req.wdata, req.we),
            DMA_CTRL => {
                let ctrl = merge_bytes(0, req.wdata, req.we);
                p.fixed_dst = ctrl & CTRL_FIXED_DST != 0;
                if ctrl & CTRL_START != 0 {
                    self.start();
                }
            }
            _ => {}
        }
    }

    fn start(&mut self) {
        let desc = self.programmed;
        if self.busy() {
            debug!("dma start ignored while busy");
        } else if desc.count == 0 {
            debug!("dma start with zero count");
        } else {
            debug!(
                src = format_args!("{:#010x}", desc.src),
                dst = format_args!("{:#010x}", desc.dst),
                count = desc.count,
                fixed_dst = desc.fixed_dst,
                "dma transfer start"
            );
            self.active = desc;
            self.phase = Phase::Read;
        }
    }
}
