//! Bus fabric: the signal bundles shared by every master and target,
//! the two-master arbiter and the address-decoding interconnect.
//!
//! A transaction is accepted on a clock edge where `valid` (from the
//! requester) and `ready` (from the responder) are both high. Every
//! accepted transaction produces exactly one response.

use thiserror::Error;

pub mod arbiter;
pub mod interconnect;

pub use arbiter::{Arbiter, ArbiterState};
pub use interconnect::{FetchTarget, Interconnect, MapError, MemoryMap, Region, Target};

/// Request half of a bus port
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BusRequest {
    pub addr: u32,
    pub wdata: u32,
    /// Byte-enable mask, zero for reads
    pub we: u8,
    pub valid: bool,
}

/// Response half of a bus port
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BusResponse {
    pub rdata: u32,
    pub ready: bool,
}

#[derive(Error, PartialEq, Eq, Debug)]
pub enum ProtocolError {
    #[error("write enable {we:#06b} asserted without valid at address {addr:#010x}")]
    WriteWithoutValid { addr: u32, we: u8 },
    #[error("byte enable {0:#x} is wider than four lanes")]
    InvalidByteEnable(u8),
    #[error("both masters completed a transaction on the same edge")]
    DoubleCompletion,
    #[error("target presented ready with no request on the shared channel")]
    ReadyWithoutRequest,
}

impl BusRequest {
    pub fn read(addr: u32) -> Self {
        Self {
            addr,
            valid: true,
            ..Default::default()
        }
    }

    pub fn write(addr: u32, wdata: u32, we: u8) -> Self {
        Self {
            addr,
            wdata,
            we,
            valid: true,
        }
    }

    /// No request on the port this cycle
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn is_write(&self) -> bool {
        self.valid && self.we != 0
    }

    pub fn validate(&self) -> Result<(), ProtocolError> {
        if self.we > 0b1111 {
            Err(ProtocolError::InvalidByteEnable(self.we))
        } else if !self.valid && self.we != 0 {
            Err(ProtocolError::WriteWithoutValid {
                addr: self.addr,
                we: self.we,
            })
        } else {
            Ok(())
        }
    }

    /// Fail fast on a malformed request from the driving harness
    pub fn assert_valid(&self, port: &str) {
        if let Err(e) = self.validate() {
            panic!("bus protocol violation on {port}: {e}");
        }
    }

    /// The request as seen by a target that is not selected
    pub fn gated(&self, selected: bool) -> Self {
        if selected {
            *self
        } else {
            Self::idle()
        }
    }
}

impl BusResponse {
    pub fn ready(rdata: u32) -> Self {
        Self { rdata, ready: true }
    }

    pub fn waiting() -> Self {
        Self::default()
    }
}

/// Only one transaction is accepted per edge on the shared channel, so
/// at most one master can see a completion
pub fn check_single_completion(m0: &BusResponse, m1: &BusResponse) -> Result<(), ProtocolError> {
    if m0.ready && m1.ready {
        Err(ProtocolError::DoubleCompletion)
    } else {
        Ok(())
    }
}

/// Fail fast when both masters are handed a completion
pub fn assert_single_completion(m0: &BusResponse, m1: &BusResponse) {
    if let Err(e) = check_single_completion(m0, m1) {
        panic!("bus protocol violation on shared channel: {e}");
    }
}

/// Ready generator for a target with one cycle of latency. A request
/// is latched on one edge, the target presents ready during the next
/// cycle, and the transaction is accepted on the edge after that. No
/// new request is latched on an edge where ready is already high.
#[derive(Debug, Default, Clone, Copy)]
pub struct RegisteredReady {
    ready: bool,
}

impl RegisteredReady {
    pub fn ready(&self) -> bool {
        self.ready
    }

    /// Advance one edge. Returns true when the target should perform
    /// the request on this edge.
    pub fn clock_edge(&mut self, req: &BusRequest) -> bool {
        if self.ready {
            self.ready = false;
            false
        } else if req.valid {
            self.ready = true;
            true
        } else {
            false
        }
    }
}
