//! Address decode and response multiplexing.
//!
//! Address bits [31:28] select a region. The standard data map is:
//!
//! | Top nibble | Target     |
//! |------------|------------|
//! | 0x0        | ROM        |
//! | 0x1        | UART       |
//! | 0x2        | GPIO       |
//! | 0x3        | VGA        |
//! | 0x4        | DMA config |
//! | 0x8        | RAM        |
//! | 0x9        | NPU        |
//!
//! Instruction fetch has its own decode path that only reaches ROM and
//! RAM. Anything else decodes to no target, which answers ready with
//! zero data in the same cycle.

use itertools::Itertools;
use thiserror::Error;
use tracing::warn;

use super::{BusRequest, BusResponse};
use crate::utils::extract_field;

/// Targets reachable from the data path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Rom,
    Uart,
    Gpio,
    Vga,
    DmaConfig,
    Ram,
    Npu,
}

/// Targets reachable from the instruction path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchTarget {
    Rom,
    Ram,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region<T> {
    /// Value of address bits [31:28]
    pub nibble: u8,
    pub target: T,
}

#[derive(Error, PartialEq, Eq, Debug)]
pub enum MapError {
    #[error("regions overlap at top nibble {0:#x}")]
    Overlap(u8),
    #[error("region base {0:#x} does not fit in four bits")]
    InvalidNibble(u8),
}

/// Partition of the address space into at most one target per
/// top-nibble value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryMap<T> {
    regions: Vec<Region<T>>,
}

impl<T: Copy> MemoryMap<T> {
    pub fn new(regions: Vec<Region<T>>) -> Result<Self, MapError> {
        if let Some(region) = regions.iter().find(|r| r.nibble > 0xf) {
            return Err(MapError::InvalidNibble(region.nibble));
        }
        if let Some(nibble) = regions.iter().map(|r| r.nibble).duplicates().next() {
            return Err(MapError::Overlap(nibble));
        }
        Ok(Self { regions })
    }

    pub fn decode(&self, addr: u32) -> Option<T> {
        let nibble = extract_field(addr, 31, 28) as u8;
        self.regions
            .iter()
            .find(|r| r.nibble == nibble)
            .map(|r| r.target)
    }

    /// Base address of the region holding target
    pub fn base_of(&self, target: T) -> Option<u32>
    where
        T: PartialEq,
    {
        self.regions
            .iter()
            .find(|r| r.target == target)
            .map(|r| u32::from(r.nibble) << 28)
    }
}

impl MemoryMap<Target> {
    pub fn standard_data() -> Self {
        let regions = [
            (0x0, Target::Rom),
            (0x1, Target::Uart),
            (0x2, Target::Gpio),
            (0x3, Target::Vga),
            (0x4, Target::DmaConfig),
            (0x8, Target::Ram),
            (0x9, Target::Npu),
        ];
        Self {
            regions: regions
                .into_iter()
                .map(|(nibble, target)| Region { nibble, target })
                .collect(),
        }
    }
}

impl MemoryMap<FetchTarget> {
    pub fn standard_fetch() -> Self {
        Self {
            regions: vec![
                Region {
                    nibble: 0x0,
                    target: FetchTarget::Rom,
                },
                Region {
                    nibble: 0x8,
                    target: FetchTarget::Ram,
                },
            ],
        }
    }
}

/// Combinational decode for the data and fetch paths
#[derive(Debug, Clone)]
pub struct Interconnect {
    data_map: MemoryMap<Target>,
    fetch_map: MemoryMap<FetchTarget>,
}

impl Default for Interconnect {
    fn default() -> Self {
        Self::new(MemoryMap::standard_data(), MemoryMap::standard_fetch())
    }
}

impl Interconnect {
    pub fn new(data_map: MemoryMap<Target>, fetch_map: MemoryMap<FetchTarget>) -> Self {
        Self {
            data_map,
            fetch_map,
        }
    }

    pub fn data_map(&self) -> &MemoryMap<Target> {
        &self.data_map
    }

    pub fn decode_data(&self, addr: u32) -> Option<Target> {
        self.data_map.decode(addr)
    }

    pub fn decode_fetch(&self, addr: u32) -> Option<FetchTarget> {
        self.fetch_map.decode(addr)
    }

    /// The request as seen by one data target: forwarded unmodified
    /// when the address selects it, idle otherwise
    pub fn request_for(&self, req: &BusRequest, target: Target) -> BusRequest {
        req.gated(req.valid && self.decode_data(req.addr) == Some(target))
    }

    pub fn fetch_request_for(&self, req: &BusRequest, target: FetchTarget) -> BusRequest {
        req.gated(req.valid && self.decode_fetch(req.addr) == Some(target))
    }

    /// Multiplex the selected target's response back to the requester
    pub fn data_response(
        &self,
        req: &BusRequest,
        respond: impl FnOnce(Target) -> BusResponse,
    ) -> BusResponse {
        match self.decode_data(req.addr) {
            Some(target) => respond(target),
            None => {
                if req.valid {
                    warn!(addr = format_args!("{:#010x}", req.addr), "unmapped data access");
                }
                BusResponse {
                    rdata: 0,
                    ready: req.valid,
                }
            }
        }
    }

    pub fn fetch_response(
        &self,
        req: &BusRequest,
        respond: impl FnOnce(FetchTarget) -> BusResponse,
    ) -> BusResponse {
        match self.decode_fetch(req.addr) {
            Some(target) => respond(target),
            None => {
                if req.valid {
                    warn!(addr = format_args!("{:#010x}", req.addr), "unmapped instruction fetch");
                }
                BusResponse {
                    rdata: 0,
                    ready: req.valid,
                }
            }
        }
    }
}
