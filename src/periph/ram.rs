use super::{load_image, word_index, MemoryError};
use crate::bus::{BusRequest, BusResponse, RegisteredReady};
use crate::utils::merge_bytes;

/// One port of the RAM primitive for one cycle
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RamPort {
    pub enable: bool,
    pub addr: u32,
    pub wdata: u32,
    /// Byte write mask
    pub we: u8,
}

impl RamPort {
    pub fn read(addr: u32) -> Self {
        Self {
            enable: true,
            addr,
            ..Default::default()
        }
    }

    pub fn write(addr: u32, wdata: u32, we: u8) -> Self {
        Self {
            enable: true,
            addr,
            wdata,
            we,
        }
    }

    pub fn disabled() -> Self {
        Self::default()
    }
}

/// Synchronous dual-port block RAM with read-first behaviour.
///
/// On each edge an enabled port registers the word stored at its
/// address before any write of that edge is applied, then its write
/// (if any) is merged through the byte mask. A disabled port holds its
/// output.
#[derive(Debug, Clone)]
pub struct DualPortRam {
    cells: Vec<u32>,
    data_out_a: u32,
    data_out_b: u32,
}

impl DualPortRam {
    pub fn new(words: usize) -> Self {
        Self {
            cells: vec![0; words],
            data_out_a: 0,
            data_out_b: 0,
        }
    }

    pub fn words(&self) -> usize {
        self.cells.len()
    }

    pub fn data_out_a(&self) -> u32 {
        self.data_out_a
    }

    pub fn data_out_b(&self) -> u32 {
        self.data_out_b
    }

    pub fn clock_edge(&mut self, a: &RamPort, b: &RamPort) {
        let len = self.cells.len();
        if a.enable {
            self.data_out_a = self.cells[word_index(a.addr, len)];
        }
        if b.enable {
            self.data_out_b = self.cells[word_index(b.addr, len)];
        }
        for port in [a, b] {
            if port.enable && port.we != 0 {
                let cell = &mut self.cells[word_index(port.addr, len)];
                *cell = merge_bytes(*cell, port.wdata, port.we);
            }
        }
    }

    /// Backdoor read, bypassing the ports
    pub fn peek(&self, addr: u32) -> u32 {
        self.cells[word_index(addr, self.cells.len())]
    }

    /// Backdoor write, bypassing the ports
    pub fn poke(&mut self, addr: u32, value: u32) {
        let len = self.cells.len();
        self.cells[word_index(addr, len)] = value;
    }

    pub fn load(&mut self, word_offset: usize, image: &[u32]) -> Result<(), MemoryError> {
        load_image(&mut self.cells, word_offset, image)
    }
}

/// System RAM: port A serves instruction fetch, port B the shared data
/// bus
#[derive(Debug, Clone)]
pub struct Ram {
    mem: DualPortRam,
    fetch_ready: RegisteredReady,
    data_ready: RegisteredReady,
}

impl Ram {
    pub fn new(words: usize) -> Self {
        Self {
            mem: DualPortRam::new(words),
            fetch_ready: RegisteredReady::default(),
            data_ready: RegisteredReady::default(),
        }
    }

    pub fn mem(&self) -> &DualPortRam {
        &self.mem
    }

    pub fn mem_mut(&mut self) -> &mut DualPortRam {
        &mut self.mem
    }

    pub fn fetch_response(&self) -> BusResponse {
        BusResponse {
            rdata: self.mem.data_out_a(),
            ready: self.fetch_ready.ready(),
        }
    }

    pub fn data_response(&self) -> BusResponse {
        BusResponse {
            rdata: self.mem.data_out_b(),
            ready: self.data_ready.ready(),
        }
    }

    /// Both requests must already be gated by the interconnect
    pub fn clock_edge(&mut self, fetch: &BusRequest, data: &BusRequest) {
        let a = if self.fetch_ready.clock_edge(fetch) {
            RamPort::read(fetch.addr)
        } else {
            RamPort::disabled()
        };
        let b = if self.data_ready.clock_edge(data) {
            RamPort::write(data.addr, data.wdata, data.we)
        } else {
            RamPort::disabled()
        };
        self.mem.clock_edge(&a, &b);
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn check_read_has_one_cycle_latency() {
        let mut ram = DualPortRam::new(16);
        ram.poke(0x8, 0x1234);
        assert_eq!(ram.data_out_a(), 0);
        ram.clock_edge(&RamPort::read(0x8), &RamPort::disabled());
        assert_eq!(ram.data_out_a(), 0x1234);
    }

    #[test]
    fn check_read_first_on_same_port() {
        let mut ram = DualPortRam::new(16);
        ram.poke(0x4, 0xaaaa_aaaa);
        ram.clock_edge(&RamPort::disabled(), &RamPort::write(0x4, 0x5555_5555, 0xf));
        assert_eq!(ram.data_out_b(), 0xaaaa_aaaa);
        ram.clock_edge(&RamPort::disabled(), &RamPort::read(0x4));
        assert_eq!(ram.data_out_b(), 0x5555_5555);
    }

    #[test]
    fn check_read_first_across_ports() {
        let mut ram = DualPortRam::new(16);
        ram.poke(0x10, 7);
        ram.clock_edge(&RamPort::read(0x10), &RamPort::write(0x10, 9, 0xf));
        assert_eq!(ram.data_out_a(), 7);
        assert_eq!(ram.peek(0x10), 9);
    }

    #[test]
    fn check_byte_masked_write() {
        let mut ram = DualPortRam::new(16);
        ram.poke(0x0, 0x1122_3344);
        ram.clock_edge(&RamPort::write(0x0, 0xaabb_ccdd, 0b0110), &RamPort::disabled());
        assert_eq!(ram.peek(0x0), 0x11bb_cc44);
    }

    #[test]
    fn check_disabled_port_holds_output() {
        let mut ram = DualPortRam::new(16);
        ram.poke(0x0, 5);
        ram.clock_edge(&RamPort::read(0x0), &RamPort::disabled());
        ram.poke(0x0, 6);
        ram.clock_edge(&RamPort::disabled(), &RamPort::disabled());
        assert_eq!(ram.data_out_a(), 5);
    }

    #[test]
    fn check_load_bounds() {
        let mut ram = DualPortRam::new(4);
        assert_eq!(ram.load(1, &[1, 2, 3]), Ok(()));
        assert_eq!(ram.peek(0xc), 3);
        assert_eq!(
            ram.load(2, &[1, 2, 3]),
            Err(MemoryError::ImageTooLarge {
                words: 3,
                capacity: 4,
                offset: 2
            })
        );
    }

    #[test]
    fn check_bus_handshake() {
        let mut ram = Ram::new(64);
        let write = BusRequest::write(0x8000_0020, 0xfeed, 0xf);
        ram.clock_edge(&BusRequest::idle(), &write);
        assert!(ram.data_response().ready);
        // Accepted on this edge; not written a second time
        ram.clock_edge(&BusRequest::idle(), &write);
        assert!(!ram.data_response().ready);
        ram.clock_edge(&BusRequest::read(0x8000_0020), &BusRequest::idle());
        assert_eq!(ram.fetch_response(), BusResponse::ready(0xfeed));
    }

    #[test]
    fn random_dual_port_traffic_matches_shadow_model() {
        let mut rng = StdRng::seed_from_u64(99);
        let mut ram = DualPortRam::new(4096);
        let mut shadow = vec![0u32; 4096];
        for _ in 0..5000 {
            let addr_a = 4 * rng.random_range(0..4096u32);
            let mut addr_b = 4 * rng.random_range(0..4096u32);
            let a = if rng.random_bool(0.5) {
                RamPort::write(addr_a, rng.random(), rng.random_range(0..16))
            } else {
                RamPort::read(addr_a)
            };
            if a.we != 0 && addr_b == addr_a {
                addr_b = (addr_a + 4) % (4 * 4096);
            }
            let b = if rng.random_bool(0.5) {
                RamPort::write(addr_b, rng.random(), rng.random_range(0..16))
            } else {
                RamPort::read(addr_b)
            };
            let expected_a = shadow[(addr_a / 4) as usize];
            let expected_b = shadow[(addr_b / 4) as usize];
            ram.clock_edge(&a, &b);
            for port in [a, b] {
                let cell = &mut shadow[(port.addr / 4) as usize];
                *cell = merge_bytes(*cell, port.wdata, port.we);
            }
            assert_eq!(ram.data_out_a(), expected_a);
            assert_eq!(ram.data_out_b(), expected_b);
        }
    }
}
