//! Cycle-level model of the whole system: hart, two-master bus fabric,
//! memories, peripherals and the simulation-control MMIO registers.
//!
//! `Soc::step` advances every component by one clock edge. All
//! responses are sampled before any component is clocked, so each
//! model only ever sees values registered on the previous edge.

use queues::{IsQueue, Queue};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::bus::{
    assert_single_completion, Arbiter, BusRequest, FetchTarget, Interconnect, MapError,
    MemoryMap, Region, Target,
};
use crate::config::SocConfig;
use crate::dma::Dma;
use crate::hart::Hart;
use crate::periph::{Gpio, MemoryError, NpuSink, Ram, Rom, UartController, UartRx, UartTx, Vga};
use crate::register_file::RegisterError;

#[derive(Error, PartialEq, Eq, Debug)]
pub enum SimError {
    #[error("no halt after {cycles} cycles")]
    Timeout { cycles: u64 },
    #[error(transparent)]
    Memory(#[from] MemoryError),
    #[error(transparent)]
    Map(#[from] MapError),
}

/// Observable outcome of a completed run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimReport {
    pub cycles: u64,
    pub retired: u64,
    /// Complete lines written to the console register
    pub console: Vec<String>,
    pub debug_ints: Vec<i32>,
    /// Bytes decoded from the UART TX line
    pub uart_output: String,
    pub halted: bool,
}

pub struct Soc {
    config: SocConfig,
    cycle: u64,
    hart: Hart,
    arbiter: Arbiter,
    interconnect: Interconnect,
    rom: Rom,
    ram: Ram,
    uart: UartController,
    gpio: Gpio,
    vga: Vga,
    dma: Dma,
    npu: NpuSink,
    /// Receiver watching the TX line on behalf of the host
    uart_monitor: UartRx,
    uart_output: Queue<u8>,
    /// Transmitter driving the RX line on behalf of the host
    host_tx: UartTx,
    uart_input: Queue<u8>,
    console_line: String,
    console: Vec<String>,
    debug_ints: Vec<i32>,
    halted: bool,
    irq_remaining: u32,
}

impl Soc {
    pub fn new(config: SocConfig) -> Result<Self, SimError> {
        Self::with_interconnect(config, Interconnect::default())
    }

    /// Build a system whose data targets sit at non-standard bases
    pub fn with_data_map(
        config: SocConfig,
        regions: Vec<Region<Target>>,
    ) -> Result<Self, SimError> {
        let data_map = MemoryMap::new(regions)?;
        let interconnect = Interconnect::new(data_map, MemoryMap::standard_fetch());
        Self::with_interconnect(config, interconnect)
    }

    fn with_interconnect(config: SocConfig, interconnect: Interconnect) -> Result<Self, SimError> {
        if config.rom_words == 0 {
            return Err(MemoryError::Empty("ROM").into());
        }
        if config.ram_words == 0 {
            return Err(MemoryError::Empty("RAM").into());
        }
        let bit_period = config.bit_period();
        Ok(Self {
            cycle: 0,
            hart: Hart::new(config.boot_pc),
            arbiter: Arbiter::new(),
            interconnect,
            rom: Rom::new(config.rom_words),
            ram: Ram::new(config.ram_words),
            uart: UartController::new(bit_period),
            gpio: Gpio::new(),
            vga: Vga::new(),
            dma: Dma::new(),
            npu: NpuSink::new(),
            uart_monitor: UartRx::new(bit_period),
            uart_output: Queue::new(),
            host_tx: UartTx::new(bit_period),
            uart_input: Queue::new(),
            console_line: String::new(),
            console: Vec::new(),
            debug_ints: Vec::new(),
            halted: false,
            irq_remaining: 0,
            config,
        })
    }

    pub fn load_rom(&mut self, image: &[u32]) -> Result<(), SimError> {
        self.rom.load(image)?;
        Ok(())
    }

    /// Copy an image into RAM starting at a word offset
    pub fn load_ram(&mut self, word_offset: usize, image: &[u32]) -> Result<(), SimError> {
        self.ram.mem_mut().load(word_offset, image)?;
        Ok(())
    }

    pub fn config(&self) -> &SocConfig {
        &self.config
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn halted(&self) -> bool {
        self.halted
    }

    pub fn hart(&self) -> &Hart {
        &self.hart
    }

    pub fn register(&self, which: usize) -> Result<u32, RegisterError> {
        self.hart.registers().try_read(which)
    }

    pub fn ram(&self) -> &Ram {
        &self.ram
    }

    pub fn ram_mut(&mut self) -> &mut Ram {
        &mut self.ram
    }

    pub fn gpio(&self) -> &Gpio {
        &self.gpio
    }

    pub fn gpio_mut(&mut self) -> &mut Gpio {
        &mut self.gpio
    }

    pub fn vga(&self) -> &Vga {
        &self.vga
    }

    pub fn dma(&self) -> &Dma {
        &self.dma
    }

    pub fn npu_mut(&mut self) -> &mut NpuSink {
        &mut self.npu
    }

    pub fn console(&self) -> &[String] {
        &self.console
    }

    pub fn debug_ints(&self) -> &[i32] {
        &self.debug_ints
    }

    /// Level of the interrupt line driven by the trigger register
    pub fn timer_irq(&self) -> bool {
        self.irq_remaining > 0
    }

    /// Queue bytes for the host to send on the RX line
    pub fn send_uart(&mut self, bytes: &[u8]) {
        for byte in bytes {
            // Unbounded queue
            let _ = self.uart_input.add(*byte);
        }
    }

    /// Remove and return everything received on the TX line so far
    pub fn flush_uart_output(&mut self) -> String {
        let mut bytes = Vec::with_capacity(self.uart_output.size());
        while let Ok(byte) = self.uart_output.remove() {
            bytes.push(byte);
        }
        String::from_utf8_lossy(&bytes).into_owned()
    }

    /// Advance the whole system by one clock edge
    pub fn step(&mut self) {
        self.irq_remaining = self.irq_remaining.saturating_sub(1);
        let ic = &self.interconnect;

        let fetch_req = self.hart.fetch_request();
        let fetch_resp = ic.fetch_response(&fetch_req, |target| match target {
            FetchTarget::Rom => self.rom.fetch_response(),
            FetchTarget::Ram => self.ram.fetch_response(),
        });

        let m0 = self.hart.data_request();
        let m1 = self.dma.master_request();
        let m0_resp = self.arbiter.m0_response();
        let m1_resp = self.arbiter.m1_response();
        assert_single_completion(&m0_resp, &m1_resp);

        let s_req = self.arbiter.slave_request();
        let s_resp = ic.data_response(&s_req, |target| match target {
            Target::Rom => self.rom.data_response(),
            Target::Uart => self.uart.response(),
            Target::Gpio => self.gpio.response(),
            Target::Vga => self.vga.response(),
            Target::DmaConfig => self.dma.csr_response(),
            Target::Ram => self.ram.data_response(),
            Target::Npu => self.npu.response(),
        });
        if s_req.is_write() && s_resp.ready {
            self.snoop(&s_req);
        }

        let tx_line = self.uart.tx_line();
        let rx_line = if self.config.uart_loopback {
            tx_line
        } else {
            self.host_tx.line()
        };

        self.hart.clock_edge(&fetch_resp, &m0_resp);
        self.arbiter.clock_edge(&m0, &m1, &s_resp);

        let ic = &self.interconnect;
        self.rom.clock_edge(
            &ic.fetch_request_for(&fetch_req, FetchTarget::Rom),
            &ic.request_for(&s_req, Target::Rom),
        );
        self.ram.clock_edge(
            &ic.fetch_request_for(&fetch_req, FetchTarget::Ram),
            &ic.request_for(&s_req, Target::Ram),
        );
        self.uart.clock_edge(&ic.request_for(&s_req, Target::Uart), rx_line);
        self.gpio.clock_edge(&ic.request_for(&s_req, Target::Gpio));
        self.vga.clock_edge(&ic.request_for(&s_req, Target::Vga));
        self.npu.clock_edge(&ic.request_for(&s_req, Target::Npu));
        self.dma
            .clock_edge(&ic.request_for(&s_req, Target::DmaConfig), &m1_resp);

        self.uart_monitor.clock_edge(tx_line);
        if let Some(byte) = self.uart_monitor.data_valid() {
            let _ = self.uart_output.add(byte);
        }
        self.clock_host_tx();
        self.cycle += 1;
    }

    fn clock_host_tx(&mut self) {
        let next = if self.host_tx.busy() {
            None
        } else {
            self.uart_input.remove().ok()
        };
        self.host_tx.clock_edge(next.is_some(), next.unwrap_or(0));
    }

    /// Act on an accepted write to one of the simulation-control
    /// addresses. The write still reaches whatever target is mapped
    /// there.
    fn snoop(&mut self, req: &BusRequest) {
        let addr = req.addr & !0b11;
        if addr == self.config.console_addr() {
            match req.wdata as u8 {
                b'\n' => {
                    let line = std::mem::take(&mut self.console_line);
                    info!(line = line.as_str(), "console");
                    self.console.push(line);
                }
                c => self.console_line.push(char::from(c)),
            }
        } else if addr == self.config.debug_int_addr() {
            let value = req.wdata as i32;
            info!(value, "debug int");
            self.debug_ints.push(value);
        } else if addr == self.config.halt_addr() {
            info!(cycle = self.cycle, "halt");
            self.halted = true;
        } else if addr == self.config.irq_trigger_addr {
            debug!(cycles = self.config.irq_pulse_cycles, "timer interrupt triggered");
            self.irq_remaining = self.config.irq_pulse_cycles;
        }
    }

    /// Step until the program writes the halt register or the cycle
    /// budget runs out
    pub fn run(&mut self) -> Result<SimReport, SimError> {
        while !self.halted {
            if self.cycle >= self.config.max_cycles {
                warn!(
                    cycles = self.cycle,
                    pc = format_args!("{:#010x}", self.hart.pc()),
                    "timeout"
                );
                return Err(SimError::Timeout { cycles: self.cycle });
            }
            self.step();
        }
        Ok(self.report())
    }

    pub fn report(&mut self) -> SimReport {
        SimReport {
            cycles: self.cycle,
            retired: self.hart.retired(),
            console: self.console.clone(),
            debug_ints: self.debug_ints.clone(),
            uart_output: self.flush_uart_output(),
            halted: self.halted,
        }
    }
}
