//! 8N1 UART: bit-serial transmitter and receiver plus the two-register
//! CSR block that exposes them on the bus.
//!
//! | Offset | Read                       | Write                  |
//! |--------|----------------------------|------------------------|
//! | 0x0    | last received byte, clears RX_READY | transmit low byte |
//! | 0x4    | bit0 TX_BUSY, bit1 RX_READY | ignored               |

use tracing::debug;

use crate::bus::{BusRequest, BusResponse, RegisteredReady};

pub const UART_DATA: u32 = 0x0;
pub const UART_STATUS: u32 = 0x4;

pub const STATUS_TX_BUSY: u32 = 1 << 0;
pub const STATUS_RX_READY: u32 = 1 << 1;

/// Position within a serial frame
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum FrameState {
    #[default]
    Idle,
    Start,
    Data(u8),
    Stop,
}

/// Serialises one byte per start pulse: a low start bit, eight data
/// bits LSB first and a high stop bit, each held for `bit_period`
/// clocks. Busy for exactly ten bit periods.
#[derive(Debug, Clone)]
pub struct UartTx {
    bit_period: u32,
    state: FrameState,
    counter: u32,
    shift: u8,
    line: bool,
}

impl UartTx {
    pub fn new(bit_period: u32) -> Self {
        Self {
            bit_period: bit_period.max(1),
            state: FrameState::Idle,
            counter: 0,
            shift: 0,
            line: true,
        }
    }

    /// Level on the TX wire (idle high)
    pub fn line(&self) -> bool {
        self.line
    }

    pub fn busy(&self) -> bool {
        self.state != FrameState::Idle
    }

    /// A start pulse while busy is ignored
    pub fn clock_edge(&mut self, start: bool, byte: u8) {
        if self.state == FrameState::Idle {
            if start {
                debug!(byte, "uart tx start");
                self.shift = byte;
                self.state = FrameState::Start;
                self.counter = 0;
                self.line = false;
            }
            return;
        }

        if self.counter + 1 < self.bit_period {
            self.counter += 1;
            return;
        }
        self.counter = 0;
        (self.state, self.line) = match self.state {
            FrameState::Start => (FrameState::Data(0), self.shift & 1 == 1),
            FrameState::Data(7) => (FrameState::Stop, true),
            FrameState::Data(n) => (FrameState::Data(n + 1), (self.shift >> (n + 1)) & 1 == 1),
            FrameState::Stop | FrameState::Idle => (FrameState::Idle, true),
        };
    }
}

/// Deserialises 8N1 frames, sampling each bit at the centre of its
/// period. `data_valid` holds the byte for the single cycle after its
/// stop bit is sampled. Frames with a low stop bit are discarded.
#[derive(Debug, Clone)]
pub struct UartRx {
    bit_period: u32,
    state: FrameState,
    counter: u32,
    shift: u8,
    valid: Option<u8>,
}

impl UartRx {
    pub fn new(bit_period: u32) -> Self {
        Self {
            bit_period: bit_period.max(1),
            state: FrameState::Idle,
            counter: 0,
            shift: 0,
            valid: None,
        }
    }

    pub fn data_valid(&self) -> Option<u8> {
        self.valid
    }

    /// Sample the RX wire
    pub fn clock_edge(&mut self, line: bool) {
        self.valid = None;
        match self.state {
            FrameState::Idle => {
                if !line {
                    self.state = FrameState::Start;
                    self.counter = 0;
                    self.shift = 0;
                }
            }
            FrameState::Start => {
                if self.counter < (self.bit_period - 1) / 2 {
                    self.counter += 1;
                } else if line {
                    // Glitch rather than a start bit
                    self.state = FrameState::Idle;
                } else {
                    self.state = FrameState::Data(0);
                    self.counter = 0;
                }
            }
            FrameState::Data(n) => {
                if self.counter + 1 < self.bit_period {
                    self.counter += 1;
                } else {
                    self.counter = 0;
                    self.shift |= u8::from(line) << n;
                    self.state = if n == 7 {
                        FrameState::Stop
                    } else {
                        FrameState::Data(n + 1)
                    };
                }
            }
            FrameState::Stop => {
                if self.counter + 1 < self.bit_period {
                    self.counter += 1;
                } else {
                    self.state = FrameState::Idle;
                    if line {
                        debug!(byte = self.shift, "uart rx byte");
                        self.valid = Some(self.shift);
                    } else {
                        debug!(byte = self.shift, "uart rx framing error");
                    }
                }
            }
        }
    }
}

/// CSR wrapper around a transmitter/receiver pair
#[derive(Debug, Clone)]
pub struct UartController {
    tx: UartTx,
    rx: UartRx,
    rx_byte: u8,
    rx_ready: bool,
    rdata: u32,
    handshake: RegisteredReady,
}

impl UartController {
    pub fn new(bit_period: u32) -> Self {
        Self {
            tx: UartTx::new(bit_period),
            rx: UartRx::new(bit_period),
            rx_byte: 0,
            rx_ready: false,
            rdata: 0,
            handshake: RegisteredReady::default(),
        }
    }

    pub fn tx_line(&self) -> bool {
        self.tx.line()
    }

    pub fn status(&self) -> u32 {
        let mut status = 0;
        if self.tx.busy() {
            status |= STATUS_TX_BUSY;
        }
        if self.rx_ready {
            status |= STATUS_RX_READY;
        }
        status
    }

    pub fn response(&self) -> BusResponse {
        BusResponse {
            rdata: self.rdata,
            ready: self.handshake.ready(),
        }
    }

    pub fn clock_edge(&mut self, req: &BusRequest, rx_line: bool) {
        let mut send = None;
        if self.handshake.clock_edge(req) {
            let offset = req.addr & 0xf;
            self.rdata = match offset {
                UART_DATA => u32::from(self.rx_byte),
                UART_STATUS => self.status(),
                _ => 0,
            };
            match (offset, req.we != 0) {
                (UART_DATA, true) if self.tx.busy() => {
                    debug!(byte = req.wdata & 0xff, "uart tx busy, byte dropped")
                }
                (UART_DATA, true) => send = Some(req.wdata as u8),
                (UART_DATA, false) => self.rx_ready = false,
                _ => {}
            }
        }

        self.tx.clock_edge(send.is_some(), send.unwrap_or(0));
        self.rx.clock_edge(rx_line);
        if let Some(byte) = self.rx.data_valid() {
            self.rx_byte = byte;
            self.rx_ready = true;
        }
    }
}
