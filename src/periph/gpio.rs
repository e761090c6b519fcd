//! GPIO block: 16 LEDs (read/write at +0x0) and 16 switches
//! (read-only at +0x4).

use crate::bus::{BusRequest, BusResponse, RegisteredReady};
use crate::utils::merge_bytes;

pub const GPIO_LEDS: u32 = 0x0;
pub const GPIO_SWITCHES: u32 = 0x4;

#[derive(Debug, Default, Clone)]
pub struct Gpio {
    leds: u16,
    switches: u16,
    rdata: u32,
    handshake: RegisteredReady,
}

impl Gpio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn leds(&self) -> u16 {
        self.leds
    }

    /// Drive the switch inputs
    pub fn set_switches(&mut self, value: u16) {
        self.switches = value;
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
        let offset = req.addr & 0xf;
        self.rdata = match offset {
            GPIO_LEDS => u32::from(self.leds),
            GPIO_SWITCHES => u32::from(self.switches),
            _ => 0,
        };
        if req.we != 0 && offset == GPIO_LEDS {
            self.leds = merge_bytes(u32::from(self.leds), req.wdata, req.we) as u16;
        }
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    fn access(gpio: &mut Gpio, req: BusRequest) -> u32 {
        gpio.clock_edge(&req);
        let resp = gpio.response();
        assert!(resp.ready);
        gpio.clock_edge(&req);
        resp.rdata
    }

    #[test]
    fn check_leds_reset_to_zero() {
        let mut gpio = Gpio::new();
        assert_eq!(access(&mut gpio, BusRequest::read(0x2000_0000)), 0);
    }

    #[test]
    fn check_led_write_then_read() {
        let mut gpio = Gpio::new();
        access(&mut gpio, BusRequest::write(0x2000_0000, 0xdead_a5a5, 0xf));
        assert_eq!(gpio.leds(), 0xa5a5);
        assert_eq!(access(&mut gpio, BusRequest::read(0x2000_0000)), 0xa5a5);
    }

    #[test]
    fn check_switches_are_read_only() {
        let mut gpio = Gpio::new();
        gpio.set_switches(0x00f0);
        access(&mut gpio, BusRequest::write(0x2000_0004, 0xffff, 0xf));
        assert_eq!(access(&mut gpio, BusRequest::read(0x2000_0004)), 0x00f0);
        assert_eq!(gpio.leds(), 0);
    }
}
