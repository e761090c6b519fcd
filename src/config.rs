/// Offsets of the simulation-control registers from `mmio_base`
pub const CONSOLE_OFFSET: u32 = 0x0;
pub const DEBUG_INT_OFFSET: u32 = 0x4;
pub const HALT_OFFSET: u32 = 0x8;

/// Deployment constants of one simulated system
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocConfig {
    pub clock_hz: u32,
    pub baud: u32,
    /// Base of the console/debug-int/halt registers
    pub mmio_base: u32,
    pub irq_trigger_addr: u32,
    /// Length of the timer interrupt pulse in clock cycles
    pub irq_pulse_cycles: u32,
    /// Cycle budget for `Soc::run`
    pub max_cycles: u64,
    pub rom_words: usize,
    pub ram_words: usize,
    pub boot_pc: u32,
    /// Feed the UART transmitter back into its own receiver
    pub uart_loopback: bool,
}

impl Default for SocConfig {
    fn default() -> Self {
        Self {
            clock_hz: 100_000_000,
            baud: 115_200,
            mmio_base: 0x1000_0000,
            irq_trigger_addr: 0x2000_0000,
            irq_pulse_cycles: 100,
            max_cycles: 1_000_000,
            rom_words: 1024,
            ram_words: 4096,
            boot_pc: 0x0000_0000,
            uart_loopback: false,
        }
    }
}

impl SocConfig {
    /// Clocks per UART bit, clock_hz / baud rounded to nearest
    pub fn bit_period(&self) -> u32 {
        let baud = u64::from(self.baud.max(1));
        let period = (u64::from(self.clock_hz) + baud / 2) / baud;
        period.clamp(1, u64::from(u32::MAX)) as u32
    }

    pub fn console_addr(&self) -> u32 {
        self.mmio_base.wrapping_add(CONSOLE_OFFSET)
    }

    pub fn debug_int_addr(&self) -> u32 {
        self.mmio_base.wrapping_add(DEBUG_INT_OFFSET)
    }

    pub fn halt_addr(&self) -> u32 {
        self.mmio_base.wrapping_add(HALT_OFFSET)
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn check_default_bit_period() {
        assert_eq!(SocConfig::default().bit_period(), 868);
    }

    #[test]
    fn check_bit_period_rounds() {
        let config = SocConfig {
            clock_hz: 1_000,
            baud: 300,
            ..Default::default()
        };
        assert_eq!(config.bit_period(), 3);
        let config = SocConfig {
            clock_hz: 10,
            baud: 1_000,
            ..Default::default()
        };
        assert_eq!(config.bit_period(), 1);
    }

    #[test]
    fn check_mmio_addresses() {
        let config = SocConfig::default();
        assert_eq!(config.console_addr(), 0x1000_0000);
        assert_eq!(config.debug_int_addr(), 0x1000_0004);
        assert_eq!(config.halt_addr(), 0x1000_0008);
    }
}
