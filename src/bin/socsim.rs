use std::process::ExitCode;

use clap::Parser;
use clap_num::maybe_hex;
use itertools::Itertools;
use rvsoc_model::config::SocConfig;
use rvsoc_model::programs::Demo;
use rvsoc_model::soc::Soc;
use tracing_subscriber::EnvFilter;

/// Cycle-level golden model of an RV32I system-on-chip
///
/// Runs one of the built-in programs until it writes the halt
/// register, then prints what it wrote to the console and debug-int
/// registers.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about)]
struct Args {
    /// Program to load into ROM
    #[arg(value_enum, default_value_t = Demo::Fibonacci)]
    program: Demo,

    /// Cycle budget before the run counts as a failure
    #[arg(short, long, default_value_t = 1_000_000)]
    cycles: u64,

    #[arg(long, default_value_t = 100_000_000)]
    clock_hz: u32,

    #[arg(long, default_value_t = 115_200)]
    baud: u32,

    /// Base of the console, debug-int and halt registers
    #[arg(long, value_parser = maybe_hex::<u32>, default_value = "0x10000000")]
    mmio_base: u32,

    /// Address whose write starts the timer interrupt pulse
    #[arg(long, value_parser = maybe_hex::<u32>, default_value = "0x20000000")]
    irq_addr: u32,

    /// Feed the UART transmitter back into its receiver
    #[arg(long)]
    loopback: bool,

    /// Default log filter, overridden by RUST_LOG
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let directive = match args.log_level.parse() {
        Ok(directive) => directive,
        Err(e) => {
            eprintln!("invalid log level '{}': {e}", args.log_level);
            return ExitCode::FAILURE;
        }
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(directive))
        .init();

    let config = SocConfig {
        clock_hz: args.clock_hz,
        baud: args.baud,
        mmio_base: args.mmio_base,
        irq_trigger_addr: args.irq_addr,
        max_cycles: args.cycles,
        uart_loopback: args.loopback,
        ..Default::default()
    };

    let mut soc = match Soc::new(config.clone()) {
        Ok(soc) => soc,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = soc.load_rom(&args.program.image(&config)) {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    match soc.run() {
        Ok(report) => {
            for line in &report.console {
                println!("{line}");
            }
            if !report.debug_ints.is_empty() {
                println!("{}", report.debug_ints.iter().join(", "));
            }
            if !report.uart_output.is_empty() {
                print!("uart: {}", report.uart_output);
            }
            println!(
                "halted after {} cycles, {} instructions retired",
                report.cycles, report.retired
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{e}");
            eprintln!("{}", soc.hart());
            ExitCode::FAILURE
        }
    }
}
