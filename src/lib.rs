#![forbid(unsafe_code)]

pub mod bus;
pub mod config;
pub mod dma;
pub mod encode;
pub mod hart;
pub mod lsu;
pub mod opcodes;
pub mod periph;
pub mod programs;
pub mod register_file;
pub mod semantics;
pub mod soc;

pub mod utils;
