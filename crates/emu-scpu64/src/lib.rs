//! SuperCPU64 memory map.
//!
//! A 20 MHz 65816 with 128K of SRAM sits in front of the C64. Bank 0
//! follows the C64 rows plus three SuperCPU bits (register enable, DOS
//! extension, boot map), giving 256 configurations. RAM stores are
//! mirrored to the motherboard according to the optimisation mode, which
//! selects the write variant. Banks above 1 reach the SIMM and the EPROM.

pub mod config;
pub mod io;
pub mod meminit;
mod memory;
pub mod registers;
pub mod simm;

pub use config::{EPROM_MAX, Scpu64Config, ScpuVersion};
pub use io::{ScpuIo, Stretch};
pub use meminit::{Read, Source, Store, Tables, Write};
pub use memory::{
    BANK_CART, BANK_CPU, BANK_IO, BANK_RAM, BANK_RAM00, BANK_ROM, BANK_ROMF8, Scpu64Memory,
};
pub use registers::{HwEvent, HwRegisters, Optim};
pub use simm::{Simm, SimmSize};
