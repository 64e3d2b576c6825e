//! Commodore 128 memory map.
//!
//! The 8722 MMU configuration register picks one of 128 native rows; the
//! RAM configuration register adds common RAM at either end and the page
//! pointers relocate pages 0 and 1. Setting the C64 mode bit hands control
//! to the C64 PLA rows, selected by the 8502 port and the cartridge lines.

pub mod config;
pub mod io;
pub mod meminit;
mod memory;

pub use config::{C128Config, C128Model};
pub use io::C128Io;
pub use meminit::{HighArea, IoDevice, Read, Source, Tables, Write};
pub use memory::{
    BANK_C64ROM, BANK_CART, BANK_CPU, BANK_EXTFUNC, BANK_INTFUNC, BANK_IO, BANK_RAM, BANK_RAM1,
    BANK_ROM, BANK_VDC, C128Memory,
};
