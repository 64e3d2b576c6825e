//! C64 Direct-to-TV memory map.
//!
//! The DTV extends the C64 PLA rows with 2 MB of RAM and 2 MB of flash.
//! CPU registers 12-15 place each 16K window anywhere in either space,
//! register 8 picks RAM or flash per window, and the $D100 mapper moves
//! the KERNAL and BASIC areas. The flash is an AT49-family part driven
//! through its command state machine.

pub mod config;
pub mod flash;
pub mod io;
pub mod mapper;
pub mod meminit;
mod memory;
pub mod registers;

pub use config::{C64DtvConfig, DtvRevision};
pub use flash::{FLASH_SIZE, Flash, FlashState};
pub use io::DtvIo;
pub use mapper::{MapTarget, MemoryMapper};
pub use meminit::{Read, Source, Tables, Write};
pub use memory::{
    BANK_CART, BANK_CPU, BANK_IO, BANK_RAM, BANK_RAM00, BANK_ROM, BANK_ROM00, C64DtvMemory,
    COLOR_RAM,
};
pub use registers::{DtvRegisters, SegmentAccess};
