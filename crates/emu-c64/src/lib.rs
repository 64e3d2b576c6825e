//! Commodore 64 memory map.
//!
//! The 6510 port at $00/$01 and the cartridge EXROM/GAME lines select one
//! of 32 PLA configurations. Each configuration is a precomputed row of
//! page handlers, so a bank switch costs one index update and every access
//! is a table lookup plus a match.

pub mod config;
pub mod meminit;
mod memory;

pub use config::{BoardType, C64Config, C64Model};
pub use meminit::{Read, Source, Tables, Write};
pub use memory::{
    BANK_CART, BANK_CPU, BANK_IO, BANK_RAM, BANK_ROM, C64Memory, ScreenParams,
};
