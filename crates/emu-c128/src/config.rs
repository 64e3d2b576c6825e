//! C128 configuration: model selection and ROM images.

use commodore_banking::{Result, check_rom};

/// C128 model variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum C128Model {
    /// PAL C128 (8564 VIC-IIe).
    #[default]
    C128Pal,
    /// NTSC C128 (8563 VIC-IIe).
    C128Ntsc,
    /// C128D with metal case (PAL).
    C128DcrPal,
    /// C128D with metal case (NTSC).
    C128DcrNtsc,
}

/// Configuration for constructing a C128 memory map.
#[derive(Debug, Clone)]
pub struct C128Config {
    pub model: C128Model,
    /// US/international machine. National machines switch the character
    /// ROM half with the CAPS (ASCII/DIN) key instead.
    pub international: bool,
    /// BASIC low ROM, $4000-$7FFF (16,384 bytes).
    pub basic_lo_rom: Vec<u8>,
    /// BASIC high ROM, $8000-$BFFF (16,384 bytes).
    pub basic_hi_rom: Vec<u8>,
    /// Kernal image (16,384 bytes): screen editor, Z80 BIOS, then the
    /// 8K kernal proper.
    pub kernal_rom: Vec<u8>,
    /// Character ROM, both halves (8,192 bytes).
    pub char_rom: Vec<u8>,
    /// C64 mode BASIC (8,192 bytes).
    pub basic64_rom: Vec<u8>,
    /// C64 mode Kernal (8,192 bytes).
    pub kernal64_rom: Vec<u8>,
    /// Internal function ROM socket (empty or 32,768 bytes).
    pub int_function_rom: Vec<u8>,
    /// External function ROM (empty or 32,768 bytes).
    pub ext_function_rom: Vec<u8>,
}

pub(crate) const FUNCTION_ROM_SIZE: usize = 0x8000;

impl C128Config {
    pub(crate) fn check(&self) -> Result<()> {
        check_rom("BASIC low", &self.basic_lo_rom, 0x4000)?;
        check_rom("BASIC high", &self.basic_hi_rom, 0x4000)?;
        check_rom("kernal", &self.kernal_rom, 0x4000)?;
        check_rom("character", &self.char_rom, 0x2000)?;
        check_rom("C64 BASIC", &self.basic64_rom, 0x2000)?;
        check_rom("C64 kernal", &self.kernal64_rom, 0x2000)?;
        if !self.int_function_rom.is_empty() {
            check_rom("internal function", &self.int_function_rom, FUNCTION_ROM_SIZE)?;
        }
        if !self.ext_function_rom.is_empty() {
            check_rom("external function", &self.ext_function_rom, FUNCTION_ROM_SIZE)?;
        }
        Ok(())
    }
}
