//! C64 configuration: model selection, board type and ROM images.

use commodore_banking::{Result, check_rom};

/// C64 model variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum C64Model {
    /// PAL C64 (6569 VIC-II, 985,248 Hz CPU).
    #[default]
    C64Pal,
    /// NTSC C64 (6567 VIC-II, 1,022,727 Hz CPU).
    C64Ntsc,
}

/// Main board wiring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BoardType {
    /// Standard C64 board.
    #[default]
    Normal,
    /// Ultimax / MAX Machine: 2K RAM, everything above $07FF unconnected.
    Max,
}

/// Configuration for constructing a C64 memory map.
#[derive(Debug, Clone)]
pub struct C64Config {
    /// Model variant.
    pub model: C64Model,
    /// Board wiring.
    pub board: BoardType,
    /// Kernal ROM (8,192 bytes).
    pub kernal_rom: Vec<u8>,
    /// BASIC ROM (8,192 bytes).
    pub basic_rom: Vec<u8>,
    /// Character ROM (4,096 bytes).
    pub char_rom: Vec<u8>,
}

impl C64Config {
    pub(crate) fn check(&self) -> Result<()> {
        check_rom("KERNAL", &self.kernal_rom, 0x2000)?;
        check_rom("BASIC", &self.basic_rom, 0x2000)?;
        check_rom("character", &self.char_rom, 0x1000)
    }
}
