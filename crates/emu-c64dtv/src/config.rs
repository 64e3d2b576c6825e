//! C64DTV configuration: board revision and flash image.

use commodore_banking::{Result, check_rom};

use crate::flash::FLASH_SIZE;

/// DTV board revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DtvRevision {
    V2Pal,
    V2Ntsc,
    #[default]
    V3Pal,
    V3Ntsc,
    /// Hummer game console (DTV3 core).
    Hummer,
}

/// Configuration for constructing a DTV memory map.
#[derive(Debug, Clone)]
pub struct C64DtvConfig {
    pub revision: DtvRevision,
    /// Flash image (2 MB). KERNAL at $E000, BASIC at $A000 and the
    /// character sets at $1000 and $D000 of the first segment.
    pub flash: Vec<u8>,
}

impl C64DtvConfig {
    pub(crate) fn check(&self) -> Result<()> {
        check_rom("flash", &self.flash, FLASH_SIZE)
    }
}
