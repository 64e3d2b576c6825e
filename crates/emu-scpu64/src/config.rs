//! SuperCPU64 configuration: board revision, SIMM and ROM images.

use commodore_banking::{BankingError, Result, check_rom};

use crate::simm::SimmSize;

/// Largest EPROM the board decodes.
pub const EPROM_MAX: usize = 0x8_0000;

/// SuperCPU board revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScpuVersion {
    V1,
    /// V2: I/O stores are shadowed into SRAM bank 1 and colour RAM is
    /// read back from there.
    #[default]
    V2,
}

/// Configuration for constructing a SuperCPU64 memory map.
#[derive(Debug, Clone)]
pub struct Scpu64Config {
    pub version: ScpuVersion,
    /// SIMM fitted, in megabytes: 0, 1, 4, 8 or 16.
    pub simm_mb: u32,
    /// SuperCPU EPROM, 64K to 512K. Smaller images repeat.
    pub eprom: Vec<u8>,
    /// Character ROM (4,096 bytes).
    pub char_rom: Vec<u8>,
}

impl Scpu64Config {
    pub(crate) fn check(&self) -> Result<()> {
        SimmSize::from_mb(self.simm_mb)?;
        let len = self.eprom.len();
        if !(0x1_0000..=EPROM_MAX).contains(&len) || !len.is_power_of_two() {
            return Err(BankingError::RomSize {
                name: "SuperCPU",
                expected: EPROM_MAX,
                actual: len,
            });
        }
        check_rom("character", &self.char_rom, 0x1000)
    }

    /// EPROM image repeated to fill the decoded space.
    pub(crate) fn eprom_image(&self) -> Vec<u8> {
        self.eprom.iter().copied().cycle().take(EPROM_MAX).collect()
    }
}
