//! DTV CPU extension registers that steer the memory map.
//!
//! The DTV's 6510 core has sixteen extra registers. Those the memory map
//! cares about:
//!
//! | reg | use                                                   |
//! |-----|-------------------------------------------------------|
//! | 8   | ROM/RAM access per 16K bank, two bits each (00 = ROM) |
//! | 9   | bit 0 skip internal cycles, bit 1 burst fetch         |
//! | 10  | zero page segment (256-byte units)                    |
//! | 11  | stack page segment (256-byte units)                   |
//! | 12-15 | physical 16K segment for CPU banks 0-3              |

/// Size of the physical RAM and flash address spaces.
pub const PHYS_SIZE: usize = 0x20_0000;

pub const ACCESS_MODE: usize = 8;
pub const SKIP_BURST: usize = 9;
pub const ZERO_PAGE: usize = 10;
pub const STACK_PAGE: usize = 11;
pub const BANK_SEGMENT: usize = 12;

/// Where a CPU bank's accesses go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentAccess {
    /// Flash, straight through the command state machine.
    Rom,
    /// RAM, with the C64 memory map over the first 64K.
    Ram,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DtvRegisters {
    regs: [u8; 16],
}

impl Default for DtvRegisters {
    fn default() -> Self {
        Self::new()
    }
}

impl DtvRegisters {
    #[must_use]
    pub fn new() -> Self {
        let mut regs = Self { regs: [0; 16] };
        regs.reset();
        regs
    }

    /// Power-on values: all banks RAM, identity segment mapping, stack at
    /// page 1.
    pub fn reset(&mut self) {
        self.regs = [0; 16];
        self.regs[ACCESS_MODE] = 0x55;
        self.regs[STACK_PAGE] = 1;
        for bank in 0..4 {
            self.regs[BANK_SEGMENT + bank] = bank as u8;
        }
    }

    #[must_use]
    pub fn get(&self, reg: usize) -> u8 {
        self.regs[reg & 0x0F]
    }

    pub fn set(&mut self, reg: usize, value: u8) {
        self.regs[reg & 0x0F] = value;
    }

    /// Access mode of the bank holding `addr`. Only `00` selects ROM.
    #[must_use]
    pub fn access(&self, addr: u16) -> SegmentAccess {
        let bank = addr >> 14;
        if (self.regs[ACCESS_MODE] >> (bank * 2)) & 0x03 == 0 {
            SegmentAccess::Rom
        } else {
            SegmentAccess::Ram
        }
    }

    #[must_use]
    pub fn is_rom(&self, addr: u16) -> bool {
        self.access(addr) == SegmentAccess::Rom
    }

    /// Physical start of the segment mapped at CPU bank `bank`.
    #[must_use]
    pub fn segment_base(&self, bank: usize) -> usize {
        (usize::from(self.regs[BANK_SEGMENT + (bank & 3)]) << 14) & (PHYS_SIZE - 1)
    }

    /// CPU address to physical address.
    #[must_use]
    pub fn paddr(&self, addr: u16) -> usize {
        (self.segment_base(usize::from(addr >> 14)) + usize::from(addr & 0x3FFF)) & (PHYS_SIZE - 1)
    }

    #[must_use]
    pub fn skip_cycle(&self) -> bool {
        self.regs[SKIP_BURST] & 0x01 != 0
    }

    #[must_use]
    pub fn burst(&self) -> bool {
        self.regs[SKIP_BURST] & 0x02 != 0
    }

    /// CPU address of a zero page operand after relocation.
    #[must_use]
    pub fn zero_page_addr(&self, offset: u8) -> u16 {
        (u16::from(self.regs[ZERO_PAGE]) << 8) | u16::from(offset)
    }

    /// CPU address of a stack slot after relocation.
    #[must_use]
    pub fn stack_addr(&self, sp: u8) -> u16 {
        (u16::from(self.regs[STACK_PAGE]) << 8) | u16::from(sp)
    }
}
