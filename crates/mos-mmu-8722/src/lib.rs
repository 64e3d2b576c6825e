//! MOS 8722 Memory Management Unit (C128).
//!
//! The MMU decides what the 8502 sees in each part of its 64K window and
//! where the zero page and stack live.
//!
//! | Address | Register | Function |
//! |---------|----------|----------|
//! | $D500   | CR       | Configuration register |
//! | $D501-4 | PCR A-D  | Preset configurations |
//! | $D505   | MCR      | Mode configuration |
//! | $D506   | RCR      | RAM configuration (shared RAM, VIC bank) |
//! | $D507   | P0L      | Page 0 pointer low (commits P0H) |
//! | $D508   | P0H      | Page 0 pointer high (latched) |
//! | $D509   | P1L      | Page 1 pointer low (commits P1H) |
//! | $D50A   | P1H      | Page 1 pointer high (latched) |
//! | $D50B   | VR       | Version, reads $20 |
//!
//! The load configuration registers at $FF00-$FF04 are visible in every
//! configuration: $FF00 is CR itself, and a write to $FF01-$FF04 copies
//! the matching PCR into CR.
//!
//! CR layout:
//!
//! | Bit | Function |
//! |-----|----------|
//! | 0   | 0 = I/O at $D000-$DFFF |
//! | 1   | $4000-$7FFF: 0 = BASIC low ROM, 1 = RAM |
//! | 2-3 | $8000-$BFFF: 00 = BASIC high ROM, 01 = internal, 10 = external, 11 = RAM |
//! | 4-5 | $C000-$FFFF: 00 = system ROM, 01 = internal, 10 = external, 11 = RAM |
//! | 6   | RAM bank |
//! | 7   | RAM bank (256K, not fitted) |

#![allow(clippy::cast_possible_truncation)]

use bitflags::bitflags;

/// MMU register addresses (low byte).
pub const CR: u8 = 0x00;
pub const PCRA: u8 = 0x01;
pub const MCR: u8 = 0x05;
pub const RCR: u8 = 0x06;
pub const P0L: u8 = 0x07;
pub const P0H: u8 = 0x08;
pub const P1L: u8 = 0x09;
pub const P1H: u8 = 0x0A;
pub const VR: u8 = 0x0B;

/// Value read from the version register.
pub const VERSION: u8 = 0x20;

bitflags! {
    /// Mode configuration register ($D505).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ModeConfig: u8 {
        /// 1 = 8502, 0 = Z80.
        const CPU_8502 = 0x01;
        /// Fast serial direction (1 = output).
        const FSDIR = 0x08;
        /// Cartridge /GAME input.
        const GAME = 0x10;
        /// Cartridge /EXROM input.
        const EXROM = 0x20;
        /// C64 mode.
        const C64_MODE = 0x40;
        /// 40/80 DISPLAY key (0 = pressed).
        const KEY_40_80 = 0x80;
    }
}

bitflags! {
    /// RAM configuration register ($D506).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RamConfig: u8 {
        const SIZE = 0x03;
        const BOTTOM_SHARED = 0x04;
        const TOP_SHARED = 0x08;
        const VIC_BANK = 0x40;
        /// VIC bank bit for 256K machines.
        const VIC_BANK_HI = 0x80;
    }
}

bitflags! {
    /// What a register store changed. The memory engine acts on each.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct MmuEvent: u8 {
        /// CR changed: re-select the dispatch row.
        const CONFIG = 0x01;
        /// RCR changed: recompute the shared RAM limits.
        const RAM_CONFIG = 0x02;
        /// A page pointer was committed.
        const PAGES = 0x04;
        /// C64 mode bit was set.
        const MODE_CHANGED = 0x08;
        /// The active CPU changed.
        const CPU_CHANGED = 0x10;
        /// Fast serial direction changed.
        const FAST_SERIAL_DIR = 0x20;
    }
}

/// Common RAM boundaries derived from RCR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SharedLimits {
    /// Addresses above this are common RAM.
    pub top: u16,
    /// Addresses below this are common RAM.
    pub bottom: u16,
}

impl SharedLimits {
    /// No common RAM at either end.
    pub const NONE: Self = Self {
        top: 0xFFFF,
        bottom: 0,
    };

    #[must_use]
    pub fn from_rcr(rcr: u8) -> Self {
        let size: u16 = match rcr & RamConfig::SIZE.bits() {
            0 => 0x0400,
            n => 0x1000 << (n - 1),
        };
        let flags = RamConfig::from_bits_truncate(rcr);
        Self {
            top: if flags.contains(RamConfig::TOP_SHARED) {
                0xFFFF - size
            } else {
                0xFFFF
            },
            bottom: if flags.contains(RamConfig::BOTTOM_SHARED) {
                size
            } else {
                0
            },
        }
    }
}

/// Page pointer latch state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LatchState {
    #[default]
    Idle,
    /// A high byte is waiting for the low byte write.
    Latched(u8),
}

/// One relocatable page pointer (P0 or P1).
///
/// Writing the high register only arms the latch. The next low register
/// write commits both halves at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageLatch {
    low: u8,
    high: u8,
    state: LatchState,
}

impl PageLatch {
    fn with_low(low: u8) -> Self {
        Self {
            low,
            ..Self::default()
        }
    }

    pub fn store_high(&mut self, value: u8) {
        self.state = LatchState::Latched(value);
    }

    pub fn store_low(&mut self, value: u8) {
        self.low = value;
        if let LatchState::Latched(high) = self.state {
            self.high = high;
        }
        self.state = LatchState::Idle;
    }

    #[must_use]
    pub fn low(&self) -> u8 {
        self.low
    }

    /// Committed high byte.
    #[must_use]
    pub fn high(&self) -> u8 {
        self.high
    }

    #[must_use]
    pub fn state(&self) -> LatchState {
        self.state
    }

    /// Physical address of the relocated page (bank bit 16).
    #[must_use]
    pub fn address(&self) -> u32 {
        (u32::from(self.high & 1) << 16) | (u32::from(self.low) << 8)
    }
}

/// MOS 8722 register file.
#[derive(Debug, Clone)]
pub struct Mmu {
    /// Configuration register.
    pub cr: u8,
    /// Preset configuration registers A-D.
    pub pcr: [u8; 4],
    /// Mode configuration register as written.
    pub mcr: u8,
    /// RAM configuration register.
    pub rcr: u8,
    /// Page 0 pointer.
    pub p0: PageLatch,
    /// Page 1 pointer.
    pub p1: PageLatch,
    /// 40/80 DISPLAY key is down.
    key_40_80: bool,
    /// Cartridge lines as seen on the MCR inputs (true = asserted).
    game: bool,
    exrom: bool,
    z80_warned: bool,
}

impl Default for Mmu {
    fn default() -> Self {
        Self::new()
    }
}

impl Mmu {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cr: 0,
            pcr: [0; 4],
            mcr: 0,
            rcr: 0,
            p0: PageLatch::default(),
            p1: PageLatch::with_low(1),
            key_40_80: false,
            game: false,
            exrom: false,
            z80_warned: false,
        }
    }

    /// Power-on state. Only P1L is non-zero, so the stack is at $0100.
    pub fn reset(&mut self) {
        self.cr = 0;
        self.pcr = [0; 4];
        self.mcr = 0;
        self.rcr = 0;
        self.p0 = PageLatch::default();
        self.p1 = PageLatch::with_low(1);
    }

    /// Read $D500-$D5FF.
    #[must_use]
    pub fn read(&self, addr: u16) -> u8 {
        match (addr & 0xFF) as u8 {
            CR => self.cr,
            reg @ 0x01..=0x04 => self.pcr[usize::from(reg - PCRA)],
            MCR => self.read_mcr(),
            RCR => self.rcr | 0x30,
            P0L => self.p0.low(),
            P0H => self.p0.high() | 0xF0,
            P1L => self.p1.low(),
            P1H => self.p1.high() | 0xF0,
            VR => VERSION,
            _ => 0xFF,
        }
    }

    fn read_mcr(&self) -> u8 {
        let mut value = (self.mcr & 0x49) | 0x06;
        if !self.game {
            value |= ModeConfig::GAME.bits();
        }
        if !self.exrom {
            value |= ModeConfig::EXROM.bits();
        }
        if !self.key_40_80 {
            value |= ModeConfig::KEY_40_80.bits();
        }
        value
    }

    /// Write $D500-$D5FF.
    pub fn write(&mut self, addr: u16, value: u8) -> MmuEvent {
        if !self.is_8502() && !self.z80_warned {
            // Z80 writes take the 8502 path; unverified on hardware
            log::warn!("MMU write at ${addr:04X} while the Z80 is active");
            self.z80_warned = true;
        }
        match (addr & 0xFF) as u8 {
            CR => self.set_cr(value),
            reg @ 0x01..=0x04 => {
                self.pcr[usize::from(reg - PCRA)] = value;
                MmuEvent::empty()
            }
            MCR => self.write_mcr(value),
            RCR => {
                if self.rcr == value {
                    return MmuEvent::empty();
                }
                self.rcr = value;
                MmuEvent::RAM_CONFIG
            }
            P0L => {
                self.p0.store_low(value);
                MmuEvent::PAGES
            }
            P0H => {
                self.p0.store_high(value);
                MmuEvent::empty()
            }
            P1L => {
                self.p1.store_low(value);
                MmuEvent::PAGES
            }
            P1H => {
                self.p1.store_high(value);
                MmuEvent::empty()
            }
            _ => MmuEvent::empty(),
        }
    }

    fn write_mcr(&mut self, value: u8) -> MmuEvent {
        let old = self.mcr;
        self.mcr = value;
        let changed = old ^ value;
        let mut events = MmuEvent::empty();
        if changed & ModeConfig::CPU_8502.bits() != 0 {
            events |= MmuEvent::CPU_CHANGED;
        }
        if changed & ModeConfig::FSDIR.bits() != 0 {
            events |= MmuEvent::FAST_SERIAL_DIR;
        }
        if value & ModeConfig::C64_MODE.bits() != 0 && old & ModeConfig::C64_MODE.bits() == 0 {
            events |= MmuEvent::MODE_CHANGED;
        }
        events
    }

    fn set_cr(&mut self, value: u8) -> MmuEvent {
        self.cr = value;
        MmuEvent::CONFIG
    }

    /// Read $FF00-$FF04.
    #[must_use]
    pub fn read_lcr(&self, addr: u16) -> u8 {
        match addr & 0xFF {
            0 => self.cr,
            n @ 1..=4 => self.pcr[usize::from(n as u8 - 1)],
            _ => 0xFF,
        }
    }

    /// Write $FF00-$FF04. $FF01-$FF04 load CR from the matching PCR,
    /// whatever value is written.
    pub fn write_lcr(&mut self, addr: u16, value: u8) -> MmuEvent {
        match addr & 0xFF {
            0 => self.set_cr(value),
            n @ 1..=4 => self.set_cr(self.pcr[usize::from(n as u8 - 1)]),
            _ => MmuEvent::empty(),
        }
    }

    /// Dispatch row for the current CR in native mode (0..=0x7F).
    ///
    /// Bit 0 selects BASIC low, bits 1-2 the $8000 region, bits 3-4 the
    /// $C000 region, bit 5 the RAM bank and bit 6 I/O.
    #[must_use]
    pub fn config_index(&self) -> usize {
        let cr = self.cr;
        let mut config: usize = if cr & 0x02 != 0 { 0 } else { 1 };
        config |= usize::from((cr & 0x0C) >> 1);
        config |= usize::from((cr & 0x30) >> 1);
        if cr & 0x40 != 0 {
            config |= 32;
        }
        if cr & 0x01 == 0 {
            config |= 64;
        }
        config
    }

    /// RAM bank selected by CR (0 or 1).
    #[must_use]
    pub fn ram_bank(&self) -> usize {
        usize::from((self.cr >> 6) & 1)
    }

    #[must_use]
    pub fn shared_limits(&self) -> SharedLimits {
        SharedLimits::from_rcr(self.rcr)
    }

    /// VIC-IIe fetches from RAM bank 1.
    #[must_use]
    pub fn vic_bank(&self) -> usize {
        usize::from(self.rcr & RamConfig::VIC_BANK.bits() != 0)
    }

    #[must_use]
    pub fn is_8502(&self) -> bool {
        self.mcr & ModeConfig::CPU_8502.bits() != 0
    }

    #[must_use]
    pub fn is_c64_mode(&self) -> bool {
        self.mcr & ModeConfig::C64_MODE.bits() != 0
    }

    #[must_use]
    pub fn fast_serial_out(&self) -> bool {
        self.mcr & ModeConfig::FSDIR.bits() != 0
    }

    pub fn set_key_40_80(&mut self, pressed: bool) {
        self.key_40_80 = pressed;
    }

    #[must_use]
    pub fn key_40_80(&self) -> bool {
        self.key_40_80
    }

    /// Cartridge line state for the MCR inputs.
    pub fn set_cart_lines(&mut self, game: bool, exrom: bool) {
        self.game = game;
        self.exrom = exrom;
    }

    /// Relocated zero page address.
    #[must_use]
    pub fn page_zero(&self) -> u32 {
        self.p0.address()
    }

    /// Relocated stack page address.
    #[must_use]
    pub fn page_one(&self) -> u32 {
        self.p1.address()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_state() {
        let mmu = Mmu::new();
        assert_eq!(mmu.cr, 0);
        assert_eq!(mmu.page_zero(), 0x0000);
        assert_eq!(mmu.page_one(), 0x0100);
        assert_eq!(mmu.config_index(), 65);
    }

    #[test]
    fn version_register() {
        let mmu = Mmu::new();
        assert_eq!(mmu.read(0xD50B), 0x20);
        assert_eq!(mmu.read(0xD50C), 0xFF);
        assert_eq!(mmu.read(0xD5FF), 0xFF);
    }

    #[test]
    fn page_high_alone_has_no_effect() {
        let mut mmu = Mmu::new();
        let events = mmu.write(0xD508, 0x01);
        assert!(events.is_empty());
        assert_eq!(mmu.page_zero(), 0x0000);
        assert_eq!(mmu.read(0xD508) & 0x0F, 0x00);
        assert_eq!(mmu.p0.state(), LatchState::Latched(0x01));

        let events = mmu.write(0xD507, 0x20);
        assert!(events.contains(MmuEvent::PAGES));
        assert_eq!(mmu.page_zero(), 0x1_2000);
        assert_eq!(mmu.read(0xD508) & 0x0F, 0x01);
        assert_eq!(mmu.p0.state(), LatchState::Idle);
    }

    #[test]
    fn low_write_keeps_committed_high() {
        let mut mmu = Mmu::new();
        mmu.write(0xD50A, 0x01);
        mmu.write(0xD509, 0x05);
        assert_eq!(mmu.page_one(), 0x1_0500);
        // No new high byte latched: bank stays
        mmu.write(0xD509, 0x06);
        assert_eq!(mmu.page_one(), 0x1_0600);
    }

    #[test]
    fn config_index_layout() {
        let mut mmu = Mmu::new();
        // All RAM, I/O off, bank 0
        mmu.write(0xD500, 0x3F);
        assert_eq!(mmu.config_index(), 0x1E);
        // All RAM, bank 1, I/O on
        mmu.write(0xD500, 0x7E);
        assert_eq!(mmu.config_index(), 0x1E | 32 | 64);
        assert_eq!(mmu.ram_bank(), 1);
        // Internal function ROM mid and high
        mmu.write(0xD500, 0x14);
        assert_eq!(mmu.config_index() & 0x06, 0x02);
    }

    #[test]
    fn lcr_loads_presets() {
        let mut mmu = Mmu::new();
        mmu.write(0xD501, 0x3F);
        mmu.write(0xD503, 0x7F);
        assert!(mmu.write_lcr(0xFF01, 0x00).contains(MmuEvent::CONFIG));
        assert_eq!(mmu.cr, 0x3F);
        mmu.write_lcr(0xFF03, 0xAA);
        assert_eq!(mmu.cr, 0x7F);
        mmu.write_lcr(0xFF00, 0x0E);
        assert_eq!(mmu.read_lcr(0xFF00), 0x0E);
        assert_eq!(mmu.read_lcr(0xFF01), 0x3F);
    }

    #[test]
    fn shared_limits_from_rcr() {
        assert_eq!(SharedLimits::from_rcr(0x00), SharedLimits::NONE);
        let limits = SharedLimits::from_rcr(0x04);
        assert_eq!(limits.bottom, 0x0400);
        assert_eq!(limits.top, 0xFFFF);
        let limits = SharedLimits::from_rcr(0x0B);
        assert_eq!(limits.bottom, 0);
        assert_eq!(limits.top, 0xFFFF - 0x4000);
        assert_eq!(SharedLimits::from_rcr(0x0F).bottom, 0x8000);
    }

    #[test]
    fn rcr_store_reports_change_once() {
        let mut mmu = Mmu::new();
        assert_eq!(mmu.write(0xD506, 0x44), MmuEvent::RAM_CONFIG);
        assert!(mmu.write(0xD506, 0x44).is_empty());
        assert_eq!(mmu.vic_bank(), 1);
    }

    #[test]
    fn mcr_events() {
        let mut mmu = Mmu::new();
        let events = mmu.write(0xD505, 0x01);
        assert_eq!(events, MmuEvent::CPU_CHANGED);
        assert!(mmu.is_8502());
        let events = mmu.write(0xD505, 0x49);
        assert!(events.contains(MmuEvent::MODE_CHANGED));
        assert!(events.contains(MmuEvent::FAST_SERIAL_DIR));
        assert!(mmu.is_c64_mode());
    }

    #[test]
    fn mcr_reads_inputs() {
        let mut mmu = Mmu::new();
        mmu.write(0xD505, 0x01);
        assert_eq!(mmu.read(0xD505), 0xB7);
        mmu.set_key_40_80(true);
        mmu.set_cart_lines(false, true);
        assert_eq!(mmu.read(0xD505), 0x17);
    }
}
