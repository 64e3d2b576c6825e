//! Chips and expansions the memory map routes to.
//!
//! The memory engines own RAM, ROM and color RAM. Everything else on the
//! bus is reached through these traits, so each machine can be driven by
//! full chip emulations or by a bare [`OpenBus`].

use emu_core::Ticks;

/// Which part of a video bank a store touches.
///
/// The VIC-II fetches from $3900-$39FF and $3FFF of its bank during idle
/// cycles, so stores there must be seen in the same half cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VbankWindow {
    Plain,
    Page39,
    Page3f,
}

impl VbankWindow {
    /// Window for a page inside the video bank.
    #[must_use]
    pub fn for_page(page: usize) -> Self {
        match page & 0x3F {
            0x39 => VbankWindow::Page39,
            0x3F => VbankWindow::Page3f,
            _ => VbankWindow::Plain,
        }
    }
}

/// On-board I/O of a C64-class machine: VIC-II, SID, both CIAs.
///
/// Reads default to the last value the VIC-II left on the bus, which is
/// what an unconnected data bus returns.
pub trait C64Io {
    /// CPU cycle counter.
    fn cycles(&self) -> Ticks;

    /// Byte the VIC-II fetched in the last first clock phase.
    fn phi1(&self) -> u8;

    /// The CPU is about to store into the VIC-II's current bank.
    fn vbank_store(&mut self, _addr: u16, _value: u8, _window: VbankWindow) {}

    /// The video bank changed.
    fn set_vbank(&mut self, _vbank: usize) {}

    fn vic_read(&mut self, _addr: u16) -> u8 {
        self.phi1()
    }

    fn vic_store(&mut self, _addr: u16, _value: u8) {}

    fn vic_peek(&self, _addr: u16) -> u8 {
        self.phi1()
    }

    fn sid_read(&mut self, _addr: u16) -> u8 {
        self.phi1()
    }

    fn sid_store(&mut self, _addr: u16, _value: u8) {}

    fn sid_peek(&self, _addr: u16) -> u8 {
        self.phi1()
    }

    fn cia1_read(&mut self, _addr: u16) -> u8 {
        self.phi1()
    }

    fn cia1_store(&mut self, _addr: u16, _value: u8) {}

    fn cia1_peek(&self, _addr: u16) -> u8 {
        self.phi1()
    }

    fn cia2_read(&mut self, _addr: u16) -> u8 {
        self.phi1()
    }

    fn cia2_store(&mut self, _addr: u16, _value: u8) {}

    fn cia2_peek(&self, _addr: u16) -> u8 {
        self.phi1()
    }

    /// A store to $FF00 starts a pending REU transfer.
    fn ff00_dma(&mut self) {}
}

/// Cartridge port.
///
/// `None` or `false` means the cartridge did not claim the access. The
/// memory engine then falls back: ROML and ROMH reads go to RAM, Ultimax
/// reads return the open-bus value, Ultimax stores are dropped and stores
/// under ROML in 8K/16K mode go to RAM.
pub trait Expansion {
    /// /EXROM asserted.
    fn exrom(&self) -> bool {
        false
    }

    /// /GAME asserted.
    fn game(&self) -> bool {
        false
    }

    /// $8000-$9FFF.
    fn roml_read(&mut self, _addr: u16) -> Option<u8> {
        None
    }

    /// $A000-$BFFF, or $E000-$FFFF in Ultimax mode.
    fn romh_read(&mut self, _addr: u16) -> Option<u8> {
        None
    }

    /// $1000-$7FFF, $A000-$BFFF and $C000-$CFFF in Ultimax mode.
    fn ultimax_read(&mut self, _addr: u16) -> Option<u8> {
        None
    }

    /// Ultimax store at $8000-$9FFF.
    fn roml_store(&mut self, _addr: u16, _value: u8) -> bool {
        false
    }

    /// Ultimax store at $E000-$FFFF.
    fn romh_store(&mut self, _addr: u16, _value: u8) -> bool {
        false
    }

    /// Ultimax store in the unmapped areas.
    fn ultimax_store(&mut self, _addr: u16, _value: u8) -> bool {
        false
    }

    /// Store under ROML outside Ultimax mode.
    fn raml_store(&mut self, _addr: u16, _value: u8) -> bool {
        false
    }

    /// $DE00-$DEFF.
    fn io1_read(&mut self, _addr: u16) -> Option<u8> {
        None
    }

    fn io1_peek(&self, _addr: u16) -> Option<u8> {
        None
    }

    fn io1_store(&mut self, _addr: u16, _value: u8) {}

    /// $DF00-$DFFF.
    fn io2_read(&mut self, _addr: u16) -> Option<u8> {
        None
    }

    fn io2_peek(&self, _addr: u16) -> Option<u8> {
        None
    }

    fn io2_store(&mut self, _addr: u16, _value: u8) {}

    /// Cartridge memory as the monitor's `cart` bank shows it.
    fn peek(&self, _addr: u16) -> Option<u8> {
        None
    }
}

/// Empty cartridge port.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExpansion;

impl Expansion for NoExpansion {}

/// I/O with no chips fitted: every read sees the open bus.
#[derive(Debug, Clone, Copy)]
pub struct OpenBus {
    pub cycles: Ticks,
    pub phi1: u8,
}

impl Default for OpenBus {
    fn default() -> Self {
        Self {
            cycles: Ticks::ZERO,
            phi1: 0xFF,
        }
    }
}

impl C64Io for OpenBus {
    fn cycles(&self) -> Ticks {
        self.cycles
    }

    fn phi1(&self) -> u8 {
        self.phi1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn windows_by_page() {
        assert_eq!(VbankWindow::for_page(0x39), VbankWindow::Page39);
        assert_eq!(VbankWindow::for_page(0xB9), VbankWindow::Page39);
        assert_eq!(VbankWindow::for_page(0x7F), VbankWindow::Page3f);
        assert_eq!(VbankWindow::for_page(0x40), VbankWindow::Plain);
    }

    #[test]
    fn open_bus_reads_phi1() {
        let mut io = OpenBus {
            phi1: 0x5A,
            ..OpenBus::default()
        };
        assert_eq!(io.vic_read(0xD020), 0x5A);
        assert_eq!(io.cia2_peek(0xDD00), 0x5A);
        assert_eq!(NoExpansion.roml_read(0x8000), None);
    }
}
