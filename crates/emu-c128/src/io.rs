//! C128-only chips seen by the memory map.

use commodore_banking::{C64Io, OpenBus};

/// C128 I/O on top of the C64 set: the VDC, 2 MHz cycle stretching and
/// the MMU side effects the rest of the machine reacts to.
pub trait C128Io: C64Io {
    /// An I/O read at 2 MHz must be slowed to the 1 MHz bus.
    fn read_stretch(&mut self) {}

    /// An I/O write at 2 MHz must be slowed to the 1 MHz bus.
    fn write_stretch(&mut self) {}

    fn vdc_read(&mut self, _addr: u16) -> u8 {
        self.phi1()
    }

    fn vdc_store(&mut self, _addr: u16, _value: u8) {}

    fn vdc_peek(&self, _addr: u16) -> u8 {
        self.phi1()
    }

    /// VDC private RAM, for the monitor's `vdc` bank.
    fn vdc_ram_read(&self, _addr: u16) -> u8 {
        0
    }

    fn vdc_ram_store(&mut self, _addr: u16, _value: u8) {}

    /// VDC screen start, rows and columns (registers 12/13, 6 and 1).
    fn vdc_screen(&self) -> (u16, u8, u8) {
        (0, 25, 80)
    }

    /// VIC-IIe video RAM moved to another 64K bank.
    fn set_vic_ram_bank(&mut self, _bank: usize) {}

    /// The MMU handed the bus to the 8502 (`true`) or the Z80.
    fn cpu_changed(&mut self, _is_8502: bool) {}

    /// Fast serial direction changed.
    fn fast_serial_dir(&mut self, _output: bool) {}

    /// The machine dropped into C64 mode.
    fn c64_mode_entered(&mut self) {}
}

impl C128Io for OpenBus {}
