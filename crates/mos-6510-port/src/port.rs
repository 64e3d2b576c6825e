//! The on-chip I/O port at $00 (direction) and $01 (data).
//!
//! | Bit | C64/DTV      | C128           |
//! |-----|--------------|----------------|
//! | 0   | LORAM        | LORAM          |
//! | 1   | HIRAM        | HIRAM          |
//! | 2   | CHAREN       | CHAREN         |
//! | 3   | Cass. write  | Cass. write    |
//! | 4   | Cass. sense  | Cass. sense    |
//! | 5   | Cass. motor  | Cass. motor    |
//! | 6   | floating     | CAPS sense     |
//! | 7   | floating     | floating       |
//!
//! Input lines with external pull-ups read 1 when undriven; the unused bits
//! read back their capacitor charge (see [`FloatingBit`]).

use bitflags::bitflags;
use emu_core::Ticks;

use crate::floating::FloatingBit;

bitflags! {
    /// Port line assignments.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PortLines: u8 {
        const LORAM = 0x01;
        const HIRAM = 0x02;
        const CHAREN = 0x04;
        const CASSETTE_WRITE = 0x08;
        const CASSETTE_SENSE = 0x10;
        const CASSETTE_MOTOR = 0x20;
        const CAPS_SENSE = 0x40;
        const UNUSED = 0x80;
        /// The three lines the PLA decodes.
        const BANKING = Self::LORAM.bits() | Self::HIRAM.bits() | Self::CHAREN.bits();
    }
}

/// Per-machine wiring of the port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortModel {
    /// Lines pulled high externally.
    pub pullup: u8,
    /// Bits that behave as floating capacitors when set to input.
    pub floating: u8,
    /// Cycles a floating bit keeps its charge.
    pub fall_off: Ticks,
}

impl PortModel {
    /// 6510: bits 6 and 7 unconnected.
    pub const C64: Self = Self {
        pullup: 0x17,
        floating: 0xC0,
        fall_off: Ticks::new(350_000),
    };

    /// 8502: bit 6 is the CAPS LOCK / ASCII-DIN sense line.
    pub const C128: Self = Self {
        pullup: 0x57,
        floating: 0x80,
        fall_off: Ticks::new(350_000),
    };

    /// DTV: no capacitor emulation.
    pub const DTV: Self = Self {
        pullup: 0x17,
        floating: 0x00,
        fall_off: Ticks::ZERO,
    };
}

/// Processor port state.
#[derive(Debug, Clone)]
pub struct ProcessorPort {
    model: PortModel,
    /// Direction register as written ($00). 1 = output.
    dir: u8,
    /// Data register as written ($01).
    data: u8,
    /// Last value driven on each output line.
    data_out: u8,
    /// Value returned by reads of $00.
    dir_read: u8,
    /// Value returned by reads of $01, before capacitor bits.
    data_read: u8,
    /// A cassette button is held down.
    tape_sense: bool,
    /// CAPS LOCK / ASCII-DIN key is held down (C128 only).
    caps_pressed: bool,
    floating: [FloatingBit; 8],
}

impl ProcessorPort {
    #[must_use]
    pub fn new(model: PortModel) -> Self {
        let mut port = Self {
            model,
            dir: 0,
            data: 0,
            data_out: 0,
            dir_read: 0,
            data_read: 0,
            tape_sense: false,
            caps_pressed: false,
            floating: [FloatingBit::default(); 8],
        };
        port.reset();
        port
    }

    /// Power-on state: all lines input.
    pub fn reset(&mut self) {
        self.dir = 0;
        self.data = 0x3F;
        self.data_out = 0x3F;
        self.floating = [FloatingBit::default(); 8];
        self.recompute();
    }

    /// Re-derive the values the CPU reads back.
    fn recompute(&mut self) {
        let pullup = self.model.pullup;
        self.data_out = (self.data_out & !self.dir) | (self.data & self.dir);
        self.data_read = (self.data | !self.dir) & (self.data_out | pullup);

        if pullup & PortLines::CAPS_SENSE.bits() != 0 && self.caps_pressed {
            self.data_read &= !PortLines::CAPS_SENSE.bits();
        }
        if self.dir & PortLines::CASSETTE_MOTOR.bits() == 0 {
            self.data_read &= !PortLines::CASSETTE_MOTOR.bits();
        }
        if self.tape_sense && self.dir & PortLines::CASSETTE_SENSE.bits() == 0 {
            self.data_read &= !PortLines::CASSETTE_SENSE.bits();
        }
        self.dir_read = self.dir;
    }

    /// Store to $00. Returns true when the direction register changed.
    pub fn store_dir(&mut self, value: u8, now: Ticks) -> bool {
        // An output bit switched to input keeps the charge it was driven with
        for bit in 0..8 {
            let mask = 1u8 << bit;
            if self.model.floating & mask != 0
                && self.dir & mask != 0
                && (self.dir ^ value) & mask != 0
            {
                self.floating[bit].charge(self.data & mask != 0, now, self.model.fall_off);
            }
        }

        if self.dir == value {
            return false;
        }
        self.dir = value;
        self.recompute();
        true
    }

    /// Store to $01. Returns true when the data register changed.
    pub fn store_data(&mut self, value: u8, now: Ticks) -> bool {
        for bit in 0..8 {
            let mask = 1u8 << bit;
            if self.model.floating & mask != 0 && self.dir & mask != 0 {
                self.floating[bit].charge(value & mask != 0, now, self.model.fall_off);
            }
        }

        if self.data == value {
            return false;
        }
        self.data = value;
        self.recompute();
        true
    }

    /// Read of $00.
    #[must_use]
    pub fn read_dir(&self) -> u8 {
        self.dir_read
    }

    /// Read of $01. Discharges any capacitor whose time has run out.
    pub fn read_data(&mut self, now: Ticks) -> u8 {
        for bit in 0..8 {
            if self.model.floating & (1 << bit) != 0 {
                self.floating[bit].settle(now);
            }
        }
        self.peek_data(now)
    }

    /// Read of $01 without discharging anything.
    #[must_use]
    pub fn peek_data(&self, now: Ticks) -> u8 {
        let mut value = self.data_read;
        for bit in 0..8 {
            let mask = 1u8 << bit;
            if self.model.floating & mask != 0 && self.dir_read & mask == 0 {
                value &= !mask;
                if self.floating[bit].effective_value(now) {
                    value |= mask;
                }
            }
        }
        value
    }

    /// PLA input lines: an input bit reads as 1.
    #[must_use]
    pub fn bank_lines(&self) -> u8 {
        (!self.dir | self.data) & PortLines::BANKING.bits()
    }

    /// Composite value seen on the lines, as the rest of the machine sees it.
    #[must_use]
    pub fn data_read(&self) -> u8 {
        self.data_read
    }

    #[must_use]
    pub fn dir(&self) -> u8 {
        self.dir
    }

    #[must_use]
    pub fn data(&self) -> u8 {
        self.data
    }

    #[must_use]
    pub fn data_out(&self) -> u8 {
        self.data_out
    }

    #[must_use]
    pub fn model(&self) -> PortModel {
        self.model
    }

    pub fn set_tape_sense(&mut self, pressed: bool) {
        self.tape_sense = pressed;
        self.recompute();
    }

    pub fn set_caps_pressed(&mut self, pressed: bool) {
        self.caps_pressed = pressed;
        self.recompute();
    }

    #[must_use]
    pub fn caps_pressed(&self) -> bool {
        self.caps_pressed
    }

    /// The CPU cycle counter was moved back by `sub`.
    pub fn rebase(&mut self, sub: Ticks, now: Ticks) {
        for bit in 0..8 {
            if self.model.floating & (1 << bit) != 0 {
                self.floating[bit].rebase(sub, now);
            }
        }
    }

    #[must_use]
    pub fn floating_bit(&self, bit: usize) -> FloatingBit {
        self.floating[bit & 7]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window() -> u64 {
        PortModel::C64.fall_off.get()
    }

    #[test]
    fn reset_selects_all_roms() {
        let port = ProcessorPort::new(PortModel::C64);
        assert_eq!(port.bank_lines(), 7);
        assert_eq!(port.read_dir(), 0);
    }

    #[test]
    fn kernal_default_reads_back() {
        let mut port = ProcessorPort::new(PortModel::C64);
        port.store_dir(0x2F, Ticks::ZERO);
        port.store_data(0x37, Ticks::ZERO);
        assert_eq!(port.bank_lines(), 7);
        // Motor (bit 5) is an output driven high, sense (bit 4) pulled up
        assert_eq!(port.read_data(Ticks::new(1)) & 0x3F, 0x37);
    }

    #[test]
    fn motor_bit_reads_zero_when_input() {
        let mut port = ProcessorPort::new(PortModel::C64);
        port.store_data(0xFF, Ticks::ZERO);
        assert_eq!(port.data_read() & 0x20, 0);
    }

    #[test]
    fn tape_sense_pulls_bit_4_low() {
        let mut port = ProcessorPort::new(PortModel::C64);
        assert_eq!(port.data_read() & 0x10, 0x10);
        port.set_tape_sense(true);
        assert_eq!(port.data_read() & 0x10, 0);
    }

    #[test]
    fn caps_key_only_on_c128() {
        let mut c128 = ProcessorPort::new(PortModel::C128);
        assert_eq!(c128.data_read() & 0x40, 0x40);
        c128.set_caps_pressed(true);
        assert_eq!(c128.data_read() & 0x40, 0);

        let mut c64 = ProcessorPort::new(PortModel::C64);
        c64.set_caps_pressed(true);
        c64.store_dir(0x40, Ticks::ZERO);
        c64.store_data(0x40, Ticks::ZERO);
        assert_eq!(c64.data_read() & 0x40, 0x40);
    }

    #[test]
    fn bit7_decays_after_direction_flip() {
        for t in [0u64, 17, 1_000_000] {
            let mut port = ProcessorPort::new(PortModel::C64);
            port.store_dir(0x80, Ticks::new(t));
            port.store_data(0x80, Ticks::new(t));
            // Flip to input one cycle later
            port.store_dir(0x00, Ticks::new(t + 1));
            assert_eq!(port.read_data(Ticks::new(t + 1)) & 0x80, 0x80);
            assert_eq!(port.read_data(Ticks::new(t + 1 + window())) & 0x80, 0x80);
            assert_eq!(port.read_data(Ticks::new(t + 2 + window())) & 0x80, 0);
        }
    }

    #[test]
    fn write_while_input_does_not_charge() {
        let mut port = ProcessorPort::new(PortModel::C64);
        port.store_data(0xC0, Ticks::ZERO);
        assert_eq!(port.read_data(Ticks::new(1)) & 0xC0, 0);
    }

    #[test]
    fn bit6_floats_on_c64_but_not_c128() {
        let mut c64 = ProcessorPort::new(PortModel::C64);
        c64.store_dir(0x40, Ticks::ZERO);
        c64.store_data(0x40, Ticks::ZERO);
        c64.store_dir(0x00, Ticks::new(5));
        assert_eq!(c64.read_data(Ticks::new(6)) & 0x40, 0x40);
        assert_eq!(c64.read_data(Ticks::new(6 + window())) & 0x40, 0);

        // On the 8502 bit 6 is a real input with a pull-up
        let mut c128 = ProcessorPort::new(PortModel::C128);
        c128.store_dir(0x40, Ticks::ZERO);
        c128.store_data(0x00, Ticks::ZERO);
        c128.store_dir(0x00, Ticks::new(5));
        assert_eq!(c128.read_data(Ticks::new(6 + 2 * window())) & 0x40, 0x40);
    }

    #[test]
    fn dtv_has_no_capacitors() {
        let mut port = ProcessorPort::new(PortModel::DTV);
        port.store_dir(0x80, Ticks::ZERO);
        port.store_data(0x80, Ticks::ZERO);
        port.store_dir(0x00, Ticks::new(1));
        // Input bit 7 reads the last driven output through data_out
        assert_eq!(port.read_data(Ticks::new(2)), port.data_read());
    }

    #[test]
    fn unchanged_store_reports_no_change() {
        let mut port = ProcessorPort::new(PortModel::C64);
        assert!(port.store_dir(0x2F, Ticks::ZERO));
        assert!(!port.store_dir(0x2F, Ticks::ZERO));
        assert!(port.store_data(0x36, Ticks::ZERO));
        assert!(!port.store_data(0x36, Ticks::ZERO));
    }

    #[test]
    fn peek_does_not_settle() {
        let mut port = ProcessorPort::new(PortModel::C64);
        port.store_dir(0x80, Ticks::ZERO);
        port.store_data(0x80, Ticks::ZERO);
        port.store_dir(0x00, Ticks::ZERO);
        let late = Ticks::new(2 * window());
        assert_eq!(port.peek_data(late) & 0x80, 0);
        assert!(port.floating_bit(7).is_armed());
        port.read_data(late);
        assert!(!port.floating_bit(7).is_armed());
    }
}
