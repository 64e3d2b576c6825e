//! SuperCPU hardware registers at $D071-$D07F and $D0B0-$D0BF.
//!
//! Most are strobes: any store to the address acts, the value is ignored.
//! Only $D07E (enable) is reachable while the registers are disabled,
//! together with $D07F/$D0BD/$D0BF and the speed controls.

use bitflags::bitflags;

use crate::config::ScpuVersion;

bitflags! {
    /// Optimisation register: which RAM writes are mirrored to the
    /// motherboard so the VIC-II sees them.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Optim: u8 {
        /// Leave pages 0 and 1 out of the mirror.
        const SKIP_ZERO_STACK = 0x01;
        /// Second VIC bank of the pair selected by the mode bits.
        const ALT_BANK = 0x04;
        const MODE_LO = 0x40;
        const MODE_HI = 0x80;
    }
}

/// Mirrored page range (`first << 8 | last`) per mirror mode. Zero means
/// nothing is mirrored.
pub const MIRRORS: [u16; 16] = [
    0x80BF, 0x80BF, 0x003F, 0x023F, 0x407F, 0x407F, 0xC0FF, 0xC0FF, 0x0407, 0x0407, 0, 0, 0x00FF,
    0x02FF, 0x00FF, 0x02FF,
];

impl Optim {
    /// Mirror mode index into [`MIRRORS`].
    #[must_use]
    pub fn mirror(self) -> usize {
        usize::from(self.contains(Self::SKIP_ZERO_STACK))
            | usize::from(self.contains(Self::ALT_BANK)) << 1
            | usize::from(self.contains(Self::MODE_LO)) << 2
            | usize::from(self.contains(Self::MODE_HI)) << 3
    }
}

/// Is `page` mirrored in mirror mode `mirror`?
#[must_use]
pub fn is_mirrored(mirror: usize, page: usize) -> bool {
    let range = MIRRORS[mirror];
    range != 0 && usize::from(range >> 8) <= page && usize::from(range & 0xFF) >= page
}

bitflags! {
    /// What a register store changed.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct HwEvent: u8 {
        /// Enable, DOS extension or boot map changed: re-select the row.
        const CONFIG = 0x01;
        /// Optimisation mode changed: re-select the mirror variant.
        const MIRROR = 0x02;
        /// $D078 changed.
        const SIMM = 0x04;
        /// 1 MHz / 20 MHz changed.
        const SPEED = 0x08;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HwRegisters {
    /// 1 MHz front panel switch.
    pub switch_1mhz: bool,
    /// JiffyDOS front panel switch.
    pub switch_jiffy: bool,
    pub soft_1mhz: bool,
    pub sys_1mhz: bool,
    pub hw_enable: bool,
    pub dos_ext: bool,
    pub ramlink: bool,
    pub bootmap: bool,
    pub optim: Optim,
    pub simm: u8,
}

impl Default for HwRegisters {
    fn default() -> Self {
        let mut regs = Self {
            switch_1mhz: false,
            switch_jiffy: true,
            soft_1mhz: false,
            sys_1mhz: false,
            hw_enable: false,
            dos_ext: false,
            ramlink: false,
            bootmap: true,
            optim: Optim::empty(),
            simm: 0,
        };
        regs.reset();
        regs
    }
}

impl HwRegisters {
    /// Hardware reset. The front panel switches keep their positions.
    pub fn reset(&mut self) {
        self.optim = Optim::from_bits_retain(0xC7);
        self.soft_1mhz = false;
        self.sys_1mhz = false;
        self.hw_enable = false;
        self.dos_ext = false;
        self.ramlink = false;
        self.bootmap = true;
        self.simm = 4;
    }

    /// Running at 20 MHz.
    #[must_use]
    pub fn fast(&self) -> bool {
        !(self.sys_1mhz || self.soft_1mhz || (self.switch_1mhz && !self.hw_enable))
    }

    /// $D0B0-$D0BF read. `emulation` is the 65816 E flag.
    #[must_use]
    pub fn read(&self, addr: u16, version: ScpuVersion, emulation: bool) -> u8 {
        let bit = |set: bool, mask: u8| if set { mask } else { 0 };
        let v2 = version == ScpuVersion::V2;
        let value = match addr {
            0xD0B0 => {
                if v2 {
                    0x40
                } else {
                    0xC0
                }
            }
            0xD0B2 => bit(self.hw_enable, 0x80) | bit(self.sys_1mhz, 0x40),
            0xD0B3 if v2 => self.optim.bits() & 0xC0,
            0xD0B4 => self.optim.bits() & 0xC0,
            0xD0B5 => bit(self.switch_jiffy, 0x80) | bit(self.switch_1mhz, 0x40),
            0xD0B6 => bit(emulation, 0x80),
            0xD0B8 | 0xD0B9 => bit(self.soft_1mhz, 0x80) | bit(!self.fast(), 0x40),
            0xD0BC..=0xD0BF => bit(self.dos_ext, 0x80) | bit(self.ramlink, 0x40),
            0xD0B1 | 0xD0B3 | 0xD0B7 | 0xD0BA | 0xD0BB => 0x00,
            _ => 0xFF,
        };
        value | (self.optim.bits() & 0x07)
    }

    /// Store to a register address. Addresses outside the register block
    /// are ignored.
    pub fn store(&mut self, addr: u16, value: u8, version: ScpuVersion) -> HwEvent {
        let fast = self.fast();
        let mut event = HwEvent::empty();
        let hw = self.hw_enable;
        match addr {
            0xD072 => self.sys_1mhz = true,
            0xD073 => self.sys_1mhz = false,
            0xD074..=0xD077 if hw => {
                self.optim = Optim::from_bits_retain(((addr & 3) as u8) << 6);
                event |= HwEvent::MIRROR;
            }
            0xD078 if hw && self.simm != value => {
                self.simm = value;
                event |= HwEvent::SIMM;
            }
            0xD07A => self.soft_1mhz = true,
            0xD079 | 0xD07B => self.soft_1mhz = false,
            0xD07E if !hw => {
                self.hw_enable = true;
                event |= HwEvent::CONFIG;
            }
            0xD07D | 0xD07F if hw => {
                self.hw_enable = false;
                event |= HwEvent::CONFIG;
            }
            0xD0B2 if hw => {
                self.sys_1mhz = value & 0x40 != 0;
                if value & 0x80 == 0 {
                    self.hw_enable = false;
                    event |= HwEvent::CONFIG;
                }
            }
            0xD0B3 if hw && version == ScpuVersion::V2 => {
                let bits = (self.optim.bits() & 0x38) | (value & 0xC7);
                self.optim = Optim::from_bits_retain(bits);
                event |= HwEvent::MIRROR;
            }
            0xD0B4 if hw => {
                let bits = (self.optim.bits() & 0x3F) | (value & 0xC0);
                self.optim = Optim::from_bits_retain(bits);
                event |= HwEvent::MIRROR;
            }
            0xD0B6 if hw && self.bootmap => {
                self.bootmap = false;
                event |= HwEvent::CONFIG;
            }
            0xD0B7 if hw && !self.bootmap => {
                self.bootmap = true;
                event |= HwEvent::CONFIG;
            }
            0xD0B8 if hw => self.soft_1mhz = value & 0x80 != 0,
            0xD0BC if hw && self.dos_ext != (value & 0x80 != 0) => {
                self.dos_ext = value & 0x80 != 0;
                event |= HwEvent::CONFIG;
            }
            0xD0BE if hw && !self.dos_ext => {
                self.dos_ext = true;
                event |= HwEvent::CONFIG;
            }
            0xD0BD | 0xD0BF if self.dos_ext => {
                self.dos_ext = false;
                event |= HwEvent::CONFIG;
            }
            _ => {}
        }
        if self.fast() != fast {
            event |= HwEvent::SPEED;
        }
        event
    }

    /// Front panel 1 MHz switch. Returns true if the speed changed.
    pub fn set_speed_switch(&mut self, slow: bool) -> bool {
        let fast = self.fast();
        self.switch_1mhz = slow;
        self.fast() != fast
    }
}

/// Register block addresses that reach [`HwRegisters::store`].
#[must_use]
pub fn is_register(addr: u16) -> bool {
    (0xD071..0xD080).contains(&addr) || (0xD0B0..0xD0C0).contains(&addr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_state() {
        let regs = HwRegisters::default();
        assert_eq!(regs.optim.mirror(), 15);
        assert!(regs.bootmap && regs.fast());
        assert_eq!(regs.read(0xD0B0, ScpuVersion::V2, true), 0x47);
        assert_eq!(regs.read(0xD0B5, ScpuVersion::V2, true), 0x87);
    }

    #[test]
    fn enable_gates_writes() {
        let mut regs = HwRegisters::default();
        assert_eq!(regs.store(0xD0B7, 0, ScpuVersion::V2), HwEvent::empty());
        assert!(regs.store(0xD074, 0, ScpuVersion::V2).is_empty());
        assert_eq!(regs.store(0xD07E, 0, ScpuVersion::V2), HwEvent::CONFIG);
        assert_eq!(regs.store(0xD0B6, 0, ScpuVersion::V2), HwEvent::CONFIG);
        assert!(!regs.bootmap);
        assert_eq!(regs.store(0xD076, 0, ScpuVersion::V2), HwEvent::MIRROR);
        assert_eq!(regs.optim.mirror(), 8);
        assert_eq!(regs.read(0xD0B4, ScpuVersion::V2, false), 0x80);
    }

    #[test]
    fn speed_follows_every_source() {
        let mut regs = HwRegisters::default();
        assert_eq!(regs.store(0xD07A, 0, ScpuVersion::V2), HwEvent::SPEED);
        assert_eq!(regs.read(0xD0B8, ScpuVersion::V2, true) & 0xC0, 0xC0);
        assert_eq!(regs.store(0xD07B, 0, ScpuVersion::V2), HwEvent::SPEED);
        // The switch only counts while the registers are disabled
        assert!(regs.set_speed_switch(true));
        assert_eq!(
            regs.store(0xD07E, 0, ScpuVersion::V2),
            HwEvent::CONFIG | HwEvent::SPEED
        );
        assert!(regs.fast());
    }

    #[test]
    fn dos_extension_disable_needs_no_enable() {
        let mut regs = HwRegisters::default();
        regs.store(0xD07E, 0, ScpuVersion::V1);
        regs.store(0xD0BE, 0, ScpuVersion::V1);
        regs.store(0xD07F, 0, ScpuVersion::V1);
        assert!(regs.dos_ext && !regs.hw_enable);
        assert_eq!(regs.store(0xD0BF, 0, ScpuVersion::V1), HwEvent::CONFIG);
        assert!(!regs.dos_ext);
        // $D0B3 is a V2 register
        regs.store(0xD07E, 0, ScpuVersion::V1);
        assert!(regs.store(0xD0B3, 0x00, ScpuVersion::V1).is_empty());
    }
}
