//! C128 dispatch tables.
//!
//! Configurations 0-$7F are the native mode rows, indexed by the MMU
//! configuration register (see [`mos_mmu_8722::Mmu::config_index`]):
//!
//! | bit | meaning                                         |
//! |-----|-------------------------------------------------|
//! | 0   | BASIC low ROM at $4000-$7FFF                    |
//! | 1-2 | $8000-$BFFF: BASIC high, int. func., ext. func., RAM |
//! | 3-4 | $C000-$FFFF: system ROMs, int. func., ext. func., RAM |
//! | 5   | RAM bank 1                                      |
//! | 6   | I/O at $D000-$DFFF                              |
//!
//! Configurations $80-$9F are C64 mode, `$80 + ` the C64 PLA index.

use commodore_banking::{Base, DispatchTables, Result, TableBuilder, VbankWindow};
use emu_c64::meminit::{
    BASIC_CONFIGS, IO_CONFIG, KERNAL_CONFIGS, ROMH_CONFIG, ROML_CONFIG, is_ultimax,
};

/// Native configurations.
pub const NUM_NATIVE: usize = 0x80;

/// First C64 mode configuration.
pub const C64_MODE_BASE: usize = 0x80;

pub const NUM_CONFIGS: usize = C64_MODE_BASE + 32;

pub const NUM_VBANKS: usize = 4;

/// C64 mode character ROM configs. Config 25 sees the ROM on the C128 PLA.
const C64_CHARGEN_CONFIGS: [usize; 9] = [1, 2, 3, 9, 10, 11, 25, 26, 27];

/// Chips in the $D000-$DFFF area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoDevice {
    Vic,
    Sid,
    Mmu,
    /// $D5xx in C64 mode: nothing answers.
    D5xx,
    Vdc,
    ColorRam,
    Cia1,
    Cia2,
    Io1,
    Io2,
}

/// What the top 16K is mapped to in native mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighArea {
    System,
    IntFunction,
    ExtFunction,
    Ram,
}

impl HighArea {
    /// Selection for bits 3-4 of a native config.
    #[must_use]
    pub fn of_config(config: usize) -> Self {
        match (config >> 3) & 3 {
            0 => HighArea::System,
            1 => HighArea::IntFunction,
            2 => HighArea::ExtFunction,
            _ => HighArea::Ram,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Read {
    /// Relocated zero page, port at $00/$01.
    Zero,
    /// Relocated stack page.
    One,
    /// $0200-$3FFF with bottom common RAM.
    Lo,
    Ram,
    /// $C000-$FFFF RAM with top common RAM.
    TopShared,
    BasicLo,
    BasicHi,
    Editor,
    Kernal,
    IntFunction,
    ExtFunction,
    Chargen,
    /// $FF00-$FF04 load configuration registers over the high area.
    Ffxx,
    Io(IoDevice),
    Basic64,
    Kernal64,
    Roml,
    Romh,
    Ultimax,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Write {
    Zero,
    One,
    Lo,
    Ram,
    TopShared,
    Ffxx,
    Io(IoDevice),
    /// C64 mode RAM inside the video bank.
    Vbank(VbankWindow),
    /// C64 mode page $FF.
    RamHi,
    Roml,
    RamlNoUltimax,
    Romh,
    Ultimax,
}

/// Direct-read sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Ram,
    BasicLo,
    BasicHi,
    Editor,
    Kernal,
    IntFunction,
    ExtFunction,
    Basic64,
    Kernal64,
}

pub type Tables = DispatchTables<Read, Write, Source>;

type Builder = TableBuilder<Read, Write, Source>;

/// I/O handler for a page of $D000-$DFFF.
#[must_use]
pub fn io_device(page: usize, c64_mode: bool) -> IoDevice {
    match page {
        0xD0..=0xD3 => IoDevice::Vic,
        0xD5 if c64_mode => IoDevice::D5xx,
        0xD5 => IoDevice::Mmu,
        0xD6 => IoDevice::Vdc,
        0xD4..=0xD7 => IoDevice::Sid,
        0xD8..=0xDB => IoDevice::ColorRam,
        0xDC => IoDevice::Cia1,
        0xDD => IoDevice::Cia2,
        0xDE => IoDevice::Io1,
        _ => IoDevice::Io2,
    }
}

/// I/O visible in a configuration.
#[must_use]
pub fn io_visible(config: usize) -> bool {
    if config >= C64_MODE_BASE {
        IO_CONFIG[config - C64_MODE_BASE]
    } else {
        config & 0x40 != 0
    }
}

pub fn build() -> Result<Tables> {
    let mut t = TableBuilder::new(NUM_CONFIGS, NUM_VBANKS);
    for config in 0..NUM_NATIVE {
        native_row(&mut t, config);
    }
    for config in 0..32 {
        c64_row(&mut t, config);
    }
    t.build()
}

fn map_all(
    t: &mut Builder,
    config: usize,
    page: usize,
    read: Read,
    write: Write,
    base: Option<Base<Source>>,
) {
    t.map_read(config, page, read, base);
    t.set_write_hook(config, page, write);
}

fn native_row(t: &mut Builder, config: usize) {
    let bank_offset = if config & 0x20 == 0 { 0 } else { 0x10000 };
    let ram = Some(Base::new(Source::Ram, bank_offset));
    // Common RAM always lives in bank 0, so only bank 0 rows can read it
    // directly
    let shared = if bank_offset == 0 { ram } else { None };

    map_all(t, config, 0x00, Read::Zero, Write::Zero, None);
    map_all(t, config, 0x01, Read::One, Write::One, None);
    for page in 0x02..=0x3F {
        map_all(t, config, page, Read::Lo, Write::Lo, shared);
    }

    let (lo, lo_base) = if config & 1 != 0 {
        (Read::BasicLo, Some(Base::new(Source::BasicLo, -0x4000)))
    } else {
        (Read::Ram, ram)
    };
    for page in 0x40..=0x7F {
        map_all(t, config, page, lo, Write::Ram, lo_base);
    }

    let (mid, mid_base) = match (config >> 1) & 3 {
        0 => (Read::BasicHi, Some(Base::new(Source::BasicHi, -0x8000))),
        1 => (Read::IntFunction, Some(Base::new(Source::IntFunction, -0x8000))),
        2 => (Read::ExtFunction, Some(Base::new(Source::ExtFunction, -0x8000))),
        _ => (Read::Ram, ram),
    };
    for page in 0x80..=0xBF {
        map_all(t, config, page, mid, Write::Ram, mid_base);
    }

    let high = HighArea::of_config(config);
    let (high_read, high_base) = match high {
        HighArea::IntFunction => (
            Read::IntFunction,
            Some(Base::new(Source::IntFunction, -0x8000)),
        ),
        HighArea::ExtFunction => (
            Read::ExtFunction,
            Some(Base::new(Source::ExtFunction, -0x8000)),
        ),
        HighArea::Ram | HighArea::System => (Read::TopShared, shared),
    };
    let system = high == HighArea::System;

    let editor = Some(Base::new(Source::Editor, -0xC000));
    for page in 0xC0..=0xCF {
        if system {
            map_all(t, config, page, Read::Editor, Write::TopShared, editor);
        } else {
            map_all(t, config, page, high_read, Write::TopShared, high_base);
        }
    }

    for page in 0xD0..=0xDF {
        if config & 0x40 != 0 {
            let device = io_device(page, false);
            map_all(t, config, page, Read::Io(device), Write::Io(device), None);
        } else if system {
            map_all(t, config, page, Read::Chargen, Write::TopShared, None);
        } else {
            map_all(t, config, page, high_read, Write::TopShared, high_base);
        }
    }

    let kernal = Some(Base::new(Source::Kernal, -0xE000));
    for page in 0xE0..=0xFE {
        if system {
            map_all(t, config, page, Read::Kernal, Write::TopShared, kernal);
        } else {
            map_all(t, config, page, high_read, Write::TopShared, high_base);
        }
    }

    map_all(t, config, 0xFF, Read::Ffxx, Write::Ffxx, None);
}

/// C64 mode: the C64 PLA rows with C128 I/O and C64 ROMs.
fn c64_row(t: &mut Builder, c64_config: usize) {
    let config = C64_MODE_BASE + c64_config;
    let ram = Some(Base::new(Source::Ram, 0));

    map_all(t, config, 0x00, Read::Zero, Write::Zero, ram);
    map_all(t, config, 0x01, Read::One, Write::One, ram);
    for page in 0x02..=0xFE {
        t.map_read(config, page, Read::Ram, ram);
        for vbank in 0..NUM_VBANKS {
            let store = if page & 0xC0 == vbank << 6 {
                Write::Vbank(VbankWindow::for_page(page))
            } else {
                Write::Ram
            };
            t.set_write(vbank, config, page, store);
        }
    }
    map_all(t, config, 0xFF, Read::Ram, Write::RamHi, ram);

    if C64_CHARGEN_CONFIGS.contains(&c64_config) {
        for page in 0xD0..=0xDF {
            t.map_read(config, page, Read::Chargen, None);
        }
    }

    if BASIC_CONFIGS.contains(&c64_config) {
        let basic = Some(Base::new(Source::Basic64, -0xA000));
        for page in 0xA0..=0xBF {
            t.map_read(config, page, Read::Basic64, basic);
        }
    }
    if KERNAL_CONFIGS.contains(&c64_config) {
        let kernal = Some(Base::new(Source::Kernal64, -0xE000));
        for page in 0xE0..=0xFF {
            t.map_read(config, page, Read::Kernal64, kernal);
        }
    }

    if IO_CONFIG[c64_config] {
        for page in 0xD0..=0xDF {
            let device = io_device(page, true);
            map_all(t, config, page, Read::Io(device), Write::Io(device), None);
        }
    }

    let ultimax = is_ultimax(c64_config);
    if ROML_CONFIG[c64_config] {
        let store = if ultimax { Write::Roml } else { Write::RamlNoUltimax };
        for page in 0x80..=0x9F {
            map_all(t, config, page, Read::Roml, store, None);
        }
    }

    if ultimax {
        for page in (0x10..=0x7F).chain(0xA0..=0xCF) {
            map_all(t, config, page, Read::Ultimax, Write::Ultimax, None);
        }
        for page in 0xE0..=0xFF {
            t.set_write_hook(config, page, Write::Romh);
        }
    }

    if ROMH_CONFIG[c64_config] {
        let first = if ultimax { 0xE0 } else { 0xA0 };
        for page in first..first + 0x20 {
            t.map_read(config, page, Read::Romh, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tables() -> Tables {
        build().unwrap()
    }

    #[test]
    fn power_on_row() {
        // CR = 0: BASIC, kernal, I/O, bank 0
        let t = tables();
        let config = 0x41;
        assert_eq!(t.read(config, 0x00), Read::Zero);
        assert_eq!(t.read(config, 0x02), Read::Lo);
        assert_eq!(t.read(config, 0x40), Read::BasicLo);
        assert_eq!(t.read(config, 0x80), Read::BasicHi);
        assert_eq!(t.read(config, 0xC0), Read::Editor);
        assert_eq!(t.read(config, 0xD5), Read::Io(IoDevice::Mmu));
        assert_eq!(t.read(config, 0xD6), Read::Io(IoDevice::Vdc));
        assert_eq!(t.read(config, 0xD7), Read::Io(IoDevice::Sid));
        assert_eq!(t.read(config, 0xE0), Read::Kernal);
        assert_eq!(t.read(config, 0xFF), Read::Ffxx);
        assert_eq!(t.write(2, config, 0x40), Write::Ram);
    }

    #[test]
    fn all_ram_bank_1() {
        let t = tables();
        let config = 0x3E;
        assert_eq!(t.read(config, 0x40), Read::Ram);
        assert_eq!(t.read(config, 0x80), Read::Ram);
        assert_eq!(t.read(config, 0xD0), Read::TopShared);
        assert_eq!(t.read(config, 0xE0), Read::TopShared);
        assert_eq!(t.base(config, 0x80).map(|b| b.offset), Some(0x10000));
        assert!(t.base(config, 0x02).is_none());
        assert!(t.base(config, 0xE0).is_none());
    }

    #[test]
    fn function_roms() {
        let t = tables();
        assert_eq!(t.read(0x02, 0x80), Read::IntFunction);
        assert_eq!(t.read(0x04, 0x80), Read::ExtFunction);
        assert_eq!(t.read(0x08, 0xD0), Read::IntFunction);
        assert_eq!(t.read(0x10, 0xE0), Read::ExtFunction);
        assert_eq!(t.read(0x00, 0xD0), Read::Chargen);
    }

    #[test]
    fn c64_mode_rows() {
        let t = tables();
        let config = C64_MODE_BASE + 7;
        assert_eq!(t.read(config, 0xA0), Read::Basic64);
        assert_eq!(t.read(config, 0xE0), Read::Kernal64);
        assert_eq!(t.read(config, 0xD5), Read::Io(IoDevice::D5xx));
        assert_eq!(t.read(config, 0xD6), Read::Io(IoDevice::Vdc));
        assert_eq!(t.write(1, config, 0x7F), Write::Vbank(VbankWindow::Page3f));
        assert_eq!(t.read(C64_MODE_BASE + 25, 0xD0), Read::Chargen);
        assert_eq!(t.read(C64_MODE_BASE + 23, 0x10), Read::Ultimax);
        assert_eq!(t.write(0, C64_MODE_BASE + 23, 0xFF), Write::Romh);
    }

    #[test]
    fn io_visibility() {
        assert!(io_visible(0x41));
        assert!(!io_visible(0x01));
        assert!(io_visible(C64_MODE_BASE + 7));
        assert!(!io_visible(C64_MODE_BASE + 3));
    }
}
