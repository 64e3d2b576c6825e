//! DTV memory map as dispatch tables.
//!
//! The DTV has no cartridge port, so only the three processor port lines
//! select a configuration. The C64 rows are built first, then the VIC-II
//! pages $D1-$D3 are handed to the DTV extensions.

use commodore_banking::{Base, DispatchTables, Result, TableBuilder, VbankWindow};

/// Number of configurations.
pub const NUM_CONFIGS: usize = 8;

pub const NUM_VBANKS: usize = 4;

pub const DEFAULT_CONFIG: usize = 7;

const CHARGEN_CONFIGS: [usize; 3] = [1, 2, 3];

pub const BASIC_CONFIGS: [usize; 2] = [3, 7];

pub const KERNAL_CONFIGS: [usize; 4] = [2, 3, 6, 7];

/// I/O visible at $D000-$DFFF.
pub const IO_CONFIG: [bool; NUM_CONFIGS] = [false, false, false, false, false, true, true, true];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Read {
    Zero,
    Ram,
    /// BASIC area through the $D101 mapper.
    Basic,
    /// KERNAL area through the $D100 mapper.
    Kernal,
    /// Character set read from flash.
    Chargen,
    Vic,
    /// $D1xx: memory mapper.
    Mapper,
    /// $D2xx: palette.
    Palette,
    /// $D3xx: DMA engine and blitter.
    DmaBlit,
    Sid,
    ColorRam,
    Cia1,
    Cia2,
    Io1,
    Io2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Write {
    Zero,
    Ram,
    Vbank(VbankWindow),
    RamHi,
    Vic,
    Mapper,
    Palette,
    DmaBlit,
    Sid,
    ColorRam,
    Cia1,
    Cia2,
    Io1,
    Io2,
}

/// Direct-read sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Ram,
    Flash,
}

pub type Tables = DispatchTables<Read, Write, Source>;

type Builder = TableBuilder<Read, Write, Source>;

/// Handler pair for a page of the I/O area, before the DTV extensions.
#[must_use]
pub fn io_handlers(page: usize) -> (Read, Write) {
    match page {
        0xD0..=0xD3 => (Read::Vic, Write::Vic),
        0xD4..=0xD7 => (Read::Sid, Write::Sid),
        0xD8..=0xDB => (Read::ColorRam, Write::ColorRam),
        0xDC => (Read::Cia1, Write::Cia1),
        0xDD => (Read::Cia2, Write::Cia2),
        0xDE => (Read::Io1, Write::Io1),
        _ => (Read::Io2, Write::Io2),
    }
}

pub fn build() -> Result<Tables> {
    let mut t = TableBuilder::new(NUM_CONFIGS, NUM_VBANKS);
    for config in 0..NUM_CONFIGS {
        default_row(&mut t, config);
    }

    // ROM areas have no direct base: the mapper can move them
    for config in CHARGEN_CONFIGS {
        for page in 0xD0..=0xDF {
            t.map_read(config, page, Read::Chargen, None);
        }
    }
    for config in BASIC_CONFIGS {
        for page in 0xA0..=0xBF {
            t.map_read(config, page, Read::Basic, None);
        }
    }
    for config in KERNAL_CONFIGS {
        for page in 0xE0..=0xFF {
            t.map_read(config, page, Read::Kernal, None);
        }
    }
    for config in (0..NUM_CONFIGS).filter(|&c| IO_CONFIG[c]) {
        for page in 0xD0..=0xDF {
            let (read, write) = io_handlers(page);
            t.map_read(config, page, read, None);
            t.set_write_hook(config, page, write);
        }
    }

    install_extensions(&mut t);
    t.build()
}

fn default_row(t: &mut Builder, config: usize) {
    let ram = Some(Base::new(Source::Ram, 0));

    t.map_read(config, 0, Read::Zero, ram);
    t.set_write_hook(config, 0, Write::Zero);
    for page in 1..=0xFE {
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
    t.map_read(config, 0xFF, Read::Ram, ram);
    t.set_write_hook(config, 0xFF, Write::RamHi);
}

/// Replace the VIC-II handlers on $D1-$D3 wherever the rows have them.
fn install_extensions(t: &mut Builder) {
    let extensions = [
        (0xD1, Read::Mapper, Write::Mapper),
        (0xD2, Read::Palette, Write::Palette),
        (0xD3, Read::DmaBlit, Write::DmaBlit),
    ];
    for config in 0..NUM_CONFIGS {
        for (page, read, write) in extensions {
            if t.read_cell(config, page) == Some(Read::Vic) {
                t.set_read(config, page, read);
            }
            for vbank in 0..NUM_VBANKS {
                if t.write_cell(vbank, config, page) == Some(Write::Vic) {
                    t.set_write(vbank, config, page, write);
                }
            }
        }
    }
}
