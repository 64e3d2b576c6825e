//! C64 PLA truth table as dispatch tables.
//!
//! The configuration index is `LORAM | HIRAM << 1 | CHAREN << 2 | EXROM << 3
//! | GAME << 4` with the cartridge lines counted as 1 when asserted, so
//! configs 8-15 are 8K cartridge mode, 16-23 Ultimax and 24-31 16K mode.
//! Stores vary by the VIC-II bank (four write variants).

use commodore_banking::{Base, DispatchTables, Result, TableBuilder, VbankWindow};

use crate::config::BoardType;

/// Number of PLA configurations.
pub const NUM_CONFIGS: usize = 32;

/// Number of 16K VIC-II banks.
pub const NUM_VBANKS: usize = 4;

/// Configuration after reset with no cartridge.
pub const DEFAULT_CONFIG: usize = 7;

/// Read handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Read {
    /// $00-$FF with the processor port at $00/$01.
    Zero,
    Ram,
    Basic,
    Kernal,
    Chargen,
    Vic,
    Sid,
    ColorRam,
    Cia1,
    Cia2,
    Io1,
    Io2,
    Roml,
    Romh,
    /// Unmapped Ultimax areas.
    Ultimax,
    /// Nothing connected.
    Void,
}

/// Store handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Write {
    Zero,
    Ram,
    /// RAM inside the current video bank.
    Vbank(VbankWindow),
    /// Page $FF: video bank 3 store and REU trigger at $FF00.
    RamHi,
    Vic,
    Sid,
    ColorRam,
    Cia1,
    Cia2,
    Io1,
    Io2,
    /// Ultimax store at $8000-$9FFF.
    Roml,
    /// Store under ROML in 8K/16K mode.
    RamlNoUltimax,
    /// Ultimax store at $E000-$FFFF.
    Romh,
    Ultimax,
    Void,
}

/// Direct-read sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Ram,
    Basic,
    Kernal,
    Chargen,
}

pub type Tables = DispatchTables<Read, Write, Source>;

/// I/O visible at $D000-$DFFF.
pub const IO_CONFIG: [bool; NUM_CONFIGS] = [
    false, false, false, false, false, true, true, true, //
    false, false, false, false, false, true, true, true, //
    true, true, true, true, true, true, true, true, //
    false, false, false, false, false, true, true, true,
];

/// ROML visible at $8000-$9FFF.
pub const ROML_CONFIG: [bool; NUM_CONFIGS] = [
    false, false, false, false, false, false, false, false, //
    false, false, false, true, false, false, false, true, //
    true, true, true, true, true, true, true, true, //
    false, false, false, true, false, false, false, true,
];

/// ROMH visible: $A000-$BFFF in 16K mode, $E000-$FFFF in Ultimax mode.
pub const ROMH_CONFIG: [bool; NUM_CONFIGS] = [
    false, false, false, false, false, false, false, false, //
    false, false, false, false, false, false, false, false, //
    true, true, true, true, true, true, true, true, //
    false, false, true, true, false, false, true, true,
];

const CHARGEN_CONFIGS: [usize; 8] = [1, 2, 3, 9, 10, 11, 26, 27];
pub const BASIC_CONFIGS: [usize; 4] = [3, 7, 11, 15];

/// KERNAL visible at $E000-$FFFF.
pub const KERNAL_CONFIGS: [usize; 12] = [2, 3, 6, 7, 10, 11, 14, 15, 26, 27, 30, 31];

#[must_use]
pub fn is_ultimax(config: usize) -> bool {
    (16..24).contains(&config)
}

/// Handler pair for a page of the I/O area.
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

/// Build the full table set for a board.
pub fn build(board: BoardType) -> Result<Tables> {
    let mut t = TableBuilder::new(NUM_CONFIGS, NUM_VBANKS);

    for config in 0..NUM_CONFIGS {
        default_row(&mut t, config, board);
    }

    let chargen = Some(Base::new(Source::Chargen, -0xD000));
    for config in CHARGEN_CONFIGS {
        for page in 0xD0..=0xDF {
            t.map_read(config, page, Read::Chargen, chargen);
        }
    }

    overlay_roms_and_io(&mut t);
    t.build()
}

/// RAM everywhere, with video bank stores and the processor port.
fn default_row(t: &mut TableBuilder<Read, Write, Source>, config: usize, board: BoardType) {
    let ram = Some(Base::new(Source::Ram, 0));

    t.map_read(config, 0, Read::Zero, ram);
    t.set_write_hook(config, 0, Write::Zero);

    for page in 1..=0xFE {
        if board == BoardType::Max && page >= 0x08 {
            t.map_read(config, page, Read::Void, None);
            t.set_write_hook(config, page, Write::Void);
            continue;
        }
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

    if board == BoardType::Max {
        t.map_read(config, 0xFF, Read::Void, None);
        t.set_write_hook(config, 0xFF, Write::Void);
    } else {
        t.map_read(config, 0xFF, Read::Ram, ram);
        t.set_write_hook(config, 0xFF, Write::RamHi);
    }
}

/// BASIC, KERNAL, I/O and the cartridge port over the default rows.
fn overlay_roms_and_io(t: &mut TableBuilder<Read, Write, Source>) {
    let basic = Some(Base::new(Source::Basic, -0xA000));
    for config in BASIC_CONFIGS {
        for page in 0xA0..=0xBF {
            t.map_read(config, page, Read::Basic, basic);
        }
    }

    let kernal = Some(Base::new(Source::Kernal, -0xE000));
    for config in KERNAL_CONFIGS {
        for page in 0xE0..=0xFF {
            t.map_read(config, page, Read::Kernal, kernal);
        }
    }

    for config in 0..NUM_CONFIGS {
        if IO_CONFIG[config] {
            for page in 0xD0..=0xDF {
                let (read, write) = io_handlers(page);
                t.map_read(config, page, read, None);
                t.set_write_hook(config, page, write);
            }
        }

        if ROML_CONFIG[config] {
            for page in 0x80..=0x9F {
                t.map_read(config, page, Read::Roml, None);
                if !is_ultimax(config) {
                    t.set_write_hook(config, page, Write::RamlNoUltimax);
                }
            }
        }
    }

    for config in 16..24 {
        for page in 0x10..=0x7F {
            t.map_read(config, page, Read::Ultimax, None);
            t.set_write_hook(config, page, Write::Ultimax);
        }
        for page in 0x80..=0x9F {
            t.set_write_hook(config, page, Write::Roml);
        }
        for page in 0xA0..=0xBF {
            t.map_read(config, page, Read::Ultimax, None);
            t.set_write_hook(config, page, Write::Ultimax);
        }
        for page in 0xC0..=0xCF {
            t.map_read(config, page, Read::Ultimax, None);
            t.set_write_hook(config, page, Write::Ultimax);
        }
    }

    for config in 0..NUM_CONFIGS {
        if ROMH_CONFIG[config] {
            let first = if is_ultimax(config) { 0xE0 } else { 0xA0 };
            for page in first..first + 0x20 {
                t.map_read(config, page, Read::Romh, None);
            }
        }
    }

    for config in 16..24 {
        for page in 0xE0..=0xFF {
            t.set_write_hook(config, page, Write::Romh);
        }
    }
}
