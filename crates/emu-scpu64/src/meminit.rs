//! SuperCPU memory map as dispatch tables.
//!
//! The configuration index is `LORAM | HIRAM << 1 | CHAREN << 2 | EXROM << 3
//! | GAME << 4 | HWENABLE << 5 | DOSEXT << 6 | BOOTMAP << 7`, 256 rows.
//! Rows $E0-$FF run from motherboard RAM (boot map with hardware registers
//! and DOS extension both on). Stores vary by the mirror mode, so there are
//! sixteen write variants.

use commodore_banking::{Base, DispatchTables, Result, TableBuilder};

use crate::registers::{MIRRORS, is_mirrored};

pub const NUM_CONFIGS: usize = 256;

pub const NUM_MIRRORS: usize = MIRRORS.len();

/// First configuration that runs from motherboard RAM.
pub const INTERNAL_CONFIGS: usize = 0xE0;

/// Port at 7, boot map on.
pub const DEFAULT_CONFIG: usize = 0x87;

/// Configurations the KERNAL traps may patch.
pub const KERNAL_CONFIGS: [usize; 12] = [2, 3, 6, 7, 10, 11, 14, 15, 26, 27, 30, 31];

/// Read handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Read {
    /// SRAM bank 0.
    Sram,
    /// SRAM bank 1.
    Sram1,
    /// KERNAL copy at SRAM $16000-$17FFF, seen at $E000-$FFFF.
    KernalShadow,
    /// Motherboard RAM.
    Internal,
    Roml,
    Romh,
    Ultimax,
    /// $D000-$D1FF with the hardware status block at $D0B0.
    Vic,
    /// $D200-$D3FF: SuperCPU registers kept in SRAM bank 1.
    Registers,
    Sid,
    ColorRam,
    /// Colour RAM in the internal maps: write-only, reads float.
    ColorRamInt,
    Cia1,
    Cia2,
    Io1,
    Io2,
    Eprom,
    Chargen,
}

/// Where a RAM store lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Store {
    Sram,
    /// SRAM and motherboard RAM, so the VIC-II sees it.
    Mirrored,
    /// Motherboard RAM only.
    Internal,
}

/// Store handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Write {
    /// Page 0: $01 also drives the emulated processor port.
    Zero(Store),
    Ram(Store),
    /// Page $FF: $FF00 triggers REU DMA.
    RamHi(Store),
    Roml,
    Romh,
    Ultimax,
    Vic,
    Registers,
    Sid,
    ColorRam,
    ColorRamInt,
    Cia1,
    Cia2,
    Io1,
    Io2,
}

/// Direct-read sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Sram,
    /// Motherboard RAM.
    Internal,
    /// KERNAL trap copy.
    TrapRam,
    Eprom,
    Chargen,
    Simm,
}

pub type Tables = DispatchTables<Read, Write, Source>;

/// Truth table cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Map {
    /// SRAM bank 0.
    R0,
    /// SRAM bank 1.
    R1,
    /// Motherboard RAM.
    Rc,
    /// Ultimax cartridge.
    Um,
    Rl,
    Rh,
    Io,
    /// Character ROM.
    Cr,
    /// SuperCPU EPROM.
    F8,
    /// KERNAL shadow.
    Ks,
    /// KERNAL with traps.
    Kt,
    Co,
    /// Internal colour RAM.
    Op,
}

/// Page ranges sharing one truth table column.
const AREAS: [(usize, usize); 10] = [
    (0x00, 0x0F),
    (0x10, 0x5F),
    (0x60, 0x7F),
    (0x80, 0x9F),
    (0xA0, 0xBF),
    (0xC0, 0xCF),
    (0xD0, 0xD7),
    (0xD8, 0xDB),
    (0xDC, 0xDF),
    (0xE0, 0xFF),
];

#[rustfmt::skip]
const TRUTH: [[Map; NUM_CONFIGS]; AREAS.len()] = {
    use Map::{Co, Cr, F8, Io, Ks, Kt, Op, R0, R1, Rc, Rh, Rl, Um};
    [
        // $0000-$0FFF
        [
            R0, R0, R0, R0, R0, R0, R0, R0,  R0, R0, R0, R0, R0, R0, R0, R0,
            R0, R0, R0, R0, R0, R0, R0, R0,  R0, R0, R0, R0, R0, R0, R0, R0,
            R0, R0, R0, R0, R0, R0, R0, R0,  R0, R0, R0, R0, R0, R0, R0, R0,
            R0, R0, R0, R0, R0, R0, R0, R0,  R0, R0, R0, R0, R0, R0, R0, R0,
            R0, R0, R0, R0, R0, R0, R0, R0,  R0, R0, R0, R0, R0, R0, R0, R0,
            R0, R0, R0, R0, R0, R0, R0, R0,  R0, R0, R0, R0, R0, R0, R0, R0,
            R0, R0, R0, R0, R0, R0, R0, R0,  R0, R0, R0, R0, R0, R0, R0, R0,
            R0, R0, R0, R0, R0, R0, R0, R0,  R0, R0, R0, R0, R0, R0, R0, R0,
            R0, R0, R0, R0, R0, R0, R0, R0,  R0, R0, R0, R0, R0, R0, R0, R0,
            R0, R0, R0, R0, R0, R0, R0, R0,  R0, R0, R0, R0, R0, R0, R0, R0,
            R0, R0, R0, R0, R0, R0, R0, R0,  R0, R0, R0, R0, R0, R0, R0, R0,
            R0, R0, R0, R0, R0, R0, R0, R0,  R0, R0, R0, R0, R0, R0, R0, R0,
            R0, R0, R0, R0, R0, R0, R0, R0,  R0, R0, R0, R0, R0, R0, R0, R0,
            R0, R0, R0, R0, R0, R0, R0, R0,  R0, R0, R0, R0, R0, R0, R0, R0,
            Rc, Rc, Rc, Rc, Rc, Rc, Rc, Rc,  Rc, Rc, Rc, Rc, Rc, Rc, Rc, Rc,
            Rc, Rc, Rc, Rc, Rc, Rc, Rc, Rc,  Rc, Rc, Rc, Rc, Rc, Rc, Rc, Rc,
        ],
        // $1000-$5FFF
        [
            R0, R0, R0, R0, R0, R0, R0, R0,  R0, R0, R0, R0, R0, R0, R0, R0,
            R0, R0, R0, R0, R0, R0, R0, R0,  R0, R0, R0, R0, R0, R0, R0, R0,
            R0, R0, R0, R0, R0, R0, R0, R0,  R0, R0, R0, R0, R0, R0, R0, R0,
            R0, R0, R0, R0, R0, R0, R0, R0,  R0, R0, R0, R0, R0, R0, R0, R0,
            R1, R1, R1, R1, R1, R1, R1, R1,  R1, R1, R1, R1, R1, R1, R1, R1,
            R1, R1, R1, R1, R1, R1, R1, R1,  R1, R1, R1, R1, R1, R1, R1, R1,
            R1, R1, R1, R1, R1, R1, R1, R1,  R1, R1, R1, R1, R1, R1, R1, R1,
            R1, R1, R1, R1, R1, R1, R1, R1,  R1, R1, R1, R1, R1, R1, R1, R1,
            R0, R0, R0, R0, R0, R0, R0, R0,  R0, R0, R0, R0, R0, R0, R0, R0,
            R0, R0, R0, R0, R0, R0, R0, R0,  R0, R0, R0, R0, R0, R0, R0, R0,
            R0, R0, R0, R0, R0, R0, R0, R0,  R0, R0, R0, R0, R0, R0, R0, R0,
            R0, R0, R0, R0, R0, R0, R0, R0,  R0, R0, R0, R0, R0, R0, R0, R0,
            R1, R1, R1, R1, R1, R1, R1, R1,  R1, R1, R1, R1, R1, R1, R1, R1,
            R1, R1, R1, R1, R1, R1, R1, R1,  R1, R1, R1, R1, R1, R1, R1, R1,
            Rc, Rc, Rc, Rc, Rc, Rc, Rc, Rc,  Rc, Rc, Rc, Rc, Rc, Rc, Rc, Rc,
            Um, Um, Um, Um, Um, Um, Um, Um,  Rc, Rc, Rc, Rc, Rc, Rc, Rc, Rc,
        ],
        // $6000-$7FFF
        [
            R0, R0, R0, R0, R0, R0, R0, R0,  R0, R0, R0, R0, R0, R0, R0, R0,
            R0, R0, R0, R0, R0, R0, R0, R0,  R0, R0, R0, R0, R0, R0, R0, R0,
            R0, R0, R0, R0, R0, R0, R0, R0,  R0, R0, R0, R0, R0, R0, R0, R0,
            R0, R0, R0, R0, R0, R0, R0, R0,  R0, R0, R0, R0, R0, R0, R0, R0,
            R0, R0, R0, R0, R0, R0, R0, R0,  R0, R0, R0, R0, R0, R0, R0, R0,
            R0, R0, R0, R0, R0, R0, R0, R0,  R0, R0, R0, R0, R0, R0, R0, R0,
            R0, R0, R0, R0, R0, R0, R0, R0,  R0, R0, R0, R0, R0, R0, R0, R0,
            R0, R0, R0, R0, R0, R0, R0, R0,  R0, R0, R0, R0, R0, R0, R0, R0,
            R0, R0, R0, R0, R0, R0, R0, R0,  R0, R0, R0, R0, R0, R0, R0, R0,
            R0, R0, R0, R0, R0, R0, R0, R0,  R0, R0, R0, R0, R0, R0, R0, R0,
            R0, R0, R0, R0, R0, R0, R0, R0,  R0, R0, R0, R0, R0, R0, R0, R0,
            R0, R0, R0, R0, R0, R0, R0, R0,  R0, R0, R0, R0, R0, R0, R0, R0,
            R0, R0, R0, R0, R0, R0, R0, R0,  R0, R0, R0, R0, R0, R0, R0, R0,
            R0, R0, R0, R0, R0, R0, R0, R0,  R0, R0, R0, R0, R0, R0, R0, R0,
            Rc, Rc, Rc, Rc, Rc, Rc, Rc, Rc,  Rc, Rc, Rc, Rc, Rc, Rc, Rc, Rc,
            Um, Um, Um, Um, Um, Um, Um, Um,  Rc, Rc, Rc, Rc, Rc, Rc, Rc, Rc,
        ],
        // $8000-$9FFF
        [
            R0, R0, R0, R0, R0, R0, R0, R0,  R0, R0, R0, Rl, R0, R0, R0, Rl,
            R0, R0, R0, R0, R0, R0, R0, R0,  R0, R0, R0, Rl, R0, R0, R0, Rl,
            R0, R0, R0, R0, R0, R0, R0, R0,  R0, R0, R0, Rl, R0, R0, R0, Rl,
            R0, R0, R0, R0, R0, R0, R0, R0,  R0, R0, R0, Rl, R0, R0, R0, Rl,
            R1, R1, R1, R1, R1, R1, R1, R1,  R1, R1, R1, R1, R1, R1, R1, R1,
            R1, R1, R1, R1, R1, R1, R1, R1,  R1, R1, R1, R1, R1, R1, R1, R1,
            R1, R1, R1, R1, R1, R1, R1, R1,  R1, R1, R1, R1, R1, R1, R1, R1,
            R1, R1, R1, R1, R1, R1, R1, R1,  R1, R1, R1, R1, R1, R1, R1, R1,
            F8, F8, F8, F8, F8, F8, F8, F8,  F8, F8, F8, F8, F8, F8, F8, F8,
            F8, F8, F8, F8, F8, F8, F8, F8,  F8, F8, F8, F8, F8, F8, F8, F8,
            F8, F8, F8, F8, F8, F8, F8, F8,  F8, F8, F8, F8, F8, F8, F8, F8,
            F8, F8, F8, F8, F8, F8, F8, F8,  F8, F8, F8, F8, F8, F8, F8, F8,
            F8, F8, F8, F8, F8, F8, F8, F8,  F8, F8, F8, F8, F8, F8, F8, F8,
            F8, F8, F8, F8, F8, F8, F8, F8,  F8, F8, F8, F8, F8, F8, F8, F8,
            Rc, Rc, Rc, Rc, Rc, Rc, Rc, Rc,  Rl, Rl, Rl, Rl, Rl, Rl, Rl, Rl,
            Um, Um, Um, Um, Um, Um, Um, Um,  Rl, Rl, Rl, Rl, Rl, Rl, Rl, Rl,
        ],
        // $A000-$BFFF
        [
            R0, R0, R0, R1, R0, R0, R0, R1,  R0, R0, R0, R1, R0, R0, R0, R1,
            R0, R0, R0, R1, R0, R0, R0, R1,  R0, R0, Rh, Rh, R0, R0, Rh, Rh,
            R0, R0, R0, R1, R0, R0, R0, R1,  R0, R0, R0, R1, R0, R0, R0, R1,
            R0, R0, R0, R1, R0, R0, R0, R1,  R0, R0, Rh, Rh, R0, R0, Rh, Rh,
            R0, R0, R0, R1, R0, R0, R0, R1,  R0, R0, R0, R1, R0, R0, R0, R1,
            R0, R0, R0, R1, R0, R0, R0, R1,  R0, R0, Rh, Rh, R0, R0, Rh, Rh,
            R0, R0, R0, R1, R0, R0, R0, R1,  R0, R0, R0, R1, R0, R0, R0, R1,
            R0, R0, R0, R1, R0, R0, R0, R1,  R0, R0, Rh, Rh, R0, R0, Rh, Rh,
            F8, F8, F8, F8, F8, F8, F8, F8,  F8, F8, F8, F8, F8, F8, F8, F8,
            F8, F8, F8, F8, F8, F8, F8, F8,  F8, F8, F8, F8, F8, F8, F8, F8,
            F8, F8, F8, F8, F8, F8, F8, F8,  F8, F8, F8, F8, F8, F8, F8, F8,
            F8, F8, F8, F8, F8, F8, F8, F8,  F8, F8, F8, F8, F8, F8, F8, F8,
            F8, F8, F8, F8, F8, F8, F8, F8,  F8, F8, F8, F8, F8, F8, F8, F8,
            F8, F8, F8, F8, F8, F8, F8, F8,  F8, F8, F8, F8, F8, F8, F8, F8,
            F8, F8, F8, F8, F8, F8, F8, F8,  F8, F8, F8, F8, F8, F8, F8, F8,
            Um, Um, Um, Um, Um, Um, Um, Um,  Rh, Rh, Rh, Rh, Rh, Rh, Rh, Rh,
        ],
        // $C000-$CFFF
        [
            R0, R0, R0, R0, R0, R0, R0, R0,  R0, R0, R0, R0, R0, R0, R0, R0,
            R0, R0, R0, R0, R0, R0, R0, R0,  R0, R0, R0, R0, R0, R0, R0, R0,
            R0, R0, R0, R0, R0, R0, R0, R0,  R0, R0, R0, R0, R0, R0, R0, R0,
            R0, R0, R0, R0, R0, R0, R0, R0,  R0, R0, R0, R0, R0, R0, R0, R0,
            R0, R0, R0, R0, R0, R0, R0, R0,  R0, R0, R0, R0, R0, R0, R0, R0,
            R0, R0, R0, R0, R0, R0, R0, R0,  R0, R0, R0, R0, R0, R0, R0, R0,
            R0, R0, R0, R0, R0, R0, R0, R0,  R0, R0, R0, R0, R0, R0, R0, R0,
            R0, R0, R0, R0, R0, R0, R0, R0,  R0, R0, R0, R0, R0, R0, R0, R0,
            F8, F8, F8, F8, F8, F8, F8, F8,  F8, F8, F8, F8, F8, F8, F8, F8,
            F8, F8, F8, F8, F8, F8, F8, F8,  F8, F8, F8, F8, F8, F8, F8, F8,
            F8, F8, F8, F8, F8, F8, F8, F8,  F8, F8, F8, F8, F8, F8, F8, F8,
            F8, F8, F8, F8, F8, F8, F8, F8,  F8, F8, F8, F8, F8, F8, F8, F8,
            F8, F8, F8, F8, F8, F8, F8, F8,  F8, F8, F8, F8, F8, F8, F8, F8,
            F8, F8, F8, F8, F8, F8, F8, F8,  F8, F8, F8, F8, F8, F8, F8, F8,
            Rc, Rc, Rc, Rc, Rc, Rc, Rc, Rc,  Rc, Rc, Rc, Rc, Rc, Rc, Rc, Rc,
            Um, Um, Um, Um, Um, Um, Um, Um,  Rc, Rc, Rc, Rc, Rc, Rc, Rc, Rc,
        ],
        // $D000-$D7FF
        [
            R0, Cr, Cr, Cr, R0, Io, Io, Io,  R0, Cr, Cr, Cr, R0, Io, Io, Io,
            R0, Cr, Cr, Cr, R0, Io, Io, Io,  R0, R0, Cr, Cr, R0, Io, Io, Io,
            R0, Cr, Cr, Cr, R0, Io, Io, Io,  R0, Cr, Cr, Cr, R0, Io, Io, Io,
            R0, Cr, Cr, Cr, R0, Io, Io, Io,  R0, R0, Cr, Cr, R0, Io, Io, Io,
            R0, Cr, Cr, Cr, R0, Io, Io, Io,  R0, Cr, Cr, Cr, R0, Io, Io, Io,
            R0, Cr, Cr, Cr, R0, Io, Io, Io,  R0, R0, Cr, Cr, R0, Io, Io, Io,
            R0, Cr, Cr, Cr, R0, Io, Io, Io,  R0, Cr, Cr, Cr, R0, Io, Io, Io,
            R0, Cr, Cr, Cr, R0, Io, Io, Io,  R0, R0, Cr, Cr, R0, Io, Io, Io,
            F8, Cr, Cr, Cr, F8, Io, Io, Io,  F8, Cr, Cr, Cr, F8, Io, Io, Io,
            F8, Cr, Cr, Cr, F8, Io, Io, Io,  F8, F8, Cr, Cr, F8, Io, Io, Io,
            F8, Cr, Cr, Cr, F8, Io, Io, Io,  F8, Cr, Cr, Cr, F8, Io, Io, Io,
            F8, Cr, Cr, Cr, F8, Io, Io, Io,  F8, F8, Cr, Cr, F8, Io, Io, Io,
            F8, Cr, Cr, Cr, F8, Io, Io, Io,  F8, Cr, Cr, Cr, F8, Io, Io, Io,
            F8, Cr, Cr, Cr, F8, Io, Io, Io,  F8, F8, Cr, Cr, F8, Io, Io, Io,
            Cr, Cr, Cr, Cr, Cr, Io, Io, Io,  Cr, Cr, Cr, Cr, Cr, Io, Io, Io,
            Cr, Cr, Cr, Cr, Cr, Io, Io, Io,  Cr, Cr, Cr, Cr, Cr, Io, Io, Io,
        ],
        // $D800-$DBFF
        [
            R0, Cr, Cr, Cr, R0, Co, Co, Co,  R0, Cr, Cr, Cr, R0, Co, Co, Co,
            R0, Cr, Cr, Cr, R0, Co, Co, Co,  R0, R0, Cr, Cr, R0, Co, Co, Co,
            R0, Cr, Cr, Cr, R0, Co, Co, Co,  R0, Cr, Cr, Cr, R0, Co, Co, Co,
            R0, Cr, Cr, Cr, R0, Co, Co, Co,  R0, R0, Cr, Cr, R0, Co, Co, Co,
            R0, Cr, Cr, Cr, R0, Co, Co, Co,  R0, Cr, Cr, Cr, R0, Co, Co, Co,
            R0, Cr, Cr, Cr, R0, Co, Co, Co,  R0, R0, Cr, Cr, R0, Co, Co, Co,
            R0, Cr, Cr, Cr, R0, Co, Co, Co,  R0, Cr, Cr, Cr, R0, Co, Co, Co,
            R0, Cr, Cr, Cr, R0, Co, Co, Co,  R0, R0, Cr, Cr, R0, Co, Co, Co,
            F8, Cr, Cr, Cr, F8, Co, Co, Co,  F8, Cr, Cr, Cr, F8, Co, Co, Co,
            F8, Cr, Cr, Cr, F8, Co, Co, Co,  F8, F8, Cr, Cr, F8, Co, Co, Co,
            F8, Cr, Cr, Cr, F8, Co, Co, Co,  F8, Cr, Cr, Cr, F8, Co, Co, Co,
            F8, Cr, Cr, Cr, F8, Co, Co, Co,  F8, F8, Cr, Cr, F8, Co, Co, Co,
            F8, Cr, Cr, Cr, F8, Co, Co, Co,  F8, Cr, Cr, Cr, F8, Co, Co, Co,
            F8, Cr, Cr, Cr, F8, Co, Co, Co,  F8, F8, Cr, Cr, F8, Co, Co, Co,
            Cr, Cr, Cr, Cr, Cr, Op, Op, Op,  Cr, Cr, Cr, Cr, Cr, Op, Op, Op,
            Cr, Cr, Cr, Cr, Cr, Op, Op, Op,  Cr, Cr, Cr, Cr, Cr, Op, Op, Op,
        ],
        // $DC00-$DFFF
        [
            R0, Cr, Cr, Cr, R0, Io, Io, Io,  R0, Cr, Cr, Cr, R0, Io, Io, Io,
            R0, Cr, Cr, Cr, R0, Io, Io, Io,  R0, R0, Cr, Cr, R0, Io, Io, Io,
            R0, Cr, Cr, Cr, R0, Io, Io, Io,  R0, Cr, Cr, Cr, R0, Io, Io, Io,
            R0, Cr, Cr, Cr, R0, Io, Io, Io,  R0, R0, Cr, Cr, R0, Io, Io, Io,
            R0, Cr, Cr, Cr, R0, Io, Io, Io,  R0, Cr, Cr, Cr, R0, Io, Io, Io,
            R0, Cr, Cr, Cr, R0, Io, Io, Io,  R0, R0, Cr, Cr, R0, Io, Io, Io,
            R0, Cr, Cr, Cr, R0, Io, Io, Io,  R0, Cr, Cr, Cr, R0, Io, Io, Io,
            R0, Cr, Cr, Cr, R0, Io, Io, Io,  R0, R0, Cr, Cr, R0, Io, Io, Io,
            F8, Cr, Cr, Cr, F8, Io, Io, Io,  F8, Cr, Cr, Cr, F8, Io, Io, Io,
            F8, Cr, Cr, Cr, F8, Io, Io, Io,  F8, F8, Cr, Cr, F8, Io, Io, Io,
            F8, Cr, Cr, Cr, F8, Io, Io, Io,  F8, Cr, Cr, Cr, F8, Io, Io, Io,
            F8, Cr, Cr, Cr, F8, Io, Io, Io,  F8, F8, Cr, Cr, F8, Io, Io, Io,
            F8, Cr, Cr, Cr, F8, Io, Io, Io,  F8, Cr, Cr, Cr, F8, Io, Io, Io,
            F8, Cr, Cr, Cr, F8, Io, Io, Io,  F8, F8, Cr, Cr, F8, Io, Io, Io,
            Cr, Cr, Cr, Cr, Cr, Io, Io, Io,  Cr, Cr, Cr, Cr, Cr, Io, Io, Io,
            Cr, Cr, Cr, Cr, Cr, Io, Io, Io,  Cr, Cr, Cr, Cr, Cr, Io, Io, Io,
        ],
        // $E000-$FFFF
        [
            R0, R0, Kt, Kt, R0, R0, Kt, Kt,  R0, R0, Kt, Kt, R0, R0, Kt, Kt,
            R0, R0, Kt, Kt, R0, R0, Kt, Kt,  R0, R0, Kt, Kt, R0, R0, Kt, Kt,
            R0, R0, Ks, Ks, R0, R0, Ks, Ks,  R0, R0, Ks, Ks, R0, R0, Ks, Ks,
            R0, R0, Ks, Ks, R0, R0, Ks, Ks,  R0, R0, Ks, Ks, R0, R0, Ks, Ks,
            R0, R0, Kt, Kt, R0, R0, Kt, Kt,  R0, R0, Kt, Kt, R0, R0, Kt, Kt,
            R0, R0, Kt, Kt, R0, R0, Kt, Kt,  R0, R0, Kt, Kt, R0, R0, Kt, Kt,
            R0, R0, Ks, Ks, R0, R0, Ks, Ks,  R0, R0, Ks, Ks, R0, R0, Ks, Ks,
            R0, R0, Ks, Ks, R0, R0, Ks, Ks,  R0, R0, Ks, Ks, R0, R0, Ks, Ks,
            F8, F8, F8, F8, F8, F8, F8, F8,  F8, F8, F8, F8, F8, F8, F8, F8,
            F8, F8, F8, F8, F8, F8, F8, F8,  F8, F8, F8, F8, F8, F8, F8, F8,
            F8, F8, F8, F8, F8, F8, F8, F8,  F8, F8, F8, F8, F8, F8, F8, F8,
            F8, F8, F8, F8, F8, F8, F8, F8,  F8, F8, F8, F8, F8, F8, F8, F8,
            F8, F8, F8, F8, F8, F8, F8, F8,  F8, F8, F8, F8, F8, F8, F8, F8,
            F8, F8, F8, F8, F8, F8, F8, F8,  F8, F8, F8, F8, F8, F8, F8, F8,
            F8, F8, F8, F8, F8, F8, F8, F8,  F8, F8, F8, F8, F8, F8, F8, F8,
            Um, Um, Um, Um, Um, Um, Um, Um,  F8, F8, F8, F8, F8, F8, F8, F8,
        ],    ]
};

/// Build the full table set.
pub fn build() -> Result<Tables> {
    let mut t = TableBuilder::new(NUM_CONFIGS, NUM_MIRRORS);

    for config in 0..NUM_CONFIGS {
        preset_row(&mut t, config);
    }

    for (cells, &(first, last)) in TRUTH.iter().zip(AREAS.iter()) {
        for page in first..=last {
            for (config, &cell) in cells.iter().enumerate() {
                apply(&mut t, config, page, cell);
            }
        }
    }

    // Motherboard and ROM reads need the slow clock
    for config in 0..NUM_CONFIGS {
        for page in 0..=0xFF {
            if matches!(
                t.read_cell(config, page),
                Some(Read::Internal | Read::Eprom | Read::Chargen)
            ) {
                t.set_slow(config, page);
            }
        }
    }

    t.build()
}

/// RAM everywhere: SRAM with mirrored stores below $E0, motherboard RAM
/// above.
fn preset_row(t: &mut TableBuilder<Read, Write, Source>, config: usize) {
    let internal = config >= INTERNAL_CONFIGS;
    let (read, base) = if internal {
        (Read::Internal, Base::new(Source::Internal, 0))
    } else {
        (Read::Sram, Base::new(Source::Sram, 0))
    };
    for page in 0..=0xFF {
        t.map_read(config, page, read, Some(base));
        for mirror in 0..NUM_MIRRORS {
            let store = if internal {
                Store::Internal
            } else if is_mirrored(mirror, page) {
                Store::Mirrored
            } else {
                Store::Sram
            };
            let write = match page {
                0 => Write::Zero(store),
                0xFF => Write::RamHi(store),
                _ => Write::Ram(store),
            };
            t.set_write(mirror, config, page, write);
        }
    }
}

/// I/O handler pair for a page of $D000-$D7FF or $DC00-$DFFF.
fn io_handlers(page: usize) -> (Read, Write, Option<Base<Source>>) {
    match page {
        0xD0 | 0xD1 => (Read::Vic, Write::Vic, None),
        0xD2 | 0xD3 => (
            Read::Registers,
            Write::Registers,
            Some(Base::new(Source::Sram, 0x1_0000)),
        ),
        0xD4..=0xD7 => (Read::Sid, Write::Sid, None),
        0xDC => (Read::Cia1, Write::Cia1, None),
        0xDD => (Read::Cia2, Write::Cia2, None),
        0xDE => (Read::Io1, Write::Io1, None),
        _ => (Read::Io2, Write::Io2, None),
    }
}

/// One truth table cell. Cells that only change reads keep the preset
/// stores.
fn apply(t: &mut TableBuilder<Read, Write, Source>, config: usize, page: usize, cell: Map) {
    let sram1 = Some(Base::new(Source::Sram, 0x1_0000));
    match cell {
        Map::R0 => t.map_read(config, page, Read::Sram, Some(Base::new(Source::Sram, 0))),
        Map::R1 => t.map_read(config, page, Read::Sram1, sram1),
        Map::Kt => t.map_read(
            config,
            page,
            Read::Sram1,
            Some(Base::new(Source::TrapRam, -0xE000)),
        ),
        Map::Ks => t.map_read(
            config,
            page,
            Read::KernalShadow,
            Some(Base::new(Source::Sram, 0x8000)),
        ),
        Map::Rc => t.map_read(
            config,
            page,
            Read::Internal,
            Some(Base::new(Source::Internal, 0)),
        ),
        Map::Um => {
            let (read, write) = match page & 0xF0 {
                0x80 | 0x90 => (Read::Roml, Write::Roml),
                0xE0 | 0xF0 => (Read::Romh, Write::Romh),
                _ => (Read::Ultimax, Write::Ultimax),
            };
            t.map_read(config, page, read, None);
            t.set_write_hook(config, page, write);
        }
        Map::Rl => t.map_read(config, page, Read::Roml, None),
        Map::Rh => t.map_read(config, page, Read::Romh, None),
        Map::Io => {
            let (read, write, base) = io_handlers(page);
            t.map_read(config, page, read, base);
            t.set_write_hook(config, page, write);
        }
        Map::Co => {
            t.map_read(config, page, Read::ColorRam, sram1);
            t.set_write_hook(config, page, Write::ColorRam);
        }
        Map::Op => {
            t.map_read(config, page, Read::ColorRamInt, None);
            t.set_write_hook(config, page, Write::ColorRamInt);
        }
        Map::F8 => t.map_read(config, page, Read::Eprom, Some(Base::new(Source::Eprom, 0))),
        Map::Cr => t.map_read(
            config,
            page,
            Read::Chargen,
            Some(Base::new(Source::Chargen, -0xD000)),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use commodore_banking::Limit;

    fn tables() -> Tables {
        build().unwrap()
    }

    #[test]
    fn boot_map_runs_the_eprom() {
        let t = tables();
        for page in [0x80, 0xA0, 0xC0, 0xE0, 0xFF] {
            assert_eq!(t.read(DEFAULT_CONFIG, page), Read::Eprom, "page {page:02X}");
            assert_eq!(t.limit(DEFAULT_CONFIG, page), Limit::NONE);
        }
        assert_eq!(t.read(DEFAULT_CONFIG, 0x10), Read::Sram);
        assert_eq!(t.read(DEFAULT_CONFIG, 0xD0), Read::Vic);
        assert_eq!(t.read(DEFAULT_CONFIG, 0xD8), Read::ColorRam);
    }

    #[test]
    fn normal_map_reads_bank_one_roms() {
        let t = tables();
        assert_eq!(t.read(7, 0xA0), Read::Sram1);
        assert_eq!(t.base(7, 0xE0), Some(Base::new(Source::TrapRam, -0xE000)));
        assert_eq!(t.read(7 | 0x20, 0xE0), Read::KernalShadow);
        assert_eq!(t.read(3, 0xD0), Read::Chargen);
        assert_eq!(t.read(0, 0xD0), Read::Sram);
        let limit = t.limit(7, 0xA0);
        assert_eq!((limit.start, limit.end), (0xA000, 0xBFFD));
    }

    #[test]
    fn internal_rows_use_motherboard_ram() {
        let t = tables();
        let config = 0xE7;
        assert_eq!(t.read(config, 0x10), Read::Internal);
        assert_eq!(t.write(0, config, 0x10), Write::Ram(Store::Internal));
        assert_eq!(t.write(0, config, 0x00), Write::Zero(Store::Internal));
        assert_eq!(t.read(config, 0xD8), Read::ColorRamInt);
        assert!(t.base(config, 0x10).is_some());
        assert_eq!(t.limit(config, 0x10), Limit::NONE);
    }

    #[test]
    fn mirror_variants_pick_pages() {
        let t = tables();
        // Mode 15: pages 2-$FF mirrored, zero page and stack not
        assert_eq!(t.write(15, 7, 0x00), Write::Zero(Store::Sram));
        assert_eq!(t.write(15, 7, 0x01), Write::Ram(Store::Sram));
        assert_eq!(t.write(15, 7, 0x04), Write::Ram(Store::Mirrored));
        assert_eq!(t.write(15, 7, 0xFF), Write::RamHi(Store::Mirrored));
        // Mode 8: $0400-$07FF only
        assert_eq!(t.write(8, 7, 0x04), Write::Ram(Store::Mirrored));
        assert_eq!(t.write(8, 7, 0x08), Write::Ram(Store::Sram));
        // Mode 10: nothing
        assert!((0..0xFF).all(|page| !matches!(t.write(10, 7, page), Write::Ram(Store::Mirrored))));
    }

    #[test]
    fn io_stores_ignore_mirror_mode() {
        let t = tables();
        for mirror in 0..NUM_MIRRORS {
            assert_eq!(t.write(mirror, 7, 0xD0), Write::Vic);
            assert_eq!(t.write(mirror, 7, 0xD2), Write::Registers);
            assert_eq!(t.write(mirror, 7, 0xDF), Write::Io2);
        }
        assert_eq!(t.base(7, 0xD2), Some(Base::new(Source::Sram, 0x1_0000)));
    }
}
