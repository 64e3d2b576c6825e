//! C64DTV memory subsystem.
//!
//! The CPU sees 64K through four 16K windows, each mapped onto any segment
//! of 2 MB RAM or 2 MB flash by the DTV registers. Only accesses that land
//! in the first 64K of RAM go through the C64 memory map; the rest hit RAM
//! directly. The VIC-II, DMA engine and blitter address physical memory.

use std::cell::Cell;

use commodore_banking::{
    AccessKind, ActiveRows, Base, BankList, Limit, Result, Translation, VbankWindow, WatchEvents,
    WatchHook, WatchMode, ram_init, snapshot,
};
use emu_c64::ScreenParams;
use emu_core::{Bus, Observable, Ticks, Value, parse_address};
use mos_6510_port::{PortModel, ProcessorPort};

use crate::config::C64DtvConfig;
use crate::flash::Flash;
use crate::io::DtvIo;
use crate::mapper::{self, MapTarget, MemoryMapper};
use crate::meminit::{self, DEFAULT_CONFIG, KERNAL_CONFIGS, Read, Source, Tables, Write};
use crate::registers::{DtvRegisters, PHYS_SIZE};

pub const BANK_CPU: u16 = 0;
pub const BANK_RAM: u16 = 1;
pub const BANK_ROM: u16 = 2;
pub const BANK_IO: u16 = 3;
pub const BANK_CART: u16 = 4;
/// `ram00`-`ram1f`: 64K RAM segments.
pub const BANK_RAM00: u16 = 5;
/// `rom00`-`rom1f`: 64K flash segments.
pub const BANK_ROM00: u16 = 37;

const SEGMENTS: u16 = 0x20;

/// Colour RAM lives in main RAM, a full byte per cell.
pub const COLOR_RAM: usize = 0x1_D800;

/// C64DTV memory subsystem.
pub struct C64DtvMemory<I: DtvIo> {
    ram: Box<[u8]>,
    flash: Flash,
    port: ProcessorPort,
    tables: Tables,
    rows: ActiveRows,
    regs: DtvRegisters,
    mapper: MemoryMapper,
    watch: WatchEvents,
    banks: BankList,
    mapper_peek_warned: Cell<bool>,
    pub io: I,
}

impl<I: DtvIo> C64DtvMemory<I> {
    pub fn new(config: &C64DtvConfig, io: I) -> Result<Self> {
        config.check()?;
        let tables = meminit::build()?;
        log::info!(
            "C64DTV memory initialised: {} configs, {:?}",
            tables.configs(),
            config.revision
        );
        let mut mem = Self {
            ram: vec![0; PHYS_SIZE].into_boxed_slice(),
            flash: Flash::new(&config.flash),
            port: ProcessorPort::new(PortModel::DTV),
            tables,
            rows: ActiveRows::new(DEFAULT_CONFIG),
            regs: DtvRegisters::new(),
            mapper: MemoryMapper::default(),
            watch: WatchEvents::new(),
            banks: BankList::new()
                .bank("default", BANK_CPU)
                .bank("cpu", BANK_CPU)
                .bank("ram", BANK_RAM)
                .bank("rom", BANK_ROM)
                .bank("io", BANK_IO)
                .bank("cart", BANK_CART)
                .array("ram", 0, 0x1F, BANK_RAM00)
                .array("rom", 0, 0x1F, BANK_ROM00),
            mapper_peek_warned: Cell::new(false),
            io,
        };
        mem.update_config();
        Ok(mem)
    }

    pub fn powerup(&mut self) {
        ram_init(&mut self.ram);
    }

    /// Reset: port, DTV registers, mapper and flash command state.
    pub fn reset(&mut self) {
        self.port.reset();
        self.regs.reset();
        self.mapper.reset();
        self.flash.reset();
        self.update_config();
    }

    pub fn update_config(&mut self) {
        let config = usize::from(self.port.bank_lines());
        if self.rows.update_config(config) {
            log::debug!("C64DTV memory config {config}");
        }
    }

    pub fn set_vbank(&mut self, vbank: usize) {
        let vbank = vbank & 3;
        self.rows.set_variant(vbank);
        self.io.set_vbank(vbank);
        log::debug!("C64DTV video bank {vbank}");
    }

    pub fn toggle_watchpoints(&mut self, mode: WatchMode) {
        self.rows.toggle_watchpoints(mode);
    }

    pub fn watch_events(&mut self) -> &mut WatchEvents {
        &mut self.watch
    }

    #[must_use]
    pub fn config(&self) -> usize {
        self.rows.config()
    }

    #[must_use]
    pub fn vbank(&self) -> usize {
        self.rows.variant()
    }

    #[must_use]
    pub fn port(&self) -> &ProcessorPort {
        &self.port
    }

    #[must_use]
    pub fn registers(&self) -> &DtvRegisters {
        &self.regs
    }

    /// Register file, for the CPU core to load and store.
    pub fn registers_mut(&mut self) -> &mut DtvRegisters {
        &mut self.regs
    }

    #[must_use]
    pub fn mapper(&self) -> MemoryMapper {
        self.mapper
    }

    #[must_use]
    pub fn flash(&self) -> &Flash {
        &self.flash
    }

    pub fn flash_mut(&mut self) -> &mut Flash {
        &mut self.flash
    }

    #[must_use]
    pub fn tables(&self) -> &Tables {
        &self.tables
    }

    // ------------------------------------------------------------------
    // CPU accesses

    fn now(&self) -> Ticks {
        self.io.cycles()
    }

    fn read_with(&mut self, addr: u16, kind: AccessKind) -> u8 {
        let paddr = self.regs.paddr(addr);
        if self.regs.is_rom(addr) {
            return self.flash.read(paddr);
        }
        if paddr > 0xFFFF {
            return self.ram[paddr];
        }
        let low = paddr as u16;
        if self.rows.watching(kind) {
            self.watch.load(low);
        }
        let handler = self.tables.read(self.rows.config(), paddr >> 8);
        self.read_handler(handler, low, kind)
    }

    fn write_with(&mut self, addr: u16, value: u8, watch: bool) {
        let paddr = self.regs.paddr(addr);
        if self.regs.is_rom(addr) {
            self.flash.store(paddr, value);
            return;
        }
        if paddr > 0xFFFF {
            self.ram[paddr] = value;
            return;
        }
        let low = paddr as u16;
        if watch {
            self.watch.store(low);
        }
        let handler = self
            .tables
            .write(self.rows.variant(), self.rows.config(), paddr >> 8);
        self.write_handler(handler, low, value, AccessKind::Cpu);
    }

    pub fn read(&mut self, addr: u16) -> u8 {
        self.read_with(addr, AccessKind::Cpu)
    }

    pub fn write(&mut self, addr: u16, value: u8) {
        let watch = self.rows.watching(AccessKind::Cpu);
        self.write_with(addr, value, watch);
    }

    pub fn dummy_write(&mut self, addr: u16, value: u8) {
        let watch = self.rows.watching_dummy();
        self.write_with(addr, value, watch);
    }

    /// Bus-master read of the first 64K through the memory map, without
    /// segment translation.
    pub fn dma_read(&mut self, addr: u16) -> u8 {
        let handler = self.tables.read(self.rows.config(), usize::from(addr >> 8));
        self.read_handler(handler, addr, AccessKind::Dma)
    }

    pub fn dma_write(&mut self, addr: u16, value: u8) {
        let handler = self.tables.write(
            self.rows.variant(),
            self.rows.config(),
            usize::from(addr >> 8),
        );
        self.write_handler(handler, addr, value, AccessKind::Dma);
    }

    /// Physical RAM, as the DMA engine, blitter and VIC-II see it.
    #[must_use]
    pub fn phys_read(&self, paddr: u32) -> u8 {
        self.ram[paddr as usize & (PHYS_SIZE - 1)]
    }

    pub fn phys_write(&mut self, paddr: u32, value: u8) {
        self.ram[paddr as usize & (PHYS_SIZE - 1)] = value;
    }

    /// KERNAL or BASIC area byte through the mapper.
    fn mapped_rom(&self, mapping: u8, addr: usize, direct: bool) -> u8 {
        match mapper::resolve(mapping, addr) {
            (MapTarget::Flash, paddr) if direct => self.flash.direct(paddr),
            (MapTarget::Flash, paddr) => self.flash.read(paddr),
            (MapTarget::Ram, paddr) => self.ram[paddr],
        }
    }

    fn extension_read(&mut self, handler: Read, addr: u16) -> u8 {
        if !self.io.extended_regs() {
            return self.io.vic_read(addr);
        }
        match handler {
            Read::Mapper => self.ram[usize::from(addr)],
            Read::Palette => self.io.palette_read(addr),
            _ => {
                let reg = (addr & 0x3F) as u8;
                if reg & 0x20 != 0 {
                    self.io.blitter_read(reg & 0x1F)
                } else {
                    self.io.dma_engine_read(reg)
                }
            }
        }
    }

    fn read_handler(&mut self, handler: Read, addr: u16, kind: AccessKind) -> u8 {
        let a = usize::from(addr);
        match handler {
            Read::Zero if kind.is_dma() => self.ram[a & 0xFF],
            Read::Zero => match addr & 0xFF {
                0 => self.port.read_dir(),
                1 => {
                    let now = self.now();
                    self.port.read_data(now)
                }
                low => self.ram[usize::from(low)],
            },
            Read::Ram => self.ram[a],
            Read::Basic => self.mapped_rom(self.mapper.basic, a, false),
            Read::Kernal => self.mapped_rom(self.mapper.kernal, a, false),
            Read::Chargen => self.flash.read(a),
            Read::Vic => self.io.vic_read(addr),
            Read::Mapper | Read::Palette | Read::DmaBlit => self.extension_read(handler, addr),
            Read::Sid => self.io.sid_read(addr),
            Read::ColorRam => self.ram[COLOR_RAM + (a & 0x3FF)],
            Read::Cia1 => self.io.cia1_read(addr),
            Read::Cia2 => self.io.cia2_read(addr),
            Read::Io1 | Read::Io2 => 0x00,
        }
    }

    fn zero_store(&mut self, addr: u16, value: u8, kind: AccessKind) {
        let reg = addr & 0xFF;
        let cell = usize::from(reg);
        let in_vbank = self.rows.variant() == 0;
        if kind.is_dma() || reg > 1 {
            if in_vbank && !kind.is_dma() {
                self.io.vbank_store(reg, value, VbankWindow::Plain);
            }
            self.ram[cell] = value;
            return;
        }

        let phi1 = self.io.phi1();
        if in_vbank {
            self.io.vbank_store(reg, phi1, VbankWindow::Plain);
        }
        self.ram[cell] = phi1;
        let now = self.now();
        let changed = if reg == 0 {
            self.port.store_dir(value, now)
        } else {
            self.port.store_data(value, now)
        };
        if changed {
            self.update_config();
        }
    }

    fn mapper_store(&mut self, addr: u16, value: u8) {
        if !self.io.extended_regs() {
            self.io.vic_store(addr, value);
            return;
        }
        // The hardware also writes through to RAM under $D1xx
        self.ram[usize::from(addr)] = value;
        if self.mapper.store(addr, value) {
            log::info!(
                "C64DTV mapper: KERNAL segment ${:02X}, BASIC segment ${:02X}",
                self.mapper.kernal,
                self.mapper.basic
            );
        }
    }

    fn write_handler(&mut self, handler: Write, addr: u16, value: u8, kind: AccessKind) {
        let a = usize::from(addr);
        match handler {
            Write::Zero => self.zero_store(addr, value, kind),
            Write::Ram => self.ram[a] = value,
            Write::Vbank(window) => {
                self.io.vbank_store(addr, value, window);
                self.ram[a] = value;
            }
            Write::RamHi => {
                if self.rows.variant() == 3 {
                    self.io.vbank_store(addr, value, VbankWindow::Page3f);
                }
                self.ram[a] = value;
            }
            Write::Vic => self.io.vic_store(addr, value),
            Write::Mapper => self.mapper_store(addr, value),
            Write::Palette if self.io.extended_regs() => self.io.palette_store(addr, value),
            Write::DmaBlit if self.io.extended_regs() => {
                let reg = (addr & 0x3F) as u8;
                if reg & 0x20 != 0 {
                    self.io.blitter_store(reg & 0x1F, value);
                } else {
                    self.io.dma_engine_store(reg, value);
                }
            }
            Write::Palette | Write::DmaBlit => self.io.vic_store(addr, value),
            Write::Sid => self.io.sid_store(addr, value),
            Write::ColorRam => self.ram[COLOR_RAM + (a & 0x3FF)] = value,
            Write::Cia1 => self.io.cia1_store(addr, value),
            Write::Cia2 => self.io.cia2_store(addr, value),
            Write::Io1 | Write::Io2 => {}
        }
    }

    // ------------------------------------------------------------------
    // Side-effect-free access

    fn warn_mapper_peek(&self) {
        if !self.mapper_peek_warned.replace(true) {
            log::warn!("C64DTV peek through the ROM mapper; not verified on hardware");
        }
    }

    fn peek_handler(&self, handler: Read, addr: u16) -> u8 {
        let a = usize::from(addr);
        match handler {
            Read::Zero => match addr & 0xFF {
                0 => self.port.read_dir(),
                1 => self.port.peek_data(self.now()),
                low => self.ram[usize::from(low)],
            },
            Read::Ram => self.ram[a],
            Read::Basic => {
                self.warn_mapper_peek();
                self.mapped_rom(self.mapper.basic, a, true)
            }
            Read::Kernal => {
                self.warn_mapper_peek();
                self.mapped_rom(self.mapper.kernal, a, true)
            }
            Read::Chargen => self.flash.direct(a),
            Read::Mapper if self.io.extended_regs() => self.ram[a],
            Read::Vic | Read::Mapper | Read::Palette | Read::DmaBlit => self.io.vic_peek(addr),
            Read::Sid => self.io.sid_peek(addr),
            Read::ColorRam => self.ram[COLOR_RAM + (a & 0x3FF)],
            Read::Cia1 => self.io.cia1_peek(addr),
            Read::Cia2 => self.io.cia2_peek(addr),
            Read::Io1 | Read::Io2 => 0x00,
        }
    }

    #[must_use]
    pub fn peek(&self, addr: u16) -> u8 {
        let paddr = self.regs.paddr(addr);
        if self.regs.is_rom(addr) {
            return self.flash.direct(paddr);
        }
        if paddr > 0xFFFF {
            return self.ram[paddr];
        }
        let handler = self.tables.read(self.rows.config(), paddr >> 8);
        self.peek_handler(handler, paddr as u16)
    }

    /// Direct-read window for a CPU address. None while the flash is in a
    /// command state, or where reads have side effects.
    #[must_use]
    pub fn translate(&self, addr: u16) -> Option<Translation<Source>> {
        let window = addr & 0xC000;
        let segment = self.regs.segment_base(usize::from(addr >> 14));
        let whole_window = Limit {
            start: window,
            end: window | 0x3FFD,
        };
        // Base placing `from` at physical `target`
        let shift = |source: Source, target: usize, from: u16| {
            Base::new(source, target as i32 - i32::from(from))
        };

        if self.regs.is_rom(addr) {
            if !self.flash.is_idle() {
                return None;
            }
            return Some(Translation {
                base: shift(Source::Flash, segment, window),
                limit: whole_window,
            });
        }
        if segment > 0xFFFF {
            return Some(Translation {
                base: shift(Source::Ram, segment, window),
                limit: whole_window,
            });
        }

        let paddr = segment | usize::from(addr & 0x3FFF);
        let config = self.rows.config();
        let page = paddr >> 8;
        if let Some(base) = self.tables.base(config, page) {
            if addr <= 1 {
                return None;
            }
            let delta = paddr as i32 - i32::from(addr);
            let limit = self.tables.limit(config, page);
            let start = (i32::from(limit.start) - delta).max(i32::from(whole_window.start));
            let end = (i32::from(limit.end) - delta).min(i32::from(whole_window.end));
            return Some(Translation {
                base: Base::new(base.source, base.offset + delta),
                limit: Limit {
                    start: start as u16,
                    end: end as u16,
                },
            });
        }
        if !self.flash.is_idle() {
            return None;
        }

        let rom = |mapping: u8| {
            let (target, mapped) = mapper::resolve(mapping, paddr & !0x3FFF);
            let source = match target {
                MapTarget::Flash => Source::Flash,
                MapTarget::Ram => Source::Ram,
            };
            Translation {
                base: shift(source, mapped, window),
                limit: Limit {
                    start: addr & 0xE000,
                    end: (addr & 0xE000) | 0x1FFD,
                },
            }
        };
        match self.tables.read(config, page) {
            Read::Kernal => Some(rom(self.mapper.kernal)),
            Read::Basic => Some(rom(self.mapper.basic)),
            Read::Chargen => Some(Translation {
                base: shift(Source::Flash, paddr & !0x3FFF, window),
                limit: Limit {
                    start: addr & 0xF000,
                    end: (addr & 0xF000) | 0x0FFD,
                },
            }),
            _ => None,
        }
    }

    #[must_use]
    pub fn source(&self, source: Source) -> &[u8] {
        match source {
            Source::Ram => &self.ram,
            Source::Flash => self.flash.contents(),
        }
    }

    // ------------------------------------------------------------------
    // Monitor banks

    #[must_use]
    pub fn banks(&self) -> &BankList {
        &self.banks
    }

    /// `ram00`-`ram1f` and `rom00`-`rom1f`.
    fn segment_cell(bank: u16, addr: u16) -> Option<(MapTarget, usize)> {
        let offset = usize::from(addr);
        if (BANK_RAM00..BANK_RAM00 + SEGMENTS).contains(&bank) {
            Some((MapTarget::Ram, (usize::from(bank - BANK_RAM00) << 16) + offset))
        } else if (BANK_ROM00..BANK_ROM00 + SEGMENTS).contains(&bank) {
            Some((MapTarget::Flash, (usize::from(bank - BANK_ROM00) << 16) + offset))
        } else {
            None
        }
    }

    fn io_read(&mut self, addr: u16) -> u8 {
        match addr >> 8 {
            0xD0..=0xD3 => self.io.vic_read(addr),
            0xD4..=0xD7 => self.io.sid_read(addr),
            0xD8..=0xDB => self.ram[COLOR_RAM + usize::from(addr & 0x3FF)],
            0xDC => self.io.cia1_read(addr),
            0xDD => self.io.cia2_read(addr),
            _ => 0x00,
        }
    }

    fn io_peek(&self, addr: u16) -> u8 {
        match addr >> 8 {
            0xD0..=0xD3 => self.io.vic_peek(addr),
            0xD4..=0xD7 => self.io.sid_peek(addr),
            0xD8..=0xDB => self.ram[COLOR_RAM + usize::from(addr & 0x3FF)],
            0xDC => self.io.cia1_peek(addr),
            0xDD => self.io.cia2_peek(addr),
            _ => 0x00,
        }
    }

    fn io_store(&mut self, addr: u16, value: u8) {
        match addr >> 8 {
            0xD0..=0xD3 => self.io.vic_store(addr, value),
            0xD4..=0xD7 => self.io.sid_store(addr, value),
            0xD8..=0xDB => self.ram[COLOR_RAM + usize::from(addr & 0x3FF)] = value,
            0xDC => self.io.cia1_store(addr, value),
            0xDD => self.io.cia2_store(addr, value),
            _ => {}
        }
    }

    /// ROM areas of the physical first 64K, for the `rom` bank.
    fn rom_byte(&self, paddr: usize, direct: bool) -> Option<u8> {
        match paddr {
            0xA000..=0xBFFF => Some(self.mapped_rom(self.mapper.basic, paddr, direct)),
            0xD000..=0xDFFF if direct => Some(self.flash.direct(paddr)),
            0xD000..=0xDFFF => Some(self.flash.read(paddr)),
            0xE000..=0xFFFF => Some(self.mapped_rom(self.mapper.kernal, paddr, direct)),
            _ => None,
        }
    }

    /// What the CPU window holds, ignoring the C64 memory map.
    fn segment_byte(&self, addr: u16, paddr: usize, direct: bool) -> u8 {
        match (self.regs.is_rom(addr), direct) {
            (true, true) => self.flash.direct(paddr),
            (true, false) => self.flash.read(paddr),
            (false, _) => self.ram[paddr],
        }
    }

    fn is_io(paddr: usize) -> bool {
        (0xD000..0xE000).contains(&paddr)
    }

    pub fn bank_read(&mut self, bank: u16, addr: u16) -> u8 {
        match Self::segment_cell(bank, addr) {
            Some((MapTarget::Ram, cell)) => return self.ram[cell],
            Some((MapTarget::Flash, cell)) => return self.flash.direct(cell),
            None => {}
        }
        let paddr = self.regs.paddr(addr);
        match bank {
            BANK_CPU => self.read(addr),
            BANK_IO if Self::is_io(paddr) => self.io_read(paddr as u16),
            BANK_ROM => self
                .rom_byte(paddr, false)
                .unwrap_or_else(|| self.segment_byte(addr, paddr, false)),
            _ => self.segment_byte(addr, paddr, false),
        }
    }

    #[must_use]
    pub fn bank_peek(&self, bank: u16, addr: u16) -> u8 {
        match Self::segment_cell(bank, addr) {
            Some((MapTarget::Ram, cell)) => return self.ram[cell],
            Some((MapTarget::Flash, cell)) => return self.flash.direct(cell),
            None => {}
        }
        let paddr = self.regs.paddr(addr);
        match bank {
            BANK_CPU => self.peek(addr),
            BANK_IO if Self::is_io(paddr) => self.io_peek(paddr as u16),
            BANK_ROM => self
                .rom_byte(paddr, true)
                .unwrap_or_else(|| self.segment_byte(addr, paddr, true)),
            _ => self.segment_byte(addr, paddr, true),
        }
    }

    pub fn bank_write(&mut self, bank: u16, addr: u16, value: u8) {
        match Self::segment_cell(bank, addr) {
            Some((MapTarget::Ram, cell)) => {
                self.ram[cell] = value;
                return;
            }
            Some((MapTarget::Flash, cell)) => {
                self.flash.direct_store(cell, value);
                return;
            }
            None => {}
        }
        let paddr = self.regs.paddr(addr);
        match bank {
            BANK_CPU => self.write(addr, value),
            BANK_IO if Self::is_io(paddr) => self.io_store(paddr as u16, value),
            BANK_ROM if self.rom_byte(paddr, true).is_some() => {}
            _ if self.regs.is_rom(addr) => self.flash.direct_store(paddr, value),
            _ => self.ram[paddr] = value,
        }
    }

    // ------------------------------------------------------------------
    // Helpers for loaders, traps and video

    pub fn inject(&mut self, addr: u32, value: u8) {
        self.ram[addr as usize & (PHYS_SIZE - 1)] = value;
    }

    /// BASIC program start ($2B/$2C) and end ($2D/$2E).
    #[must_use]
    pub fn basic_text(&self) -> (u16, u16) {
        let word = |lo: usize| u16::from_le_bytes([self.ram[lo], self.ram[lo + 1]]);
        (word(0x2B), word(0x2D))
    }

    pub fn set_basic_text(&mut self, start: u16, end: u16) {
        let [start_lo, start_hi] = start.to_le_bytes();
        let [end_lo, end_hi] = end.to_le_bytes();
        for lo in [0x2B, 0xAC] {
            self.ram[lo] = start_lo;
            self.ram[lo + 1] = start_hi;
        }
        for lo in [0x2D, 0x2F, 0x31, 0xAE] {
            self.ram[lo] = end_lo;
            self.ram[lo + 1] = end_hi;
        }
    }

    /// Screen RAM as the KERNAL writes it.
    #[must_use]
    pub fn read_screen(&self, addr: u16) -> u8 {
        self.ram[usize::from(addr)]
    }

    #[must_use]
    pub fn rom_trap_allowed(&self, addr: u16) -> bool {
        addr >= 0xE000 && KERNAL_CONFIGS.contains(&self.rows.config())
    }

    #[must_use]
    pub fn screen_params(&self) -> ScreenParams {
        let vm = u16::from(self.io.vic_peek(0xD018) & 0xF0) << 6;
        let bank = u16::from(!self.io.cia2_peek(0xDD00) & 0x03) << 14;
        ScreenParams {
            base: vm | bank,
            rows: 25,
            columns: 40,
            bank: 0,
        }
    }

    /// Character set the VIC-II sees in its ROM window.
    #[must_use]
    pub fn chargen_rom(&self) -> &[u8] {
        &self.flash.contents()[0x1000..0x2000]
    }

    /// Where the VIC-II sees the character ROM, as `(mask, value)`.
    #[must_use]
    pub fn chargen_addr_options(&self) -> (u16, u16) {
        (0x7000, 0x1000)
    }

    pub fn ram_to_snapshot(&self, buf: &mut [u8]) -> Result<()> {
        snapshot::block_to_snapshot("RAM", &self.ram, buf)
    }

    pub fn ram_from_snapshot(&mut self, buf: &[u8]) -> Result<()> {
        snapshot::block_from_snapshot("RAM", buf, &mut self.ram)
    }

    pub fn flash_to_snapshot(&self, buf: &mut [u8]) -> Result<()> {
        snapshot::block_to_snapshot("flash", self.flash.contents(), buf)
    }

    pub fn flash_from_snapshot(&mut self, buf: &[u8]) -> Result<()> {
        snapshot::block_from_snapshot("flash", buf, self.flash.contents_mut())
    }

    pub fn clock_overflow(&mut self, sub: Ticks) {
        let now = self.now();
        self.port.rebase(sub, now);
    }
}

impl<I: DtvIo> Bus for C64DtvMemory<I> {
    fn read(&mut self, address: u16) -> u8 {
        C64DtvMemory::read(self, address)
    }

    fn write(&mut self, address: u16, value: u8) {
        C64DtvMemory::write(self, address, value);
    }

    fn dma_read(&mut self, address: u16) -> u8 {
        C64DtvMemory::dma_read(self, address)
    }

    fn dma_write(&mut self, address: u16, value: u8) {
        C64DtvMemory::dma_write(self, address, value);
    }

    fn peek(&self, address: u16) -> u8 {
        C64DtvMemory::peek(self, address)
    }
}

impl<I: DtvIo> Observable for C64DtvMemory<I> {
    fn query(&self, path: &str) -> Option<Value> {
        if let Some(rest) = path.strip_prefix("memory.") {
            let addr = parse_address(rest)?;
            return Some(Value::U8(self.peek(addr as u16)));
        }
        if let Some(reg) = path.strip_prefix("regs.r") {
            let reg: usize = reg.parse().ok()?;
            return (reg < 16).then(|| self.regs.get(reg).into());
        }
        match path {
            "config" => Some(self.config().into()),
            "vbank" => Some(self.vbank().into()),
            "port.dir" => Some(self.port.dir().into()),
            "port.data" => Some(self.port.data().into()),
            "mapper.kernal" => Some(self.mapper.kernal.into()),
            "mapper.basic" => Some(self.mapper.basic.into()),
            "flash.state" => Some(self.flash.state().name().into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "config",
            "vbank",
            "port.dir",
            "port.data",
            "regs.r<n>",
            "mapper.kernal",
            "mapper.basic",
            "flash.state",
            "memory.<address>",
        ]
    }
}
