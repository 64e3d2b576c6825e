//! C64 memory subsystem.
//!
//! The C64 has 64K RAM with overlaid ROMs, I/O and cartridge space. The PLA
//! decides what the CPU sees from the 6510 port lines at $01 and the
//! cartridge EXROM/GAME lines:
//!
//! | HIRAM | LORAM | CHAREN | $A000-$BFFF | $D000-$DFFF | $E000-$FFFF |
//! |-------|-------|--------|-------------|-------------|-------------|
//! | 1     | 1     | 1      | BASIC       | I/O         | Kernal      |
//! | 1     | 1     | 0      | BASIC       | Char ROM    | Kernal      |
//! | 1     | 0     | 1      | RAM         | I/O         | Kernal      |
//! | 0     | 1     | 1      | RAM         | I/O         | RAM         |
//! | 0     | 0     | x      | RAM         | RAM         | RAM         |
//!
//! Every access goes through the dispatch row selected by the current
//! configuration (see [`crate::meminit`]). Stores into the 16K bank the
//! VIC-II is fetching from are announced to the video chip first.

use commodore_banking::{
    AccessKind, ActiveRows, BankList, C64Io, Expansion, Result, Translation, VbankWindow,
    WatchEvents, WatchHook, WatchMode, ram_init, snapshot,
};
use emu_core::{Bus, Observable, Value, parse_address};
use mos_6510_port::{PortModel, ProcessorPort};

use crate::config::{BoardType, C64Config};
use crate::meminit::{
    self, DEFAULT_CONFIG, IO_CONFIG, KERNAL_CONFIGS, Read, Source, Tables, Write,
};

/// Monitor bank numbers.
pub const BANK_CPU: u16 = 0;
pub const BANK_RAM: u16 = 1;
pub const BANK_ROM: u16 = 2;
pub const BANK_IO: u16 = 3;
pub const BANK_CART: u16 = 4;

/// Where the text screen is, as the monitor shows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenParams {
    pub base: u16,
    pub rows: u8,
    pub columns: u8,
    pub bank: u16,
}

/// C64 memory subsystem: 64K RAM + ROMs + colour RAM + 6510 port.
pub struct C64Memory<I: C64Io, E: Expansion> {
    /// 64K RAM.
    ram: Box<[u8; 0x10000]>,
    /// Kernal ROM (8K, mapped at $E000-$FFFF).
    kernal_rom: Vec<u8>,
    /// BASIC ROM (8K, mapped at $A000-$BFFF).
    basic_rom: Vec<u8>,
    /// Character ROM (4K, mapped at $D000-$DFFF for CPU, $1000-$1FFF for VIC).
    char_rom: Vec<u8>,
    /// Colour RAM (1K, 4-bit, at $D800-$DBFF).
    color_ram: [u8; 0x400],
    port: ProcessorPort,
    tables: Tables,
    rows: ActiveRows,
    board: BoardType,
    /// Cartridge lines, true when asserted.
    exrom: bool,
    game: bool,
    watch: WatchEvents,
    banks: BankList,
    /// VIC-II, SID and CIAs.
    pub io: I,
    /// Cartridge port.
    pub expansion: E,
}

impl<I: C64Io, E: Expansion> C64Memory<I, E> {
    /// Build the memory map. Fails if a ROM image has the wrong size.
    pub fn new(config: &C64Config, io: I, expansion: E) -> Result<Self> {
        config.check()?;
        let tables = meminit::build(config.board)?;
        log::info!(
            "C64 memory initialised: {} configs, {:?} board",
            tables.configs(),
            config.board
        );

        let exrom = expansion.exrom();
        let game = expansion.game();
        let mut mem = Self {
            ram: Box::new([0; 0x10000]),
            kernal_rom: config.kernal_rom.clone(),
            basic_rom: config.basic_rom.clone(),
            char_rom: config.char_rom.clone(),
            color_ram: [0; 0x400],
            port: ProcessorPort::new(PortModel::C64),
            tables,
            rows: ActiveRows::new(DEFAULT_CONFIG),
            board: config.board,
            exrom,
            game,
            watch: WatchEvents::new(),
            banks: BankList::new()
                .bank("default", BANK_RAM)
                .bank("cpu", BANK_CPU)
                .bank("ram", BANK_RAM)
                .bank("rom", BANK_ROM)
                .bank("io", BANK_IO)
                .bank("cart", BANK_CART),
            io,
            expansion,
        };
        mem.update_config();
        Ok(mem)
    }

    /// Power-up RAM pattern.
    pub fn powerup(&mut self) {
        ram_init(&mut self.ram[..]);
    }

    /// Reset the processor port and re-derive the configuration.
    pub fn reset(&mut self) {
        self.port.reset();
        self.update_config();
    }

    // ------------------------------------------------------------------
    // Configuration

    /// Re-derive the PLA configuration from the port and cartridge lines
    /// and select its row.
    pub fn update_config(&mut self) {
        let config = usize::from(self.port.bank_lines())
            | usize::from(self.exrom) << 3
            | usize::from(self.game) << 4;
        if self.rows.update_config(config) {
            log::debug!("C64 memory config {config}");
        }
    }

    /// The cartridge changed its EXROM/GAME lines.
    pub fn set_cart_lines(&mut self, exrom: bool, game: bool) {
        self.exrom = exrom;
        self.game = game;
        self.update_config();
    }

    /// The VIC-II bank changed (CIA2 port A).
    pub fn set_vbank(&mut self, vbank: usize) {
        let vbank = vbank & 3;
        self.rows.set_variant(vbank);
        self.io.set_vbank(vbank);
        log::debug!("C64 video bank {vbank}");
    }

    pub fn set_tape_sense(&mut self, pressed: bool) {
        self.port.set_tape_sense(pressed);
        self.update_config();
    }

    pub fn toggle_watchpoints(&mut self, mode: WatchMode) {
        self.rows.toggle_watchpoints(mode);
    }

    /// Watchpoint hits since the last drain.
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
    pub fn board(&self) -> BoardType {
        self.board
    }

    #[must_use]
    pub fn port(&self) -> &ProcessorPort {
        &self.port
    }

    #[must_use]
    pub fn tables(&self) -> &Tables {
        &self.tables
    }

    // ------------------------------------------------------------------
    // CPU and DMA accesses

    fn now(&self) -> emu_core::Ticks {
        self.io.cycles()
    }

    fn read_with(&mut self, addr: u16, kind: AccessKind) -> u8 {
        if self.rows.watching(kind) {
            self.watch.load(addr);
        }
        let handler = self.tables.read(self.rows.config(), usize::from(addr >> 8));
        self.read_handler(handler, addr, kind)
    }

    fn write_with(&mut self, addr: u16, value: u8, kind: AccessKind, watch: bool) {
        if watch {
            self.watch.store(addr);
        }
        let handler = self
            .tables
            .write(self.rows.variant(), self.rows.config(), usize::from(addr >> 8));
        self.write_handler(handler, addr, value, kind);
    }

    /// CPU read cycle.
    pub fn read(&mut self, addr: u16) -> u8 {
        self.read_with(addr, AccessKind::Cpu)
    }

    /// CPU write cycle.
    pub fn write(&mut self, addr: u16, value: u8) {
        let watch = self.rows.watching(AccessKind::Cpu);
        self.write_with(addr, value, AccessKind::Cpu, watch);
    }

    /// Dummy write of a read-modify-write instruction.
    pub fn dummy_write(&mut self, addr: u16, value: u8) {
        let watch = self.rows.watching_dummy();
        self.write_with(addr, value, AccessKind::Cpu, watch);
    }

    /// Expansion DMA read: $00/$01 are plain RAM.
    pub fn dma_read(&mut self, addr: u16) -> u8 {
        self.read_with(addr, AccessKind::Dma)
    }

    /// Expansion DMA write: $00/$01 are plain RAM.
    pub fn dma_write(&mut self, addr: u16, value: u8) {
        self.write_with(addr, value, AccessKind::Dma, false);
    }

    /// Read as if no cartridge forced Ultimax mode.
    pub fn read_without_ultimax(&mut self, addr: u16) -> u8 {
        let handler = self.tables.read(self.rows.config() & 7, usize::from(addr >> 8));
        self.read_handler(handler, addr, AccessKind::Cpu)
    }

    /// Store as if no cartridge forced Ultimax mode.
    pub fn store_without_ultimax(&mut self, addr: u16, value: u8) {
        let handler =
            self.tables
                .write(self.rows.variant(), self.rows.config() & 7, usize::from(addr >> 8));
        self.write_handler(handler, addr, value, AccessKind::Cpu);
    }

    /// Store through config 0, where neither ROML nor ROMH is mapped.
    pub fn store_without_romlh(&mut self, addr: u16, value: u8) {
        let handler = self.tables.write(self.rows.variant(), 0, usize::from(addr >> 8));
        self.write_handler(handler, addr, value, AccessKind::Cpu);
    }

    fn read_handler(&mut self, handler: Read, addr: u16, kind: AccessKind) -> u8 {
        let a = usize::from(addr);
        match handler {
            Read::Zero => match addr & 0xFF {
                0 if !kind.is_dma() => self.port.read_dir(),
                1 if !kind.is_dma() => {
                    let now = self.now();
                    self.port.read_data(now)
                }
                low => self.ram[usize::from(low)],
            },
            Read::Ram => self.ram[a],
            Read::Basic => self.basic_rom[a & 0x1FFF],
            Read::Kernal => self.kernal_rom[a & 0x1FFF],
            Read::Chargen => self.char_rom[a & 0x0FFF],
            Read::Vic => self.io.vic_read(addr),
            Read::Sid => self.io.sid_read(addr),
            Read::ColorRam => self.color_ram[a & 0x3FF] | (self.io.phi1() & 0xF0),
            Read::Cia1 => self.io.cia1_read(addr),
            Read::Cia2 => self.io.cia2_read(addr),
            Read::Io1 => match self.expansion.io1_read(addr) {
                Some(value) => value,
                None => self.io.phi1(),
            },
            Read::Io2 => match self.expansion.io2_read(addr) {
                Some(value) => value,
                None => self.io.phi1(),
            },
            Read::Roml => self.expansion.roml_read(addr).unwrap_or(self.ram[a]),
            Read::Romh => self.expansion.romh_read(addr).unwrap_or(self.ram[a]),
            Read::Ultimax => match self.expansion.ultimax_read(addr) {
                Some(value) => value,
                None => self.io.phi1(),
            },
            Read::Void => self.io.phi1(),
        }
    }

    /// Store to RAM, telling the VIC-II first when it is in its bank.
    fn store_vbank(&mut self, addr: u16, value: u8, window: VbankWindow) {
        self.io.vbank_store(addr, value, window);
        self.ram[usize::from(addr)] = value;
    }

    fn zero_store(&mut self, addr: u16, value: u8, kind: AccessKind) {
        let vbank0 = self.rows.variant() == 0;
        let reg = addr & 0xFF;
        if kind.is_dma() || reg > 1 {
            if vbank0 {
                self.store_vbank(reg, value, VbankWindow::Plain);
            } else {
                self.ram[usize::from(reg)] = value;
            }
            return;
        }

        // The RAM cell under the port receives whatever the VIC-II left
        // on the bus
        let bus = self.io.phi1();
        if vbank0 {
            self.store_vbank(reg, bus, VbankWindow::Plain);
        } else {
            self.ram[usize::from(reg)] = bus;
        }

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

    fn write_handler(&mut self, handler: Write, addr: u16, value: u8, kind: AccessKind) {
        let a = usize::from(addr);
        match handler {
            Write::Zero => self.zero_store(addr, value, kind),
            Write::Ram => self.ram[a] = value,
            Write::Vbank(window) => self.store_vbank(addr, value, window),
            Write::RamHi => {
                if self.rows.variant() == 3 {
                    self.store_vbank(addr, value, VbankWindow::Page3f);
                } else {
                    self.ram[a] = value;
                }
                if addr == 0xFF00 && !kind.is_dma() {
                    self.io.ff00_dma();
                }
            }
            Write::Vic => self.io.vic_store(addr, value),
            Write::Sid => self.io.sid_store(addr, value),
            Write::ColorRam => self.color_ram[a & 0x3FF] = value & 0x0F,
            Write::Cia1 => self.io.cia1_store(addr, value),
            Write::Cia2 => self.io.cia2_store(addr, value),
            Write::Io1 => self.expansion.io1_store(addr, value),
            Write::Io2 => self.expansion.io2_store(addr, value),
            Write::Roml => {
                self.expansion.roml_store(addr, value);
            }
            Write::RamlNoUltimax => {
                if !self.expansion.raml_store(addr, value) {
                    self.ram[a] = value;
                }
            }
            Write::Romh => {
                self.expansion.romh_store(addr, value);
            }
            Write::Ultimax => {
                self.expansion.ultimax_store(addr, value);
            }
            Write::Void => {}
        }
    }

    // ------------------------------------------------------------------
    // Side-effect-free access

    fn peek_handler(&self, handler: Read, addr: u16) -> u8 {
        let a = usize::from(addr);
        match handler {
            Read::Zero => match addr & 0xFF {
                0 => self.port.read_dir(),
                1 => self.port.peek_data(self.now()),
                low => self.ram[usize::from(low)],
            },
            Read::Vic => self.io.vic_peek(addr),
            Read::Sid => self.io.sid_peek(addr),
            Read::Cia1 => self.io.cia1_peek(addr),
            Read::Cia2 => self.io.cia2_peek(addr),
            Read::Io1 => self.expansion.io1_peek(addr).unwrap_or(self.io.phi1()),
            Read::Io2 => self.expansion.io2_peek(addr).unwrap_or(self.io.phi1()),
            Read::Roml | Read::Romh => self.expansion.peek(addr).unwrap_or(self.ram[a]),
            Read::Ultimax => self.expansion.peek(addr).unwrap_or(self.io.phi1()),
            Read::Ram => self.ram[a],
            Read::Basic => self.basic_rom[a & 0x1FFF],
            Read::Kernal => self.kernal_rom[a & 0x1FFF],
            Read::Chargen => self.char_rom[a & 0x0FFF],
            Read::ColorRam => self.color_ram[a & 0x3FF] | (self.io.phi1() & 0xF0),
            Read::Void => self.io.phi1(),
        }
    }

    /// What the CPU would read, without side effects.
    #[must_use]
    pub fn peek(&self, addr: u16) -> u8 {
        let handler = self.tables.read(self.rows.config(), usize::from(addr >> 8));
        self.peek_handler(handler, addr)
    }

    /// Direct-read window for the CPU's fetch cache.
    #[must_use]
    pub fn translate(&self, addr: u16) -> Option<Translation<Source>> {
        self.tables.translate(self.rows.config(), addr)
    }

    /// Backing array of a direct-read source.
    #[must_use]
    pub fn source(&self, source: Source) -> &[u8] {
        match source {
            Source::Ram => &self.ram[..],
            Source::Basic => &self.basic_rom,
            Source::Kernal => &self.kernal_rom,
            Source::Chargen => &self.char_rom,
        }
    }

    // ------------------------------------------------------------------
    // Monitor banks

    #[must_use]
    pub fn banks(&self) -> &BankList {
        &self.banks
    }

    fn io_read(&mut self, addr: u16) -> u8 {
        let (read, _) = meminit::io_handlers(usize::from(addr >> 8));
        self.read_handler(read, addr, AccessKind::Cpu)
    }

    fn rom_byte(&self, addr: u16) -> Option<u8> {
        let a = usize::from(addr);
        match addr {
            0xA000..=0xBFFF => Some(self.basic_rom[a & 0x1FFF]),
            0xD000..=0xDFFF => Some(self.char_rom[a & 0x0FFF]),
            0xE000..=0xFFFF => Some(self.kernal_rom[a & 0x1FFF]),
            _ => None,
        }
    }

    /// Monitor read with side effects.
    pub fn bank_read(&mut self, bank: u16, addr: u16) -> u8 {
        let io_area = (0xD000..0xE000).contains(&addr);
        match bank {
            BANK_CPU => self.read(addr),
            BANK_IO if io_area => self.io_read(addr),
            BANK_IO | BANK_CART => self
                .expansion
                .peek(addr)
                .unwrap_or(self.ram[usize::from(addr)]),
            BANK_ROM => self
                .rom_byte(addr)
                .unwrap_or(self.ram[usize::from(addr)]),
            _ => self.ram[usize::from(addr)],
        }
    }

    /// Monitor read without side effects.
    #[must_use]
    pub fn bank_peek(&self, bank: u16, addr: u16) -> u8 {
        let io_area = (0xD000..0xE000).contains(&addr);
        match bank {
            BANK_CPU => self.peek(addr),
            BANK_IO if io_area => {
                let (read, _) = meminit::io_handlers(usize::from(addr >> 8));
                self.peek_handler(read, addr)
            }
            BANK_IO | BANK_CART => self
                .expansion
                .peek(addr)
                .unwrap_or(self.ram[usize::from(addr)]),
            BANK_ROM => self
                .rom_byte(addr)
                .unwrap_or(self.ram[usize::from(addr)]),
            _ => self.ram[usize::from(addr)],
        }
    }

    /// Monitor write. ROM banks swallow stores over ROM.
    pub fn bank_write(&mut self, bank: u16, addr: u16, value: u8) {
        let io_area = (0xD000..0xE000).contains(&addr);
        match bank {
            BANK_CPU => self.write(addr, value),
            BANK_IO if io_area => {
                let (_, write) = meminit::io_handlers(usize::from(addr >> 8));
                self.write_handler(write, addr, value, AccessKind::Cpu);
            }
            BANK_IO | BANK_ROM if self.rom_byte(addr).is_some() => {}
            _ => self.ram[usize::from(addr)] = value,
        }
    }

    /// Is the I/O area mapped in the current configuration?
    #[must_use]
    pub fn io_visible(&self) -> bool {
        IO_CONFIG[self.rows.config()]
    }

    // ------------------------------------------------------------------
    // Helpers for loaders, traps and the VIC-II

    /// Write straight into RAM.
    pub fn inject(&mut self, addr: u32, value: u8) {
        self.ram[(addr & 0xFFFF) as usize] = value;
    }

    /// BASIC program start and end from the zero page pointers.
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

    /// KERNAL traps may only fire where the KERNAL ROM is visible.
    #[must_use]
    pub fn rom_trap_allowed(&self, addr: u16) -> bool {
        addr >= 0xE000 && KERNAL_CONFIGS.contains(&self.rows.config())
    }

    /// Screen memory location from the VIC-II and CIA2 registers.
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

    /// Character ROM mask/value: the VIC-II sees the ROM where
    /// `addr & mask == value`.
    #[must_use]
    pub fn chargen_addr_options(&self) -> (u16, u16) {
        (0x7000, 0x1000)
    }

    /// VIC-II fetch at `addr` (0-$3FFF) in the current video bank.
    #[must_use]
    pub fn vic_fetch(&self, addr: u16) -> u8 {
        let full = ((self.rows.variant() as u16) << 14) | (addr & 0x3FFF);
        let (mask, value) = self.chargen_addr_options();
        if full & mask == value {
            self.char_rom[usize::from(full & 0x0FFF)]
        } else {
            self.ram[usize::from(full)]
        }
    }

    /// Colour RAM as the VIC-II reads it.
    #[must_use]
    pub fn color_ram(&self) -> &[u8; 0x400] {
        &self.color_ram
    }

    pub fn color_ram_to_snapshot(&self, buf: &mut [u8]) -> Result<()> {
        snapshot::block_to_snapshot("color RAM", &self.color_ram, buf)
    }

    pub fn color_ram_from_snapshot(&mut self, buf: &[u8]) -> Result<()> {
        snapshot::block_from_snapshot("color RAM", buf, &mut self.color_ram)
    }

    pub fn ram_to_snapshot(&self, buf: &mut [u8]) -> Result<()> {
        snapshot::block_to_snapshot("RAM", &self.ram[..], buf)
    }

    pub fn ram_from_snapshot(&mut self, buf: &[u8]) -> Result<()> {
        snapshot::block_from_snapshot("RAM", buf, &mut self.ram[..])
    }

    /// The CPU clock was rebased by `sub` cycles.
    pub fn clock_overflow(&mut self, sub: emu_core::Ticks) {
        let now = self.now();
        self.port.rebase(sub, now);
    }
}

impl<I: C64Io, E: Expansion> Bus for C64Memory<I, E> {
    fn read(&mut self, address: u16) -> u8 {
        C64Memory::read(self, address)
    }

    fn write(&mut self, address: u16, value: u8) {
        C64Memory::write(self, address, value);
    }

    fn dma_read(&mut self, address: u16) -> u8 {
        C64Memory::dma_read(self, address)
    }

    fn dma_write(&mut self, address: u16, value: u8) {
        C64Memory::dma_write(self, address, value);
    }

    fn peek(&self, address: u16) -> u8 {
        C64Memory::peek(self, address)
    }
}

impl<I: C64Io, E: Expansion> Observable for C64Memory<I, E> {
    fn query(&self, path: &str) -> Option<Value> {
        if let Some(rest) = path.strip_prefix("memory.") {
            let addr = parse_address(rest)?;
            return Some(Value::U8(self.peek(addr as u16)));
        }
        match path {
            "config" => Some(self.config().into()),
            "vbank" => Some(self.vbank().into()),
            "exrom" => Some(self.exrom.into()),
            "game" => Some(self.game.into()),
            "port.dir" => Some(self.port.dir().into()),
            "port.data" => Some(self.port.data().into()),
            "port.data_read" => Some(self.port.data_read().into()),
            "watch" => Some(format!("{:?}", self.rows.watch()).as_str().into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "config",
            "vbank",
            "exrom",
            "game",
            "port.dir",
            "port.data",
            "port.data_read",
            "watch",
            "memory.<address>",
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use commodore_banking::{NoExpansion, OpenBus, WatchEvent};

    fn make_memory() -> C64Memory<OpenBus, NoExpansion> {
        let config = C64Config {
            model: crate::C64Model::C64Pal,
            board: BoardType::Normal,
            kernal_rom: vec![0xEE; 8192],
            basic_rom: vec![0xBB; 8192],
            char_rom: vec![0xCC; 4096],
        };
        C64Memory::new(&config, OpenBus::default(), NoExpansion).unwrap()
    }

    /// Cartridge with recognisable ROML/ROMH bytes.
    struct TestCart {
        exrom: bool,
        game: bool,
    }

    impl Expansion for TestCart {
        fn exrom(&self) -> bool {
            self.exrom
        }

        fn game(&self) -> bool {
            self.game
        }

        fn roml_read(&mut self, _addr: u16) -> Option<u8> {
            Some(0x11)
        }

        fn romh_read(&mut self, _addr: u16) -> Option<u8> {
            Some(0x22)
        }
    }

    #[test]
    fn default_banking_sees_roms() {
        let mut mem = make_memory();
        assert_eq!(mem.config(), 7);
        assert_eq!(mem.read(0xA000), 0xBB); // BASIC ROM
        assert_eq!(mem.read(0xE000), 0xEE); // Kernal ROM
    }

    #[test]
    fn writes_under_rom_go_to_ram() {
        let mut mem = make_memory();
        mem.write(0xA000, 0x42);
        // Read still sees BASIC ROM
        assert_eq!(mem.read(0xA000), 0xBB);
        assert_eq!(mem.bank_read(BANK_RAM, 0xA000), 0x42);
    }

    #[test]
    fn all_ram_banking() {
        let mut mem = make_memory();
        mem.write(0x0000, 0x2F);
        mem.write(0x0001, 0x30);
        assert_eq!(mem.config(), 0);
        mem.write(0xA000, 0x42);
        mem.write(0xD000, 0x43);
        mem.write(0xE000, 0x44);
        assert_eq!(mem.read(0xA000), 0x42);
        assert_eq!(mem.read(0xD000), 0x43);
        assert_eq!(mem.read(0xE000), 0x44);
    }

    #[test]
    fn char_rom_visible_when_charen_clear() {
        let mut mem = make_memory();
        mem.write(0x0000, 0x2F);
        mem.write(0x0001, 0x33);
        assert_eq!(mem.read(0xD000), 0xCC);
    }

    #[test]
    fn port_registers_read_back() {
        let mut mem = make_memory();
        mem.write(0x0000, 0x2F);
        assert_eq!(mem.read(0x0000), 0x2F);
        mem.write(0x0001, 0x37);
        assert_eq!(mem.read(0x0001) & 0x3F, 0x37);
    }

    #[test]
    fn port_store_writes_bus_value_to_ram() {
        let mut mem = make_memory();
        mem.io.phi1 = 0x5A;
        mem.write(0x0001, 0x37);
        assert_eq!(mem.bank_read(BANK_RAM, 0x0001), 0x5A);
        // DMA sees RAM, not the port
        assert_eq!(mem.dma_read(0x0001), 0x5A);
        mem.dma_write(0x0000, 0x99);
        assert_eq!(mem.read(0x0000), 0x00);
        assert_eq!(mem.dma_read(0x0000), 0x99);
    }

    #[test]
    fn colour_ram_masks_nybble() {
        let mut mem = make_memory();
        mem.io.phi1 = 0xA0;
        mem.write(0xD800, 0xFF);
        assert_eq!(mem.color_ram()[0], 0x0F);
        assert_eq!(mem.read(0xD800), 0xAF);
        mem.io.phi1 = 0x30;
        assert_eq!(mem.peek(0xD800), 0x3F);
    }

    #[test]
    fn vic_sees_char_rom_in_bank_0() {
        let mut mem = make_memory();
        assert_eq!(mem.vic_fetch(0x1000), 0xCC);
        mem.write(0x0400, 0x20);
        assert_eq!(mem.vic_fetch(0x0400), 0x20);
        mem.set_vbank(1);
        mem.write(0x5000, 0xAA);
        assert_eq!(mem.vic_fetch(0x1000), 0xAA);
    }

    #[test]
    fn watchpoints_record_without_changing_results() {
        let mut mem = make_memory();
        mem.toggle_watchpoints(WatchMode::On);
        mem.write(0x1000, 0x12);
        assert_eq!(mem.read(0x1000), 0x12);
        mem.dma_read(0x1000);
        let events: Vec<_> = mem.watch_events().drain().collect();
        assert_eq!(events, vec![WatchEvent::Store(0x1000), WatchEvent::Load(0x1000)]);

        mem.dummy_write(0x1000, 0x12);
        assert!(mem.watch_events().is_empty());
        mem.toggle_watchpoints(WatchMode::OnDummy);
        mem.dummy_write(0x1000, 0x12);
        assert_eq!(mem.watch_events().len(), 1);
    }

    #[test]
    fn cartridge_lines_select_rows() {
        let cart = TestCart {
            exrom: true,
            game: false,
        };
        let config = C64Config {
            model: crate::C64Model::C64Pal,
            board: BoardType::Normal,
            kernal_rom: vec![0xEE; 8192],
            basic_rom: vec![0xBB; 8192],
            char_rom: vec![0xCC; 4096],
        };
        let mut mem = C64Memory::new(&config, OpenBus::default(), cart).unwrap();
        assert_eq!(mem.config(), 15);
        assert_eq!(mem.read(0x8000), 0x11);
        assert_eq!(mem.read(0xA000), 0xBB);
        mem.set_cart_lines(true, true);
        assert_eq!(mem.read(0xA000), 0x22);
        // Stores under ROML land in RAM
        mem.write(0x8000, 0x77);
        assert_eq!(mem.bank_read(BANK_RAM, 0x8000), 0x77);
        // Without the cartridge lines the area is plain RAM
        assert_eq!(mem.read_without_ultimax(0x8000), 0x77);
    }

    #[test]
    fn ultimax_unclaimed_reads_open_bus() {
        let mut mem = make_memory();
        mem.io.phi1 = 0x3C;
        mem.set_cart_lines(false, true);
        assert_eq!(mem.config(), 23);
        assert_eq!(mem.read(0x4000), 0x3C);
        mem.write(0x4000, 0x99);
        assert_eq!(mem.bank_read(BANK_RAM, 0x4000), 0x00);
        // No ROML claimed: RAM shows through
        assert_eq!(mem.read(0x8000), 0x00);
        // Low 4K is still RAM
        mem.write(0x0800, 0x55);
        assert_eq!(mem.read(0x0800), 0x55);
        // Ultimax-free view of the same address
        mem.store_without_ultimax(0x4000, 0x66);
        assert_eq!(mem.read_without_ultimax(0x4000), 0x66);
    }

    #[test]
    fn monitor_banks() {
        let mut mem = make_memory();
        mem.write(0x0000, 0x2F);
        mem.write(0x0001, 0x30);
        mem.write(0xE000, 0x12);
        assert_eq!(mem.bank_read(BANK_ROM, 0xE000), 0xEE);
        assert_eq!(mem.bank_peek(BANK_ROM, 0xD000), 0xCC);
        assert_eq!(mem.bank_peek(BANK_RAM, 0xE000), 0x12);
        mem.bank_write(BANK_ROM, 0xE000, 0x34);
        assert_eq!(mem.bank_peek(BANK_RAM, 0xE000), 0x12);
        mem.bank_write(BANK_RAM, 0xE000, 0x34);
        assert_eq!(mem.peek(0xE000), 0x34);
        mem.bank_write(BANK_IO, 0xD800, 0x07);
        assert_eq!(mem.color_ram()[0], 0x07);
        assert_eq!(mem.banks().from_name("cart").unwrap(), BANK_CART);
    }

    #[test]
    fn basic_text_pointers() {
        let mut mem = make_memory();
        mem.set_basic_text(0x0801, 0x0900);
        assert_eq!(mem.basic_text(), (0x0801, 0x0900));
        assert_eq!(mem.bank_peek(BANK_RAM, 0xAC), 0x01);
        assert_eq!(mem.bank_peek(BANK_RAM, 0x32), 0x09);
    }

    #[test]
    fn rom_traps_follow_kernal() {
        let mut mem = make_memory();
        assert!(mem.rom_trap_allowed(0xFFD2));
        assert!(!mem.rom_trap_allowed(0xA000));
        mem.write(0x0000, 0x2F);
        mem.write(0x0001, 0x35);
        assert!(!mem.rom_trap_allowed(0xFFD2));
    }

    #[test]
    fn translate_matches_handlers() {
        let mut mem = make_memory();
        for addr in [0x0002u16, 0x1234, 0xA000, 0xBFFF, 0xE000, 0xFFFF] {
            let t = mem.translate(addr).unwrap();
            let direct = mem.source(t.base.source)[t.base.index(addr)];
            assert_eq!(direct, mem.read(addr));
        }
        assert!(mem.translate(0x0001).is_none());
        assert!(mem.translate(0xD000).is_none());
    }

    #[test]
    fn rom_size_is_checked() {
        let config = C64Config {
            model: crate::C64Model::C64Pal,
            board: BoardType::Normal,
            kernal_rom: vec![0; 100],
            basic_rom: vec![0; 8192],
            char_rom: vec![0; 4096],
        };
        assert!(C64Memory::new(&config, OpenBus::default(), NoExpansion).is_err());
    }

    #[test]
    fn max_board_floats_above_2k() {
        let config = C64Config {
            model: crate::C64Model::C64Pal,
            board: BoardType::Max,
            kernal_rom: vec![0xEE; 8192],
            basic_rom: vec![0xBB; 8192],
            char_rom: vec![0xCC; 4096],
        };
        let mut mem = C64Memory::new(&config, OpenBus::default(), NoExpansion).unwrap();
        mem.io.phi1 = 0x42;
        mem.write(0x0800, 0x11);
        assert_eq!(mem.read(0x0800), 0x42);
        mem.write(0x07FF, 0x11);
        assert_eq!(mem.read(0x07FF), 0x11);
    }
}
