//! SuperCPU64 memory subsystem.
//!
//! The 65816 runs from 128K of fast SRAM. Bank 0 is the C64's address
//! space: RAM stores in the mirrored range are copied to motherboard RAM
//! for the VIC-II, I/O goes out on the 1 MHz bus, and the ROMs are SRAM
//! bank 1 copies made by the EPROM at boot. Banks $02-$F5 are the SIMM,
//! $F6-$F7 a window onto its first 128K and $F8-$FF the EPROM.

use commodore_banking::{
    AccessKind, ActiveRows, Base, BankList, Expansion, Limit, Result, Translation, WatchEvents,
    WatchHook, WatchMode, ram_init, snapshot,
};
use emu_c64::ScreenParams;
use emu_core::{Bus, Observable, Value, parse_address};

use crate::config::{EPROM_MAX, Scpu64Config, ScpuVersion};
use crate::io::{ScpuIo, Stretch};
use crate::meminit::{self, DEFAULT_CONFIG, KERNAL_CONFIGS, Read, Source, Store, Tables, Write};
use crate::registers::{self, HwEvent, HwRegisters};
use crate::simm::{Simm, SimmSize};

pub const BANK_CPU: u16 = 0;
pub const BANK_RAM: u16 = 1;
pub const BANK_ROM: u16 = 2;
pub const BANK_IO: u16 = 3;
pub const BANK_CART: u16 = 4;
/// `ram00`-`ramf7`.
pub const BANK_RAM00: u16 = 5;
/// `romf8`-`romff`.
pub const BANK_ROMF8: u16 = 253;

const SRAM_SIZE: usize = 0x2_0000;
const TRAP_RAM_SIZE: usize = 0x2000;

/// Where a 24-bit address or monitor bank lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cell {
    Sram(usize),
    /// $F6-$F7 SIMM window.
    Window(usize),
    Simm(usize),
    Eprom(usize),
    /// Nothing there; reads see this value.
    Open(u8),
}

/// SuperCPU64 memory subsystem.
pub struct Scpu64Memory<I: ScpuIo, E: Expansion> {
    version: ScpuVersion,
    /// Motherboard RAM.
    ram: Box<[u8]>,
    sram: Box<[u8]>,
    /// Copy of SRAM $1E000-$1FFFF the KERNAL traps patch.
    trap_ram: Box<[u8]>,
    simm: Simm,
    eprom: Box<[u8]>,
    char_rom: Box<[u8]>,
    color_ram: [u8; 0x400],
    pport: u8,
    exrom: bool,
    game: bool,
    regs: HwRegisters,
    tables: Tables,
    rows: ActiveRows,
    vbank: usize,
    traps_pending: bool,
    watch: WatchEvents,
    banks: BankList,
    pub io: I,
    pub expansion: E,
}

impl<I: ScpuIo, E: Expansion> Scpu64Memory<I, E> {
    /// Build the memory map. Fails on a bad SIMM size or ROM image.
    pub fn new(config: &Scpu64Config, io: I, expansion: E) -> Result<Self> {
        config.check()?;
        let simm = Simm::new(SimmSize::from_mb(config.simm_mb)?);
        let tables = meminit::build()?;
        log::info!(
            "SuperCPU64 memory initialised: {} configs, {:?}, {} MB SIMM",
            tables.configs(),
            config.version,
            config.simm_mb
        );

        let exrom = expansion.exrom();
        let game = expansion.game();
        let mut mem = Self {
            version: config.version,
            ram: vec![0; 0x1_0000].into_boxed_slice(),
            sram: vec![0; SRAM_SIZE].into_boxed_slice(),
            trap_ram: vec![0; TRAP_RAM_SIZE].into_boxed_slice(),
            simm,
            eprom: config.eprom_image().into_boxed_slice(),
            char_rom: config.char_rom.clone().into_boxed_slice(),
            color_ram: [0; 0x400],
            pport: 7,
            exrom,
            game,
            regs: HwRegisters::default(),
            tables,
            rows: ActiveRows::new(DEFAULT_CONFIG),
            vbank: 0,
            traps_pending: false,
            watch: WatchEvents::new(),
            banks: BankList::new()
                .bank("default", BANK_RAM)
                .bank("cpu", BANK_CPU)
                .bank("ram", BANK_RAM)
                .bank("rom", BANK_ROM)
                .bank("io", BANK_IO)
                .bank("cart", BANK_CART)
                .array("ram", 0x00, 0xF7, BANK_RAM00)
                .array("rom", 0xF8, 0xFF, BANK_ROMF8),
            io,
            expansion,
        };
        mem.hardware_reset();
        Ok(mem)
    }

    /// Power-up RAM pattern in motherboard RAM, SRAM and the trap copy.
    pub fn powerup(&mut self) {
        ram_init(&mut self.ram);
        ram_init(&mut self.sram);
        self.trap_ram
            .copy_from_slice(&self.sram[SRAM_SIZE - TRAP_RAM_SIZE..]);
        self.traps_pending = true;
    }

    /// Reset button: registers to power-on values, boot map back in.
    pub fn hardware_reset(&mut self) {
        self.regs.reset();
        self.pport = 7;
        self.apply_mirror();
        self.apply_simm();
        self.update_config();
        let fast = self.regs.fast();
        self.io.set_fastmode(fast);
    }

    // ------------------------------------------------------------------
    // Configuration

    /// Re-derive the configuration from the port, cartridge lines and
    /// hardware registers and select its row.
    pub fn update_config(&mut self) {
        let config = usize::from(self.pport & 7)
            | usize::from(self.exrom) << 3
            | usize::from(self.game) << 4
            | usize::from(self.regs.hw_enable) << 5
            | usize::from(self.regs.dos_ext) << 6
            | usize::from(self.regs.bootmap) << 7;
        if self.rows.update_config(config) {
            log::debug!("SuperCPU64 memory config ${config:02X}");
        }
    }

    fn apply_mirror(&mut self) {
        let mirror = self.regs.optim.mirror();
        if mirror != self.rows.variant() {
            log::debug!("SuperCPU64 mirror mode {mirror}");
        }
        self.rows.set_variant(mirror);
    }

    fn apply_simm(&mut self) {
        let bits = self.simm.configure(self.regs.simm);
        self.io.set_simm_row_size(bits);
    }

    /// The cartridge changed its EXROM/GAME lines.
    pub fn set_cart_lines(&mut self, exrom: bool, game: bool) {
        self.exrom = exrom;
        self.game = game;
        self.update_config();
    }

    /// The VIC-II bank changed. Stores do not depend on it here.
    pub fn set_vbank(&mut self, vbank: usize) {
        self.vbank = vbank & 3;
        self.io.set_vbank(self.vbank);
    }

    /// Write $D078 as software would, ignoring the enable.
    pub fn set_simm_config(&mut self, reg: u8) {
        self.regs.simm = reg;
        self.apply_simm();
    }

    /// Fit a different SIMM. Contents are lost.
    pub fn set_simm_size(&mut self, mb: u32) -> Result<()> {
        let size = SimmSize::from_mb(mb)?;
        self.simm.resize(size);
        Ok(())
    }

    /// Front panel speed switch.
    pub fn set_speed_switch(&mut self, fast: bool) {
        if self.regs.set_speed_switch(!fast) {
            let fast = self.regs.fast();
            self.io.set_fastmode(fast);
        }
    }

    /// Front panel JiffyDOS switch.
    pub fn set_jiffy_switch(&mut self, on: bool) {
        self.regs.switch_jiffy = on;
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

    /// Current mirror mode (write variant).
    #[must_use]
    pub fn mirror(&self) -> usize {
        self.rows.variant()
    }

    #[must_use]
    pub fn vbank(&self) -> usize {
        self.vbank
    }

    #[must_use]
    pub fn version(&self) -> ScpuVersion {
        self.version
    }

    #[must_use]
    pub fn registers(&self) -> &HwRegisters {
        &self.regs
    }

    #[must_use]
    pub fn simm(&self) -> &Simm {
        &self.simm
    }

    #[must_use]
    pub fn tables(&self) -> &Tables {
        &self.tables
    }

    /// Running at 20 MHz.
    #[must_use]
    pub fn fast(&self) -> bool {
        self.regs.fast()
    }

    /// Interrupt vectors come from the SuperCPU's KERNAL copy rather than
    /// the motherboard.
    #[must_use]
    pub fn interrupt_reroute(&self) -> bool {
        let kernal = matches!(
            self.tables.read(self.rows.config(), 0xFF),
            Read::KernalShadow | Read::Sram1
        );
        kernal
            && (!self.io.emulation_mode()
                || self.regs.hw_enable
                || self.regs.sys_1mhz
                || self.regs.dos_ext
                || self.regs.ramlink)
    }

    // ------------------------------------------------------------------
    // Clock

    fn stretch(&mut self, kind: Stretch) {
        self.io.stretch(kind);
    }

    fn check_ba_read(&mut self) {
        if !self.regs.fast() {
            self.io.steal_cycles();
        }
    }

    fn check_ba_write(&mut self) {
        if !self.regs.fast() && !self.io.emulation_mode() {
            self.io.steal_cycles();
        }
    }

    // ------------------------------------------------------------------
    // Bank 0 accesses

    fn read_with(&mut self, addr: u16, kind: AccessKind) -> u8 {
        if self.rows.watching(kind) {
            self.watch.load(addr);
        }
        let handler = self.tables.read(self.rows.config(), usize::from(addr >> 8));
        self.read_handler(handler, addr)
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

    pub fn read(&mut self, addr: u16) -> u8 {
        self.read_with(addr, AccessKind::Cpu)
    }

    pub fn write(&mut self, addr: u16, value: u8) {
        let watch = self.rows.watching(AccessKind::Cpu);
        self.write_with(addr, value, AccessKind::Cpu, watch);
    }

    pub fn dummy_write(&mut self, addr: u16, value: u8) {
        let watch = self.rows.watching_dummy();
        self.write_with(addr, value, AccessKind::Cpu, watch);
    }

    /// Expansion DMA read.
    pub fn dma_read(&mut self, addr: u16) -> u8 {
        self.read_with(addr, AccessKind::Dma)
    }

    /// Expansion DMA write: $01 does not reach the processor port.
    pub fn dma_write(&mut self, addr: u16, value: u8) {
        self.write_with(addr, value, AccessKind::Dma, false);
    }

    /// Read as if no cartridge forced Ultimax mode.
    pub fn read_without_ultimax(&mut self, addr: u16) -> u8 {
        let handler = self.tables.read(self.rows.config() & 7, usize::from(addr >> 8));
        self.read_handler(handler, addr)
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

    fn hardware_read(&self, addr: u16) -> u8 {
        self.regs.read(addr, self.version, self.io.emulation_mode())
    }

    fn color_ram_read(&self, addr: u16) -> u8 {
        let a = usize::from(addr);
        match self.version {
            ScpuVersion::V2 => self.sram[0x1_0000 + a],
            ScpuVersion::V1 => self.color_ram[a & 0x3FF] | (self.io.phi1() & 0xF0),
        }
    }

    fn vic_read(&mut self, addr: u16) -> u8 {
        if addr & 0xFFF0 == 0xD0B0 {
            // V2 answers from the SuperCPU itself, V1 goes out on the bus
            match self.version {
                ScpuVersion::V2 => self.check_ba_read(),
                ScpuVersion::V1 => self.stretch(Stretch::ReadIo),
            }
            return self.hardware_read(addr);
        }
        self.stretch(Stretch::ReadIo);
        self.io.vic_read(addr)
    }

    fn read_handler(&mut self, handler: Read, addr: u16) -> u8 {
        let a = usize::from(addr);
        match handler {
            Read::Sram => {
                self.check_ba_read();
                self.sram[a]
            }
            Read::Sram1 => {
                self.check_ba_read();
                self.sram[0x1_0000 + a]
            }
            Read::KernalShadow => {
                self.check_ba_read();
                self.sram[0x8000 + a]
            }
            Read::Internal => {
                self.stretch(Stretch::ReadIo);
                self.ram[a]
            }
            Read::Roml => {
                self.stretch(Stretch::ReadIo);
                self.expansion.roml_read(addr).unwrap_or(self.ram[a])
            }
            Read::Romh => {
                self.stretch(Stretch::ReadIo);
                self.expansion.romh_read(addr).unwrap_or(self.ram[a])
            }
            Read::Ultimax => {
                self.stretch(Stretch::ReadIo);
                match self.expansion.ultimax_read(addr) {
                    Some(value) => value,
                    None => self.io.phi1(),
                }
            }
            Read::Vic => self.vic_read(addr),
            Read::Registers => {
                self.check_ba_read();
                if self.version == ScpuVersion::V1 {
                    self.stretch(Stretch::ReadIoRam);
                }
                self.sram[0x1_0000 + a]
            }
            Read::Sid => {
                self.stretch(Stretch::ReadIo);
                self.io.sid_read(addr)
            }
            Read::ColorRam => {
                match self.version {
                    ScpuVersion::V2 => self.check_ba_read(),
                    ScpuVersion::V1 => self.stretch(Stretch::ReadIo),
                }
                self.color_ram_read(addr)
            }
            Read::ColorRamInt => {
                self.stretch(Stretch::ReadIo);
                self.io.phi1()
            }
            Read::Cia1 => {
                self.stretch(Stretch::ReadIo);
                self.io.cia1_read(addr)
            }
            Read::Cia2 => {
                self.stretch(Stretch::ReadIo);
                self.io.cia2_read(addr)
            }
            Read::Io1 => {
                self.stretch(Stretch::ReadIo);
                match self.expansion.io1_read(addr) {
                    Some(value) => value,
                    None => self.io.phi1(),
                }
            }
            Read::Io2 => {
                self.stretch(Stretch::ReadIo);
                match self.expansion.io2_read(addr) {
                    Some(value) => value,
                    None => self.io.phi1(),
                }
            }
            Read::Eprom => {
                self.stretch(Stretch::ReadEprom);
                self.eprom[a]
            }
            Read::Chargen => {
                self.stretch(Stretch::ReadIo);
                self.char_rom[a & 0x0FFF]
            }
        }
    }

    fn put(&mut self, store: Store, a: usize, value: u8) {
        if store != Store::Internal {
            self.sram[a] = value;
        }
        if store != Store::Sram {
            self.ram[a] = value;
        }
    }

    fn pport_store(&mut self, value: u8) {
        if self.pport != value {
            self.pport = value;
            self.update_config();
        }
    }

    fn zero_store(&mut self, addr: u16, value: u8, store: Store, kind: AccessKind) {
        if store != Store::Sram {
            self.stretch(Stretch::Write);
        }
        self.put(store, usize::from(addr), value);
        if addr == 1 && !kind.is_dma() {
            self.pport_store(value & 7);
        }
    }

    fn ram_store(&mut self, addr: u16, value: u8, store: Store) {
        match store {
            Store::Sram => self.check_ba_write(),
            Store::Mirrored | Store::Internal => self.stretch(Stretch::Write),
        }
        self.put(store, usize::from(addr), value);
    }

    /// Apply a hardware register store and everything it switches.
    fn hardware_store(&mut self, addr: u16, value: u8) {
        let event = self.regs.store(addr, value, self.version);
        if event.contains(HwEvent::MIRROR) {
            self.apply_mirror();
        }
        if event.contains(HwEvent::SIMM) {
            self.apply_simm();
        }
        if event.contains(HwEvent::CONFIG) {
            self.update_config();
        }
        if event.contains(HwEvent::SPEED) {
            let fast = self.regs.fast();
            log::debug!("SuperCPU64 {} MHz", if fast { 20 } else { 1 });
            self.io.set_fastmode(fast);
        }
    }

    fn shadow_io(&mut self, addr: u16, value: u8) {
        if self.version == ScpuVersion::V2 {
            self.sram[0x1_0000 + usize::from(addr)] = value;
        }
    }

    fn vic_store(&mut self, addr: u16, value: u8) {
        self.stretch(Stretch::WriteIoStart);
        self.shadow_io(addr, value);
        if registers::is_register(addr) {
            let was_fast = self.regs.fast();
            self.hardware_store(addr, value);
            // Back at 20 MHz: the rest of the cycle is not stretched
            if !was_fast && self.regs.fast() {
                return;
            }
        } else {
            self.io.vic_store(addr, value);
        }
        self.stretch(Stretch::WriteIo);
    }

    fn registers_store(&mut self, addr: u16, value: u8) {
        if self.regs.hw_enable || addr == 0xD27E {
            self.sram[0x1_0000 + usize::from(addr)] = value;
        }
    }

    fn color_ram_store(&mut self, addr: u16, value: u8) {
        self.shadow_io(addr, value);
        self.color_ram[usize::from(addr & 0x3FF)] = value & 0x0F;
    }

    fn write_handler(&mut self, handler: Write, addr: u16, value: u8, kind: AccessKind) {
        match handler {
            Write::Zero(store) => self.zero_store(addr, value, store, kind),
            Write::RamHi(store) if addr == 0xFF00 => {
                self.stretch(Stretch::WriteIoStart);
                self.put(store, 0xFF00, value);
                self.io.ff00_dma();
                self.stretch(Stretch::WriteIoLong);
            }
            Write::Ram(store) | Write::RamHi(store) => self.ram_store(addr, value, store),
            Write::Roml => {
                self.stretch(Stretch::WriteIoStart);
                self.expansion.roml_store(addr, value);
                self.stretch(Stretch::WriteIo);
            }
            Write::Romh => {
                self.stretch(Stretch::WriteIoStart);
                self.expansion.romh_store(addr, value);
                self.stretch(Stretch::WriteIo);
            }
            Write::Ultimax => {
                self.stretch(Stretch::WriteIoStart);
                self.expansion.ultimax_store(addr, value);
                self.stretch(Stretch::WriteIo);
            }
            Write::Vic => self.vic_store(addr, value),
            Write::Registers => {
                self.stretch(Stretch::Write);
                self.registers_store(addr, value);
            }
            // $D600 is written like RAM, not I/O
            Write::Sid if addr >> 8 == 0xD6 => {
                self.stretch(Stretch::Write);
                self.io.sid_store(addr, value);
            }
            Write::Sid => {
                self.stretch(Stretch::WriteIoStart);
                if addr < 0xD600 {
                    self.shadow_io(addr, value);
                }
                self.io.sid_store(addr, value);
                self.stretch(Stretch::WriteIo);
            }
            Write::ColorRam => {
                self.stretch(Stretch::Write);
                self.color_ram_store(addr, value);
            }
            Write::ColorRamInt => {
                self.stretch(Stretch::Write);
                self.color_ram[usize::from(addr & 0x3FF)] = value & 0x0F;
            }
            Write::Cia1 => {
                self.stretch(Stretch::WriteIoStartCia);
                self.shadow_io(addr, value);
                self.io.cia1_store(addr, value);
                self.stretch(Stretch::WriteIoCia);
            }
            Write::Cia2 => {
                self.stretch(Stretch::WriteIoStartCia);
                self.shadow_io(addr, value);
                self.io.cia2_store(addr, value);
                self.stretch(Stretch::WriteIoCia);
            }
            Write::Io1 => {
                self.stretch(Stretch::WriteIoStart);
                self.expansion.io1_store(addr, value);
                self.stretch(Stretch::WriteIo);
            }
            Write::Io2 => {
                self.stretch(Stretch::WriteIoStart);
                self.expansion.io2_store(addr, value);
                match addr {
                    0xDF01 | 0xDF21 => self.stretch(Stretch::WriteIoLong),
                    0xDF7E | 0xDF7F => {
                        self.stretch(Stretch::WriteIo);
                        self.regs.ramlink = addr == 0xDF7E;
                    }
                    _ => self.stretch(Stretch::WriteIo),
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Side-effect-free access

    fn peek_handler(&self, handler: Read, addr: u16) -> u8 {
        let a = usize::from(addr);
        match handler {
            Read::Sram => self.sram[a],
            Read::Sram1 | Read::Registers => self.sram[0x1_0000 + a],
            Read::KernalShadow => self.sram[0x8000 + a],
            Read::Internal => self.ram[a],
            Read::Roml | Read::Romh => self.expansion.peek(addr).unwrap_or(self.ram[a]),
            Read::Ultimax => self.expansion.peek(addr).unwrap_or(self.io.phi1()),
            Read::Vic if addr & 0xFFF0 == 0xD0B0 => self.hardware_read(addr),
            Read::Vic => self.io.vic_peek(addr),
            Read::Sid => self.io.sid_peek(addr),
            Read::ColorRam => self.color_ram_read(addr),
            Read::ColorRamInt => self.io.phi1(),
            Read::Cia1 => self.io.cia1_peek(addr),
            Read::Cia2 => self.io.cia2_peek(addr),
            Read::Io1 => self.expansion.io1_peek(addr).unwrap_or(self.io.phi1()),
            Read::Io2 => self.expansion.io2_peek(addr).unwrap_or(self.io.phi1()),
            Read::Eprom => self.eprom[a],
            Read::Chargen => self.char_rom[a & 0x0FFF],
        }
    }

    #[must_use]
    pub fn peek(&self, addr: u16) -> u8 {
        let handler = self.tables.read(self.rows.config(), usize::from(addr >> 8));
        self.peek_handler(handler, addr)
    }

    // ------------------------------------------------------------------
    // 24-bit space

    fn long_cell(&self, addr: u32) -> Cell {
        let addr = addr & 0xFF_FFFF;
        match addr & 0xFE_0000 {
            // V2 folds $x0000/$x0001 of both SRAM banks onto the port bytes
            0x00_0000 if addr & 0xFFFE == 0 && self.version == ScpuVersion::V2 => {
                Cell::Sram(addr as usize & 1)
            }
            0x00_0000 => Cell::Sram(addr as usize),
            0xF6_0000 => self
                .simm
                .window(addr)
                .map_or(Cell::Open((addr >> 16) as u8), Cell::Window),
            0xF8_0000..=0xFE_0000 => Cell::Eprom(addr as usize & (EPROM_MAX - 1)),
            _ => self
                .simm
                .linear(addr)
                .map_or(Cell::Open((addr >> 16) as u8), Cell::Simm),
        }
    }

    fn cell_byte(&self, cell: Cell) -> u8 {
        match cell {
            Cell::Sram(i) => self.sram[i],
            Cell::Window(i) | Cell::Simm(i) => self.simm.get(i),
            Cell::Eprom(i) => self.eprom[i],
            Cell::Open(value) => value,
        }
    }

    /// 65816 long read outside the bank 0 memory map.
    pub fn read_long(&mut self, addr: u32) -> u8 {
        let cell = self.long_cell(addr);
        match cell {
            Cell::Window(i) | Cell::Simm(i) => self.stretch(Stretch::ReadSimm(i as u32)),
            Cell::Eprom(_) => self.stretch(Stretch::ReadEprom),
            Cell::Sram(_) | Cell::Open(_) => {}
        }
        self.cell_byte(cell)
    }

    #[must_use]
    pub fn peek_long(&self, addr: u32) -> u8 {
        self.cell_byte(self.long_cell(addr))
    }

    /// 65816 long write. The SIMM window is read-only until the hardware
    /// registers are enabled; the EPROM ignores writes.
    pub fn write_long(&mut self, addr: u32, value: u8) {
        match self.long_cell(addr) {
            Cell::Sram(i) => {
                if i >= 0x1_E000 && self.trap_ram[i & 0x1FFF] != value {
                    self.trap_ram[i & 0x1FFF] = value;
                    self.traps_pending = true;
                }
                self.sram[i] = value;
            }
            Cell::Window(i) => {
                if self.regs.hw_enable {
                    self.simm.set(i, value);
                }
                self.stretch(Stretch::WriteSimm(i as u32));
            }
            Cell::Simm(i) => {
                self.simm.set(i, value);
                self.stretch(Stretch::WriteSimm(i as u32));
            }
            Cell::Eprom(_) => self.stretch(Stretch::WriteEprom),
            Cell::Open(_) => {}
        }
    }

    /// Direct-read window for a 24-bit address. Addresses in bank 0 use
    /// the current configuration; others cover the whole bank. Hands
    /// pending trap updates to the machine first.
    pub fn translate(&mut self, addr: u32) -> Option<Translation<Source>> {
        let whole_bank = Limit {
            start: 0x0000,
            end: 0xFFFD,
        };
        let bank = |source: Source, offset: usize| Translation {
            base: Base::new(source, offset as i32),
            limit: whole_bank,
        };

        if addr >= 0x1_0000 {
            if addr < 0x2_0000 {
                let mut sram1 = bank(Source::Sram, 0x1_0000);
                // V2 folds $10000/$10001 onto the port bytes
                if self.version == ScpuVersion::V2 {
                    sram1.limit.start = 0x0002;
                }
                return Some(sram1);
            }
            if self.regs.fast() {
                return None;
            }
            if addr >= 0xF8_0000 {
                return Some(bank(Source::Eprom, addr as usize & 0x7_0000));
            }
            return self
                .simm
                .direct_bank(addr)
                .map(|offset| bank(Source::Simm, offset));
        }

        let addr = addr as u16;
        let config = self.rows.config();
        // V1 colour RAM reads come from the nibble array, not SRAM
        if self.version == ScpuVersion::V1
            && self.tables.read(config, usize::from(addr >> 8)) == Read::ColorRam
        {
            return None;
        }
        let translation = self.tables.translate(config, addr)?;
        if self.traps_pending {
            self.traps_pending = false;
            self.io.traps_refresh();
        }
        Some(translation)
    }

    /// Backing array of a direct-read source.
    #[must_use]
    pub fn source(&self, source: Source) -> &[u8] {
        match source {
            Source::Sram => &self.sram,
            Source::Internal => &self.ram,
            Source::TrapRam => &self.trap_ram,
            Source::Eprom => &self.eprom,
            Source::Chargen => &self.char_rom,
            Source::Simm => self.simm.contents(),
        }
    }

    // ------------------------------------------------------------------
    // Monitor banks

    #[must_use]
    pub fn banks(&self) -> &BankList {
        &self.banks
    }

    /// `ram00`-`ramf7` and `romf8`-`romff`.
    fn bank_cell(&self, bank: u16, addr: u16) -> Option<Cell> {
        let offset = usize::from(addr);
        match bank {
            5..=6 => Some(Cell::Sram((usize::from(bank - BANK_RAM00) << 16) + offset)),
            7..=252 => {
                // ramf6/ramf7 are the SIMM window
                let first = if bank >= 251 { 251 } else { BANK_RAM00 };
                let addr2 = (u32::from(bank - first) << 16) | u32::from(addr);
                Some(
                    self.simm
                        .linear(addr2)
                        .map_or(Cell::Open((bank - BANK_RAM00) as u8), Cell::Simm),
                )
            }
            253..=260 => {
                let index = (usize::from(bank - BANK_ROMF8) << 16) + offset;
                Some(Cell::Eprom(index & (EPROM_MAX - 1)))
            }
            _ => None,
        }
    }

    fn io_read(&mut self, addr: u16) -> u8 {
        match addr >> 8 {
            0xD0 if addr & 0xFFF0 == 0xD0B0 => self.hardware_read(addr),
            0xD0 | 0xD1 => self.io.vic_read(addr),
            0xD2 | 0xD3 => self.sram[0x1_0000 + usize::from(addr)],
            0xD4..=0xD7 => self.io.sid_read(addr),
            0xD8..=0xDB => self.color_ram_read(addr),
            0xDC => self.io.cia1_read(addr),
            0xDD => self.io.cia2_read(addr),
            0xDE => self.expansion.io1_read(addr).unwrap_or(self.io.phi1()),
            _ => self.expansion.io2_read(addr).unwrap_or(self.io.phi1()),
        }
    }

    fn io_peek(&self, addr: u16) -> u8 {
        match addr >> 8 {
            0xD0 if addr & 0xFFF0 == 0xD0B0 => self.hardware_read(addr),
            0xD0 | 0xD1 => self.io.vic_peek(addr),
            0xD2 | 0xD3 => self.sram[0x1_0000 + usize::from(addr)],
            0xD4..=0xD7 => self.io.sid_peek(addr),
            0xD8..=0xDB => self.color_ram_read(addr),
            0xDC => self.io.cia1_peek(addr),
            0xDD => self.io.cia2_peek(addr),
            0xDE => self.expansion.io1_peek(addr).unwrap_or(self.io.phi1()),
            _ => self.expansion.io2_peek(addr).unwrap_or(self.io.phi1()),
        }
    }

    fn io_store(&mut self, addr: u16, value: u8) {
        match addr >> 8 {
            0xD0 if registers::is_register(addr) => self.hardware_store(addr, value),
            0xD0 | 0xD1 => self.io.vic_store(addr, value),
            0xD2 | 0xD3 => self.registers_store(addr, value),
            0xD4..=0xD7 => self.io.sid_store(addr, value),
            0xD8..=0xDB => self.color_ram_store(addr, value),
            0xDC => self.io.cia1_store(addr, value),
            0xDD => self.io.cia2_store(addr, value),
            0xDE => self.expansion.io1_store(addr, value),
            _ => self.expansion.io2_store(addr, value),
        }
    }

    /// The ROM copies in SRAM bank 1 as the `rom` bank shows them.
    fn rom_byte(&self, addr: u16) -> Option<u8> {
        let a = usize::from(addr);
        match addr {
            0xA000..=0xBFFF => Some(self.sram[0x1_0000 + a]),
            0xD000..=0xDFFF => Some(self.char_rom[a & 0x0FFF]),
            0xE000..=0xFFFF if self.regs.hw_enable => Some(self.sram[0x8000 + a]),
            0xE000..=0xFFFF => Some(self.sram[0x1_0000 + a]),
            _ => None,
        }
    }

    /// Current 65816 program bank, if it is not bank 0.
    fn program_bank(&self) -> Option<u32> {
        let bank = self.io.program_bank();
        (bank > 0).then(|| u32::from(bank) << 16)
    }

    fn plain_bank_byte(&self, bank: u16, addr: u16) -> u8 {
        let a = usize::from(addr);
        match bank {
            BANK_IO | BANK_CART => self.expansion.peek(addr).unwrap_or(self.sram[a]),
            BANK_ROM => self.rom_byte(addr).unwrap_or(self.sram[a]),
            _ => self.sram[a],
        }
    }

    /// Monitor read with side effects.
    pub fn bank_read(&mut self, bank: u16, addr: u16) -> u8 {
        if let Some(cell) = self.bank_cell(bank, addr) {
            return self.cell_byte(cell);
        }
        let io_area = (0xD000..0xE000).contains(&addr);
        match bank {
            BANK_CPU => match self.program_bank() {
                Some(high) => self.peek_long(high | u32::from(addr)),
                None => self.read(addr),
            },
            BANK_IO if io_area => self.io_read(addr),
            _ => self.plain_bank_byte(bank, addr),
        }
    }

    /// Monitor read without side effects.
    #[must_use]
    pub fn bank_peek(&self, bank: u16, addr: u16) -> u8 {
        if let Some(cell) = self.bank_cell(bank, addr) {
            return self.cell_byte(cell);
        }
        let io_area = (0xD000..0xE000).contains(&addr);
        match bank {
            BANK_CPU => {
                if let Some(high) = self.program_bank() {
                    return self.peek_long(high | u32::from(addr));
                }
                // Only I/O where the register pages are mapped in
                let io_mapped = self.tables.base(self.rows.config(), 0xD2)
                    == Some(Base::new(Source::Sram, 0x1_0000));
                if io_area && io_mapped {
                    self.io_peek(addr)
                } else {
                    self.peek(addr)
                }
            }
            BANK_IO if io_area => self.io_peek(addr),
            _ => self.plain_bank_byte(bank, addr),
        }
    }

    /// Monitor write. The `rom` bank swallows stores over the ROM copies.
    pub fn bank_write(&mut self, bank: u16, addr: u16, value: u8) {
        if let Some(cell) = self.bank_cell(bank, addr) {
            match cell {
                Cell::Sram(i) => self.sram[i] = value,
                Cell::Window(i) | Cell::Simm(i) => self.simm.set(i, value),
                Cell::Eprom(i) => self.eprom[i] = value,
                Cell::Open(_) => {}
            }
            return;
        }
        let io_area = (0xD000..0xE000).contains(&addr);
        match bank {
            BANK_CPU => match self.program_bank() {
                Some(high) => self.write_long(high | u32::from(addr), value),
                None => self.write(addr, value),
            },
            BANK_IO if io_area => self.io_store(addr, value),
            BANK_IO | BANK_ROM if self.rom_byte(addr).is_some() => {}
            _ => self.sram[usize::from(addr)] = value,
        }
    }

    // ------------------------------------------------------------------
    // Helpers for loaders, traps and the VIC-II

    /// Write straight into motherboard RAM and SRAM.
    pub fn inject(&mut self, addr: u32, value: u8) {
        let a = (addr & 0xFFFF) as usize;
        self.ram[a] = value;
        self.sram[a] = value;
    }

    /// BASIC program start and end from the zero page pointers.
    #[must_use]
    pub fn basic_text(&self) -> (u16, u16) {
        let word = |lo: usize| u16::from_le_bytes([self.sram[lo], self.sram[lo + 1]]);
        (word(0x2B), word(0x2D))
    }

    pub fn set_basic_text(&mut self, start: u16, end: u16) {
        let [start_lo, start_hi] = start.to_le_bytes();
        let [end_lo, end_hi] = end.to_le_bytes();
        for lo in [0x2B, 0xAC] {
            self.sram[lo] = start_lo;
            self.sram[lo + 1] = start_hi;
        }
        for lo in [0x2D, 0x2F, 0x31, 0xAE] {
            self.sram[lo] = end_lo;
            self.sram[lo + 1] = end_hi;
        }
    }

    #[must_use]
    pub fn rom_trap_allowed(&self, addr: u16) -> bool {
        addr >= 0xE000 && KERNAL_CONFIGS.contains(&self.rows.config())
    }

    /// KERNAL copy the traps patch.
    pub fn trap_ram_mut(&mut self) -> &mut [u8] {
        &mut self.trap_ram
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

    #[must_use]
    pub fn chargen_addr_options(&self) -> (u16, u16) {
        (0x7000, 0x1000)
    }

    /// Motherboard RAM, as the VIC-II fetches it.
    #[must_use]
    pub fn vic_ram(&self) -> &[u8] {
        &self.ram
    }

    #[must_use]
    pub fn chargen_rom(&self) -> &[u8] {
        &self.char_rom
    }

    #[must_use]
    pub fn color_ram(&self) -> &[u8; 0x400] {
        &self.color_ram
    }

    pub fn ram_to_snapshot(&self, buf: &mut [u8]) -> Result<()> {
        snapshot::block_to_snapshot("RAM", &self.ram, buf)
    }

    pub fn ram_from_snapshot(&mut self, buf: &[u8]) -> Result<()> {
        snapshot::block_from_snapshot("RAM", buf, &mut self.ram)
    }

    pub fn sram_to_snapshot(&self, buf: &mut [u8]) -> Result<()> {
        snapshot::block_to_snapshot("SRAM", &self.sram, buf)
    }

    /// Restore SRAM. The trap copy is rebuilt from the restored KERNAL.
    pub fn sram_from_snapshot(&mut self, buf: &[u8]) -> Result<()> {
        snapshot::block_from_snapshot("SRAM", buf, &mut self.sram)?;
        self.trap_ram
            .copy_from_slice(&self.sram[SRAM_SIZE - TRAP_RAM_SIZE..]);
        self.traps_pending = true;
        Ok(())
    }

    pub fn color_ram_to_snapshot(&self, buf: &mut [u8]) -> Result<()> {
        snapshot::block_to_snapshot("color RAM", &self.color_ram, buf)
    }

    pub fn color_ram_from_snapshot(&mut self, buf: &[u8]) -> Result<()> {
        snapshot::block_from_snapshot("color RAM", buf, &mut self.color_ram)
    }

    pub fn simm_to_snapshot(&self, buf: &mut [u8]) -> Result<()> {
        snapshot::block_to_snapshot("SIMM", self.simm.contents(), buf)
    }

    pub fn simm_from_snapshot(&mut self, buf: &[u8]) -> Result<()> {
        snapshot::block_from_snapshot("SIMM", buf, self.simm.contents_mut())
    }
}

impl<I: ScpuIo, E: Expansion> Bus for Scpu64Memory<I, E> {
    fn read(&mut self, address: u16) -> u8 {
        Scpu64Memory::read(self, address)
    }

    fn write(&mut self, address: u16, value: u8) {
        Scpu64Memory::write(self, address, value);
    }

    fn dma_read(&mut self, address: u16) -> u8 {
        Scpu64Memory::dma_read(self, address)
    }

    fn dma_write(&mut self, address: u16, value: u8) {
        Scpu64Memory::dma_write(self, address, value);
    }

    fn peek(&self, address: u16) -> u8 {
        Scpu64Memory::peek(self, address)
    }
}

impl<I: ScpuIo, E: Expansion> Observable for Scpu64Memory<I, E> {
    fn query(&self, path: &str) -> Option<Value> {
        if let Some(rest) = path.strip_prefix("memory.") {
            let addr = parse_address(rest)?;
            return Some(Value::U8(self.peek_long(addr)));
        }
        match path {
            "config" => Some(self.config().into()),
            "mirror" => Some(self.mirror().into()),
            "pport" => Some(self.pport.into()),
            "fast" => Some(self.fast().into()),
            "hw_enable" => Some(self.regs.hw_enable.into()),
            "bootmap" => Some(self.regs.bootmap.into()),
            "dos_ext" => Some(self.regs.dos_ext.into()),
            "ramlink" => Some(self.regs.ramlink.into()),
            "optim" => Some(self.regs.optim.bits().into()),
            "simm.reg" => Some(self.regs.simm.into()),
            "simm.size_mb" => Some(self.simm.size().mb().into()),
            "watch" => Some(format!("{:?}", self.rows.watch()).as_str().into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "config",
            "mirror",
            "pport",
            "fast",
            "hw_enable",
            "bootmap",
            "dos_ext",
            "ramlink",
            "optim",
            "simm.reg",
            "simm.size_mb",
            "watch",
            "memory.<address>",
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use commodore_banking::{C64Io, NoExpansion, OpenBus};
    use emu_core::Ticks;

    fn make_config(version: ScpuVersion, simm_mb: u32) -> Scpu64Config {
        let mut eprom = vec![0xF8; 0x1_0000];
        eprom[0xE000] = 0x4C;
        Scpu64Config {
            version,
            simm_mb,
            eprom,
            char_rom: vec![0xCC; 0x1000],
        }
    }

    fn make_memory() -> Scpu64Memory<OpenBus, NoExpansion> {
        Scpu64Memory::new(&make_config(ScpuVersion::V2, 16), OpenBus::default(), NoExpansion)
            .unwrap()
    }

    /// Records the clock model calls.
    #[derive(Default)]
    struct Clock {
        stretches: Vec<Stretch>,
        fast: Vec<bool>,
        dma: usize,
        traps: usize,
    }

    impl C64Io for Clock {
        fn cycles(&self) -> Ticks {
            Ticks::ZERO
        }

        fn phi1(&self) -> u8 {
            0xFF
        }

        fn ff00_dma(&mut self) {
            self.dma += 1;
        }
    }

    impl ScpuIo for Clock {
        fn stretch(&mut self, kind: Stretch) {
            self.stretches.push(kind);
        }

        fn set_fastmode(&mut self, fast: bool) {
            self.fast.push(fast);
        }

        fn traps_refresh(&mut self) {
            self.traps += 1;
        }
    }

    fn clocked() -> Scpu64Memory<Clock, NoExpansion> {
        Scpu64Memory::new(&make_config(ScpuVersion::V2, 16), Clock::default(), NoExpansion)
            .unwrap()
    }

    /// Registers on, boot map off.
    fn native_map<I: ScpuIo>(mem: &mut Scpu64Memory<I, NoExpansion>) {
        mem.write(0xD07E, 0);
        mem.write(0xD0B6, 0);
    }

    #[test]
    fn boots_from_the_eprom() {
        let mut mem = make_memory();
        assert_eq!(mem.config(), DEFAULT_CONFIG);
        assert_eq!(mem.mirror(), 15);
        assert_eq!(mem.read(0xE000), 0x4C);
        assert_eq!(mem.read(0xA000), 0xF8);
        assert!(!mem.rom_trap_allowed(0xE000));
        assert_eq!(mem.read(0xD0B0), 0x47);
    }

    #[test]
    fn enable_then_leave_boot_map() {
        let mut mem = make_memory();
        mem.write(0xD07E, 0);
        assert_eq!(mem.config(), 0xA7);
        mem.write(0xD0B6, 0);
        assert_eq!(mem.config(), 0x27);
        // The KERNAL shadow is SRAM $16000-$17FFF
        mem.write_long(0x1_6000, 0x20);
        assert_eq!(mem.read(0xE000), 0x20);
        mem.write_long(0x1_A000, 0x94);
        assert_eq!(mem.read(0xA000), 0x94);
    }

    #[test]
    fn processor_port_switches_rows() {
        let mut mem = make_memory();
        native_map(&mut mem);
        mem.write(0x0001, 0x30);
        assert_eq!(mem.config(), 0x20);
        assert_eq!(mem.peek_long(0x0001), 0x30);
        mem.write(0xA000, 0x12);
        assert_eq!(mem.read(0xA000), 0x12);
        // DMA never reaches the port
        mem.dma_write(0x0001, 0x37);
        assert_eq!(mem.config(), 0x20);
    }

    #[test]
    fn mirrored_stores_reach_the_motherboard() {
        let mut mem = make_memory();
        mem.write(0x0400, 0x12);
        mem.write(0x0100, 0x34);
        assert_eq!(mem.vic_ram()[0x0400], 0x12);
        assert_eq!(mem.vic_ram()[0x0100], 0x00);
        assert_eq!(mem.read(0x0100), 0x34);

        // Mode 4: $4000-$7FFF only
        mem.write(0xD07E, 0);
        mem.write(0xD075, 0);
        assert_eq!(mem.mirror(), 4);
        mem.write(0x0400, 0x56);
        mem.write(0x4000, 0x78);
        assert_eq!(mem.vic_ram()[0x0400], 0x12);
        assert_eq!(mem.vic_ram()[0x4000], 0x78);
        assert_eq!(mem.read(0x0400), 0x56);
    }

    #[test]
    fn internal_map_uses_motherboard_ram() {
        let mut mem = make_memory();
        mem.write(0xD07E, 0);
        mem.write(0xD0BE, 0);
        assert_eq!(mem.config(), 0xE7);
        mem.write(0x1000, 0xAA);
        assert_eq!(mem.read(0x1000), 0xAA);
        assert_eq!(mem.vic_ram()[0x1000], 0xAA);
        assert_eq!(mem.bank_peek(BANK_RAM00, 0x1000), 0x00);
        assert_eq!(
            mem.tables().base(0xE7, 0x10),
            Some(Base::new(Source::Internal, 0))
        );
        assert_eq!(mem.tables().limit(0xE7, 0x10), Limit::NONE);
    }

    #[test]
    fn long_addresses() {
        let mut mem = make_memory();
        mem.write_long(0x02_0005, 0xAB);
        assert_eq!(mem.read_long(0x02_0005), 0xAB);
        assert_eq!(mem.bank_peek(BANK_RAM00 + 2, 0x0005), 0xAB);
        assert_eq!(mem.read_long(0xF8_E000), 0x4C);
        assert_eq!(mem.read_long(0xFF_E000), 0x4C);
        mem.write_long(0xF8_0000, 0x00);
        assert_eq!(mem.read_long(0xF8_0000), 0xF8);

        // The window is read-only until the registers are enabled
        mem.write_long(0xF6_0007, 0x5A);
        assert_eq!(mem.read_long(0xF6_0007), 0x00);
        mem.write(0xD07E, 0);
        mem.write_long(0xF6_0007, 0x5A);
        assert_eq!(mem.bank_peek(251, 0x0007), 0x5A);

        // V2 folds $10000/$10001 onto $0000/$0001
        mem.write_long(0x1_0001, 0x66);
        assert_eq!(mem.peek_long(0x0001), 0x66);
    }

    #[test]
    fn no_simm_floats_the_bank_number() {
        let mut mem =
            Scpu64Memory::new(&make_config(ScpuVersion::V2, 0), OpenBus::default(), NoExpansion)
                .unwrap();
        assert_eq!(mem.read_long(0x05_1234), 0x05);
        assert_eq!(mem.read_long(0xF6_0000), 0xF6);
        assert_eq!(mem.bank_peek(BANK_RAM00 + 0x10, 0), 0x10);
        assert!(mem.set_simm_size(3).is_err());
        mem.set_simm_size(4).unwrap();
        mem.write_long(0x05_1234, 0x11);
        assert_eq!(mem.read_long(0x05_1234), 0x11);
    }

    #[test]
    fn trap_copy_refreshes_on_translate() {
        let mut mem = clocked();
        native_map(&mut mem);
        mem.write(0xD07F, 0);
        assert_eq!(mem.config(), 0x07);
        assert!(mem.rom_trap_allowed(0xFFD2));
        mem.write_long(0x1_E123, 0x99);
        let t = mem.translate(0xE123).unwrap();
        assert_eq!(t.base.source, Source::TrapRam);
        assert_eq!(mem.source(t.base.source)[t.base.index(0xE123)], 0x99);
        assert_eq!(mem.io.traps, 1);
        mem.translate(0xE123);
        assert_eq!(mem.io.traps, 1);
    }

    #[test]
    fn io_is_stretched() {
        let mut mem = clocked();
        mem.read(0xD020);
        mem.write(0xD020, 0);
        mem.write(0xFF00, 0);
        assert_eq!(
            mem.io.stretches,
            vec![
                Stretch::ReadIo,
                Stretch::WriteIoStart,
                Stretch::WriteIo,
                Stretch::WriteIoStart,
                Stretch::WriteIoLong,
            ]
        );
        assert_eq!(mem.io.dma, 1);
        mem.io.stretches.clear();
        mem.write(0xDC00, 0);
        mem.read(0xE000);
        assert_eq!(
            mem.io.stretches,
            vec![Stretch::WriteIoStartCia, Stretch::WriteIoCia, Stretch::ReadEprom]
        );
    }

    #[test]
    fn speed_registers() {
        let mut mem = clocked();
        mem.write(0xD07A, 0);
        assert!(!mem.fast());
        assert_eq!(mem.io.fast.last(), Some(&false));
        assert!(mem.translate(0xF8_0000).is_some());
        mem.io.stretches.clear();
        mem.write(0xD07B, 0);
        assert!(mem.fast());
        // Switching back to 20 MHz ends the stretch early
        assert_eq!(mem.io.stretches, vec![Stretch::WriteIoStart]);
        assert!(mem.translate(0xF8_0000).is_none());
        assert!(mem.translate(0x1_2345).is_some());
        mem.set_speed_switch(false);
        assert!(!mem.fast());
    }

    #[test]
    fn register_pages_need_enable() {
        let mut mem = make_memory();
        mem.write(0xD200, 0x01);
        mem.write(0xD27E, 0x02);
        assert_eq!(mem.read(0xD200), 0x00);
        assert_eq!(mem.read(0xD27E), 0x02);
        mem.write(0xD07E, 0);
        mem.write(0xD300, 0x03);
        assert_eq!(mem.read(0xD300), 0x03);
        assert_eq!(mem.bank_peek(BANK_RAM00 + 1, 0xD300), 0x03);
    }

    #[test]
    fn colour_ram_by_version() {
        let mut v2 = make_memory();
        v2.write(0xD800, 0xAB);
        assert_eq!(v2.read(0xD800), 0xAB);
        assert_eq!(v2.color_ram()[0], 0x0B);

        let mut v1 =
            Scpu64Memory::new(&make_config(ScpuVersion::V1, 0), OpenBus::default(), NoExpansion)
                .unwrap();
        v1.write(0xD800, 0xAB);
        assert_eq!(v1.read(0xD800), 0xFB);
        assert!(v1.translate(0xD800).is_none());
        assert_eq!(v1.read(0xD0B0), 0xC7);
    }

    #[test]
    fn interrupt_reroute_follows_kernal_copy() {
        let mut mem = make_memory();
        assert!(!mem.interrupt_reroute());
        native_map(&mut mem);
        assert_eq!(mem.config(), 0x27);
        assert!(mem.interrupt_reroute());
        mem.write(0xD07F, 0);
        // Kernal with traps, but nothing asks for the reroute
        assert!(!mem.interrupt_reroute());
    }

    #[test]
    fn ramlink_registers() {
        let mut mem = make_memory();
        mem.write(0xDF7E, 0);
        assert!(mem.registers().ramlink);
        mem.write(0xDF7F, 0);
        assert!(!mem.registers().ramlink);
    }

    #[test]
    fn monitor_banks() {
        let mut mem = make_memory();
        assert_eq!(mem.banks().from_name("romff").unwrap(), 260);
        assert_eq!(mem.banks().from_name("ramf7").unwrap(), 252);
        assert_eq!(mem.banks().from_name("default").unwrap(), BANK_RAM);
        assert_eq!(mem.bank_peek(BANK_ROMF8, 0xE000), 0x4C);
        assert_eq!(mem.bank_peek(BANK_ROM, 0xD000), 0xCC);
        assert_eq!(mem.bank_read(BANK_IO, 0xD0B0), 0x47);

        mem.bank_write(BANK_ROM, 0xA000, 0x55);
        assert_eq!(mem.bank_peek(BANK_RAM, 0xA000), 0x00);
        mem.bank_write(BANK_RAM, 0xA000, 0x55);
        assert_eq!(mem.bank_peek(BANK_RAM, 0xA000), 0x55);
        mem.bank_write(BANK_RAM00 + 1, 0xE000, 0x60);
        assert_eq!(mem.bank_peek(BANK_ROM, 0xE000), 0x60);
        mem.bank_write(BANK_IO, 0xD07E, 0);
        assert!(mem.registers().hw_enable);
    }

    #[test]
    fn inject_and_basic_text() {
        let mut mem = make_memory();
        mem.inject(0x1_0801, 0x0B);
        assert_eq!(mem.read(0x0801), 0x0B);
        assert_eq!(mem.vic_ram()[0x0801], 0x0B);
        mem.set_basic_text(0x0801, 0x0900);
        assert_eq!(mem.basic_text(), (0x0801, 0x0900));
    }

    #[test]
    fn hardware_reset_restores_boot_map() {
        let mut mem = make_memory();
        native_map(&mut mem);
        mem.write(0xD074, 0);
        mem.write(0x0001, 0x35);
        mem.hardware_reset();
        assert_eq!(mem.config(), DEFAULT_CONFIG);
        assert_eq!(mem.mirror(), 15);
        assert_eq!(mem.query("hw_enable"), Some(Value::from(false)));
    }
}
