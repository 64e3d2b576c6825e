//! C128 memory subsystem.
//!
//! 128K RAM in two banks, the system ROMs, two function ROM sockets and 2K
//! of colour RAM, banked by the 8722 MMU. In C64 mode the MMU hides itself
//! and the C64 PLA rows take over.
//!
//! Common RAM: RCR can make the bottom and/or top 1K-16K of the address
//! space always come from bank 0, whatever bank CR selects. Pages 0 and 1
//! can be relocated anywhere in the 128K by the P0/P1 pointers.

use commodore_banking::{
    AccessKind, ActiveRows, BankList, Expansion, Result, Translation, VbankWindow, WatchEvents,
    WatchHook, WatchMode, ram_init, snapshot,
};
use emu_c64::ScreenParams;
use emu_c64::meminit::KERNAL_CONFIGS;
use emu_core::{Bus, Observable, Value, parse_address};
use mos_6510_port::{PortModel, ProcessorPort};
use mos_mmu_8722::{Mmu, MmuEvent, SharedLimits};

use crate::config::{C128Config, FUNCTION_ROM_SIZE};
use crate::io::C128Io;
use crate::meminit::{
    self, C64_MODE_BASE, HighArea, IoDevice, Read, Source, Tables, Write, io_device,
};

pub const BANK_CPU: u16 = 0;
pub const BANK_RAM: u16 = 1;
pub const BANK_ROM: u16 = 2;
pub const BANK_IO: u16 = 3;
pub const BANK_RAM1: u16 = 4;
pub const BANK_INTFUNC: u16 = 5;
pub const BANK_EXTFUNC: u16 = 6;
pub const BANK_CART: u16 = 7;
pub const BANK_C64ROM: u16 = 8;
pub const BANK_VDC: u16 = 9;

const RAM_SIZE: usize = 0x20000;

/// C128 memory subsystem.
pub struct C128Memory<I: C128Io, E: Expansion> {
    ram: Box<[u8]>,
    basic_lo_rom: Vec<u8>,
    basic_hi_rom: Vec<u8>,
    editor_rom: Vec<u8>,
    z80bios_rom: Vec<u8>,
    kernal_rom: Vec<u8>,
    char_rom: Vec<u8>,
    basic64_rom: Vec<u8>,
    kernal64_rom: Vec<u8>,
    int_function_rom: Vec<u8>,
    ext_function_rom: Vec<u8>,
    /// Two 1K halves, 4 bits per cell.
    color_ram: [u8; 0x800],
    port: ProcessorPort,
    mmu: Mmu,
    tables: Tables,
    rows: ActiveRows,
    /// Offset of the CR-selected bank in `ram`.
    ram_bank: usize,
    shared: SharedLimits,
    /// Physical addresses of the relocated pages 0 and 1.
    page_zero: usize,
    page_one: usize,
    /// Character ROM half the CPU and VIC-IIe see.
    chargen_offset: usize,
    /// Colour RAM halves for the CPU and the VIC-IIe.
    color_cpu: usize,
    color_vic: usize,
    chargen_options: Option<(u16, u16)>,
    international: bool,
    exrom: bool,
    game: bool,
    watch: WatchEvents,
    banks: BankList,
    pub io: I,
    pub expansion: E,
}

fn function_rom(image: &[u8]) -> Vec<u8> {
    if image.is_empty() {
        vec![0; FUNCTION_ROM_SIZE]
    } else {
        image.to_vec()
    }
}

impl<I: C128Io, E: Expansion> C128Memory<I, E> {
    pub fn new(config: &C128Config, io: I, expansion: E) -> Result<Self> {
        config.check()?;
        let tables = meminit::build()?;
        log::info!(
            "C128 memory initialised: {} configs, {:?}",
            tables.configs(),
            config.model
        );

        let exrom = expansion.exrom();
        let game = expansion.game();
        let mut mmu = Mmu::new();
        mmu.set_cart_lines(game, exrom);

        let mut mem = Self {
            ram: vec![0; RAM_SIZE].into_boxed_slice(),
            basic_lo_rom: config.basic_lo_rom.clone(),
            basic_hi_rom: config.basic_hi_rom.clone(),
            editor_rom: config.kernal_rom[..0x1000].to_vec(),
            z80bios_rom: config.kernal_rom[0x1000..0x2000].to_vec(),
            kernal_rom: config.kernal_rom[0x2000..].to_vec(),
            char_rom: config.char_rom.clone(),
            basic64_rom: config.basic64_rom.clone(),
            kernal64_rom: config.kernal64_rom.clone(),
            int_function_rom: function_rom(&config.int_function_rom),
            ext_function_rom: function_rom(&config.ext_function_rom),
            color_ram: [0; 0x800],
            port: ProcessorPort::new(PortModel::C128),
            mmu,
            tables,
            rows: ActiveRows::new(0),
            ram_bank: 0,
            shared: SharedLimits::NONE,
            page_zero: 0,
            page_one: 0x100,
            chargen_offset: 0,
            color_cpu: 0,
            color_vic: 0,
            chargen_options: None,
            international: config.international,
            exrom,
            game,
            watch: WatchEvents::new(),
            banks: BankList::new()
                .bank("default", BANK_RAM)
                .bank("cpu", BANK_CPU)
                .bank("ram", BANK_RAM)
                .bank("rom", BANK_ROM)
                .bank("io", BANK_IO)
                .bank("ram1", BANK_RAM1)
                .bank("intfunc", BANK_INTFUNC)
                .bank("extfunc", BANK_EXTFUNC)
                .bank("cart", BANK_CART)
                .bank("c64rom", BANK_C64ROM)
                .bank("vdc", BANK_VDC),
            io,
            expansion,
        };
        mem.update_config();
        Ok(mem)
    }

    pub fn powerup(&mut self) {
        ram_init(&mut self.ram);
    }

    /// Hardware reset: MMU and port back to power-on state.
    pub fn reset(&mut self) {
        self.port.reset();
        self.mmu.reset();
        self.shared = SharedLimits::NONE;
        self.update_pages();
        self.update_config();
    }

    // ------------------------------------------------------------------
    // Configuration

    /// Re-derive the active row, RAM bank, character ROM half and colour
    /// RAM halves from the MMU and the port.
    pub fn update_config(&mut self) {
        let c64_mode = self.mmu.is_c64_mode();
        let c64_config = usize::from(self.port.bank_lines())
            | usize::from(self.exrom) << 3
            | usize::from(self.game) << 4;
        let config = if c64_mode {
            C64_MODE_BASE + c64_config
        } else {
            self.mmu.config_index()
        };
        self.ram_bank = if c64_mode { 0 } else { self.mmu.ram_bank() << 16 };
        if self.rows.update_config(config) {
            log::debug!("C128 memory config ${config:02X}");
        }

        let lines = self.port.data_read();
        self.chargen_offset = match (self.international, c64_mode) {
            (true, true) => 0x1000,
            (true, false) => 0,
            // National machines: CAPS (ASCII/DIN) picks the half
            (false, _) if lines & 0x40 != 0 => 0,
            (false, _) => 0x1000,
        };

        if c64_mode {
            self.color_cpu = 0;
            self.color_vic = 0;
            self.chargen_options = Some((0x7000, 0x1000));
        } else {
            self.color_cpu = if lines & 0x01 != 0 { 0 } else { 0x400 };
            self.color_vic = if lines & 0x02 != 0 { 0 } else { 0x400 };
            self.chargen_options = if lines & 0x04 != 0 {
                None
            } else {
                Some((0x3000, 0x1000))
            };
        }
    }

    /// Act on what an MMU register store changed.
    fn apply(&mut self, events: MmuEvent) {
        if events.is_empty() {
            return;
        }
        if events.contains(MmuEvent::RAM_CONFIG) {
            self.shared = self.mmu.shared_limits();
            let vic_bank = self.mmu.vic_bank();
            self.io.set_vic_ram_bank(vic_bank);
            log::debug!(
                "C128 RCR ${:02X}: common RAM below ${:04X}, above ${:04X}, VIC bank {vic_bank}",
                self.mmu.rcr,
                self.shared.bottom,
                self.shared.top
            );
            self.update_pages();
        }
        if events.contains(MmuEvent::PAGES) {
            self.update_pages();
        }
        if events.contains(MmuEvent::CPU_CHANGED) {
            let is_8502 = self.mmu.is_8502();
            log::info!("C128 CPU: {}", if is_8502 { "8502" } else { "Z80" });
            self.io.cpu_changed(is_8502);
        }
        if events.contains(MmuEvent::FAST_SERIAL_DIR) {
            self.io.fast_serial_dir(self.mmu.fast_serial_out());
        }
        if events.contains(MmuEvent::MODE_CHANGED) {
            log::info!("C128 entering C64 mode");
            self.shared = SharedLimits::NONE;
            self.page_zero = 0;
            self.page_one = 0x100;
            self.io.c64_mode_entered();
        }
        self.update_config();
    }

    /// Physical address of a relocated page. A page inside common RAM
    /// always comes from bank 0.
    fn page_address(&self, addr: u32) -> usize {
        let low = (addr & 0xFFFF) as u16;
        if low < self.shared.bottom || low > self.shared.top {
            usize::from(low)
        } else {
            (addr & 0x1FFFF) as usize
        }
    }

    fn update_pages(&mut self) {
        if self.mmu.is_c64_mode() {
            return;
        }
        self.page_zero = self.page_address(self.mmu.page_zero());
        self.page_one = self.page_address(self.mmu.page_one());
    }

    pub fn set_vbank(&mut self, vbank: usize) {
        let vbank = vbank & 3;
        self.rows.set_variant(vbank);
        self.io.set_vbank(vbank);
        log::debug!("C128 video bank {vbank}");
    }

    pub fn set_cart_lines(&mut self, exrom: bool, game: bool) {
        self.exrom = exrom;
        self.game = game;
        self.mmu.set_cart_lines(game, exrom);
        self.update_config();
    }

    pub fn set_tape_sense(&mut self, pressed: bool) {
        self.port.set_tape_sense(pressed);
        self.update_config();
    }

    /// CAPS LOCK (ASCII/DIN) key.
    pub fn set_caps_key(&mut self, pressed: bool) {
        if self.port.caps_pressed() != pressed {
            log::info!(
                "CAPS key (ASCII/DIN) {}",
                if pressed { "pressed" } else { "released" }
            );
        }
        self.port.set_caps_pressed(pressed);
        self.update_config();
    }

    /// 40/80 DISPLAY key.
    pub fn set_key_40_80(&mut self, pressed: bool) {
        if self.mmu.key_40_80() != pressed {
            log::info!(
                "40/80 key {}",
                if pressed { "pressed" } else { "released" }
            );
        }
        self.mmu.set_key_40_80(pressed);
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
    pub fn is_c64_mode(&self) -> bool {
        self.mmu.is_c64_mode()
    }

    #[must_use]
    pub fn mmu(&self) -> &Mmu {
        &self.mmu
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

    pub fn dma_read(&mut self, addr: u16) -> u8 {
        self.read_with(addr, AccessKind::Dma)
    }

    pub fn dma_write(&mut self, addr: u16, value: u8) {
        self.write_with(addr, value, AccessKind::Dma, false);
    }

    /// Row with the cartridge lines ignored. Native rows have none.
    fn row_without_cartridge(&self) -> usize {
        let config = self.rows.config();
        if config >= C64_MODE_BASE {
            C64_MODE_BASE + ((config - C64_MODE_BASE) & 7)
        } else {
            config
        }
    }

    pub fn read_without_ultimax(&mut self, addr: u16) -> u8 {
        let handler = self
            .tables
            .read(self.row_without_cartridge(), usize::from(addr >> 8));
        self.read_handler(handler, addr, AccessKind::Cpu)
    }

    pub fn store_without_ultimax(&mut self, addr: u16, value: u8) {
        let config = self.row_without_cartridge();
        let handler = self
            .tables
            .write(self.rows.variant(), config, usize::from(addr >> 8));
        self.write_handler(handler, addr, value, AccessKind::Cpu);
    }

    /// Store with neither ROML nor ROMH mapped.
    pub fn store_without_romlh(&mut self, addr: u16, value: u8) {
        let config = if self.is_c64_mode() {
            C64_MODE_BASE
        } else {
            self.rows.config()
        };
        let handler = self
            .tables
            .write(self.rows.variant(), config, usize::from(addr >> 8));
        self.write_handler(handler, addr, value, AccessKind::Cpu);
    }

    fn bottom_shared(&self, addr: u16) -> usize {
        if addr < self.shared.bottom {
            usize::from(addr)
        } else {
            self.ram_bank + usize::from(addr)
        }
    }

    fn top_shared(&self, addr: u16) -> usize {
        if addr > self.shared.top {
            usize::from(addr)
        } else {
            self.ram_bank + usize::from(addr)
        }
    }

    fn read_handler(&mut self, handler: Read, addr: u16, kind: AccessKind) -> u8 {
        let a = usize::from(addr);
        match handler {
            Read::Zero if kind.is_dma() => self.ram[self.page_zero + (a & 0xFF)],
            Read::Zero if addr & 0xFF == 1 => {
                let now = self.now();
                self.port.read_data(now)
            }
            Read::Io(device) => {
                let value = self.io_read(device, addr);
                self.io.read_stretch();
                value
            }
            Read::Roml => self.expansion.roml_read(addr).unwrap_or(self.ram[a]),
            Read::Romh => self.expansion.romh_read(addr).unwrap_or(self.ram[a]),
            Read::Ultimax => match self.expansion.ultimax_read(addr) {
                Some(value) => value,
                None => self.io.phi1(),
            },
            _ => self.peek_handler(handler, addr),
        }
    }

    fn peek_handler(&self, handler: Read, addr: u16) -> u8 {
        let a = usize::from(addr);
        match handler {
            Read::Zero => match addr & 0xFF {
                0 => self.port.read_dir(),
                1 => self.port.peek_data(self.now()),
                low => self.ram[self.page_zero + usize::from(low)],
            },
            Read::One => self.ram[self.page_one + (a & 0xFF)],
            Read::Lo => self.ram[self.bottom_shared(addr)],
            Read::Ram => self.ram[self.ram_bank + a],
            Read::TopShared => self.ram[self.top_shared(addr)],
            Read::BasicLo => self.basic_lo_rom[a & 0x3FFF],
            Read::BasicHi => self.basic_hi_rom[a & 0x3FFF],
            Read::Editor => self.editor_rom[a & 0x0FFF],
            Read::Kernal => self.kernal_rom[a & 0x1FFF],
            Read::IntFunction => self.int_function_rom[a & 0x7FFF],
            Read::ExtFunction => self.ext_function_rom[a & 0x7FFF],
            Read::Chargen => self.char_rom[self.chargen_offset + (a & 0x0FFF)],
            Read::Ffxx => self.ffxx_read(addr),
            Read::Io(device) => self.io_peek(device, addr),
            Read::Basic64 => self.basic64_rom[a & 0x1FFF],
            Read::Kernal64 => self.kernal64_rom[a & 0x1FFF],
            Read::Roml | Read::Romh => self.expansion.peek(addr).unwrap_or(self.ram[a]),
            Read::Ultimax => self.expansion.peek(addr).unwrap_or(self.io.phi1()),
        }
    }

    /// Page $FF: the load configuration registers over whatever the high
    /// area shows.
    fn ffxx_read(&self, addr: u16) -> u8 {
        if addr <= 0xFF04 {
            return self.mmu.read_lcr(addr);
        }
        let a = usize::from(addr);
        match HighArea::of_config(self.rows.config()) {
            HighArea::System => self.kernal_rom[a & 0x1FFF],
            HighArea::IntFunction => self.int_function_rom[a & 0x7FFF],
            HighArea::ExtFunction => self.ext_function_rom[a & 0x7FFF],
            HighArea::Ram => self.ram[self.top_shared(addr)],
        }
    }

    fn ffxx_store(&mut self, addr: u16, value: u8, kind: AccessKind) {
        if addr > 0xFF04 {
            let cell = self.top_shared(addr);
            self.ram[cell] = value;
            return;
        }
        let events = self.mmu.write_lcr(addr, value);
        self.apply(events);
        if addr == 0xFF00 && !kind.is_dma() {
            self.io.ff00_dma();
        }
    }

    fn zero_store(&mut self, addr: u16, value: u8, kind: AccessKind) {
        let reg = addr & 0xFF;
        let cell = self.page_zero + usize::from(reg);
        if kind.is_dma() || reg > 1 {
            self.ram[cell] = value;
            return;
        }

        self.ram[cell] = self.io.phi1();
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
            Write::One => self.ram[self.page_one + (a & 0xFF)] = value,
            Write::Lo => {
                let cell = self.bottom_shared(addr);
                self.ram[cell] = value;
            }
            Write::Ram => self.ram[self.ram_bank + a] = value,
            Write::TopShared => {
                let cell = self.top_shared(addr);
                self.ram[cell] = value;
            }
            Write::Ffxx => self.ffxx_store(addr, value, kind),
            Write::Io(device) => {
                self.io.write_stretch();
                self.io_store(device, addr, value);
            }
            Write::Vbank(window) => {
                self.io.vbank_store(addr, value, window);
                self.ram[a] = value;
            }
            Write::RamHi => {
                if self.rows.variant() == 3 {
                    self.io.vbank_store(addr, value, VbankWindow::Page3f);
                }
                self.ram[self.ram_bank + a] = value;
                if addr == 0xFF00 && !kind.is_dma() {
                    self.io.ff00_dma();
                }
            }
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
        }
    }

    fn color_read(&self, addr: u16) -> u8 {
        self.color_ram[self.color_cpu + usize::from(addr & 0x3FF)] | (self.io.phi1() & 0xF0)
    }

    fn io_read(&mut self, device: IoDevice, addr: u16) -> u8 {
        match device {
            IoDevice::Vic => self.io.vic_read(addr),
            IoDevice::Sid => self.io.sid_read(addr),
            IoDevice::Mmu => self.mmu.read(addr),
            IoDevice::D5xx => self.io.phi1(),
            IoDevice::Vdc => self.io.vdc_read(addr),
            IoDevice::ColorRam => self.color_read(addr),
            IoDevice::Cia1 => self.io.cia1_read(addr),
            IoDevice::Cia2 => self.io.cia2_read(addr),
            IoDevice::Io1 => match self.expansion.io1_read(addr) {
                Some(value) => value,
                None => self.io.phi1(),
            },
            IoDevice::Io2 => match self.expansion.io2_read(addr) {
                Some(value) => value,
                None => self.io.phi1(),
            },
        }
    }

    fn io_peek(&self, device: IoDevice, addr: u16) -> u8 {
        match device {
            IoDevice::Vic => self.io.vic_peek(addr),
            IoDevice::Sid => self.io.sid_peek(addr),
            IoDevice::Mmu => self.mmu.read(addr),
            IoDevice::D5xx => self.io.phi1(),
            IoDevice::Vdc => self.io.vdc_peek(addr),
            IoDevice::ColorRam => self.color_read(addr),
            IoDevice::Cia1 => self.io.cia1_peek(addr),
            IoDevice::Cia2 => self.io.cia2_peek(addr),
            IoDevice::Io1 => self.expansion.io1_peek(addr).unwrap_or(self.io.phi1()),
            IoDevice::Io2 => self.expansion.io2_peek(addr).unwrap_or(self.io.phi1()),
        }
    }

    fn io_store(&mut self, device: IoDevice, addr: u16, value: u8) {
        match device {
            IoDevice::Vic => self.io.vic_store(addr, value),
            IoDevice::Sid => self.io.sid_store(addr, value),
            IoDevice::Mmu => {
                let events = self.mmu.write(addr, value);
                self.apply(events);
            }
            IoDevice::D5xx => {}
            IoDevice::Vdc => self.io.vdc_store(addr, value),
            IoDevice::ColorRam => {
                self.color_ram[self.color_cpu + usize::from(addr & 0x3FF)] = value & 0x0F;
            }
            IoDevice::Cia1 => self.io.cia1_store(addr, value),
            IoDevice::Cia2 => self.io.cia2_store(addr, value),
            IoDevice::Io1 => self.expansion.io1_store(addr, value),
            IoDevice::Io2 => self.expansion.io2_store(addr, value),
        }
    }

    // ------------------------------------------------------------------
    // Side-effect-free access

    #[must_use]
    pub fn peek(&self, addr: u16) -> u8 {
        let handler = self.tables.read(self.rows.config(), usize::from(addr >> 8));
        self.peek_handler(handler, addr)
    }

    #[must_use]
    pub fn translate(&self, addr: u16) -> Option<Translation<Source>> {
        self.tables.translate(self.rows.config(), addr)
    }

    #[must_use]
    pub fn source(&self, source: Source) -> &[u8] {
        match source {
            Source::Ram => &self.ram,
            Source::BasicLo => &self.basic_lo_rom,
            Source::BasicHi => &self.basic_hi_rom,
            Source::Editor => &self.editor_rom,
            Source::Kernal => &self.kernal_rom,
            Source::IntFunction => &self.int_function_rom,
            Source::ExtFunction => &self.ext_function_rom,
            Source::Basic64 => &self.basic64_rom,
            Source::Kernal64 => &self.kernal64_rom,
        }
    }

    // ------------------------------------------------------------------
    // Monitor banks

    #[must_use]
    pub fn banks(&self) -> &BankList {
        &self.banks
    }

    /// Banks whose contents can be read without side effects.
    fn bank_byte(&self, bank: u16, addr: u16) -> u8 {
        let a = usize::from(addr);
        match bank {
            BANK_RAM1 => self.ram[0x10000 + a],
            BANK_IO | BANK_ROM => match addr {
                0x0000..=0x0FFF => self.z80bios_rom[a],
                0x4000..=0x7FFF => self.basic_lo_rom[a & 0x3FFF],
                0x8000..=0xBFFF => self.basic_hi_rom[a & 0x3FFF],
                0xC000..=0xCFFF => self.editor_rom[a & 0x0FFF],
                0xD000..=0xDFFF => self.char_rom[a & 0x0FFF],
                0xE000..=0xFFFF => self.kernal_rom[a & 0x1FFF],
                _ => self.ram[a],
            },
            BANK_INTFUNC if addr >= 0x8000 => self.int_function_rom[a & 0x7FFF],
            BANK_EXTFUNC if addr >= 0x8000 => self.ext_function_rom[a & 0x7FFF],
            BANK_CART => self.expansion.peek(addr).unwrap_or(self.ram[a]),
            BANK_C64ROM => match addr {
                0xA000..=0xBFFF => self.basic64_rom[a & 0x1FFF],
                0xD000..=0xDFFF => self.char_rom[a & 0x0FFF],
                0xE000..=0xFFFF => self.kernal64_rom[a & 0x1FFF],
                _ => self.ram[a],
            },
            BANK_VDC => self.io.vdc_ram_read(addr),
            _ => self.ram[a],
        }
    }

    pub fn bank_read(&mut self, bank: u16, addr: u16) -> u8 {
        match bank {
            BANK_CPU => self.read(addr),
            BANK_IO if (0xD000..0xE000).contains(&addr) => {
                self.io_read(io_device(usize::from(addr >> 8), false), addr)
            }
            _ => self.bank_byte(bank, addr),
        }
    }

    /// The `cpu` bank peeks through the active row, so $D000-$DFFF shows
    /// I/O only when the configuration maps it.
    #[must_use]
    pub fn bank_peek(&self, bank: u16, addr: u16) -> u8 {
        match bank {
            BANK_CPU => self.peek(addr),
            BANK_IO if (0xD000..0xE000).contains(&addr) => {
                self.io_peek(io_device(usize::from(addr >> 8), false), addr)
            }
            _ => self.bank_byte(bank, addr),
        }
    }

    pub fn bank_write(&mut self, bank: u16, addr: u16, value: u8) {
        let a = usize::from(addr);
        match bank {
            BANK_CPU => self.write(addr, value),
            BANK_RAM1 => self.ram[0x10000 + a] = value,
            BANK_IO if (0xD000..0xE000).contains(&addr) => {
                self.io_store(io_device(usize::from(addr >> 8), false), addr, value);
            }
            BANK_IO | BANK_ROM if (0x4000..0xD000).contains(&addr) || addr >= 0xE000 => {}
            BANK_INTFUNC if addr >= 0x8000 => {}
            BANK_EXTFUNC if (0x8000..0xC000).contains(&addr) => {}
            BANK_CART if (0x8000..0xC000).contains(&addr) || addr >= 0xD000 => {}
            BANK_C64ROM if (0xA000..0xC000).contains(&addr) || addr >= 0xD000 => {}
            BANK_VDC => self.io.vdc_ram_store(addr, value),
            _ => self.ram[a] = value,
        }
    }

    // ------------------------------------------------------------------
    // Helpers for loaders, traps and video

    pub fn inject(&mut self, addr: u32, value: u8) {
        self.ram[(addr & 0xFFFF) as usize] = value;
    }

    /// BASIC program start ($2B/$2C) and end ($1210/$1211).
    #[must_use]
    pub fn basic_text(&self) -> (u16, u16) {
        let word = |lo: usize| u16::from_le_bytes([self.ram[lo], self.ram[lo + 1]]);
        (word(0x2B), word(0x1210))
    }

    pub fn set_basic_text(&mut self, start: u16, end: u16) {
        let [start_lo, start_hi] = start.to_le_bytes();
        let [end_lo, end_hi] = end.to_le_bytes();
        self.ram[0x2B] = start_lo;
        self.ram[0xAC] = start_lo;
        self.ram[0x2C] = start_hi;
        self.ram[0xAD] = start_hi;
        self.ram[0x1210] = end_lo;
        self.ram[0x1211] = end_hi;
    }

    #[must_use]
    pub fn rom_trap_allowed(&self, addr: u16) -> bool {
        if addr < 0xE000 {
            return false;
        }
        let config = self.rows.config();
        config < C64_MODE_BASE || KERNAL_CONFIGS.contains(&(config - C64_MODE_BASE))
    }

    /// 40 columns (VIC-IIe) unless the 40/80 key is down, then the VDC.
    #[must_use]
    pub fn screen_params(&self) -> ScreenParams {
        if self.mmu.read(0xD505) & 0x80 != 0 {
            let vm = u16::from(self.io.vic_peek(0xD018) & 0xF0) << 6;
            let bank = u16::from(!self.io.cia2_peek(0xDD00) & 0x03) << 14;
            ScreenParams {
                base: vm | bank,
                rows: 25,
                columns: 40,
                bank: 0,
            }
        } else {
            let (base, rows, columns) = self.io.vdc_screen();
            ScreenParams {
                base,
                rows,
                columns,
                bank: BANK_VDC,
            }
        }
    }

    /// Where the VIC-IIe sees the character ROM, as `(mask, value)`.
    #[must_use]
    pub fn chargen_addr_options(&self) -> Option<(u16, u16)> {
        self.chargen_options
    }

    /// VIC-IIe fetch in the current video bank and RCR-selected RAM bank.
    #[must_use]
    pub fn vic_fetch(&self, addr: u16) -> u8 {
        let full = ((self.rows.variant() as u16) << 14) | (addr & 0x3FFF);
        match self.chargen_options {
            Some((mask, value)) if full & mask == value => {
                self.char_rom[self.chargen_offset + usize::from(full & 0x0FFF)]
            }
            _ => self.ram[(self.mmu.vic_bank() << 16) + usize::from(full)],
        }
    }

    /// Colour RAM half the VIC-IIe reads.
    #[must_use]
    pub fn vic_color_ram(&self) -> &[u8] {
        &self.color_ram[self.color_vic..self.color_vic + 0x400]
    }

    /// Both colour RAM halves, packed one nibble each into 1K.
    pub fn color_ram_to_snapshot(&self, buf: &mut [u8]) -> Result<()> {
        let (lo, hi) = self.color_ram.split_at(0x400);
        snapshot::pack_nibbles(lo, hi, buf)
    }

    pub fn color_ram_from_snapshot(&mut self, buf: &[u8]) -> Result<()> {
        let (lo, hi) = self.color_ram.split_at_mut(0x400);
        snapshot::unpack_nibbles(buf, lo, hi)
    }

    pub fn ram_to_snapshot(&self, buf: &mut [u8]) -> Result<()> {
        snapshot::block_to_snapshot("RAM", &self.ram, buf)
    }

    pub fn ram_from_snapshot(&mut self, buf: &[u8]) -> Result<()> {
        snapshot::block_from_snapshot("RAM", buf, &mut self.ram)
    }

    pub fn clock_overflow(&mut self, sub: emu_core::Ticks) {
        let now = self.now();
        self.port.rebase(sub, now);
    }
}

impl<I: C128Io, E: Expansion> Bus for C128Memory<I, E> {
    fn read(&mut self, address: u16) -> u8 {
        C128Memory::read(self, address)
    }

    fn write(&mut self, address: u16, value: u8) {
        C128Memory::write(self, address, value);
    }

    fn dma_read(&mut self, address: u16) -> u8 {
        C128Memory::dma_read(self, address)
    }

    fn dma_write(&mut self, address: u16, value: u8) {
        C128Memory::dma_write(self, address, value);
    }

    fn peek(&self, address: u16) -> u8 {
        C128Memory::peek(self, address)
    }
}

impl<I: C128Io, E: Expansion> Observable for C128Memory<I, E> {
    fn query(&self, path: &str) -> Option<Value> {
        if let Some(rest) = path.strip_prefix("memory.") {
            let addr = parse_address(rest)?;
            return Some(Value::U8(self.peek(addr as u16)));
        }
        match path {
            "config" => Some(self.config().into()),
            "vbank" => Some(self.vbank().into()),
            "c64_mode" => Some(self.is_c64_mode().into()),
            "ram_bank" => Some((self.ram_bank >> 16).into()),
            "mmu.cr" => Some(self.mmu.cr.into()),
            "mmu.mcr" => Some(self.mmu.read(0xD505).into()),
            "mmu.rcr" => Some(self.mmu.rcr.into()),
            "mmu.p0" => Some((self.page_zero as u32).into()),
            "mmu.p1" => Some((self.page_one as u32).into()),
            "port.dir" => Some(self.port.dir().into()),
            "port.data" => Some(self.port.data().into()),
            "port.data_read" => Some(self.port.data_read().into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "config",
            "vbank",
            "c64_mode",
            "ram_bank",
            "mmu.cr",
            "mmu.mcr",
            "mmu.rcr",
            "mmu.p0",
            "mmu.p1",
            "port.dir",
            "port.data",
            "port.data_read",
            "memory.<address>",
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use commodore_banking::{C64Io, NoExpansion, OpenBus};
    use emu_core::Ticks;

    fn make_config() -> C128Config {
        let mut kernal_rom = vec![0xED; 0x1000];
        kernal_rom.extend_from_slice(&[0x80; 0x1000]);
        kernal_rom.extend_from_slice(&[0xEE; 0x2000]);
        C128Config {
            model: crate::C128Model::C128Pal,
            international: true,
            basic_lo_rom: vec![0xB0; 0x4000],
            basic_hi_rom: vec![0xB1; 0x4000],
            kernal_rom,
            char_rom: [vec![0xC0; 0x1000], vec![0xC1; 0x1000]].concat(),
            basic64_rom: vec![0xBB; 0x2000],
            kernal64_rom: vec![0xE6; 0x2000],
            int_function_rom: vec![0x1F; 0x8000],
            ext_function_rom: Vec::new(),
        }
    }

    fn make_memory() -> C128Memory<OpenBus, NoExpansion> {
        C128Memory::new(&make_config(), OpenBus::default(), NoExpansion).unwrap()
    }

    #[derive(Default)]
    struct StretchCounter {
        reads: usize,
        writes: usize,
    }

    impl C64Io for StretchCounter {
        fn cycles(&self) -> Ticks {
            Ticks::ZERO
        }

        fn phi1(&self) -> u8 {
            0xFF
        }
    }

    impl C128Io for StretchCounter {
        fn read_stretch(&mut self) {
            self.reads += 1;
        }

        fn write_stretch(&mut self) {
            self.writes += 1;
        }
    }

    #[test]
    fn power_on_sees_system_roms() {
        let mut mem = make_memory();
        assert_eq!(mem.config(), 0x41);
        assert_eq!(mem.read(0x4000), 0xB0);
        assert_eq!(mem.read(0x8000), 0xB1);
        assert_eq!(mem.read(0xC000), 0xED);
        assert_eq!(mem.read(0xE000), 0xEE);
        assert_eq!(mem.read(0xFF05), 0xEE);
        assert_eq!(mem.read(0xD50B), 0x20);
    }

    #[test]
    fn lcr_selects_all_ram() {
        let mut mem = make_memory();
        mem.write(0xFF00, 0x3F);
        assert_eq!(mem.config(), 0x1E);
        assert_eq!(mem.read(0xFF00), 0x3F);
        mem.write(0xE000, 0x12);
        mem.write(0xD000, 0x34);
        assert_eq!(mem.read(0xE000), 0x12);
        assert_eq!(mem.read(0xD000), 0x34);
        mem.write(0xFF00, 0x00);
        assert_eq!(mem.read(0xE000), 0xEE);
    }

    #[test]
    fn preset_registers_load_cr() {
        let mut mem = make_memory();
        mem.write(0xD501, 0x3F);
        mem.write(0xFF01, 0x00);
        assert_eq!(mem.mmu().cr, 0x3F);
        assert_eq!(mem.read(0xFF01), 0x3F);
    }

    #[test]
    fn banks_are_separate() {
        let mut mem = make_memory();
        mem.write(0xFF00, 0x7F);
        mem.write(0x8000, 0x55);
        assert_eq!(mem.read(0x8000), 0x55);
        mem.write(0xFF00, 0x3F);
        assert_eq!(mem.read(0x8000), 0x00);
        assert_eq!(mem.bank_peek(BANK_RAM1, 0x8000), 0x55);
    }

    #[test]
    fn bottom_common_ram_boundary() {
        let mut mem = make_memory();
        mem.write(0xD506, 0x04);
        mem.write(0xFF00, 0x7F);
        mem.write(0x03FF, 0xAA);
        mem.write(0x0400, 0xBB);
        assert_eq!(mem.bank_peek(BANK_RAM, 0x03FF), 0xAA);
        assert_eq!(mem.bank_peek(BANK_RAM, 0x0400), 0x00);
        assert_eq!(mem.bank_peek(BANK_RAM1, 0x0400), 0xBB);
    }

    #[test]
    fn top_common_ram_boundary() {
        let mut mem = make_memory();
        // 4K at the top
        mem.write(0xD506, 0x09);
        mem.write(0xFF00, 0x7F);
        mem.write(0xEFFF, 0x11);
        mem.write(0xF000, 0x22);
        assert_eq!(mem.bank_peek(BANK_RAM1, 0xEFFF), 0x11);
        assert_eq!(mem.bank_peek(BANK_RAM, 0xF000), 0x22);
        assert_eq!(mem.read(0xF000), 0x22);
    }

    #[test]
    fn zero_page_moves_on_low_byte() {
        let mut mem = make_memory();
        mem.write(0xD508, 0x01);
        mem.write(0x0010, 0x66);
        assert_eq!(mem.bank_peek(BANK_RAM, 0x0010), 0x66);
        assert_eq!(mem.read(0xD508) & 0x01, 0x00);

        mem.write(0xD507, 0x20);
        mem.write(0x0010, 0x77);
        assert_eq!(mem.bank_peek(BANK_RAM1, 0x2010), 0x77);
        assert_eq!(mem.read(0x0010), 0x77);
        assert_eq!(mem.read(0xD508) & 0x01, 0x01);
    }

    #[test]
    fn stack_page_relocates() {
        let mut mem = make_memory();
        mem.write(0xD50A, 0x00);
        mem.write(0xD509, 0x30);
        mem.write(0x0180, 0x99);
        assert_eq!(mem.bank_peek(BANK_RAM, 0x3080), 0x99);
    }

    #[test]
    fn c64_mode_hides_mmu() {
        let mut mem = make_memory();
        mem.write(0xD505, 0x41);
        assert!(mem.is_c64_mode());
        assert_eq!(mem.config(), C64_MODE_BASE + 7);
        assert_eq!(mem.read(0xA000), 0xBB);
        assert_eq!(mem.read(0xE000), 0xE6);
        assert_eq!(mem.read(0xD500), 0xFF);
        mem.write(0xFF00, 0x3F);
        assert_eq!(mem.mmu().cr, 0x00);
        assert_eq!(mem.bank_peek(BANK_RAM, 0xFF00), 0x3F);
        // Character ROM: second half in C64 mode on international machines
        mem.write(0x0000, 0x2F);
        mem.write(0x0001, 0x33);
        assert_eq!(mem.read(0xD000), 0xC1);
    }

    #[test]
    fn native_io_is_stretched() {
        let mut mem =
            C128Memory::new(&make_config(), StretchCounter::default(), NoExpansion).unwrap();
        mem.read(0xD020);
        mem.write(0xD020, 0);
        mem.read(0x1000);
        assert_eq!(mem.io.reads, 1);
        assert_eq!(mem.io.writes, 1);
        // Monitor reads are not
        mem.bank_read(BANK_IO, 0xD020);
        assert_eq!(mem.io.reads, 1);
    }

    #[test]
    fn colour_ram_halves_follow_port() {
        let mut mem = make_memory();
        mem.write(0xD800, 0x05);
        mem.write(0x0000, 0x01);
        mem.write(0x0001, 0x00);
        mem.write(0xD800, 0x0A);
        assert_eq!(mem.read(0xD800) & 0x0F, 0x0A);
        assert_eq!(mem.vic_color_ram()[0], 0x05);

        let mut snap = [0u8; 0x400];
        mem.color_ram_to_snapshot(&mut snap).unwrap();
        assert_eq!(snap[0], 0xA5);
    }

    #[test]
    fn monitor_banks() {
        let mut mem = make_memory();
        assert_eq!(mem.bank_peek(BANK_ROM, 0x0000), 0x80);
        assert_eq!(mem.bank_peek(BANK_ROM, 0xD000), 0xC0);
        assert_eq!(mem.bank_peek(BANK_C64ROM, 0xA000), 0xBB);
        assert_eq!(mem.bank_peek(BANK_INTFUNC, 0x8000), 0x1F);
        assert_eq!(mem.bank_peek(BANK_EXTFUNC, 0x8000), 0x00);
        assert_eq!(mem.bank_peek(BANK_IO, 0xD505) & 0x80, 0x80);

        mem.bank_write(BANK_ROM, 0xE000, 0x12);
        assert_eq!(mem.bank_peek(BANK_RAM, 0xE000), 0x00);
        mem.bank_write(BANK_ROM, 0x2000, 0x12);
        assert_eq!(mem.bank_peek(BANK_RAM, 0x2000), 0x12);
        mem.bank_write(BANK_CART, 0x9000, 0x34);
        assert_eq!(mem.bank_peek(BANK_RAM, 0x9000), 0x00);
        assert_eq!(mem.banks().from_name("vdc").unwrap(), BANK_VDC);
    }

    #[test]
    fn cpu_bank_peek_follows_mapping() {
        let mut mem = make_memory();
        mem.write(0xFF00, 0x3F);
        mem.write(0xD505, 0x00);
        assert_eq!(mem.bank_peek(BANK_CPU, 0xD505), 0x00);
        mem.write(0xFF00, 0x00);
        assert_ne!(mem.bank_peek(BANK_CPU, 0xD505), 0x00);
    }

    #[test]
    fn screen_follows_40_80_key() {
        let mut mem = make_memory();
        let vic = mem.screen_params();
        assert_eq!((vic.columns, vic.bank), (40, 0));
        mem.set_key_40_80(true);
        let vdc = mem.screen_params();
        assert_eq!((vdc.columns, vdc.bank), (80, BANK_VDC));
    }

    #[test]
    fn basic_text_end_pointer() {
        let mut mem = make_memory();
        mem.set_basic_text(0x1C01, 0x2000);
        assert_eq!(mem.basic_text(), (0x1C01, 0x2000));
        assert_eq!(mem.bank_peek(BANK_RAM, 0x1211), 0x20);
    }

    #[test]
    fn rom_traps() {
        let mut mem = make_memory();
        assert!(mem.rom_trap_allowed(0xFFD2));
        mem.write(0xD505, 0x41);
        assert!(mem.rom_trap_allowed(0xFFD2));
        mem.write(0x0000, 0x2F);
        mem.write(0x0001, 0x35);
        assert!(!mem.rom_trap_allowed(0xFFD2));
    }
}
