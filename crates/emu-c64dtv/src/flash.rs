//! AT49BV16x4T flash ROM.
//!
//! 2 MB in 31 64K sectors plus a top boot block of eight 8K sectors. Every
//! command starts with the unlock pair `$AA` to `$xAAA`, `$55` to `$x554`
//! (only address bits 1-11 are decoded). Programming can only clear bits;
//! an erase sets a whole sector back to `$FF`. A locked-down sector ignores
//! both until reset.

use std::ops::Range;

pub const FLASH_SIZE: usize = 0x20_0000;

/// 31 main sectors plus 8 boot block sectors.
pub const SECTORS: usize = 39;

const ADDR_MASK: usize = FLASH_SIZE - 1;

/// Command state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlashState {
    #[default]
    Idle,
    Cmd1,
    Cmd2,
    /// Erase, lockdown or single pulse program: second unlock pending.
    Cmd3,
    Cmd4,
    Cmd5,
    ProductId,
    Program,
    SetConfig,
    ProgramProtection,
    SinglePulseProgram,
}

impl FlashState {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            FlashState::Idle => "idle",
            FlashState::Cmd1 => "cmd1",
            FlashState::Cmd2 => "cmd2",
            FlashState::Cmd3 => "cmd3",
            FlashState::Cmd4 => "cmd4",
            FlashState::Cmd5 => "cmd5",
            FlashState::ProductId => "product-id",
            FlashState::Program => "program",
            FlashState::SetConfig => "set-config",
            FlashState::ProgramProtection => "program-protection",
            FlashState::SinglePulseProgram => "single-pulse-program",
        }
    }
}

/// Sector holding a flash address.
#[must_use]
pub fn sector(addr: usize) -> usize {
    if addr >> 16 == 0x1F {
        ((addr >> 13) & 7) + 31
    } else {
        addr >> 16
    }
}

fn sector_range(addr: usize) -> Range<usize> {
    if addr >> 16 == 0x1F {
        let start = addr & 0x1F_E000;
        start..start + 0x2000
    } else {
        let start = addr & 0x1F_0000;
        start..start + 0x1_0000
    }
}

fn is_first_unlock(addr: usize) -> bool {
    addr & 0xFFE == 0xAAA
}

fn is_second_unlock(addr: usize) -> bool {
    addr & 0xFFE == 0x554
}

/// Product ID mode data. Manufacturer Atmel, device AT49BV16x4T.
fn product_id(addr: usize) -> Option<u8> {
    let byte = match addr {
        0 | 1 => 0x1F,
        2 | 3 => 0xC2,
        6 | 7 => 0x08,
        // Protection register unlocked
        0x100 | 0x101 => 0xFE,
        // Protection register block A: factory unique ID
        0x102 => b'x',
        0x103 => b'6',
        0x104 => b'4',
        0x105 => b'd',
        0x106 => b't',
        0x107 => b'v',
        0x108 => b'-',
        0x109 => 0x10,
        0x10A..=0x111 => 0xFF,
        _ => return None,
    };
    Some(byte)
}

pub struct Flash {
    mem: Box<[u8]>,
    state: FlashState,
    locks: [bool; SECTORS],
}

impl Flash {
    /// Flash loaded with `image`, which must be [`FLASH_SIZE`] bytes.
    #[must_use]
    pub fn new(image: &[u8]) -> Self {
        let mut mem = vec![0xFF; FLASH_SIZE].into_boxed_slice();
        let len = image.len().min(FLASH_SIZE);
        mem[..len].copy_from_slice(&image[..len]);
        Self {
            mem,
            state: FlashState::Idle,
            locks: [false; SECTORS],
        }
    }

    /// Back to read mode with every sector unlocked.
    pub fn reset(&mut self) {
        self.state = FlashState::Idle;
        self.locks = [false; SECTORS];
    }

    #[must_use]
    pub fn state(&self) -> FlashState {
        self.state
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.state == FlashState::Idle
    }

    #[must_use]
    pub fn is_locked(&self, addr: usize) -> bool {
        self.locks[sector(addr & ADDR_MASK)]
    }

    /// Array contents, bypassing the command state.
    #[must_use]
    pub fn direct(&self, addr: usize) -> u8 {
        self.mem[addr & ADDR_MASK]
    }

    pub fn direct_store(&mut self, addr: usize, value: u8) {
        self.mem[addr & ADDR_MASK] = value;
    }

    #[must_use]
    pub fn contents(&self) -> &[u8] {
        &self.mem
    }

    pub fn contents_mut(&mut self) -> &mut [u8] {
        &mut self.mem
    }

    /// Bus read. In product ID mode the array is replaced by the ID data.
    #[must_use]
    pub fn read(&self, addr: usize) -> u8 {
        let addr = addr & ADDR_MASK;
        if self.state != FlashState::ProductId {
            return self.mem[addr];
        }
        if let Some(byte) = product_id(addr) {
            return byte;
        }
        let sector_mask = if addr >> 16 == 0x1F { 0x1FFF } else { 0xFFFF };
        if addr & sector_mask == 4 {
            if self.locks[sector(addr)] { 0xFF } else { 0x00 }
        } else {
            0xFF
        }
    }

    /// Bus write: advances the command state machine.
    pub fn store(&mut self, addr: usize, value: u8) {
        let addr = addr & ADDR_MASK;
        let next = match self.state {
            FlashState::Idle if is_first_unlock(addr) && value == 0xAA => FlashState::Cmd1,
            FlashState::Idle => FlashState::Idle,
            FlashState::Cmd1 if is_second_unlock(addr) && value == 0x55 => FlashState::Cmd2,
            FlashState::Cmd2 if is_first_unlock(addr) => match value {
                0x90 => FlashState::ProductId,
                0x80 => FlashState::Cmd3,
                0xA0 => FlashState::Program,
                0xD0 => FlashState::SetConfig,
                0xC0 => FlashState::ProgramProtection,
                // 0xF0 is product ID exit
                _ => FlashState::Idle,
            },
            FlashState::ProductId if value == 0xF0 => FlashState::Idle,
            FlashState::ProductId => FlashState::ProductId,
            FlashState::Cmd3 if is_first_unlock(addr) && value == 0xAA => FlashState::Cmd4,
            FlashState::Cmd4 if is_second_unlock(addr) && value == 0x55 => FlashState::Cmd5,
            FlashState::Cmd5 => self.sector_command(addr, value),
            FlashState::Program => {
                self.program(addr, value);
                FlashState::Idle
            }
            FlashState::SetConfig => {
                log::debug!("flash: set configuration register ${value:02X} ignored");
                FlashState::Idle
            }
            FlashState::ProgramProtection => {
                log::debug!("flash: protection register ${addr:06X} = ${value:02X} ignored");
                FlashState::Idle
            }
            FlashState::SinglePulseProgram => {
                self.program(addr, value);
                FlashState::SinglePulseProgram
            }
            FlashState::Cmd1 | FlashState::Cmd2 | FlashState::Cmd3 | FlashState::Cmd4 => {
                FlashState::Idle
            }
        };
        if next != self.state {
            log::debug!("flash: {} -> {}", self.state.name(), next.name());
            self.state = next;
        }
    }

    fn program(&mut self, addr: usize, value: u8) {
        if self.locks[sector(addr)] {
            log::debug!("flash: program of ${addr:06X} ignored, sector locked");
        } else {
            self.mem[addr] &= value;
        }
    }

    fn sector_command(&mut self, addr: usize, value: u8) -> FlashState {
        match value {
            0x30 => {
                let range = sector_range(addr);
                if self.locks[sector(addr)] {
                    log::info!(
                        "flash: erase of ${:06X}-${:06X} ignored, sector locked",
                        range.start,
                        range.end - 1
                    );
                } else {
                    log::info!("flash: erased ${:06X}-${:06X}", range.start, range.end - 1);
                    self.mem[range].fill(0xFF);
                }
            }
            0x10 => {
                for addr in 0..FLASH_SIZE {
                    if !self.locks[sector(addr)] {
                        self.mem[addr] = 0xFF;
                    }
                }
                log::info!("flash: chip erased");
            }
            0x60 => {
                self.locks[sector(addr)] = true;
                log::info!("flash: sector {} locked down", sector(addr));
            }
            0xA0 => return FlashState::SinglePulseProgram,
            _ => {}
        }
        FlashState::Idle
    }
}
