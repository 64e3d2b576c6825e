//! $D100/$D101 memory mapper: where the KERNAL and BASIC ROM areas read
//! from.
//!
//! Each register selects a 64K segment (bits 0-4) of flash, or of RAM when
//! either of bits 6-7 is set. The ROM area keeps its offset within the
//! segment, so KERNAL segment 1 reads $E000 from $1E000.

/// Backing store selected by a mapping register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapTarget {
    Flash,
    Ram,
}

/// Physical location of `addr` under `mapping`.
#[must_use]
pub fn resolve(mapping: u8, addr: usize) -> (MapTarget, usize) {
    let paddr = (usize::from(mapping & 0x1F) << 16) + (addr & 0xFFFF);
    let target = if mapping & 0xC0 == 0 {
        MapTarget::Flash
    } else {
        MapTarget::Ram
    };
    (target, paddr)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemoryMapper {
    /// $D100: KERNAL segment.
    pub kernal: u8,
    /// $D101: BASIC segment.
    pub basic: u8,
}

impl MemoryMapper {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Register store, with the register file mirrored every 16 bytes.
    /// Returns true when a mapping changed.
    pub fn store(&mut self, addr: u16, value: u8) -> bool {
        let reg = match addr & 0x0F {
            0 => &mut self.kernal,
            1 => &mut self.basic,
            _ => return false,
        };
        let changed = *reg != value;
        *reg = value;
        changed
    }
}
