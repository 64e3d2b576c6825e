//! SIMM expansion RAM.
//!
//! The SuperCPU drives the SIMM as rows and columns. Register $D078 tells
//! it which module geometry to assume; when that disagrees with the module
//! actually fitted, addresses are re-split at the assumed row size and
//! reassembled at the real one, so some of the RAM aliases and some is
//! unreachable, as on hardware.

use commodore_banking::{BankingError, Result, ram_init};

/// Fitted module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SimmSize {
    #[default]
    None,
    Mb1,
    Mb4,
    Mb8,
    Mb16,
}

impl SimmSize {
    pub fn from_mb(mb: u32) -> Result<Self> {
        match mb {
            0 => Ok(Self::None),
            1 => Ok(Self::Mb1),
            4 => Ok(Self::Mb4),
            8 => Ok(Self::Mb8),
            16 => Ok(Self::Mb16),
            _ => Err(BankingError::SimmSize(mb)),
        }
    }

    #[must_use]
    pub fn mb(self) -> u32 {
        match self {
            Self::None => 0,
            Self::Mb1 => 1,
            Self::Mb4 => 4,
            Self::Mb8 => 8,
            Self::Mb16 => 16,
        }
    }

    /// Column bits of the module.
    fn page_bits(self) -> u32 {
        match self {
            Self::Mb1 => 11,
            Self::Mb4 | Self::Mb8 => 12,
            Self::None | Self::Mb16 => 13,
        }
    }
}

/// Geometry selected through $D078: column bits and decoded size.
fn geometry(reg: u8) -> (u32, u32) {
    match reg & 7 {
        0 => (11, 1 << 20),
        1 => (12, 4 << 20),
        2 => (12, 8 << 20),
        3 => (12, 16 << 20),
        _ => (13, 16 << 20),
    }
}

#[derive(Debug, Clone)]
pub struct Simm {
    ram: Vec<u8>,
    size: SimmSize,
    mask: usize,
    page_bits: u32,
    conf_page_bits: u32,
    conf_size: u32,
}

impl Simm {
    #[must_use]
    pub fn new(size: SimmSize) -> Self {
        let (conf_page_bits, conf_size) = geometry(4);
        let mut simm = Self {
            ram: Vec::new(),
            size,
            mask: 0,
            page_bits: size.page_bits(),
            conf_page_bits,
            conf_size,
        };
        simm.resize(size);
        simm
    }

    /// Swap the module. Contents are lost.
    pub fn resize(&mut self, size: SimmSize) {
        let bytes = (size.mb() as usize) << 20;
        self.ram = vec![0; bytes.max(1)];
        ram_init(&mut self.ram);
        self.mask = bytes.saturating_sub(1);
        self.page_bits = size.page_bits();
        if size != self.size {
            log::info!("SuperCPU SIMM: {} MB", size.mb());
        }
        self.size = size;
    }

    /// Apply $D078. Returns the row size in bits for the clock model.
    pub fn configure(&mut self, reg: u8) -> u32 {
        let (page_bits, size) = geometry(reg);
        self.conf_page_bits = page_bits;
        self.conf_size = size;
        page_bits
    }

    #[must_use]
    pub fn size(&self) -> SimmSize {
        self.size
    }

    #[must_use]
    pub fn is_fitted(&self) -> bool {
        self.mask != 0
    }

    /// Geometry matches the module, so linear direct reads are valid.
    #[must_use]
    pub fn is_linear(&self) -> bool {
        self.page_bits == self.conf_page_bits
    }

    fn remap(&self, addr: u32) -> u32 {
        if self.is_linear() {
            addr
        } else {
            ((addr >> self.conf_page_bits) << self.page_bits)
                | (addr & ((1 << self.page_bits) - 1))
        }
    }

    /// The $F60000-$F7FFFF window onto the first 128K of the module.
    #[must_use]
    pub fn window(&self, addr: u32) -> Option<usize> {
        if !self.is_fitted() {
            return None;
        }
        let addr = if self.is_linear() {
            addr
        } else {
            self.remap(addr) & self.mask as u32
        };
        Some(addr as usize & 0x1_FFFF)
    }

    /// Banks $02-$F5, addressed as the module itself.
    #[must_use]
    pub fn linear(&self, addr: u32) -> Option<usize> {
        if self.is_fitted() && addr < self.conf_size {
            Some(self.remap(addr) as usize & self.mask)
        } else {
            None
        }
    }

    /// Start of the 64K direct-read window for a SIMM address, when the
    /// geometry is linear.
    #[must_use]
    pub fn direct_bank(&self, addr: u32) -> Option<usize> {
        if !self.is_fitted() || !self.is_linear() {
            return None;
        }
        if (0xF6_0000..0xF8_0000).contains(&addr) {
            Some(addr as usize & 0x1_0000)
        } else if addr < self.conf_size {
            Some(addr as usize & 0xFF_0000 & self.mask)
        } else {
            None
        }
    }

    #[must_use]
    pub fn get(&self, index: usize) -> u8 {
        self.ram[index & self.mask]
    }

    pub fn set(&mut self, index: usize, value: u8) {
        let mask = self.mask;
        self.ram[index & mask] = value;
    }

    #[must_use]
    pub fn contents(&self) -> &[u8] {
        &self.ram
    }

    pub fn contents_mut(&mut self) -> &mut [u8] {
        &mut self.ram
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes() {
        assert_eq!(SimmSize::from_mb(8).unwrap(), SimmSize::Mb8);
        assert_eq!(SimmSize::from_mb(3), Err(BankingError::SimmSize(3)));
        let simm = Simm::new(SimmSize::None);
        assert!(!simm.is_fitted());
        assert_eq!(simm.linear(0x2_0000), None);
        assert_eq!(simm.window(0xF6_0000), None);
    }

    #[test]
    fn matching_geometry_is_linear() {
        let mut simm = Simm::new(SimmSize::Mb16);
        assert!(simm.is_linear());
        assert_eq!(simm.linear(0x12_3456), Some(0x12_3456));
        assert_eq!(simm.window(0xF7_0001), Some(0x1_0001));
        assert_eq!(simm.direct_bank(0xF7_1234), Some(0x1_0000));
        assert_eq!(simm.direct_bank(0x12_3456), Some(0x12_0000));
        assert_eq!(simm.configure(0), 11);
        assert_eq!(simm.linear(0x10_0000), None);
    }

    #[test]
    fn mismatched_geometry_resplits_rows() {
        let mut simm = Simm::new(SimmSize::Mb4);
        simm.configure(4);
        assert!(!simm.is_linear());
        // Row 1 at 8K columns lands on row 1 at 4K columns
        assert_eq!(simm.linear(0x2000), Some(0x1000));
        assert_eq!(simm.linear(0x2FFF), Some(0x1FFF));
        assert_eq!(simm.direct_bank(0x2_0000), None);
        simm.configure(1);
        assert_eq!(simm.linear(0x2FFF), Some(0x2FFF));
    }
}
