//! DTV chips beyond the C64 set.

use commodore_banking::{C64Io, OpenBus};

/// The DTV's VIC-II extensions: palette, DMA engine and blitter.
///
/// All three sit under VIC-II register pages and only answer once the
/// extended registers are unlocked through $D03F. Until then the pages
/// belong to the VIC-II.
pub trait DtvIo: C64Io {
    fn extended_regs(&self) -> bool {
        false
    }

    /// $D200-$D2FF.
    fn palette_read(&mut self, _addr: u16) -> u8 {
        self.phi1()
    }

    fn palette_store(&mut self, _addr: u16, _value: u8) {}

    /// DMA engine register, `$D300 + reg` for `reg` in 0..$20.
    fn dma_engine_read(&mut self, _reg: u8) -> u8 {
        self.phi1()
    }

    fn dma_engine_store(&mut self, _reg: u8, _value: u8) {}

    /// Blitter register, `$D320 + reg` for `reg` in 0..$20.
    fn blitter_read(&mut self, _reg: u8) -> u8 {
        self.phi1()
    }

    fn blitter_store(&mut self, _reg: u8, _value: u8) {}
}

impl DtvIo for OpenBus {}
