//! Memory bus interface.

/// The memory bus a CPU core (or a DMA engine) drives.
///
/// `read` and `write` are genuine CPU bus cycles and may have side effects
/// beyond the addressed byte (I/O register strobes, cycle stretching,
/// watchpoints). The `dma_*` pair applies the same address decoding on
/// behalf of an expansion DMA engine, which never sees the CPU's on-chip
/// port. `peek` must leave the machine untouched.
pub trait Bus {
    /// CPU read cycle.
    fn read(&mut self, address: u16) -> u8;

    /// CPU write cycle.
    fn write(&mut self, address: u16, value: u8);

    /// DMA read cycle. Defaults to a CPU read.
    fn dma_read(&mut self, address: u16) -> u8 {
        self.read(address)
    }

    /// DMA write cycle. Defaults to a CPU write.
    fn dma_write(&mut self, address: u16, value: u8) {
        self.write(address, value);
    }

    /// Side-effect-free read for debuggers.
    fn peek(&self, address: u16) -> u8;
}
