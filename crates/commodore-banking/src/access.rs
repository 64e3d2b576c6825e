//! Who is driving the bus.

/// Origin of a memory access.
///
/// DMA cycles use the same dispatch tables as the CPU but never see the
/// on-chip processor port at $00/$01, never stretch the clock and never
/// fire watchpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessKind {
    #[default]
    Cpu,
    Dma,
}

impl AccessKind {
    #[must_use]
    pub fn is_dma(self) -> bool {
        self == AccessKind::Dma
    }
}
