//! SuperCPU clock model hooks.
//!
//! The 65816 runs at 20 MHz against SRAM and has to drop to the 1 MHz bus
//! for everything on the motherboard. The memory map only reports which
//! kind of slowdown an access needs; the CPU core turns that into cycles.

use commodore_banking::{C64Io, OpenBus};

/// Kinds of slow access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stretch {
    /// I/O or motherboard read.
    ReadIo,
    /// RAM write that also reaches the motherboard.
    Write,
    /// Start of an I/O write.
    WriteIoStart,
    WriteIoStartCia,
    /// End of an I/O write.
    WriteIo,
    WriteIoCia,
    /// I/O write that needs an extra bus cycle ($FF00, $DF01, $DF21).
    WriteIoLong,
    ReadEprom,
    WriteEprom,
    /// V1 read of the $D200-$D3FF SRAM registers.
    ReadIoRam,
    /// SIMM access at the given address, for row-change timing.
    ReadSimm(u32),
    WriteSimm(u32),
}

/// Machine side of the SuperCPU memory map.
pub trait ScpuIo: C64Io {
    fn stretch(&mut self, _kind: Stretch) {}

    /// The VIC-II holds BA low: a 1 MHz access must wait for the bus.
    fn steal_cycles(&mut self) {}

    /// 65816 E flag.
    fn emulation_mode(&self) -> bool {
        true
    }

    /// 65816 program bank, for the monitor's `cpu` bank.
    fn program_bank(&self) -> u8 {
        0
    }

    /// Speed registers changed: 20 MHz (`true`) or 1 MHz.
    fn set_fastmode(&mut self, _fast: bool) {}

    /// $D078 selected a new SIMM row size, in address bits.
    fn set_simm_row_size(&mut self, _bits: u32) {}

    /// Some byte at $1E000-$1FFFF changed; installed traps need to be
    /// re-checked.
    fn traps_refresh(&mut self) {}
}

impl ScpuIo for OpenBus {}
