//! MOS 6510 / 8502 processor port.
//!
//! The 6510 family carries a six-line I/O port at addresses $00/$01 that
//! the C64, C128 and DTV use as their primary bank-switch control. This
//! crate models the register pair, the values the CPU reads back, and the
//! capacitor behaviour of the undriven bits.

mod floating;
mod port;

pub use floating::FloatingBit;
pub use port::{PortLines, PortModel, ProcessorPort};
