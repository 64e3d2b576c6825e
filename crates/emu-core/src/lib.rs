//! Core traits and types for cycle-accurate emulation.
//!
//! Everything is counted in CPU cycles. Memory subsystems sit behind
//! [`Bus`] and expose their state through [`Observable`].

mod bus;
mod observable;
mod ticks;

pub use bus::Bus;
pub use observable::{Observable, Value, parse_address};
pub use ticks::Ticks;
