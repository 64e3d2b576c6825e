//! Bank-switching engine shared by the Commodore 8-bit memory maps.
//!
//! Each machine crate describes its memory map as [`DispatchTables`] built
//! once at power-up, and selects the live row with [`ActiveRows`] whenever
//! a control register changes. Accesses then cost one table lookup and one
//! `match` on the handler tag.

mod access;
mod banks;
mod error;
mod io;
mod powerup;
mod rows;
pub mod snapshot;
mod tables;

pub use access::AccessKind;
pub use banks::{BankEntry, BankFlags, BankList};
pub use error::{BankingError, Result, check_rom};
pub use io::{C64Io, Expansion, NoExpansion, OpenBus, VbankWindow};
pub use powerup::ram_init;
pub use rows::{ActiveRows, WatchEvent, WatchEvents, WatchHook, WatchMode};
pub use tables::{
    Base, DispatchTables, Limit, PAGES, TableBuilder, Translation, WRAP_PAGE, compute_limits,
};
