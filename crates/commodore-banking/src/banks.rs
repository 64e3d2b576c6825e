//! Monitor bank names.
//!
//! The monitor picks a memory view by name (`ram`, `io`, `ram1f`, ...).
//! Numbered families such as `ram00`-`ram1f` are arrays: each member
//! carries its index and whether it is the first or last of the family.

use bitflags::bitflags;

use crate::error::{BankingError, Result};

bitflags! {
    /// Array membership of a bank.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct BankFlags: u8 {
        const IS_ARRAY = 0x01;
        const FIRST = 0x02;
        const LAST = 0x04;
    }
}

/// One monitor bank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BankEntry {
    pub name: String,
    pub number: u16,
    /// Position within an array family.
    pub index: Option<usize>,
    pub flags: BankFlags,
}

/// Ordered list of monitor banks.
#[derive(Debug, Clone, Default)]
pub struct BankList {
    entries: Vec<BankEntry>,
}

impl BankList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a single named bank.
    #[must_use]
    pub fn bank(mut self, name: &str, number: u16) -> Self {
        self.entries.push(BankEntry {
            name: name.to_string(),
            number,
            index: None,
            flags: BankFlags::empty(),
        });
        self
    }

    /// Add a family `prefix{first:02x}` ..= `prefix{last:02x}` numbered
    /// from `number`.
    #[must_use]
    pub fn array(mut self, prefix: &str, first: usize, last: usize, number: u16) -> Self {
        for (index, suffix) in (first..=last).enumerate() {
            let mut flags = BankFlags::IS_ARRAY;
            if suffix == first {
                flags |= BankFlags::FIRST;
            }
            if suffix == last {
                flags |= BankFlags::LAST;
            }
            self.entries.push(BankEntry {
                name: format!("{prefix}{suffix:02x}"),
                number: number + index as u16,
                index: Some(index),
                flags,
            });
        }
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    pub fn numbers(&self) -> impl Iterator<Item = u16> + '_ {
        self.entries.iter().map(|e| e.number)
    }

    #[must_use]
    pub fn entries(&self) -> &[BankEntry] {
        &self.entries
    }

    pub fn from_name(&self, name: &str) -> Result<u16> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.number)
            .ok_or_else(|| BankingError::UnknownBank(name.to_string()))
    }

    /// Array index of a bank number, `None` for plain banks.
    #[must_use]
    pub fn index_of(&self, number: u16) -> Option<usize> {
        self.entries
            .iter()
            .find(|e| e.number == number)
            .and_then(|e| e.index)
    }

    #[must_use]
    pub fn flags_of(&self, number: u16) -> BankFlags {
        self.entries
            .iter()
            .find(|e| e.number == number)
            .map_or(BankFlags::empty(), |e| e.flags)
    }
}
