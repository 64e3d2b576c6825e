//! Configuration-indexed dispatch tables.
//!
//! Every machine describes its memory map as three parallel tables with one
//! row per bank configuration and one column per 256-byte page:
//!
//! - a read handler for each `[config][page]`
//! - a write handler for each `[variant][config][page]`, where the variant
//!   is whatever else changes store behaviour (the VIC-II bank on the C64
//!   family, the mirror mode on the SuperCPU)
//! - an optional direct-read base for the CPU's fetch cache, with the
//!   address window over which it is valid
//!
//! Column `0x100` repeats page 0 so a zero-page wrap can index the table
//! without masking.
//!
//! Tables are assembled in a [`TableBuilder`], which refuses to finish while
//! any cell is empty. A finished [`DispatchTables`] is total.

use crate::error::{BankingError, Result};

/// Columns per row: 256 pages plus the zero-page wrap slot.
pub const PAGES: usize = 0x101;

/// The wrap slot that repeats page 0.
pub const WRAP_PAGE: usize = 0x100;

/// Direct-read descriptor: the byte at `addr` is `source[addr + offset]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Base<S> {
    pub source: S,
    pub offset: i32,
}

impl<S> Base<S> {
    pub const fn new(source: S, offset: i32) -> Self {
        Self { source, offset }
    }

    /// Index into the backing array for a CPU address.
    #[must_use]
    pub fn index(&self, addr: u16) -> usize {
        (i64::from(addr) + i64::from(self.offset)) as usize
    }
}

/// Address window over which a direct base is valid, inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Limit {
    pub start: u16,
    pub end: u16,
}

impl Limit {
    pub const NONE: Self = Self { start: 0, end: 0 };

    #[must_use]
    pub fn contains(&self, addr: u16) -> bool {
        *self != Self::NONE && addr >= self.start && addr <= self.end
    }
}

/// Result of [`DispatchTables::translate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Translation<S> {
    pub base: Base<S>,
    pub limit: Limit,
}

/// Mutable tables under construction.
#[derive(Debug, Clone)]
pub struct TableBuilder<R, W, S> {
    configs: usize,
    variants: usize,
    read: Vec<Option<R>>,
    write: Vec<Option<W>>,
    base: Vec<Option<Base<S>>>,
    slow: Vec<bool>,
}

impl<R: Copy, W: Copy, S: Copy + PartialEq> TableBuilder<R, W, S> {
    #[must_use]
    pub fn new(configs: usize, variants: usize) -> Self {
        Self {
            configs,
            variants,
            read: vec![None; configs * PAGES],
            write: vec![None; variants * configs * PAGES],
            base: vec![None; configs * PAGES],
            slow: vec![false; configs * PAGES],
        }
    }

    #[must_use]
    pub fn configs(&self) -> usize {
        self.configs
    }

    #[must_use]
    pub fn variants(&self) -> usize {
        self.variants
    }

    fn cell(&self, config: usize, page: usize) -> usize {
        config * PAGES + page
    }

    fn write_cell_index(&self, variant: usize, config: usize, page: usize) -> usize {
        (variant * self.configs + config) * PAGES + page
    }

    pub fn set_read(&mut self, config: usize, page: usize, handler: R) {
        let i = self.cell(config, page);
        self.read[i] = Some(handler);
    }

    pub fn set_base(&mut self, config: usize, page: usize, base: Option<Base<S>>) {
        let i = self.cell(config, page);
        self.base[i] = base;
    }

    /// Set the read handler and direct base together.
    pub fn map_read(&mut self, config: usize, page: usize, handler: R, base: Option<Base<S>>) {
        self.set_read(config, page, handler);
        self.set_base(config, page, base);
    }

    /// Keep the page's base but give it no direct-read window, so every
    /// fetch goes through the read handler.
    pub fn set_slow(&mut self, config: usize, page: usize) {
        let i = self.cell(config, page);
        self.slow[i] = true;
    }

    pub fn set_write(&mut self, variant: usize, config: usize, page: usize, handler: W) {
        let i = self.write_cell_index(variant, config, page);
        self.write[i] = Some(handler);
    }

    /// Same store handler for every variant.
    pub fn set_write_hook(&mut self, config: usize, page: usize, handler: W) {
        for variant in 0..self.variants {
            self.set_write(variant, config, page, handler);
        }
    }

    #[must_use]
    pub fn read_cell(&self, config: usize, page: usize) -> Option<R> {
        self.read[self.cell(config, page)]
    }

    #[must_use]
    pub fn write_cell(&self, variant: usize, config: usize, page: usize) -> Option<W> {
        self.write[self.write_cell_index(variant, config, page)]
    }

    #[must_use]
    pub fn base_cell(&self, config: usize, page: usize) -> Option<Base<S>> {
        self.base[self.cell(config, page)]
    }

    /// Copy page 0 into the wrap slot, check every cell and derive limits.
    pub fn build(mut self) -> Result<DispatchTables<R, W, S>> {
        for config in 0..self.configs {
            let zero = self.cell(config, 0);
            let wrap = self.cell(config, WRAP_PAGE);
            self.read[wrap] = self.read[zero];
            self.base[wrap] = self.base[zero];
            for variant in 0..self.variants {
                let zero = self.write_cell_index(variant, config, 0);
                let wrap = self.write_cell_index(variant, config, WRAP_PAGE);
                self.write[wrap] = self.write[zero];
            }
        }

        let mut read = Vec::with_capacity(self.read.len());
        for (i, cell) in self.read.iter().enumerate() {
            match cell {
                Some(handler) => read.push(*handler),
                None => {
                    return Err(BankingError::Unpopulated {
                        config: i / PAGES,
                        page: i % PAGES,
                    });
                }
            }
        }

        let mut write = Vec::with_capacity(self.write.len());
        for (i, cell) in self.write.iter().enumerate() {
            match cell {
                Some(handler) => write.push(*handler),
                None => {
                    return Err(BankingError::Unpopulated {
                        config: (i / PAGES) % self.configs,
                        page: i % PAGES,
                    });
                }
            }
        }

        let mut limit = Vec::with_capacity(self.base.len());
        for (row, slow) in self.base.chunks(PAGES).zip(self.slow.chunks(PAGES)) {
            let fetchable: Vec<_> = row
                .iter()
                .zip(slow)
                .map(|(base, &slow)| if slow { None } else { *base })
                .collect();
            limit.extend_from_slice(&compute_limits(&fetchable));
        }

        Ok(DispatchTables {
            configs: self.configs,
            variants: self.variants,
            read,
            write,
            base: self.base,
            limit,
        })
    }
}

/// Derive the direct-read windows for one row of bases.
///
/// Consecutive pages with the same base form a run. Every page of a run
/// gets the run's window, which starts at the run's first byte (or $0002
/// when the run includes page 0, skipping the processor port) and stops
/// three bytes before the end so a whole instruction can be fetched.
#[must_use]
pub fn compute_limits<S: Copy + PartialEq>(row: &[Option<Base<S>>]) -> [Limit; PAGES] {
    let mut limits = [Limit::NONE; PAGES];
    let pages = row.len().min(WRAP_PAGE);
    let mut page = 0;
    while page < pages {
        let Some(base) = row[page] else {
            page += 1;
            continue;
        };
        let start = page;
        let mut end = page + 1;
        while end < pages && row[end] == Some(base) {
            end += 1;
        }
        let limit = Limit {
            start: if start == 0 { 0x0002 } else { (start << 8) as u16 },
            end: ((end << 8) - 3) as u16,
        };
        limits[start..end].fill(limit);
        page = end;
    }
    // Page 0 runs start at $0002 rather than 0; translate never serves $00/$01
    limits[WRAP_PAGE] = limits[0];
    limits
}

/// Finished, fully populated dispatch tables.
#[derive(Debug, Clone)]
pub struct DispatchTables<R, W, S> {
    configs: usize,
    variants: usize,
    read: Vec<R>,
    write: Vec<W>,
    base: Vec<Option<Base<S>>>,
    limit: Vec<Limit>,
}

impl<R: Copy, W: Copy, S: Copy> DispatchTables<R, W, S> {
    #[must_use]
    pub fn configs(&self) -> usize {
        self.configs
    }

    #[must_use]
    pub fn variants(&self) -> usize {
        self.variants
    }

    #[inline]
    #[must_use]
    pub fn read(&self, config: usize, page: usize) -> R {
        self.read[config * PAGES + page]
    }

    #[inline]
    #[must_use]
    pub fn write(&self, variant: usize, config: usize, page: usize) -> W {
        self.write[(variant * self.configs + config) * PAGES + page]
    }

    #[must_use]
    pub fn base(&self, config: usize, page: usize) -> Option<Base<S>> {
        self.base[config * PAGES + page]
    }

    #[must_use]
    pub fn limit(&self, config: usize, page: usize) -> Limit {
        self.limit[config * PAGES + page]
    }

    /// Direct-read window for `addr` under `config`.
    ///
    /// The processor port at $00/$01 never has one.
    #[must_use]
    pub fn translate(&self, config: usize, addr: u16) -> Option<Translation<S>> {
        let page = usize::from(addr >> 8);
        match self.base(config, page) {
            Some(base) if addr > 1 => Some(Translation {
                base,
                limit: self.limit(config, page),
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Src {
        Ram,
        Rom,
    }

    fn ram_row(builder: &mut TableBuilder<u8, u8, Src>, config: usize) {
        for page in 0..=0xFF {
            builder.map_read(config, page, 0, Some(Base::new(Src::Ram, 0)));
            builder.set_write_hook(config, page, 0);
        }
    }

    #[test]
    fn empty_cell_is_reported() {
        let mut builder = TableBuilder::<u8, u8, Src>::new(2, 1);
        ram_row(&mut builder, 0);
        ram_row(&mut builder, 1);
        builder.set_write_hook(1, 0x20, 1);
        assert!(builder.clone().build().is_ok());

        let mut builder = TableBuilder::<u8, u8, Src>::new(2, 1);
        ram_row(&mut builder, 0);
        assert_eq!(
            builder.build().unwrap_err(),
            BankingError::Unpopulated { config: 1, page: 0 }
        );
    }

    #[test]
    fn missing_write_variant_is_reported() {
        let mut builder = TableBuilder::<u8, u8, Src>::new(1, 2);
        for page in 0..=0xFF {
            builder.set_read(0, page, 0);
            builder.set_write(0, 0, page, 0);
        }
        assert_eq!(
            builder.build().unwrap_err(),
            BankingError::Unpopulated { config: 0, page: 0 }
        );
    }

    #[test]
    fn wrap_slot_repeats_page_zero() {
        let mut builder = TableBuilder::<u8, u8, Src>::new(1, 2);
        ram_row(&mut builder, 0);
        builder.set_read(0, 0, 7);
        builder.set_write(1, 0, 0, 9);
        let tables = builder.build().unwrap();
        assert_eq!(tables.read(0, WRAP_PAGE), 7);
        assert_eq!(tables.write(1, 0, WRAP_PAGE), 9);
        assert_eq!(tables.write(0, 0, WRAP_PAGE), 0);
    }

    #[test]
    fn limits_follow_runs() {
        let mut row = [None; PAGES];
        for page in 0..0xA0 {
            row[page] = Some(Base::new(Src::Ram, 0));
        }
        for page in 0xA0..0xC0 {
            row[page] = Some(Base::new(Src::Rom, -0xA000));
        }
        for page in 0xE0..0x100 {
            row[page] = Some(Base::new(Src::Rom, -0xE000 + 0x2000));
        }
        let limits = compute_limits(&row);
        assert_eq!(limits[0], Limit { start: 0x0002, end: 0x9FFD });
        assert_eq!(limits[0x9F], Limit { start: 0x0002, end: 0x9FFD });
        assert_eq!(limits[0xA0], Limit { start: 0xA000, end: 0xBFFD });
        assert_eq!(limits[0xC0], Limit::NONE);
        assert_eq!(limits[0xE0], Limit { start: 0xE000, end: 0xFFFD });
        assert_eq!(limits[WRAP_PAGE], limits[0]);
    }

    #[test]
    fn different_offsets_split_runs() {
        let mut row = [None; PAGES];
        row[0x10] = Some(Base::new(Src::Ram, 0));
        row[0x11] = Some(Base::new(Src::Ram, 0x100));
        let limits = compute_limits(&row);
        assert_eq!(limits[0x10], Limit { start: 0x1000, end: 0x10FD });
        assert_eq!(limits[0x11], Limit { start: 0x1100, end: 0x11FD });
    }

    #[test]
    fn slow_pages_keep_base_without_window() {
        let mut builder = TableBuilder::<u8, u8, Src>::new(1, 1);
        ram_row(&mut builder, 0);
        builder.set_slow(0, 0x80);
        let tables = builder.build().unwrap();
        assert_eq!(tables.limit(0, 0x7F), Limit { start: 0x0002, end: 0x7FFD });
        assert_eq!(tables.limit(0, 0x80), Limit::NONE);
        assert_eq!(tables.limit(0, 0x81), Limit { start: 0x8100, end: 0xFFFD });
        assert!(tables.translate(0, 0x8000).is_some());
    }

    #[test]
    fn translate_skips_port() {
        let mut builder = TableBuilder::<u8, u8, Src>::new(1, 1);
        ram_row(&mut builder, 0);
        let tables = builder.build().unwrap();
        assert!(tables.translate(0, 0x0000).is_none());
        assert!(tables.translate(0, 0x0001).is_none());
        let t = tables.translate(0, 0x0002).unwrap();
        assert_eq!(t.base.source, Src::Ram);
        assert_eq!(t.limit, Limit { start: 0x0002, end: 0xFFFD });
        assert!(t.limit.contains(0x1234));
    }

    #[test]
    fn base_index_applies_offset() {
        let base = Base::new(Src::Rom, -0xD000);
        assert_eq!(base.index(0xD123), 0x123);
    }
}
