//! The live selection into the dispatch tables.
//!
//! Switching configuration, video bank or watchpoint mode only changes
//! which row later accesses index. Nothing is rebuilt.

use crate::access::AccessKind;

/// Monitor watchpoint mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WatchMode {
    #[default]
    Off,
    /// Watch genuine CPU accesses.
    On,
    /// Also watch the dummy accesses of read-modify-write instructions.
    OnDummy,
}

/// Currently selected table row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveRows {
    config: usize,
    variant: usize,
    watch: WatchMode,
}

impl ActiveRows {
    #[must_use]
    pub fn new(config: usize) -> Self {
        Self {
            config,
            variant: 0,
            watch: WatchMode::Off,
        }
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> usize {
        self.config
    }

    #[inline]
    #[must_use]
    pub fn variant(&self) -> usize {
        self.variant
    }

    #[must_use]
    pub fn watch(&self) -> WatchMode {
        self.watch
    }

    /// Select a new configuration row. Returns true if it changed.
    pub fn update_config(&mut self, config: usize) -> bool {
        let changed = self.config != config;
        self.config = config;
        changed
    }

    /// Select the write variant (video bank or mirror mode).
    pub fn set_variant(&mut self, variant: usize) {
        self.variant = variant;
    }

    /// Swap the watch row in or out. The configuration is untouched.
    pub fn toggle_watchpoints(&mut self, mode: WatchMode) {
        self.watch = mode;
    }

    /// A genuine access of this kind goes through the watch row.
    #[inline]
    #[must_use]
    pub fn watching(&self, kind: AccessKind) -> bool {
        kind == AccessKind::Cpu && self.watch != WatchMode::Off
    }

    /// A read-modify-write dummy access goes through the watch row.
    #[inline]
    #[must_use]
    pub fn watching_dummy(&self) -> bool {
        self.watch == WatchMode::OnDummy
    }
}

/// One watchpoint hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchEvent {
    Load(u16),
    Store(u16),
}

/// Receives the addresses the watch row sees.
pub trait WatchHook {
    fn load(&mut self, addr: u16);
    fn store(&mut self, addr: u16);
}

/// Queue of watchpoint hits for the monitor to drain.
#[derive(Debug, Clone, Default)]
pub struct WatchEvents {
    events: Vec<WatchEvent>,
}

impl WatchEvents {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&mut self) -> impl Iterator<Item = WatchEvent> + '_ {
        self.events.drain(..)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }
}

impl WatchHook for WatchEvents {
    fn load(&mut self, addr: u16) {
        self.events.push(WatchEvent::Load(addr));
    }

    fn store(&mut self, addr: u16) {
        self.events.push(WatchEvent::Store(addr));
    }
}
