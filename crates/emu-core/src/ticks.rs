//! The fundamental unit of time in the emulator.

/// A count of CPU clock cycles.
///
/// Used both as an absolute timestamp (the CPU's cycle counter) and as a
/// duration. Subtraction saturates so rebasing after a clock overflow can
/// never wrap a deadline into the far future.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Ticks(pub u64);

impl Ticks {
    pub const ZERO: Self = Self(0);

    #[must_use]
    pub const fn new(count: u64) -> Self {
        Self(count)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Move a timestamp back by `sub` cycles, stopping at zero.
    #[must_use]
    pub const fn rebased(self, sub: Self) -> Self {
        Self(self.0.saturating_sub(sub.0))
    }
}

impl core::ops::Add for Ticks {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl core::ops::AddAssign for Ticks {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl core::ops::Sub for Ticks {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        self.rebased(rhs)
    }
}

impl From<u64> for Ticks {
    fn from(count: u64) -> Self {
        Self(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rebase_saturates() {
        assert_eq!(Ticks::new(10).rebased(Ticks::new(4)), Ticks::new(6));
        assert_eq!(Ticks::new(3) - Ticks::new(4), Ticks::ZERO);
    }

    #[test]
    fn ordering_follows_count() {
        let deadline = Ticks::new(100) + Ticks::new(350_000);
        assert!(Ticks::new(350_100) <= deadline);
        assert!(Ticks::new(350_101) > deadline);
    }
}
