//! Capacitor model for undriven port bits.
//!
//! When an unused port bit is switched from output to input, or written
//! while it is an output, the pin keeps its charge for a while and reads
//! back the last driven value. After the fall-off time the bit reads 0.

use emu_core::Ticks;

/// Charge state of one undriven port bit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FloatingBit {
    /// Value held by the pin capacitance.
    value: bool,
    /// Last cycle on which the charge is still present.
    deadline: Ticks,
    /// A fall-off is pending.
    armed: bool,
}

impl FloatingBit {
    /// Charge the pin with `value` at cycle `now`.
    pub fn charge(&mut self, value: bool, now: Ticks, window: Ticks) {
        self.value = value;
        self.deadline = now + window;
        self.armed = true;
    }

    /// Value the pin reads at cycle `now`.
    ///
    /// The charge survives up to and including the deadline cycle.
    #[must_use]
    pub fn effective_value(&self, now: Ticks) -> bool {
        if self.armed && self.deadline < now {
            false
        } else {
            self.value
        }
    }

    /// Commit a fall-off that has already happened by cycle `now`.
    pub fn settle(&mut self, now: Ticks) {
        if self.armed && self.deadline < now {
            self.armed = false;
            self.value = false;
        }
    }

    /// Move the deadline back after the CPU clock counter was rebased.
    pub fn rebase(&mut self, sub: Ticks, now: Ticks) {
        if self.deadline > Ticks::ZERO {
            self.deadline = self.deadline.rebased(sub);
        }
        self.settle(now);
    }

    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    #[must_use]
    pub fn deadline(&self) -> Ticks {
        self.deadline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Ticks = Ticks::new(350_000);

    #[test]
    fn holds_charge_until_deadline() {
        let mut bit = FloatingBit::default();
        bit.charge(true, Ticks::new(1000), WINDOW);
        assert!(bit.effective_value(Ticks::new(1000)));
        assert!(bit.effective_value(Ticks::new(351_000)));
        assert!(!bit.effective_value(Ticks::new(351_001)));
    }

    #[test]
    fn effective_value_is_pure() {
        let mut bit = FloatingBit::default();
        bit.charge(true, Ticks::ZERO, WINDOW);
        let late = Ticks::new(1_000_000);
        assert!(!bit.effective_value(late));
        // Still armed until settled
        assert!(bit.is_armed());
        assert!(bit.effective_value(Ticks::new(10)));
        bit.settle(late);
        assert!(!bit.is_armed());
        assert!(!bit.effective_value(Ticks::new(10)));
    }

    #[test]
    fn recharge_restarts_timer() {
        let mut bit = FloatingBit::default();
        bit.charge(true, Ticks::ZERO, WINDOW);
        bit.charge(true, Ticks::new(300_000), WINDOW);
        assert!(bit.effective_value(Ticks::new(600_000)));
    }

    #[test]
    fn rebase_keeps_relative_deadline() {
        let mut bit = FloatingBit::default();
        bit.charge(true, Ticks::new(900_000), WINDOW);
        bit.rebase(Ticks::new(800_000), Ticks::new(100_000));
        assert_eq!(bit.deadline(), Ticks::new(450_000));
        assert!(bit.effective_value(Ticks::new(450_000)));
        assert!(!bit.effective_value(Ticks::new(450_001)));
    }
}
