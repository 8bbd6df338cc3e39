//! Per-tenant BudgetLedger (§3, §4.9)
//!
//! The hot path only ever increments spend atomically and reads it for a
//! gating decision; it is the one mutable shared resource in the hot path
//! (§5). Modeled after the teacher's `parking_lot`-guarded shared state
//! (e.g. `SessionManager`'s `RwLock<HashMap<..>>`), but since spend is a
//! single `f64` counter a lock-free atomic bit-pattern swap is simpler and
//! avoids lock contention across tenants' concurrent calls.

use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic per-tenant budget ledger.
///
/// `currentSpend` is stored as the bits of an `f64` in an `AtomicU64` so
/// increments can be done with a compare-and-swap loop — the "atomic
/// read-modify-write" called for in §5.
#[derive(Debug)]
pub struct BudgetLedger {
    monthly_budget: f64,
    current_spend_bits: AtomicU64,
}

impl BudgetLedger {
    pub fn new(monthly_budget: f64, current_spend: f64) -> Self {
        Self {
            monthly_budget,
            current_spend_bits: AtomicU64::new(current_spend.to_bits()),
        }
    }

    pub fn monthly_budget(&self) -> f64 {
        self.monthly_budget
    }

    /// Read-only; may be stale by at most one cache TTL per §3 when read
    /// from a cached tenant snapshot (this type itself is always fresh).
    pub fn current_spend(&self) -> f64 {
        f64::from_bits(self.current_spend_bits.load(Ordering::Acquire))
    }

    pub fn remaining(&self) -> f64 {
        self.monthly_budget - self.current_spend()
    }

    /// Whether a Tier-3 call of the given estimated cost may be attempted.
    /// Per §4.9 step 4: budget gate fails when `remaining <= estimated_cost`.
    pub fn can_afford(&self, estimated_cost: f64) -> bool {
        self.remaining() > estimated_cost
    }

    /// Atomically add `amount` to current spend via compare-and-swap.
    /// Returns the new spend value.
    pub fn increment_spend(&self, amount: f64) -> f64 {
        loop {
            let current_bits = self.current_spend_bits.load(Ordering::Acquire);
            let current = f64::from_bits(current_bits);
            let new = current + amount;
            if self
                .current_spend_bits
                .compare_exchange(current_bits, new.to_bits(), Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return new;
            }
        }
    }

    /// Fraction of budget used, for the `>=80%` budget-warning threshold
    /// in §4.9.
    pub fn usage_fraction(&self) -> f64 {
        if self.monthly_budget <= 0.0 {
            return 1.0;
        }
        (self.current_spend() / self.monthly_budget).min(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn can_afford_respects_remaining() {
        let ledger = BudgetLedger::new(10.0, 9.80);
        assert!(!ledger.can_afford(0.50));

        let ledger = BudgetLedger::new(10.0, 5.0);
        assert!(ledger.can_afford(0.50));
    }

    #[test]
    fn concurrent_increments_are_linearizable() {
        let ledger = Arc::new(BudgetLedger::new(1000.0, 0.0));
        let mut handles = Vec::new();
        for _ in 0..50 {
            let ledger = Arc::clone(&ledger);
            handles.push(thread::spawn(move || {
                ledger.increment_spend(1.0);
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(ledger.current_spend(), 50.0);
    }

    #[test]
    fn usage_fraction_warns_at_80_percent() {
        let ledger = BudgetLedger::new(10.0, 8.0);
        assert!(ledger.usage_fraction() >= 0.8);
    }
}
