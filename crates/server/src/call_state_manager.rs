//! `CallStateManager` — per-call `CallState` storage with a TTL sweep
//! (§10: "call-state TTL sweep").
//!
//! Grounded on the teacher's `SessionManager` (`crates/server/src/session.rs`):
//! a capacity-bounded `RwLock<HashMap>`, expiry on access, and a background
//! cleanup task coordinated through a `tokio::sync::watch` shutdown signal.
//! Unlike the teacher's `Session` (which wraps a live `GoldLoanAgent`), a
//! `CallState` has no long-lived resources attached, so the manager hands
//! ownership out and back in per turn instead of holding shared references.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use recept_core::CallState;
use tokio::sync::watch;

pub struct CallStateManager {
    states: RwLock<HashMap<String, CallState>>,
    max_calls: usize,
    ttl: Duration,
    cleanup_interval: Duration,
}

impl CallStateManager {
    pub fn new(max_calls: usize, ttl: Duration, cleanup_interval: Duration) -> Self {
        Self { states: RwLock::new(HashMap::new()), max_calls, ttl, cleanup_interval }
    }

    /// Remove and return the state for `call_id`, or a fresh one if this is
    /// the first turn of the call (or it has already been swept).
    pub fn take(&self, call_id: &str) -> CallState {
        let mut states = self.states.write();
        states.remove(call_id).unwrap_or_else(|| CallState::new(call_id))
    }

    /// Hand a state back after a turn completes. Sweeps expired entries
    /// first if the manager is at capacity and this is a new call id.
    pub fn store(&self, state: CallState) {
        let mut states = self.states.write();
        if states.len() >= self.max_calls && !states.contains_key(&state.call_id) {
            self.sweep_expired_locked(&mut states);
        }
        states.insert(state.call_id.clone(), state);
    }

    pub fn count(&self) -> usize {
        self.states.read().len()
    }

    pub fn sweep_expired(&self) -> usize {
        let mut states = self.states.write();
        self.sweep_expired_locked(&mut states)
    }

    fn sweep_expired_locked(&self, states: &mut HashMap<String, CallState>) -> usize {
        let ttl = self.ttl;
        let expired: Vec<String> = states.iter().filter(|(_, s)| s.is_expired(ttl)).map(|(id, _)| id.clone()).collect();
        let removed = expired.len();
        for id in expired {
            states.remove(&id);
        }
        removed
    }

    /// Start the background sweep task. Returns a shutdown sender; dropping
    /// or sending `true` on it stops the loop.
    pub fn start_cleanup_task(self: &Arc<Self>) -> watch::Sender<bool> {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let manager = Arc::clone(self);
        let interval = manager.cleanup_interval;

        tokio::spawn(async move {
            let mut interval_timer = tokio::time::interval(interval);
            interval_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = interval_timer.tick() => {
                        let removed = manager.sweep_expired();
                        if removed > 0 {
                            tracing::info!(removed, remaining = manager.count(), "call-state sweep");
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            tracing::info!("call-state cleanup task shutting down");
                            break;
                        }
                    }
                }
            }
        });

        shutdown_tx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_creates_fresh_state_for_new_call() {
        let manager = CallStateManager::new(10, Duration::from_secs(60), Duration::from_secs(1));
        let state = manager.take("call-1");
        assert_eq!(state.call_id, "call-1");
        assert_eq!(state.turn_count, 0);
    }

    #[test]
    fn store_then_take_round_trips_state() {
        let manager = CallStateManager::new(10, Duration::from_secs(60), Duration::from_secs(1));
        let mut state = manager.take("call-2");
        state.push_turn(recept_core::TurnRole::Caller, "hello");
        manager.store(state);

        let resumed = manager.take("call-2");
        assert_eq!(resumed.turn_count, 1);
    }

    #[test]
    fn sweep_removes_expired_entries() {
        let manager = CallStateManager::new(10, Duration::from_secs(0), Duration::from_secs(1));
        manager.store(CallState::new("call-3"));
        assert_eq!(manager.count(), 1);
        let removed = manager.sweep_expired();
        assert_eq!(removed, 1);
        assert_eq!(manager.count(), 0);
    }
}
