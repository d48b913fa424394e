//! The unlock gate: per-user availability of decryption key material.
//!
//! The gate is a read-mostly view over state owned by the key-management
//! layer; that layer drives the phase transitions, everything in this crate
//! only queries or awaits them. Decryption never happens for a user whose
//! phase is not `Unlocked`.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;
use vaultkit_types::UserId;

/// Where a user's vault currently stands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnlockPhase {
    /// Key material is absent.
    #[default]
    Locked,
    /// An unlock attempt is in progress.
    Unlocking,
    /// Key material is available; decryption may proceed.
    Unlocked,
}

/// Observable per-user unlock state.
///
/// Clones share the same underlying channel.
#[derive(Debug, Clone)]
pub struct UnlockGate {
    states: Arc<watch::Sender<HashMap<UserId, UnlockPhase>>>,
}

impl Default for UnlockGate {
    fn default() -> Self {
        Self::new()
    }
}

impl UnlockGate {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(HashMap::new());
        Self {
            states: Arc::new(sender),
        }
    }

    /// The current phase for a user.
    pub fn phase(&self, user_id: &UserId) -> UnlockPhase {
        self.states
            .borrow()
            .get(user_id)
            .copied()
            .unwrap_or_default()
    }

    /// True when decryption key material is available right now.
    pub fn is_unlocked(&self, user_id: &UserId) -> bool {
        self.phase(user_id) == UnlockPhase::Unlocked
    }

    /// True while an unlock attempt is in progress — "about to be
    /// unlocked" as opposed to plainly locked.
    pub fn is_unlocking(&self, user_id: &UserId) -> bool {
        self.phase(user_id) == UnlockPhase::Unlocking
    }

    /// Records a phase transition. Driven by the key-management layer.
    pub fn set_phase(&self, user_id: UserId, phase: UnlockPhase) {
        self.states.send_modify(|states| {
            states.insert(user_id, phase);
        });
    }

    /// Marks the user's vault locked again.
    pub fn lock(&self, user_id: UserId) {
        self.set_phase(user_id, UnlockPhase::Locked);
    }

    /// Drops all state for a user (logout).
    pub fn clear(&self, user_id: &UserId) {
        self.states.send_modify(|states| {
            states.remove(user_id);
        });
    }

    /// The observable map of per-user unlock phases.
    pub fn subscribe(&self) -> watch::Receiver<HashMap<UserId, UnlockPhase>> {
        self.states.subscribe()
    }

    /// Suspends until the user's vault is unlocked; returns immediately if
    /// it already is.
    pub async fn await_unlocked(&self, user_id: &UserId) {
        let mut receiver = self.states.subscribe();
        // The sender lives inside self, so the channel cannot close while
        // we hold &self.
        let _ = receiver
            .wait_for(|states| states.get(user_id) == Some(&UnlockPhase::Unlocked))
            .await;
    }
}
