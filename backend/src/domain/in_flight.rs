//! Busy guard for (user, problem) pairs.
//!
//! Only one reaction action per pair may be in flight at a time. A second
//! call while one is pending is rejected instead of racing the first, which
//! would otherwise double-apply deltas on a rapid double click.
//!
//! The guard is released on drop, so a caller that abandons the future still
//! frees the pair.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use super::{ProblemId, UserId};

type PairKey = (UserId, ProblemId);

/// Registry of pairs with an action in flight.
#[derive(Debug, Default)]
pub struct InFlightRegistry {
    active: Mutex<HashSet<PairKey>>,
}

impl InFlightRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the pair, or return `None` if it is already claimed.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use reactions::domain::{InFlightRegistry, ProblemId, UserId};
    ///
    /// let registry = Arc::new(InFlightRegistry::new());
    /// let user = UserId::random();
    /// let problem = ProblemId::new("two-sum").expect("valid id");
    ///
    /// let guard = registry.try_acquire(&user, &problem).expect("free pair");
    /// assert!(registry.try_acquire(&user, &problem).is_none());
    /// drop(guard);
    /// assert!(registry.try_acquire(&user, &problem).is_some());
    /// ```
    pub fn try_acquire(
        self: &Arc<Self>,
        user_id: &UserId,
        problem_id: &ProblemId,
    ) -> Option<InFlightGuard> {
        let key = (user_id.clone(), problem_id.clone());
        // The set holds no partially-updated state, so a poisoned lock is
        // still safe to reuse.
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if !active.insert(key.clone()) {
            return None;
        }
        Some(InFlightGuard {
            registry: Arc::clone(self),
            key: Some(key),
        })
    }

    /// Whether an action is in flight for the pair.
    #[cfg(test)]
    pub(crate) fn is_active(&self, user_id: &UserId, problem_id: &ProblemId) -> bool {
        let key = (user_id.clone(), problem_id.clone());
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&key)
    }

    fn release(&self, key: &PairKey) {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }
}

/// Claim on one (user, problem) pair; released on drop.
#[derive(Debug)]
pub struct InFlightGuard {
    registry: Arc<InFlightRegistry>,
    key: Option<PairKey>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            self.registry.release(&key);
        }
    }
}
