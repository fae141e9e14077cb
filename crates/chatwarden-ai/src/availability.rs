//! Generation-backend availability state machine.
//!
//! A process-wide cell with a single allowed transition, Live→Fallback.
//! There is deliberately no way back: quota and rate-limit exhaustion in the
//! source system never recovered within a process lifetime, and silently
//! re-promoting would hide that. See DESIGN.md for the open-question note.

use std::sync::atomic::{AtomicBool, Ordering};

/// Availability of the generation backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvailabilityState {
    Live,
    Fallback,
}

impl std::fmt::Display for AvailabilityState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Live => write!(f, "live"),
            Self::Fallback => write!(f, "fallback"),
        }
    }
}

/// Shared one-way availability cell.
#[derive(Debug)]
pub struct NlpAvailability {
    demoted: AtomicBool,
}

impl NlpAvailability {
    /// Start in the Live state.
    pub fn live() -> Self {
        Self {
            demoted: AtomicBool::new(false),
        }
    }

    /// Start demoted, e.g. after failed startup credential validation.
    pub fn fallback() -> Self {
        Self {
            demoted: AtomicBool::new(true),
        }
    }

    pub fn state(&self) -> AvailabilityState {
        if self.demoted.load(Ordering::SeqCst) {
            AvailabilityState::Fallback
        } else {
            AvailabilityState::Live
        }
    }

    pub fn is_live(&self) -> bool {
        self.state() == AvailabilityState::Live
    }

    /// Flip to Fallback. Idempotent and race-safe: returns true only for the
    /// call that performed the transition.
    pub fn demote(&self) -> bool {
        !self.demoted.swap(true, Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_initial_states() {
        assert_eq!(NlpAvailability::live().state(), AvailabilityState::Live);
        assert_eq!(
            NlpAvailability::fallback().state(),
            AvailabilityState::Fallback
        );
    }

    #[test]
    fn test_demote_is_one_way_and_idempotent() {
        let cell = NlpAvailability::live();
        assert!(cell.demote());
        assert!(!cell.demote());
        assert_eq!(cell.state(), AvailabilityState::Fallback);
    }

    #[tokio::test]
    async fn test_concurrent_demotion_transitions_exactly_once() {
        let cell = Arc::new(NlpAvailability::live());

        let mut handles = Vec::new();
        for _ in 0..16 {
            let cell = cell.clone();
            handles.push(tokio::spawn(async move { cell.demote() }));
        }

        let mut transitions = 0;
        for handle in handles {
            if handle.await.unwrap() {
                transitions += 1;
            }
        }

        assert_eq!(transitions, 1);
        assert_eq!(cell.state(), AvailabilityState::Fallback);
    }
}
