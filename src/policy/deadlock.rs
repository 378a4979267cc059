//! Deadlock lesson policy
//!
//! Threads behave like the random walk until they pass the halfway mark, then
//! lock up for good: each now holds a lock the other one needs. A deadlock
//! session therefore never completes on its own and ends only by cancellation.

use crate::core::types::SimRng;
use crate::entity::{ThreadEntity, ThreadState};
use crate::policy::{PolicyKind, RandomWalkPolicy, TransitionPolicy};

/// Progress above which a thread is stuck in BLOCKED
pub const DEADLOCK_THRESHOLD: f64 = 50.0;

#[derive(Debug, Clone, Copy, Default)]
pub struct DeadlockPolicy;

impl TransitionPolicy for DeadlockPolicy {
    fn kind(&self) -> PolicyKind {
        PolicyKind::Deadlock
    }

    fn apply(&self, entity: &mut ThreadEntity, rng: &mut SimRng) {
        if entity.progress() > DEADLOCK_THRESHOLD {
            entity.transition_to(ThreadState::Blocked);
            return;
        }
        RandomWalkPolicy::walk(entity, rng);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::seeded_rng;
    use crate::entity::advance;

    #[test]
    fn test_locks_up_past_threshold() {
        let mut rng = seeded_rng(5);
        let mut thread = ThreadEntity::new(0, None);
        thread.transition_to(ThreadState::Runnable);
        thread.accrue(50.5);

        advance(&mut thread, &DeadlockPolicy, &mut rng);
        assert_eq!(thread.state(), ThreadState::Blocked);

        for _ in 0..1_000 {
            advance(&mut thread, &DeadlockPolicy, &mut rng);
            assert_eq!(thread.state(), ThreadState::Blocked);
            assert_eq!(thread.progress(), 50.5);
        }
    }

    #[test]
    fn test_exactly_at_threshold_keeps_walking() {
        let mut rng = seeded_rng(6);
        let mut thread = ThreadEntity::new(0, None);
        thread.transition_to(ThreadState::Runnable);
        thread.accrue(DEADLOCK_THRESHOLD);

        // Not yet past the threshold, so the walk may still move it forward
        let mut moved = false;
        for _ in 0..500 {
            advance(&mut thread, &DeadlockPolicy, &mut rng);
            if thread.progress() > DEADLOCK_THRESHOLD {
                moved = true;
                break;
            }
        }
        assert!(moved);
    }

    #[test]
    fn test_never_terminates() {
        let mut rng = seeded_rng(7);
        let mut thread = ThreadEntity::new(0, None);
        for _ in 0..5_000 {
            advance(&mut thread, &DeadlockPolicy, &mut rng);
            assert!(!thread.is_terminated());
        }
        assert!(thread.progress() > DEADLOCK_THRESHOLD);
        assert_eq!(thread.state(), ThreadState::Blocked);
    }
}
