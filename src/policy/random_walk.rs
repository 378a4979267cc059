//! Default policy: occasional random state changes

use rand::Rng;

use crate::core::types::SimRng;
use crate::entity::{ThreadEntity, ThreadState};
use crate::policy::{accrue_progress, PolicyKind, TransitionPolicy};

/// Chance per tick that a thread picks a new state
pub const STATE_CHANGE_PROBABILITY: f64 = 0.2;

/// States drawn uniformly when a change happens
const WALK_STATES: [ThreadState; 3] = [
    ThreadState::Runnable,
    ThreadState::Blocked,
    ThreadState::Waiting,
];

/// With probability 0.2 jump to a uniformly chosen live state, otherwise keep
/// the current one. RUNNABLE threads then gain progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomWalkPolicy;

impl RandomWalkPolicy {
    pub(crate) fn walk(entity: &mut ThreadEntity, rng: &mut SimRng) {
        if rng.gen_bool(STATE_CHANGE_PROBABILITY) {
            let next = WALK_STATES[rng.gen_range(0..WALK_STATES.len())];
            entity.transition_to(next);
        }
        accrue_progress(entity, rng);
    }
}

impl TransitionPolicy for RandomWalkPolicy {
    fn kind(&self) -> PolicyKind {
        PolicyKind::RandomWalk
    }

    fn apply(&self, entity: &mut ThreadEntity, rng: &mut SimRng) {
        Self::walk(entity, rng);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::seeded_rng;
    use crate::entity::advance;

    #[test]
    fn test_thread_eventually_terminates() {
        let mut rng = seeded_rng(1);
        let mut thread = ThreadEntity::new(0, None);

        let mut ticks = 0;
        while !thread.is_terminated() && ticks < 10_000 {
            advance(&mut thread, &RandomWalkPolicy, &mut rng);
            ticks += 1;
        }

        assert!(thread.is_terminated(), "thread never finished in {} ticks", ticks);
        assert_eq!(thread.progress(), 100.0);
    }

    #[test]
    fn test_progress_never_decreases() {
        let mut rng = seeded_rng(2);
        let mut thread = ThreadEntity::new(0, None);
        let mut last = 0.0;
        for _ in 0..500 {
            advance(&mut thread, &RandomWalkPolicy, &mut rng);
            assert!(thread.progress() >= last);
            last = thread.progress();
        }
    }

    #[test]
    fn test_state_changes_are_rare() {
        let mut rng = seeded_rng(3);
        let mut changes = 0;
        let trials = 5_000;
        for _ in 0..trials {
            let mut thread = ThreadEntity::new(0, None);
            RandomWalkPolicy.apply(&mut thread, &mut rng);
            if thread.state() != ThreadState::New {
                changes += 1;
            }
        }
        let rate = changes as f64 / trials as f64;
        assert!((rate - STATE_CHANGE_PROBABILITY).abs() < 0.03, "rate was {}", rate);
    }

    #[test]
    fn test_terminated_thread_is_skipped() {
        let mut rng = seeded_rng(4);
        let mut thread = ThreadEntity::new(0, None);
        thread.transition_to(ThreadState::Runnable);
        thread.accrue(100.0);
        let before = thread.clone();

        for _ in 0..100 {
            advance(&mut thread, &RandomWalkPolicy, &mut rng);
        }
        assert_eq!(thread, before);
    }
}
