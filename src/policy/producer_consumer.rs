//! Producer-consumer lesson policy

use rand::Rng;

use crate::core::types::SimRng;
use crate::entity::{ThreadEntity, ThreadRole, ThreadState};
use crate::policy::{accrue_progress, PolicyKind, TransitionPolicy};

/// Chance a producer finds the buffer full this tick
pub const PRODUCER_WAIT_PROBABILITY: f64 = 0.3;

/// Chance a consumer finds the buffer empty this tick
pub const CONSUMER_WAIT_PROBABILITY: f64 = 0.3;

/// Each tick a thread either waits on the shared buffer or runs
#[derive(Debug, Clone, Copy, Default)]
pub struct ProducerConsumerPolicy;

impl TransitionPolicy for ProducerConsumerPolicy {
    fn kind(&self) -> PolicyKind {
        PolicyKind::ProducerConsumer
    }

    fn apply(&self, entity: &mut ThreadEntity, rng: &mut SimRng) {
        let waits = match entity.role() {
            Some(ThreadRole::Producer) => rng.gen_bool(PRODUCER_WAIT_PROBABILITY),
            Some(ThreadRole::Consumer) => rng.gen_bool(CONSUMER_WAIT_PROBABILITY),
            None => false,
        };

        let next = if waits {
            ThreadState::Waiting
        } else {
            ThreadState::Runnable
        };
        entity.transition_to(next);
        accrue_progress(entity, rng);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::seeded_rng;
    use crate::entity::advance;

    #[test]
    fn test_only_runs_or_waits() {
        let mut rng = seeded_rng(8);
        for role in [ThreadRole::Producer, ThreadRole::Consumer] {
            let mut thread = ThreadEntity::new(0, Some(role));
            while !thread.is_terminated() {
                advance(&mut thread, &ProducerConsumerPolicy, &mut rng);
                assert!(matches!(
                    thread.state(),
                    ThreadState::Runnable | ThreadState::Waiting | ThreadState::Terminated
                ));
                assert_eq!(thread.role(), Some(role));
            }
        }
    }

    #[test]
    fn test_wait_rate() {
        let mut rng = seeded_rng(9);
        let trials = 5_000;
        let mut waits = 0;
        for _ in 0..trials {
            let mut thread = ThreadEntity::new(0, Some(ThreadRole::Consumer));
            ProducerConsumerPolicy.apply(&mut thread, &mut rng);
            if thread.state() == ThreadState::Waiting {
                waits += 1;
            }
        }
        let rate = waits as f64 / trials as f64;
        assert!((rate - CONSUMER_WAIT_PROBABILITY).abs() < 0.03, "rate was {}", rate);
    }

    #[test]
    fn test_waiting_freezes_progress() {
        let mut rng = seeded_rng(10);
        let mut thread = ThreadEntity::new(0, Some(ThreadRole::Producer));
        let mut last_progress = 0.0;
        for _ in 0..200 {
            advance(&mut thread, &ProducerConsumerPolicy, &mut rng);
            if thread.state() == ThreadState::Waiting {
                assert_eq!(thread.progress(), last_progress);
            }
            last_progress = thread.progress();
        }
    }
}
