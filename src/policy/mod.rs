//! Transition policies - per-concept rules for advancing a thread one tick
//!
//! Policies are the only code that moves a thread's state or progress. They
//! draw every random number from the session's injected RNG so a seeded
//! session replays identically.

pub mod deadlock;
pub mod producer_consumer;
pub mod random_walk;

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::catalog::{Concept, DEADLOCK_TITLE, PRODUCER_CONSUMER_TITLE};
use crate::core::types::SimRng;
use crate::entity::ThreadEntity;

pub use deadlock::DeadlockPolicy;
pub use producer_consumer::ProducerConsumerPolicy;
pub use random_walk::RandomWalkPolicy;

/// Upper bound (exclusive) of the progress gained by one RUNNABLE tick
pub const PROGRESS_STEP_MAX: f64 = 15.0;

/// Rule computing a thread's next state and progress
///
/// Callers skip terminated threads; see [`crate::entity::advance`].
pub trait TransitionPolicy: Send + Sync + fmt::Debug {
    fn kind(&self) -> PolicyKind;

    fn apply(&self, entity: &mut ThreadEntity, rng: &mut SimRng);
}

/// The policies selectable by concept title
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    RandomWalk,
    Deadlock,
    ProducerConsumer,
}

impl PolicyKind {
    pub fn from_title(title: &str) -> Self {
        match title {
            DEADLOCK_TITLE => PolicyKind::Deadlock,
            PRODUCER_CONSUMER_TITLE => PolicyKind::ProducerConsumer,
            _ => PolicyKind::RandomWalk,
        }
    }

    /// Policy for a resolved concept; unknown concepts get the random walk
    pub fn for_concept(concept: Option<&Concept>) -> Self {
        concept
            .map(|c| Self::from_title(&c.title))
            .unwrap_or(PolicyKind::RandomWalk)
    }

    pub fn build(self) -> Box<dyn TransitionPolicy> {
        match self {
            PolicyKind::RandomWalk => Box::new(RandomWalkPolicy),
            PolicyKind::Deadlock => Box::new(DeadlockPolicy),
            PolicyKind::ProducerConsumer => Box::new(ProducerConsumerPolicy),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PolicyKind::RandomWalk => "random_walk",
            PolicyKind::Deadlock => "deadlock",
            PolicyKind::ProducerConsumer => "producer_consumer",
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Progress step shared by every policy: uniform in `[0, PROGRESS_STEP_MAX)`
/// while RUNNABLE, nothing otherwise
pub(crate) fn accrue_progress(entity: &mut ThreadEntity, rng: &mut SimRng) {
    if entity.state() == crate::entity::ThreadState::Runnable {
        let step = rng.gen_range(0.0..PROGRESS_STEP_MAX);
        entity.accrue(step);
    }
}
