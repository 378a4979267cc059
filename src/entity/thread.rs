//! Simulated thread entities and their lifecycle state machine
//!
//! A thread moves NEW -> {RUNNABLE, BLOCKED, WAITING}* -> TERMINATED. The only
//! way into TERMINATED is progress reaching 100 while RUNNABLE, so
//! `state == Terminated` and `progress == 100` always hold together.

use serde::{Deserialize, Serialize};

use crate::catalog::{Concept, PRODUCER_CONSUMER_TITLE};
use crate::core::types::SimRng;
use crate::policy::TransitionPolicy;

/// Progress value at which a thread terminates
pub const MAX_PROGRESS: f64 = 100.0;

/// Lifecycle state of a simulated thread
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ThreadState {
    New,
    Runnable,
    Blocked,
    Waiting,
    Terminated,
}

impl ThreadState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ThreadState::Terminated)
    }

    /// Whether a policy may move a thread from `self` to `next`
    ///
    /// NEW is never re-entered, TERMINATED is never left, and TERMINATED is
    /// reached only through [`ThreadEntity::accrue`].
    pub fn can_transition_to(&self, next: ThreadState) -> bool {
        match (self, next) {
            (ThreadState::Terminated, _) => false,
            (_, ThreadState::New) | (_, ThreadState::Terminated) => false,
            _ => true,
        }
    }
}

/// Role of a thread in the producer-consumer lesson
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ThreadRole {
    Producer,
    Consumer,
}

/// One simulated thread as seen by the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadEntity {
    id: String,
    name: String,
    state: ThreadState,
    progress: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<ThreadRole>,
}

impl ThreadEntity {
    /// Fresh thread at roster position `index`
    pub fn new(index: usize, role: Option<ThreadRole>) -> Self {
        Self {
            id: format!("thread-{}", index),
            name: format!("Thread {}", index + 1),
            state: ThreadState::New,
            progress: 0.0,
            role,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> ThreadState {
        self.state
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn role(&self) -> Option<ThreadRole> {
        self.role
    }

    pub fn is_terminated(&self) -> bool {
        self.state.is_terminal()
    }

    /// Move to `next` if the state machine allows it; returns whether it moved
    pub fn transition_to(&mut self, next: ThreadState) -> bool {
        if !self.state.can_transition_to(next) {
            return false;
        }
        self.state = next;
        true
    }

    /// Add progress while RUNNABLE, terminating at 100
    ///
    /// Outside RUNNABLE progress is frozen and this is a no-op.
    pub fn accrue(&mut self, amount: f64) {
        if self.state != ThreadState::Runnable {
            return;
        }
        self.progress = (self.progress + amount.max(0.0)).min(MAX_PROGRESS);
        if self.progress >= MAX_PROGRESS {
            self.progress = MAX_PROGRESS;
            self.state = ThreadState::Terminated;
        }
    }
}

/// Advance one entity by one tick under `policy`
///
/// Terminated entities are skipped.
pub fn advance(entity: &mut ThreadEntity, policy: &dyn TransitionPolicy, rng: &mut SimRng) {
    if entity.is_terminated() {
        return;
    }
    policy.apply(entity, rng);
}

/// Fixed-size ordered collection of threads owned by one session
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Roster {
    threads: Vec<ThreadEntity>,
}

impl Roster {
    /// Create `size` NEW threads for `concept`
    ///
    /// For the producer-consumer concept the first `size / 2` threads are
    /// producers and the rest consumers; every other concept gets no roles.
    pub fn spawn(size: usize, concept: Option<&Concept>) -> Self {
        let with_roles = concept.is_some_and(|c| c.title == PRODUCER_CONSUMER_TITLE);
        let producers = size / 2;

        let threads = (0..size)
            .map(|i| {
                let role = with_roles.then(|| {
                    if i < producers {
                        ThreadRole::Producer
                    } else {
                        ThreadRole::Consumer
                    }
                });
                ThreadEntity::new(i, role)
            })
            .collect();

        Self { threads }
    }

    pub fn len(&self) -> usize {
        self.threads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.threads.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ThreadEntity> {
        self.threads.iter()
    }

    pub fn as_slice(&self) -> &[ThreadEntity] {
        &self.threads
    }

    /// Advance every thread in roster order
    pub fn advance_all(&mut self, policy: &dyn TransitionPolicy, rng: &mut SimRng) {
        for thread in &mut self.threads {
            advance(thread, policy, rng);
        }
    }

    pub fn all_terminated(&self) -> bool {
        self.threads.iter().all(ThreadEntity::is_terminated)
    }

    pub fn count_in(&self, state: ThreadState) -> usize {
        self.threads.iter().filter(|t| t.state == state).count()
    }
}
