//! Simulation session - one run of a concept's roster
//!
//! A session owns its roster, policy and RNG exclusively. Each call to
//! [`Session::step`] is one tick: advance every live thread, take a snapshot,
//! then mark the session complete if every thread has terminated.

use serde::{Deserialize, Serialize};

use crate::catalog::Concept;
use crate::core::types::{ConceptId, SimRng, Tick};
use crate::entity::{Roster, ThreadEntity, ThreadState};
use crate::policy::{PolicyKind, TransitionPolicy};

/// Lifecycle of a whole session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Running,
    /// Every thread terminated
    Complete,
    /// Stopped from outside (supersession, disconnect, send failure)
    Cancelled,
}

/// Immutable copy of the roster after a tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub tick: Tick,
    pub concept_id: Option<ConceptId>,
    pub threads: Vec<ThreadEntity>,
}

impl Snapshot {
    /// Derived deadlock flag, see [`is_deadlocked`]
    pub fn is_deadlocked(&self) -> bool {
        is_deadlocked(&self.threads)
    }

    pub fn all_terminated(&self) -> bool {
        self.threads.iter().all(ThreadEntity::is_terminated)
    }
}

/// True when every thread is BLOCKED at once
///
/// This is a read-only diagnostic over a snapshot, never a session state. An
/// empty roster is not deadlocked.
pub fn is_deadlocked(threads: &[ThreadEntity]) -> bool {
    !threads.is_empty() && threads.iter().all(|t| t.state() == ThreadState::Blocked)
}

pub struct Session {
    concept_id: Option<ConceptId>,
    roster: Roster,
    policy: Box<dyn TransitionPolicy>,
    rng: SimRng,
    tick: Tick,
    status: SessionStatus,
}

impl Session {
    /// Build a fresh roster of `num_threads` for `concept`
    ///
    /// `concept_id` is echoed in snapshots even when it did not resolve; an
    /// unresolved concept runs under the random-walk policy.
    pub fn new(
        concept_id: Option<ConceptId>,
        concept: Option<&Concept>,
        num_threads: usize,
        rng: SimRng,
    ) -> Self {
        Self {
            concept_id,
            roster: Roster::spawn(num_threads, concept),
            policy: PolicyKind::for_concept(concept).build(),
            rng,
            tick: 0,
            status: SessionStatus::Running,
        }
    }

    pub fn concept_id(&self) -> Option<ConceptId> {
        self.concept_id
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn policy_kind(&self) -> PolicyKind {
        self.policy.kind()
    }

    /// Number of ticks executed so far
    pub fn tick(&self) -> Tick {
        self.tick
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == SessionStatus::Running
    }

    pub fn is_complete(&self) -> bool {
        self.status == SessionStatus::Complete
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            tick: self.tick,
            concept_id: self.concept_id,
            threads: self.roster.as_slice().to_vec(),
        }
    }

    /// Run one tick; `None` once the session is no longer running
    pub fn step(&mut self) -> Option<Snapshot> {
        if !self.is_running() {
            return None;
        }

        self.tick += 1;
        self.roster.advance_all(self.policy.as_ref(), &mut self.rng);
        let snapshot = self.snapshot();

        if self.roster.all_terminated() {
            self.status = SessionStatus::Complete;
        }

        Some(snapshot)
    }

    /// Stop a running session; a completed session stays complete
    pub fn cancel(&mut self) {
        if self.is_running() {
            self.status = SessionStatus::Cancelled;
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("concept_id", &self.concept_id)
            .field("policy", &self.policy.kind())
            .field("threads", &self.roster.len())
            .field("tick", &self.tick)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}
