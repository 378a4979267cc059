//! Simulated thread entities

pub mod thread;

pub use thread::{advance, Roster, ThreadEntity, ThreadRole, ThreadState, MAX_PROGRESS};
