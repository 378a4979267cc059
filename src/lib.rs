//! Thread Tutor - multithreading lessons as live simulations
//!
//! A client opens a WebSocket, sends `START_EXECUTION`, and receives one
//! `THREAD_UPDATE` per tick while a roster of simulated threads walks through
//! its lifecycle under the selected concept's transition policy.

pub mod catalog;
pub mod connection;
pub mod core;
pub mod entity;
pub mod policy;
pub mod protocol;
pub mod server;
pub mod simulation;
