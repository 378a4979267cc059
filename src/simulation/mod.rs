pub mod session;
pub mod tick;

pub use session::{is_deadlocked, Session, SessionStatus, Snapshot};
pub use tick::{spawn_tick_loop, SessionOutcome, TickLoop};
