//! Tick loop - drives a session on a fixed interval
//!
//! The loop is a single tokio task per session. All roster mutation for a tick
//! happens synchronously between two awaits, so the roster needs no lock.
//! Cancellation goes through one `CancellationToken` checked before every
//! tick; [`TickLoop::cancel`] also waits for the task to exit, so once it
//! returns no further snapshot can be sent.

use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::core::types::Tick;
use crate::protocol::ServerMessage;
use crate::simulation::session::Session;

/// How a tick loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SessionOutcome {
    /// Every thread terminated
    Complete { ticks: Tick },
    /// Stopped by its owner
    Cancelled { ticks: Tick },
    /// The outbound channel went away mid-run
    TransportClosed { ticks: Tick },
}

impl SessionOutcome {
    pub fn ticks(&self) -> Tick {
        match self {
            SessionOutcome::Complete { ticks }
            | SessionOutcome::Cancelled { ticks }
            | SessionOutcome::TransportClosed { ticks } => *ticks,
        }
    }
}

/// Handle to a running tick loop
///
/// Dropping the handle cancels the loop.
#[derive(Debug)]
pub struct TickLoop {
    token: CancellationToken,
    handle: Option<JoinHandle<SessionOutcome>>,
}

/// Start ticking `session` every `period`, pushing one `THREAD_UPDATE` per tick
///
/// The first tick fires one full period after the call.
pub fn spawn_tick_loop(
    session: Session,
    period: Duration,
    outbound: UnboundedSender<ServerMessage>,
) -> TickLoop {
    let token = CancellationToken::new();
    let handle = tokio::spawn(run_tick_loop(session, period, outbound, token.clone()));
    TickLoop {
        token,
        handle: Some(handle),
    }
}

async fn run_tick_loop(
    mut session: Session,
    period: Duration,
    outbound: UnboundedSender<ServerMessage>,
    token: CancellationToken,
) -> SessionOutcome {
    let period = period.max(Duration::from_millis(1));
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => {}
            _ = ticker.tick() => {}
        }

        if token.is_cancelled() {
            session.cancel();
            return SessionOutcome::Cancelled {
                ticks: session.tick(),
            };
        }

        let Some(snapshot) = session.step() else {
            return SessionOutcome::Cancelled {
                ticks: session.tick(),
            };
        };

        if outbound.send(ServerMessage::from(snapshot)).is_err() {
            session.cancel();
            tracing::warn!(
                tick = session.tick(),
                "Outbound channel closed; stopping thread simulation"
            );
            return SessionOutcome::TransportClosed {
                ticks: session.tick(),
            };
        }

        if session.is_complete() {
            tracing::info!(ticks = session.tick(), "Thread simulation completed");
            return SessionOutcome::Complete {
                ticks: session.tick(),
            };
        }
    }
}

impl TickLoop {
    /// Whether the loop has already exited on its own
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Cancel the loop and wait until its task is gone
    pub async fn cancel(mut self) -> SessionOutcome {
        self.token.cancel();
        self.wait().await
    }

    /// Wait for the loop to end without cancelling it
    pub async fn join(mut self) -> SessionOutcome {
        self.wait().await
    }

    async fn wait(&mut self) -> SessionOutcome {
        let Some(handle) = self.handle.take() else {
            return SessionOutcome::Cancelled { ticks: 0 };
        };
        match handle.await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(error = %e, "Tick loop task failed");
                SessionOutcome::Cancelled { ticks: 0 }
            }
        }
    }
}

impl Drop for TickLoop {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
