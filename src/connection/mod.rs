//! Connection controller - binds at most one session to one channel
//!
//! The controller is created per connection and owns the only reference to
//! that connection's tick loop. Every path that ends a session (new start,
//! close, error) awaits the old loop's cancellation before anything else
//! happens, so two loops never feed the same channel.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use crate::catalog::ConceptCatalog;
use crate::core::config::ServerConfig;
use crate::core::error::TutorError;
use crate::core::types::{seeded_rng, ConceptId};
use crate::protocol::{parse_client_message, ClientMessage, ServerMessage};
use crate::simulation::{spawn_tick_loop, Session, SessionOutcome, TickLoop};

/// Per-session knobs taken from the server configuration
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub tick_interval: Duration,
    pub default_threads: u32,
    pub max_threads: u32,
    pub seed: Option<u64>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from(&ServerConfig::default())
    }
}

impl From<&ServerConfig> for SessionSettings {
    fn from(config: &ServerConfig) -> Self {
        Self {
            tick_interval: config.tick_interval(),
            default_threads: config.default_threads,
            max_threads: config.max_threads,
            seed: config.seed,
        }
    }
}

pub struct ConnectionController {
    id: u64,
    catalog: Arc<dyn ConceptCatalog>,
    settings: SessionSettings,
    outbound: UnboundedSender<ServerMessage>,
    active: Option<TickLoop>,
    seed_base: u64,
    sessions_started: u64,
}

impl ConnectionController {
    pub fn new(
        id: u64,
        catalog: Arc<dyn ConceptCatalog>,
        settings: SessionSettings,
        outbound: UnboundedSender<ServerMessage>,
    ) -> Self {
        let seed_base = settings.seed.unwrap_or_else(rand::random);
        Self {
            id,
            catalog,
            settings,
            outbound,
            active: None,
            seed_base,
            sessions_started: 0,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Whether a tick loop is currently live
    pub fn is_running(&self) -> bool {
        self.active.as_ref().is_some_and(|active| !active.is_finished())
    }

    pub fn sessions_started(&self) -> u64 {
        self.sessions_started
    }

    /// Handle one raw text frame from the client
    ///
    /// Protocol errors are logged and dropped; the connection stays usable.
    pub async fn on_message(&mut self, raw: &str) {
        match parse_client_message(raw) {
            Ok(ClientMessage::StartExecution(start)) => {
                self.on_start(start.num_threads, start.concept_id).await;
            }
            Err(TutorError::UnrecognizedMessage(kind)) => {
                debug!(connection = self.id, kind = %kind, "Ignoring unrecognized message");
            }
            Err(e) => {
                warn!(connection = self.id, error = %e, "Error processing WebSocket message");
            }
        }
    }

    /// Replace any running session with a fresh one
    pub async fn on_start(&mut self, num_threads: Option<u32>, concept_id: Option<ConceptId>) {
        if let Some(outcome) = self.stop_active().await {
            debug!(connection = self.id, ?outcome, "Superseded previous simulation");
        }

        let concept = concept_id.and_then(|id| self.catalog.get(id));
        if concept.is_none() {
            let reason = match concept_id {
                Some(id) => TutorError::ConceptNotFound(id).to_string(),
                None => "no conceptId".to_string(),
            };
            debug!(connection = self.id, reason = %reason, "Using default transition policy");
        }

        let requested = num_threads
            .filter(|n| *n > 0)
            .unwrap_or(self.settings.default_threads);

        if let Some(concept) = &concept {
            if !concept.thread_config.contains(requested) {
                info!(
                    connection = self.id,
                    requested,
                    min = concept.thread_config.min_threads,
                    max = concept.thread_config.max_threads,
                    "Thread count outside the concept's suggested range"
                );
            }
        }

        let num_threads = requested.min(self.settings.max_threads);
        if num_threads < requested {
            warn!(
                connection = self.id,
                requested,
                max = self.settings.max_threads,
                "Thread count capped"
            );
        }

        let rng = seeded_rng(self.seed_base.wrapping_add(self.sessions_started));
        self.sessions_started += 1;

        let session = Session::new(concept_id, concept.as_ref(), num_threads as usize, rng);
        info!(
            connection = self.id,
            concept_id = ?concept_id,
            num_threads,
            policy = %session.policy_kind(),
            "Starting thread simulation"
        );

        self.active = Some(spawn_tick_loop(
            session,
            self.settings.tick_interval,
            self.outbound.clone(),
        ));
    }

    /// Channel closed or errored: stop ticking unconditionally
    pub async fn on_close(&mut self) -> Option<SessionOutcome> {
        let outcome = self.stop_active().await;
        debug!(connection = self.id, ?outcome, "Connection controller closed");
        outcome
    }

    async fn stop_active(&mut self) -> Option<SessionOutcome> {
        match self.active.take() {
            Some(active) => Some(active.cancel().await),
            None => None,
        }
    }
}
