//! JSON frames exchanged over the streaming channel
//!
//! Client -> server: `{"type": "START_EXECUTION", "numThreads": 3, "conceptId": 1}`.
//! Server -> client: `{"type": "THREAD_UPDATE", "threads": [...], "conceptId": 1}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::error::{Result, TutorError};
use crate::core::types::ConceptId;
use crate::entity::ThreadEntity;
use crate::simulation::Snapshot;

pub const START_EXECUTION: &str = "START_EXECUTION";
pub const THREAD_UPDATE: &str = "THREAD_UPDATE";

/// Payload of a start command
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartExecution {
    /// Omitted or 0 means "use the configured default"
    #[serde(default)]
    pub num_threads: Option<u32>,
    #[serde(default)]
    pub concept_id: Option<ConceptId>,
}

/// Recognized client frames
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    StartExecution(StartExecution),
}

/// Decode one text frame
///
/// Non-JSON or ill-typed frames are [`TutorError::MalformedFrame`]; a
/// well-formed frame with any other `type` is [`TutorError::UnrecognizedMessage`].
pub fn parse_client_message(raw: &str) -> Result<ClientMessage> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| TutorError::MalformedFrame(e.to_string()))?;

    let kind = match value.get("type") {
        Some(Value::String(kind)) => kind.clone(),
        Some(other) => return Err(TutorError::UnrecognizedMessage(other.to_string())),
        None => return Err(TutorError::UnrecognizedMessage("<missing>".into())),
    };

    match kind.as_str() {
        START_EXECUTION => {
            let start: StartExecution = serde_json::from_value(value)
                .map_err(|e| TutorError::MalformedFrame(e.to_string()))?;
            Ok(ClientMessage::StartExecution(start))
        }
        _ => Err(TutorError::UnrecognizedMessage(kind)),
    }
}

/// Frames pushed to the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "THREAD_UPDATE", rename_all = "camelCase")]
    ThreadUpdate {
        threads: Vec<ThreadEntity>,
        concept_id: Option<ConceptId>,
    },
}

impl ServerMessage {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl From<Snapshot> for ServerMessage {
    fn from(snapshot: Snapshot) -> Self {
        ServerMessage::ThreadUpdate {
            threads: snapshot.threads,
            concept_id: snapshot.concept_id,
        }
    }
}
