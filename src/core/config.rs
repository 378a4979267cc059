//! Server configuration with documented defaults
//!
//! Values come from (lowest to highest precedence) the defaults below, an
//! optional TOML file, `THREAD_TUTOR_*` environment variables and finally CLI
//! flags applied by the binary.

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::core::error::{Result, TutorError};

/// Configuration for the tutor server and its simulation sessions
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Address the HTTP/WebSocket listener binds to
    pub listen_addr: SocketAddr,

    /// Milliseconds between two ticks of a running session
    ///
    /// At the default (1000) a default-policy thread needs roughly a minute
    /// of wall clock to terminate, slow enough to follow on screen.
    pub tick_interval_ms: u64,

    /// Roster size used when a start command omits `numThreads` (or sends 0)
    pub default_threads: u32,

    /// Hard ceiling on roster size
    ///
    /// Concept `threadConfig` bounds are advisory only; this cap exists so a
    /// single client cannot ask for an arbitrarily large roster.
    pub max_threads: u32,

    /// Base seed for session RNGs. `None` draws fresh entropy per session.
    pub seed: Option<u64>,

    /// Optional catalog file replacing the builtin concepts
    pub concepts_path: Option<PathBuf>,

    /// Fallback tracing filter when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
            tick_interval_ms: 1000,
            default_threads: 3,
            max_threads: 64,
            seed: None,
            concepts_path: None,
            log_filter: "thread_tutor=info".to_string(),
        }
    }
}

impl ServerConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from TOML text. Missing fields keep their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: ServerConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// Load a config file, or the defaults when `path` is `None`
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let content = fs::read_to_string(path)?;
                Self::from_toml_str(&content)
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply `THREAD_TUTOR_ADDR`, `THREAD_TUTOR_TICK_MS` and `THREAD_TUTOR_SEED`
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("THREAD_TUTOR_ADDR") {
            self.listen_addr = addr
                .parse::<SocketAddr>()
                .map_err(|e| TutorError::Config(format!("THREAD_TUTOR_ADDR '{}': {}", addr, e)))?;
        }
        if let Some(ms) = lookup("THREAD_TUTOR_TICK_MS") {
            self.tick_interval_ms = ms
                .parse::<u64>()
                .map_err(|e| TutorError::Config(format!("THREAD_TUTOR_TICK_MS '{}': {}", ms, e)))?;
        }
        if let Some(seed) = lookup("THREAD_TUTOR_SEED") {
            let seed = seed
                .parse::<u64>()
                .map_err(|e| TutorError::Config(format!("THREAD_TUTOR_SEED '{}': {}", seed, e)))?;
            self.seed = Some(seed);
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.tick_interval_ms == 0 {
            return Err(TutorError::Config("tick_interval_ms must be positive".into()));
        }

        if self.default_threads == 0 || self.max_threads == 0 {
            return Err(TutorError::Config(
                "default_threads and max_threads must be positive".into(),
            ));
        }

        if self.default_threads > self.max_threads {
            return Err(TutorError::Config(format!(
                "default_threads ({}) should be <= max_threads ({})",
                self.default_threads, self.max_threads
            )));
        }

        Ok(())
    }
}
