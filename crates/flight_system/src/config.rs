//! Actor configuration.

use std::time::Duration;

use flight_net::connection::resolve_url;

/// Default number of handlers allowed to run at once.
pub const DEFAULT_WORKERS: usize = 8;

/// Default upper bound on how long shutdown waits for in-flight handlers.
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for an actor process.
#[derive(Debug, Clone)]
pub struct ActorConfig {
    /// Human-readable actor name (e.g. `"flight_control"`).
    pub name: String,
    /// Optional NATS URL override (defaults to `NATS_URL` env or localhost).
    pub nats_url: Option<String>,
    /// Maximum number of concurrently running handlers.
    pub workers: usize,
    /// How long to wait for in-flight handlers on shutdown.
    pub drain_timeout: Duration,
}

impl ActorConfig {
    /// Create a new actor config with the given name and default limits.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nats_url: None,
            workers: DEFAULT_WORKERS,
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
        }
    }

    /// Override the NATS URL for this actor.
    #[must_use]
    pub fn with_nats_url(mut self, url: impl Into<String>) -> Self {
        self.nats_url = Some(url.into());
        self
    }

    /// Set the worker limit. Zero is raised to one.
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Set the drain timeout.
    #[must_use]
    pub fn with_drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }

    /// The NATS URL this actor connects to.
    #[must_use]
    pub fn resolved_nats_url(&self) -> String {
        resolve_url(self.nats_url.as_deref())
    }
}
