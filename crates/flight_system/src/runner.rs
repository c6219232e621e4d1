//! Actor runner — subscribes a handler to a subject pattern and feeds it through a worker pool.
//!
//! The runner owns the subscribe/dispatch/drain lifecycle; the bus and the
//! handler are injected so the same loop serves NATS and in-memory runs.

use std::sync::Arc;
use std::time::Instant;

use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use flight_net::{Bus, NatsBus};

use crate::config::ActorConfig;
use crate::error::RunnerError;
use crate::handler::MessageHandler;
use crate::pool::WorkerPool;
use crate::stats::{RunStats, StatsRecorder};

/// Turns a [`MessageHandler`] into a running actor.
///
/// Call [`ActorRunner::run`] to start the actor lifecycle.
#[derive(Debug)]
pub struct ActorRunner {
    /// Actor configuration.
    config: ActorConfig,
    /// Unique instance identifier for this process.
    instance_id: String,
}

impl ActorRunner {
    /// Create a new actor runner.
    #[must_use]
    pub fn new(config: ActorConfig) -> Self {
        let instance_id = Uuid::new_v4().to_string();
        Self {
            config,
            instance_id,
        }
    }

    /// Returns the unique instance ID for this runner.
    #[must_use]
    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Returns the actor name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Returns the actor configuration.
    #[must_use]
    pub fn config(&self) -> &ActorConfig {
        &self.config
    }

    /// Connect to NATS at the configured URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub async fn connect(&self) -> Result<NatsBus, RunnerError> {
        let url = self.config.resolved_nats_url();
        Ok(NatsBus::connect_to(&url).await?)
    }

    /// Run the actor lifecycle.
    ///
    /// 1. Subscribe to `pattern`.
    /// 2. Loop: receive a delivery → wait for a worker slot → handle it.
    /// 3. On cancellation or end of stream: stop accepting, drain in-flight
    ///    handlers (bounded by the drain timeout).
    ///
    /// The bus is not closed here; its owner closes it once every actor
    /// sharing it has stopped.
    ///
    /// # Errors
    ///
    /// Returns an error if subscribing fails or the pool is closed.
    pub async fn run(
        self,
        bus: Arc<dyn Bus>,
        pattern: &str,
        handler: Arc<dyn MessageHandler>,
        cancel: CancellationToken,
    ) -> Result<RunStats, RunnerError> {
        info!(
            actor = self.config.name,
            instance_id = self.instance_id,
            workers = self.config.workers,
            "actor starting"
        );

        let mut subscription = bus.subscribe(pattern).await?;
        info!(actor = self.config.name, pattern, "subscribed");

        let mut pool = WorkerPool::new(self.config.workers);
        let recorder = StatsRecorder::default();

        loop {
            let envelope = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    info!(actor = self.config.name, "cancellation requested");
                    break;
                }
                next = subscription.next() => match next {
                    Some(envelope) => envelope,
                    None => {
                        info!(actor = self.config.name, "subscription ended");
                        break;
                    }
                },
            };

            debug!(subject = envelope.subject, "dispatching");
            let handler = Arc::clone(&handler);
            let recorder = recorder.clone();
            pool.spawn(async move {
                let started = Instant::now();
                handler.handle(envelope).await;
                recorder.record(started.elapsed());
            })
            .await?;
        }

        drop(subscription);
        match pool.drain(self.config.drain_timeout).await {
            Ok(finished) => debug!(actor = self.config.name, finished, "drained"),
            Err(e) => warn!(actor = self.config.name, error = %e, "drain incomplete"),
        }

        let stats = recorder.snapshot();
        info!(
            actor = self.config.name,
            instance_id = self.instance_id,
            %stats,
            "actor stopped"
        );
        Ok(stats)
    }
}
