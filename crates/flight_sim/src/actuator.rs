//! Actuator simulator.
//!
//! Applies every command instantly and answers with one acknowledgement
//! per actuator on `actuator.data`.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use flight_net::messages::{Actuator, ActuatorAck, ActuatorCommand, ModeTarget};
use flight_net::{Bus, Envelope, Message, subjects};
use flight_system::MessageHandler;

/// Magnitude every vents acknowledgement carries.
pub const VENT_ACK_MAGNITUDE: i32 = 10;

/// One acknowledgement per actuator in `command`, same verb and magnitude.
#[must_use]
pub fn acknowledgements(command: &ActuatorCommand) -> Vec<ActuatorAck> {
    command
        .actuators
        .iter()
        .map(|&actuator| {
            let magnitude = if actuator == Actuator::Vents {
                VENT_ACK_MAGNITUDE
            } else {
                command.magnitude
            };
            ActuatorAck::new(actuator, command.verb, magnitude)
        })
        .collect()
}

/// Totals reported when the actuator simulator stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ActuatorReport {
    /// Commands received.
    pub commands: u64,
    /// Acknowledgements published.
    pub acknowledged: u64,
}

impl fmt::Display for ActuatorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} commands, {} acknowledged",
            self.commands, self.acknowledged
        )
    }
}

/// Handles `actuator.update`.
pub struct ActuatorSimulator {
    bus: Arc<dyn Bus>,
    stop: CancellationToken,
    commands: AtomicU64,
    acknowledged: AtomicU64,
}

impl fmt::Debug for ActuatorSimulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActuatorSimulator")
            .field("report", &self.report())
            .finish_non_exhaustive()
    }
}

impl ActuatorSimulator {
    /// Create a simulator publishing on `bus`.
    #[must_use]
    pub fn new(bus: Arc<dyn Bus>) -> Self {
        Self {
            bus,
            stop: CancellationToken::new(),
            commands: AtomicU64::new(0),
            acknowledged: AtomicU64::new(0),
        }
    }

    /// Cancelled when the shutdown signal arrives.
    #[must_use]
    pub fn stop_token(&self) -> CancellationToken {
        self.stop.clone()
    }

    /// Totals so far.
    #[must_use]
    pub fn report(&self) -> ActuatorReport {
        ActuatorReport {
            commands: self.commands.load(Ordering::Relaxed),
            acknowledged: self.acknowledged.load(Ordering::Relaxed),
        }
    }

    async fn on_command(&self, command: &ActuatorCommand) {
        self.commands.fetch_add(1, Ordering::Relaxed);
        info!(command = %command, "command received");
        for ack in acknowledgements(command) {
            let message = Message::from(ack);
            match self.bus.publish(subjects::ACTUATOR_DATA, &message).await {
                Ok(()) => {
                    self.acknowledged.fetch_add(1, Ordering::Relaxed);
                    debug!(message = %message, "actuator data published");
                }
                Err(e) => error!(message = %message, error = %e, "publish failed"),
            }
        }
    }
}

#[async_trait]
impl MessageHandler for ActuatorSimulator {
    async fn handle(&self, envelope: Envelope) {
        match envelope.decode() {
            Ok(Message::ActuatorCommand(command)) => self.on_command(&command).await,
            Ok(Message::ModeSignal(signal)) => match signal.target {
                ModeTarget::Landing => info!("landing mode acknowledged"),
                ModeTarget::Shutdown => {
                    info!(report = %self.report(), "shutdown signal received");
                    self.stop.cancel();
                }
            },
            Ok(other) => debug!(kind = other.kind(), "ignoring update"),
            Err(e) => warn!(subject = envelope.subject, error = %e, "malformed command, dropping"),
        }
    }
}
