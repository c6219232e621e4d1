//! The decision engine.
//!
//! Every inbound delivery is handled on its own task. Each entry point
//! locks the [`FlightState`] once, computes an [`Outcome`] (state changes,
//! one-shot checks and the messages to send) and releases the lock before
//! anything is published. No bus call ever happens under the lock.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use flight_net::messages::{
    ActuatorAck, ActuatorCommand, FeedbackReading, GeneratorStop, ModeSignal, ModeTarget, Sensor,
    SensorDelta,
};
use flight_net::{Bus, Envelope, Message, Role, subjects};
use flight_system::MessageHandler;

use crate::control_law;
use crate::mode::{self, Transition};
use crate::state::{Field, FlightSnapshot, FlightState, Mode};

/// At or below this speed (km/h) the speed generator is told to stop.
pub const SPEED_STOP_THRESHOLD: i32 = 10;

/// The messages one handler invocation decided to send.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    /// `(subject, message)` pairs, published in order.
    pub publications: Vec<(&'static str, Message)>,
    /// The aircraft landed during this invocation.
    pub landed: bool,
}

impl Outcome {
    fn push(&mut self, subject: &'static str, message: impl Into<Message>) {
        self.publications.push((subject, message.into()));
    }

    /// Whether nothing needs to be sent.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.publications.is_empty()
    }
}

/// Engine counters, reported when the engine stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EngineStats {
    /// Messages that decoded and were acted on.
    pub handled: u64,
    /// Messages dropped as malformed or unexpected.
    pub dropped: u64,
    /// Messages successfully published.
    pub published: u64,
    /// Publishes the bus rejected.
    pub publish_failures: u64,
}

impl fmt::Display for EngineStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} handled, {} dropped, {} published, {} publish failures",
            self.handled, self.dropped, self.published, self.publish_failures
        )
    }
}

#[derive(Debug, Default)]
struct Counters {
    handled: AtomicU64,
    dropped: AtomicU64,
    published: AtomicU64,
    publish_failures: AtomicU64,
}

/// Owns the flight state and turns sensor and actuator traffic into
/// commands and feedback.
pub struct DecisionEngine {
    bus: Arc<dyn Bus>,
    state: Mutex<FlightState>,
    shutdown: CancellationToken,
    counters: Counters,
}

impl fmt::Debug for DecisionEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecisionEngine")
            .field("state", &self.snapshot())
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

impl DecisionEngine {
    /// Create an engine in the initial cruising state.
    #[must_use]
    pub fn new(bus: Arc<dyn Bus>) -> Self {
        Self::with_state(bus, FlightState::new())
    }

    /// Create an engine starting from a given state.
    #[must_use]
    pub fn with_state(bus: Arc<dyn Bus>, state: FlightState) -> Self {
        Self {
            bus,
            state: Mutex::new(state),
            shutdown: CancellationToken::new(),
            counters: Counters::default(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FlightState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// A consistent copy of the current readings and positions.
    #[must_use]
    pub fn snapshot(&self) -> FlightSnapshot {
        self.lock().snapshot()
    }

    /// The current flight mode.
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.lock().mode()
    }

    /// Cancelled once the aircraft has landed and the shutdown signals
    /// have been sent.
    #[must_use]
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Counter values so far.
    #[must_use]
    pub fn stats(&self) -> EngineStats {
        EngineStats {
            handled: self.counters.handled.load(Ordering::Relaxed),
            dropped: self.counters.dropped.load(Ordering::Relaxed),
            published: self.counters.published.load(Ordering::Relaxed),
            publish_failures: self.counters.publish_failures.load(Ordering::Relaxed),
        }
    }

    /// Tell both simulators to begin the descent.
    ///
    /// The engine itself switches to landing mode when the sensor
    /// simulator acknowledges.
    pub async fn initiate_landing(&self) {
        info!("initiating landing");
        let mut outcome = Outcome::default();
        for role in [Role::Sensor, Role::Actuator] {
            outcome.push(
                subjects::update(role),
                ModeSignal::new(ModeTarget::Landing, role.as_str()),
            );
        }
        self.publish(outcome).await;
    }

    /// Dispatch a decoded message that arrived on `role`'s data subject.
    pub async fn on_message(&self, role: Role, message: Message) {
        match (role, message) {
            (Role::Sensor, Message::SensorDelta(delta)) => self.on_sensor_data(&delta).await,
            (Role::Actuator, Message::ActuatorAck(ack)) => self.on_actuator_data(&ack).await,
            (_, Message::ModeSignal(signal)) => self.on_mode_signal(&signal).await,
            (role, other) => {
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(%role, kind = other.kind(), message = %other, "unexpected message, dropping");
            }
        }
    }

    /// Apply a sensor delta, issue the control-law command and evaluate
    /// the landing transitions.
    pub async fn on_sensor_data(&self, delta: &SensorDelta) {
        self.counters.handled.fetch_add(1, Ordering::Relaxed);
        let outcome = self.sensor_outcome(delta);
        self.finish(outcome).await;
    }

    /// Fold an actuator acknowledgement back into the sensor readings and
    /// republish the affected reading.
    pub async fn on_actuator_data(&self, ack: &ActuatorAck) {
        self.counters.handled.fetch_add(1, Ordering::Relaxed);
        let outcome = self.actuator_outcome(ack);
        self.finish(outcome).await;
    }

    /// Handle a mode signal. Only a landing signal while cruising changes
    /// anything.
    pub async fn on_mode_signal(&self, signal: &ModeSignal) {
        self.counters.handled.fetch_add(1, Ordering::Relaxed);
        let transition = mode::on_signal(&mut self.lock(), signal.target);
        match transition {
            Some(Transition::EnteredLanding) => info!(from = %signal.subject, "beginning descent"),
            _ => debug!(signal = %signal, "mode signal ignored"),
        }
    }

    fn sensor_outcome(&self, delta: &SensorDelta) -> Outcome {
        let mut outcome = Outcome::default();
        let mut state = self.lock();

        let value = state.apply_delta(Field::from(delta.sensor), delta.signed());
        debug!(delta = %delta, value, "sensor delta applied");

        let mode = state.mode();
        if let Some(command) = control_law::compute_command(delta, &state, mode) {
            debug!(%mode, command = %command, "control law issued command");
            outcome.push(subjects::ACTUATOR_UPDATE, command);
        }

        match mode::evaluate_descent(&mut state) {
            Some(Transition::GearRequested) => {
                info!(
                    altitude = state.get(Field::Altitude),
                    "altitude below 2000 ft, deploying landing gear"
                );
                outcome.push(
                    subjects::ACTUATOR_UPDATE,
                    ActuatorCommand::deploy_landing_gear(),
                );
            }
            Some(Transition::Landed) => {
                info!(
                    altitude = state.get(Field::Altitude),
                    "aircraft has landed, shutting down all actors"
                );
                for role in [Role::Sensor, Role::Actuator] {
                    outcome.push(
                        subjects::update(role),
                        ModeSignal::new(ModeTarget::Shutdown, role.as_str()),
                    );
                }
                outcome.landed = true;
            }
            Some(Transition::EnteredLanding) | None => {}
        }

        outcome
    }

    fn actuator_outcome(&self, ack: &ActuatorAck) -> Outcome {
        let mut outcome = Outcome::default();
        let mut state = self.lock();

        if let Some(sensor) = control_law::apply_feedback(&mut state, ack) {
            let value = state.get(Field::from(sensor));
            debug!(ack = %ack, %sensor, value, "actuator feedback applied");
            outcome.push(subjects::SENSOR_UPDATE, FeedbackReading { sensor, value });
        }

        if state.get(Field::Speed) <= SPEED_STOP_THRESHOLD && state.mark_speed_shutdown_signal_sent()
        {
            info!(
                speed = state.get(Field::Speed),
                "speed at or below 10 km/h, stopping speed generator"
            );
            outcome.push(
                subjects::SENSOR_UPDATE,
                GeneratorStop {
                    sensor: Sensor::Speed,
                },
            );
        }

        outcome
    }

    async fn finish(&self, outcome: Outcome) {
        let landed = outcome.landed;
        self.publish(outcome).await;
        if landed {
            self.shutdown.cancel();
        }
    }

    async fn publish(&self, outcome: Outcome) {
        for (subject, message) in outcome.publications {
            match self.bus.publish(subject, &message).await {
                Ok(()) => {
                    self.counters.published.fetch_add(1, Ordering::Relaxed);
                    debug!(subject, message = %message, "published");
                }
                Err(e) => {
                    self.counters.publish_failures.fetch_add(1, Ordering::Relaxed);
                    error!(subject, message = %message, error = %e, "publish failed");
                }
            }
        }
    }
}

#[async_trait]
impl MessageHandler for DecisionEngine {
    async fn handle(&self, envelope: Envelope) {
        let Some(role) = subjects::role_of(&envelope.subject) else {
            self.counters.dropped.fetch_add(1, Ordering::Relaxed);
            warn!(subject = envelope.subject, "message on unknown subject, dropping");
            return;
        };
        match envelope.decode() {
            Ok(message) => self.on_message(role, message).await,
            Err(e) => {
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(
                    subject = envelope.subject,
                    payload = %String::from_utf8_lossy(&envelope.payload),
                    error = %e,
                    "malformed message, dropping"
                );
            }
        }
    }
}
