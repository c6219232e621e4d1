//! Sensor simulator.
//!
//! [`SensorGenerator`] decides *what* to report; [`SensorSimulator`] puts
//! it on the bus on a fixed period and reacts to the engine's updates.
//! The generator takes its randomness from the caller so runs can be
//! seeded.

use std::fmt;
use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use rand::Rng;
use serde::Serialize;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use flight_net::messages::{Direction, FeedbackReading, ModeSignal, ModeTarget, Sensor, SensorDelta};
use flight_net::{Bus, Envelope, Message, subjects};
use flight_system::{MessageHandler, RunStats};

/// Default generation period.
pub const DEFAULT_PERIOD: Duration = Duration::from_secs(4);

/// Size of the one-off cabin decompression.
pub const SUDDEN_PRESSURE_LOSS: i32 = 50;

/// Addressee text of the landing acknowledgement.
pub const LANDING_ACK: &str = "acknowledged";

/// Range a random delta of `sensor` is drawn from.
#[must_use]
pub fn magnitude_range(sensor: Sensor) -> Range<i32> {
    match sensor {
        Sensor::Altitude => 1000..4000,
        Sensor::CabinPressure | Sensor::Rain => 0..30,
        Sensor::Speed => 0..50,
    }
}

/// Produces random sensor deltas for the sensors still active.
#[derive(Debug)]
pub struct SensorGenerator<R> {
    rng: R,
    active: Vec<Sensor>,
    landing: bool,
    pressure_loss_fired: bool,
}

impl<R: Rng> SensorGenerator<R> {
    /// A cruising generator with every sensor active.
    pub fn new(rng: R) -> Self {
        Self {
            rng,
            active: Sensor::ALL.to_vec(),
            landing: false,
            pressure_loss_fired: false,
        }
    }

    /// Sensors that still produce deltas.
    #[must_use]
    pub fn active(&self) -> &[Sensor] {
        &self.active
    }

    /// Whether the landing sequence has started.
    #[must_use]
    pub fn is_landing(&self) -> bool {
        self.landing
    }

    /// One random delta for `sensor`.
    ///
    /// Every cabin-pressure delta has a one-in-five chance of being a sudden
    /// loss instead, until the loss has fired once in the run.
    pub fn next_delta(&mut self, sensor: Sensor) -> SensorDelta {
        if sensor == Sensor::CabinPressure
            && !self.pressure_loss_fired
            && self.rng.random_ratio(1, 5)
        {
            self.pressure_loss_fired = true;
            warn!("sudden loss of cabin pressure");
            return SensorDelta::new(sensor, Direction::Decreased, SUDDEN_PRESSURE_LOSS);
        }
        let direction = if self.landing || self.rng.random_bool(0.5) {
            Direction::Decreased
        } else {
            Direction::Increased
        };
        let magnitude = self.rng.random_range(magnitude_range(sensor));
        SensorDelta::new(sensor, direction, magnitude)
    }

    /// One delta per active sensor.
    pub fn generate(&mut self) -> Vec<SensorDelta> {
        let active = self.active.clone();
        active.into_iter().map(|s| self.next_delta(s)).collect()
    }

    /// Switch to the landing sequence: only altitude and speed keep
    /// reporting, and only downwards. Returns `false` if already landing.
    pub fn enter_landing(&mut self) -> bool {
        if self.landing {
            return false;
        }
        self.landing = true;
        self.active
            .retain(|s| matches!(s, Sensor::Altitude | Sensor::Speed));
        true
    }

    /// Stop generating for `sensor`. Returns `false` if it was not active.
    pub fn stop(&mut self, sensor: Sensor) -> bool {
        let before = self.active.len();
        self.active.retain(|&s| s != sensor);
        self.active.len() != before
    }
}

/// Totals reported when the sensor simulator stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SensorReport {
    /// Deltas published.
    pub published: u64,
    /// Feedback readings consumed.
    pub consumed: u64,
    /// Time from publishing a batch to the first feedback reading after it.
    pub feedback_loop: RunStats,
}

impl fmt::Display for SensorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} published, {} consumed, feedback loop: {}",
            self.published, self.consumed, self.feedback_loop
        )
    }
}

#[derive(Debug, Default)]
struct FeedbackLoop {
    batch_sent_at: Option<Instant>,
    stats: RunStats,
}

/// Publishes generated deltas on `sensor.data` and handles `sensor.update`.
pub struct SensorSimulator<R> {
    bus: Arc<dyn Bus>,
    generator: Mutex<SensorGenerator<R>>,
    feedback: Mutex<FeedbackLoop>,
    stop: CancellationToken,
    published: AtomicU64,
    consumed: AtomicU64,
}

impl<R> fmt::Debug for SensorSimulator<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SensorSimulator")
            .field("published", &self.published)
            .field("consumed", &self.consumed)
            .finish_non_exhaustive()
    }
}

impl<R: Rng + Send + 'static> SensorSimulator<R> {
    /// Create a simulator publishing on `bus`.
    pub fn new(bus: Arc<dyn Bus>, rng: R) -> Self {
        Self {
            bus,
            generator: Mutex::new(SensorGenerator::new(rng)),
            feedback: Mutex::new(FeedbackLoop::default()),
            stop: CancellationToken::new(),
            published: AtomicU64::new(0),
            consumed: AtomicU64::new(0),
        }
    }

    fn generator(&self) -> MutexGuard<'_, SensorGenerator<R>> {
        self.generator.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn feedback(&self) -> MutexGuard<'_, FeedbackLoop> {
        self.feedback.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cancelled when the shutdown signal arrives.
    #[must_use]
    pub fn stop_token(&self) -> CancellationToken {
        self.stop.clone()
    }

    /// Sensors that still produce deltas.
    #[must_use]
    pub fn active(&self) -> Vec<Sensor> {
        self.generator().active().to_vec()
    }

    /// Totals so far.
    #[must_use]
    pub fn report(&self) -> SensorReport {
        SensorReport {
            published: self.published.load(Ordering::Relaxed),
            consumed: self.consumed.load(Ordering::Relaxed),
            feedback_loop: self.feedback().stats,
        }
    }

    /// Generate and publish one batch. Returns how many were published.
    pub async fn tick(&self) -> usize {
        let batch = self.generator().generate();
        self.feedback().batch_sent_at = Some(Instant::now());

        let mut sent = 0;
        for delta in batch {
            let message = Message::from(delta);
            match self.bus.publish(subjects::SENSOR_DATA, &message).await {
                Ok(()) => {
                    sent += 1;
                    self.published.fetch_add(1, Ordering::Relaxed);
                    debug!(message = %message, "sensor data published");
                }
                Err(e) => error!(message = %message, error = %e, "publish failed"),
            }
        }
        sent
    }

    /// Publish a batch every `period` until the shutdown signal arrives.
    pub async fn run(&self, period: Duration) -> SensorReport {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                () = self.stop.cancelled() => break,
                _ = ticker.tick() => {
                    self.tick().await;
                }
            }
        }

        let report = self.report();
        info!(%report, "sensor simulator stopped");
        report
    }

    fn on_feedback(&self, reading: &FeedbackReading) {
        self.consumed.fetch_add(1, Ordering::Relaxed);
        let mut feedback = self.feedback();
        if let Some(sent_at) = feedback.batch_sent_at.take() {
            feedback.stats.record(sent_at.elapsed());
        }
        debug!(sensor = %reading.sensor, value = reading.value, "feedback reading");
    }

    async fn on_landing(&self) {
        let entered = self.generator().enter_landing();
        if !entered {
            return;
        }
        info!("landing mode activated");
        let ack = Message::from(ModeSignal::new(ModeTarget::Landing, LANDING_ACK));
        if let Err(e) = self.bus.publish(subjects::SENSOR_DATA, &ack).await {
            error!(error = %e, "failed to acknowledge landing");
        }
    }
}

#[async_trait]
impl<R: Rng + Send + 'static> MessageHandler for SensorSimulator<R> {
    async fn handle(&self, envelope: Envelope) {
        let message = match envelope.decode() {
            Ok(message) => message,
            Err(e) => {
                warn!(subject = envelope.subject, error = %e, "malformed update, dropping");
                return;
            }
        };
        match message {
            Message::FeedbackReading(reading) => self.on_feedback(&reading),
            Message::GeneratorStop(stop) => {
                let stopped = self.generator().stop(stop.sensor);
                if stopped {
                    info!(sensor = %stop.sensor, "generator stopped");
                }
            }
            Message::ModeSignal(signal) => match signal.target {
                ModeTarget::Landing => self.on_landing().await,
                ModeTarget::Shutdown => {
                    info!("shutdown signal received");
                    self.stop.cancel();
                }
            },
            other => debug!(kind = other.kind(), "ignoring update"),
        }
    }
}

#[cfg(test)]
mod tests {
    use flight_net::MemoryBus;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn generator() -> SensorGenerator<StdRng> {
        SensorGenerator::new(StdRng::seed_from_u64(7))
    }

    fn simulator() -> (MemoryBus, SensorSimulator<StdRng>) {
        let bus = MemoryBus::recording();
        let sim = SensorSimulator::new(Arc::new(bus.clone()), StdRng::seed_from_u64(11));
        (bus, sim)
    }

    #[test]
    fn test_one_delta_per_active_sensor_in_range() {
        let mut generator = generator();
        for _ in 0..200 {
            let batch = generator.generate();
            assert_eq!(batch.len(), 4);
            for delta in batch {
                let range = magnitude_range(delta.sensor);
                let sudden = delta.sensor == Sensor::CabinPressure
                    && delta.magnitude == SUDDEN_PRESSURE_LOSS;
                assert!(sudden || range.contains(&delta.magnitude), "{delta}");
            }
        }
    }

    #[test]
    fn test_sudden_pressure_loss_happens_once() {
        let mut generator = generator();
        let losses = (0..500)
            .map(|_| generator.next_delta(Sensor::CabinPressure))
            .filter(|d| d.magnitude == SUDDEN_PRESSURE_LOSS)
            .count();
        assert_eq!(losses, 1);
    }

    #[test]
    fn test_pressure_loss_can_fire_after_first_delta() {
        let late = (0..200).any(|seed| {
            let mut generator = SensorGenerator::new(StdRng::seed_from_u64(seed));
            (0..100)
                .map(|_| generator.next_delta(Sensor::CabinPressure))
                .position(|d| d.magnitude == SUDDEN_PRESSURE_LOSS)
                .is_some_and(|at| at > 0)
        });
        assert!(late);
    }

    #[test]
    fn test_landing_keeps_altitude_and_speed_decreasing() {
        let mut generator = generator();
        assert!(generator.enter_landing());
        assert!(!generator.enter_landing());
        assert_eq!(generator.active(), &[Sensor::Altitude, Sensor::Speed]);
        for _ in 0..100 {
            for delta in generator.generate() {
                assert_eq!(delta.direction, Direction::Decreased);
            }
        }
    }

    #[test]
    fn test_stop_sensor() {
        let mut generator = generator();
        assert!(generator.stop(Sensor::Speed));
        assert!(!generator.stop(Sensor::Speed));
        assert!(!generator.active().contains(&Sensor::Speed));
        generator.enter_landing();
        assert_eq!(generator.active(), &[Sensor::Altitude]);
    }

    #[tokio::test]
    async fn test_tick_publishes_batch() {
        let (bus, sim) = simulator();
        assert_eq!(sim.tick().await, 4);
        let sent = bus.published_on(subjects::SENSOR_DATA);
        assert_eq!(sent.len(), 4);
        assert!(sent.iter().all(|m| matches!(m, Message::SensorDelta(_))));
        assert_eq!(sim.report().published, 4);
    }

    #[tokio::test]
    async fn test_landing_is_acknowledged_once() {
        let (bus, sim) = simulator();
        let signal = Envelope::new(subjects::SENSOR_UPDATE, "landingMode initiated for sensor");
        sim.handle(signal.clone()).await;
        sim.handle(signal).await;

        let acks: Vec<String> = bus
            .published_on(subjects::SENSOR_DATA)
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(acks, vec!["landingMode initiated for acknowledged"]);
        assert_eq!(sim.active(), vec![Sensor::Altitude, Sensor::Speed]);
    }

    #[tokio::test]
    async fn test_generator_stop_and_feedback() {
        let (_bus, sim) = simulator();
        sim.tick().await;
        sim.handle(Envelope::new(subjects::SENSOR_UPDATE, "shutdown speed generator"))
            .await;
        sim.handle(Envelope::new(
            subjects::SENSOR_UPDATE,
            "speed sensor new reading : 310",
        ))
        .await;
        sim.handle(Envelope::new(
            subjects::SENSOR_UPDATE,
            "altitude sensor new reading : 29500",
        ))
        .await;

        assert!(!sim.active().contains(&Sensor::Speed));
        let report = sim.report();
        assert_eq!(report.consumed, 2);
        assert_eq!(report.feedback_loop.handled, 1);
    }

    #[tokio::test]
    async fn test_shutdown_stops_run() {
        let (_bus, sim) = simulator();
        let sim = Arc::new(sim);
        let task = tokio::spawn({
            let sim = Arc::clone(&sim);
            async move { sim.run(Duration::from_millis(5)).await }
        });
        tokio::time::sleep(Duration::from_millis(30)).await;
        sim.handle(Envelope::new(
            subjects::SENSOR_UPDATE,
            "shutdownMode initiated for sensor",
        ))
        .await;

        let report = tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap();
        assert!(sim.stop_token().is_cancelled());
        assert!(report.published > 0);
    }
}
