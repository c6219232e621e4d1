//! Message types exchanged between the engine and the simulators.
//!
//! Every payload on the bus is whitespace-tokenised UTF-8 text. The text is
//! parsed once at the boundary (see [`codec`](crate::codec)) into a
//! [`Message`]; everything downstream operates on the typed form. `Display`
//! produces the exact wire text.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

// ── Vocabulary ──────────────────────────────────────────────────────────────

/// The sensors the simulation reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sensor {
    /// Altitude in feet.
    Altitude,
    /// Cabin pressure in percent.
    CabinPressure,
    /// Air speed in km/h.
    Speed,
    /// Rainfall magnitude in percent.
    Rain,
}

impl Sensor {
    /// Every sensor, in generation order.
    pub const ALL: [Sensor; 4] = [
        Sensor::Altitude,
        Sensor::Speed,
        Sensor::CabinPressure,
        Sensor::Rain,
    ];

    /// Wire name of the sensor.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Sensor::Altitude => "altitude",
            Sensor::CabinPressure => "cabinPressure",
            Sensor::Speed => "speed",
            Sensor::Rain => "rain",
        }
    }
}

impl fmt::Display for Sensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sensor {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "altitude" => Ok(Sensor::Altitude),
            "cabinPressure" => Ok(Sensor::CabinPressure),
            "speed" => Ok(Sensor::Speed),
            "rain" => Ok(Sensor::Rain),
            other => Err(ParseError::UnknownSensor(other.to_string())),
        }
    }
}

/// The actuators the engine can command.
///
/// `Vents`, `OxygenMask` and `LandingGear` are switch-like: they carry no
/// meaningful magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Actuator {
    /// Engine throttle in percent.
    EngineSpeed,
    /// Tail flap angle in degrees.
    TailFlapsAngle,
    /// Wing flap angle in degrees.
    WingFlapsAngle,
    /// Cabin vents (open/close).
    Vents,
    /// Emergency oxygen masks (deploy only).
    OxygenMask,
    /// Landing gear (deploy only).
    LandingGear,
}

impl Actuator {
    /// Wire name of the actuator.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Actuator::EngineSpeed => "engineSpeed",
            Actuator::TailFlapsAngle => "tailFlapsAngle",
            Actuator::WingFlapsAngle => "wingFlapsAngle",
            Actuator::Vents => "vents",
            Actuator::OxygenMask => "oxygenMask",
            Actuator::LandingGear => "landingGear",
        }
    }

    /// The sensor whose reading changes when this actuator moves, if the
    /// engine republishes one.
    #[must_use]
    pub const fn feedback_sensor(self) -> Option<Sensor> {
        match self {
            Actuator::EngineSpeed => Some(Sensor::Speed),
            Actuator::TailFlapsAngle | Actuator::WingFlapsAngle => Some(Sensor::Altitude),
            Actuator::Vents => Some(Sensor::CabinPressure),
            Actuator::OxygenMask | Actuator::LandingGear => None,
        }
    }

    /// Whether `verb` is a movement this actuator can report.
    #[must_use]
    pub const fn accepts(self, verb: Verb) -> bool {
        match self {
            Actuator::EngineSpeed | Actuator::TailFlapsAngle | Actuator::WingFlapsAngle => {
                matches!(verb, Verb::Increase | Verb::Decrease)
            }
            Actuator::Vents => matches!(verb, Verb::Open | Verb::Close),
            Actuator::LandingGear => matches!(verb, Verb::Deploy),
            Actuator::OxygenMask => matches!(verb, Verb::Decrease | Verb::Deploy),
        }
    }
}

impl fmt::Display for Actuator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Actuator {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "engineSpeed" => Ok(Actuator::EngineSpeed),
            "tailFlapsAngle" => Ok(Actuator::TailFlapsAngle),
            "wingFlapsAngle" => Ok(Actuator::WingFlapsAngle),
            "vents" => Ok(Actuator::Vents),
            "oxygenMask" => Ok(Actuator::OxygenMask),
            "landingGear" => Ok(Actuator::LandingGear),
            other => Err(ParseError::UnknownActuator(other.to_string())),
        }
    }
}

/// Direction of a sensor delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// `increased`
    Increased,
    /// `decreased`
    Decreased,
}

impl Direction {
    /// Wire name of the direction.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Direction::Increased => "increased",
            Direction::Decreased => "decreased",
        }
    }

    /// The command verb that counteracts a change in this direction.
    #[must_use]
    pub const fn counter(self) -> Verb {
        match self {
            Direction::Increased => Verb::Decrease,
            Direction::Decreased => Verb::Increase,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "increased" => Ok(Direction::Increased),
            "decreased" => Ok(Direction::Decreased),
            other => Err(ParseError::UnknownDirection(other.to_string())),
        }
    }
}

/// Verb of an actuator command or acknowledgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verb {
    /// `increase`
    Increase,
    /// `decrease`
    Decrease,
    /// `open` (vents)
    Open,
    /// `close` (vents)
    Close,
    /// `deploy` (landing gear)
    Deploy,
}

impl Verb {
    /// Wire name of the verb.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Verb::Increase => "increase",
            Verb::Decrease => "decrease",
            Verb::Open => "open",
            Verb::Close => "close",
            Verb::Deploy => "deploy",
        }
    }

    /// Apply the verb's sign to a non-negative magnitude.
    ///
    /// Only `Decrease` is negative; switch verbs keep the magnitude as-is.
    #[must_use]
    pub const fn signed(self, magnitude: i32) -> i32 {
        match self {
            Verb::Decrease => -magnitude,
            _ => magnitude,
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verb {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "increase" => Ok(Verb::Increase),
            "decrease" => Ok(Verb::Decrease),
            "open" => Ok(Verb::Open),
            "close" => Ok(Verb::Close),
            "deploy" => Ok(Verb::Deploy),
            other => Err(ParseError::UnknownVerb(other.to_string())),
        }
    }
}

/// Target phase of a mode signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModeTarget {
    /// Begin the descent.
    Landing,
    /// The aircraft is down; every actor stops.
    Shutdown,
}

impl ModeTarget {
    /// The keyword whose presence marks a payload as this signal.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            ModeTarget::Landing => "landingMode",
            ModeTarget::Shutdown => "shutdownMode",
        }
    }
}

// ── Payloads ────────────────────────────────────────────────────────────────

/// A relative change of one sensor reading.
///
/// `altitude decreased 3000`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorDelta {
    /// The sensor that changed.
    pub sensor: Sensor,
    /// Whether it went up or down.
    pub direction: Direction,
    /// Non-negative size of the change.
    pub magnitude: i32,
}

impl SensorDelta {
    /// Create a new delta.
    #[must_use]
    pub const fn new(sensor: Sensor, direction: Direction, magnitude: i32) -> Self {
        Self {
            sensor,
            direction,
            magnitude,
        }
    }

    /// The change with its sign applied.
    #[must_use]
    pub const fn signed(&self) -> i32 {
        match self.direction {
            Direction::Increased => self.magnitude,
            Direction::Decreased => -self.magnitude,
        }
    }
}

impl fmt::Display for SensorDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.sensor, self.direction, self.magnitude)
    }
}

/// A command from the engine to one or more actuators.
///
/// `increase [engineSpeed,tailFlapsAngle,wingFlapsAngle] by 15`,
/// `open [vents]`, `deploy [landingGear] to 1`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActuatorCommand {
    /// What to do.
    pub verb: Verb,
    /// Which actuators to do it to.
    pub actuators: Vec<Actuator>,
    /// Size of the adjustment. Zero for open/close.
    pub magnitude: i32,
}

impl ActuatorCommand {
    /// An increase/decrease of the given actuators.
    #[must_use]
    pub fn adjust(verb: Verb, actuators: &[Actuator], magnitude: i32) -> Self {
        Self {
            verb,
            actuators: actuators.to_vec(),
            magnitude,
        }
    }

    /// Open or close the cabin vents.
    #[must_use]
    pub fn vents(open: bool) -> Self {
        Self {
            verb: if open { Verb::Open } else { Verb::Close },
            actuators: vec![Actuator::Vents],
            magnitude: 0,
        }
    }

    /// Deploy the landing gear.
    #[must_use]
    pub fn deploy_landing_gear() -> Self {
        Self {
            verb: Verb::Deploy,
            actuators: vec![Actuator::LandingGear],
            magnitude: 1,
        }
    }
}

impl fmt::Display for ActuatorCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [", self.verb)?;
        for (i, actuator) in self.actuators.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            f.write_str(actuator.as_str())?;
        }
        f.write_str("]")?;
        match self.verb {
            Verb::Open | Verb::Close => Ok(()),
            Verb::Deploy => write!(f, " to {}", self.magnitude),
            Verb::Increase | Verb::Decrease => write!(f, " by {}", self.magnitude),
        }
    }
}

/// One actuator reporting that it applied (its share of) a command.
///
/// `engineSpeed decrease by 15`, `vents open by 10`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActuatorAck {
    /// The actuator that moved.
    pub actuator: Actuator,
    /// The verb it applied.
    pub verb: Verb,
    /// Non-negative size of the movement.
    pub magnitude: i32,
}

impl ActuatorAck {
    /// Create a new acknowledgement.
    #[must_use]
    pub const fn new(actuator: Actuator, verb: Verb, magnitude: i32) -> Self {
        Self {
            actuator,
            verb,
            magnitude,
        }
    }

    /// The movement with the verb's sign applied.
    #[must_use]
    pub const fn signed(&self) -> i32 {
        self.verb.signed(self.magnitude)
    }
}

impl fmt::Display for ActuatorAck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} by {}", self.actuator, self.verb, self.magnitude)
    }
}

/// A flight-phase signal.
///
/// `landingMode initiated for sensor`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeSignal {
    /// The phase being entered.
    pub target: ModeTarget,
    /// Free-text addressee or remark.
    pub subject: String,
}

impl ModeSignal {
    /// Create a new mode signal.
    #[must_use]
    pub fn new(target: ModeTarget, subject: impl Into<String>) -> Self {
        Self {
            target,
            subject: subject.into(),
        }
    }
}

impl fmt::Display for ModeSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} initiated for {}", self.target.keyword(), self.subject)
    }
}

/// The absolute value of a sensor after the engine folded actuator feedback in.
///
/// `altitude sensor new reading : 27000`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackReading {
    /// The sensor being reported.
    pub sensor: Sensor,
    /// Its current value.
    pub value: i32,
}

impl fmt::Display for FeedbackReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} sensor new reading : {}", self.sensor, self.value)
    }
}

/// Tells the sensor simulator to stop generating readings for one sensor.
///
/// `shutdown speed generator`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorStop {
    /// The sensor to silence.
    pub sensor: Sensor,
}

impl fmt::Display for GeneratorStop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "shutdown {} generator", self.sensor)
    }
}

// ── Envelope sum type ───────────────────────────────────────────────────────

/// Every message that travels on the bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Message {
    /// Sensors → Engine.
    SensorDelta(SensorDelta),
    /// Engine → Actuators.
    ActuatorCommand(ActuatorCommand),
    /// Actuators → Engine.
    ActuatorAck(ActuatorAck),
    /// Engine → Sensors/Actuators, and the sensors' landing acknowledgement.
    ModeSignal(ModeSignal),
    /// Engine → Sensors.
    FeedbackReading(FeedbackReading),
    /// Engine → Sensors.
    GeneratorStop(GeneratorStop),
}

impl Message {
    /// Short name of the variant, for log fields.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Message::SensorDelta(_) => "sensor_delta",
            Message::ActuatorCommand(_) => "actuator_command",
            Message::ActuatorAck(_) => "actuator_ack",
            Message::ModeSignal(_) => "mode_signal",
            Message::FeedbackReading(_) => "feedback_reading",
            Message::GeneratorStop(_) => "generator_stop",
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::SensorDelta(m) => m.fmt(f),
            Message::ActuatorCommand(m) => m.fmt(f),
            Message::ActuatorAck(m) => m.fmt(f),
            Message::ModeSignal(m) => m.fmt(f),
            Message::FeedbackReading(m) => m.fmt(f),
            Message::GeneratorStop(m) => m.fmt(f),
        }
    }
}

impl FromStr for Message {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        crate::codec::parse(s)
    }
}

impl From<SensorDelta> for Message {
    fn from(m: SensorDelta) -> Self {
        Message::SensorDelta(m)
    }
}

impl From<ActuatorCommand> for Message {
    fn from(m: ActuatorCommand) -> Self {
        Message::ActuatorCommand(m)
    }
}

impl From<ActuatorAck> for Message {
    fn from(m: ActuatorAck) -> Self {
        Message::ActuatorAck(m)
    }
}

impl From<ModeSignal> for Message {
    fn from(m: ModeSignal) -> Self {
        Message::ModeSignal(m)
    }
}

impl From<FeedbackReading> for Message {
    fn from(m: FeedbackReading) -> Self {
        Message::FeedbackReading(m)
    }
}

impl From<GeneratorStop> for Message {
    fn from(m: GeneratorStop) -> Self {
        Message::GeneratorStop(m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_altitude_command_text() {
        let cmd = ActuatorCommand::adjust(
            Verb::Increase,
            &[
                Actuator::EngineSpeed,
                Actuator::TailFlapsAngle,
                Actuator::WingFlapsAngle,
            ],
            15,
        );
        assert_eq!(
            cmd.to_string(),
            "increase [engineSpeed,tailFlapsAngle,wingFlapsAngle] by 15"
        );
    }

    #[test]
    fn test_switch_command_text() {
        assert_eq!(ActuatorCommand::vents(true).to_string(), "open [vents]");
        assert_eq!(ActuatorCommand::vents(false).to_string(), "close [vents]");
        assert_eq!(
            ActuatorCommand::deploy_landing_gear().to_string(),
            "deploy [landingGear] to 1"
        );
    }

    #[test]
    fn test_signal_and_feedback_text() {
        let signal = ModeSignal::new(ModeTarget::Shutdown, "actuators");
        assert_eq!(signal.to_string(), "shutdownMode initiated for actuators");

        let reading = FeedbackReading {
            sensor: Sensor::Altitude,
            value: 27000,
        };
        assert_eq!(reading.to_string(), "altitude sensor new reading : 27000");

        let stop = GeneratorStop {
            sensor: Sensor::Speed,
        };
        assert_eq!(stop.to_string(), "shutdown speed generator");
    }

    #[test]
    fn test_signed_values() {
        let delta = SensorDelta::new(Sensor::Altitude, Direction::Decreased, 3000);
        assert_eq!(delta.signed(), -3000);
        assert_eq!(ActuatorAck::new(Actuator::EngineSpeed, Verb::Decrease, 5).signed(), -5);
        assert_eq!(ActuatorAck::new(Actuator::Vents, Verb::Open, 10).signed(), 10);
    }

    #[test]
    fn test_direction_counter_verb() {
        assert_eq!(Direction::Increased.counter(), Verb::Decrease);
        assert_eq!(Direction::Decreased.counter(), Verb::Increase);
    }

    #[test]
    fn test_feedback_sensor_mapping() {
        assert_eq!(Actuator::EngineSpeed.feedback_sensor(), Some(Sensor::Speed));
        assert_eq!(Actuator::WingFlapsAngle.feedback_sensor(), Some(Sensor::Altitude));
        assert_eq!(Actuator::Vents.feedback_sensor(), Some(Sensor::CabinPressure));
        assert_eq!(Actuator::LandingGear.feedback_sensor(), None);
    }

    #[test]
    fn test_actuator_verb_pairs() {
        assert!(Actuator::EngineSpeed.accepts(Verb::Increase));
        assert!(!Actuator::EngineSpeed.accepts(Verb::Open));
        assert!(Actuator::Vents.accepts(Verb::Close));
        assert!(!Actuator::Vents.accepts(Verb::Increase));
        assert!(Actuator::LandingGear.accepts(Verb::Deploy));
        assert!(!Actuator::LandingGear.accepts(Verb::Decrease));
        assert!(Actuator::OxygenMask.accepts(Verb::Decrease));
        assert!(!Actuator::OxygenMask.accepts(Verb::Open));
    }
}
