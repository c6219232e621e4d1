//! Flight state and invariant enforcement.
//!
//! [`FlightState`] is a plain record. The only way to change a numeric field
//! is [`FlightState::apply_delta`], which adds and then clamps to the
//! field's range. Booleans that may only ever go false → true are
//! [`Latch`]es. The type is not synchronised: the decision engine keeps it
//! behind a single mutex and holds that lock for each compound update.

use std::fmt;

use flight_net::messages::Sensor;
use serde::{Deserialize, Serialize};

/// Discrete flight phase. Ordered: transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Mode {
    /// Initial phase.
    Cruising,
    /// Descent in progress.
    Landing,
    /// On the ground. Terminal.
    Shutdown,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mode::Cruising => "cruising",
            Mode::Landing => "landing",
            Mode::Shutdown => "shutdown",
        })
    }
}

/// The integer fields of [`FlightState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// Feet, at least 500.
    Altitude,
    /// Percent, 0–100.
    CabinPressure,
    /// km/h, at least 5 (0 once shut down).
    Speed,
    /// Percent, 0–100.
    Rainfall,
    /// Percent, at least 0.
    EngineSpeed,
    /// Degrees, −90–90.
    TailFlapsAngle,
    /// Degrees, −90–90.
    WingFlapsAngle,
}

impl Field {
    /// Every field.
    pub const ALL: [Field; 7] = [
        Field::Altitude,
        Field::CabinPressure,
        Field::Speed,
        Field::Rainfall,
        Field::EngineSpeed,
        Field::TailFlapsAngle,
        Field::WingFlapsAngle,
    ];

    /// Inclusive `(min, max)` range of the field in the given mode.
    #[must_use]
    pub const fn bounds(self, mode: Mode) -> (i32, i32) {
        match self {
            Field::Altitude => (500, i32::MAX),
            Field::CabinPressure | Field::Rainfall => (0, 100),
            Field::Speed => match mode {
                Mode::Shutdown => (0, i32::MAX),
                Mode::Cruising | Mode::Landing => (5, i32::MAX),
            },
            Field::EngineSpeed => (0, i32::MAX),
            Field::TailFlapsAngle | Field::WingFlapsAngle => (-90, 90),
        }
    }
}

impl From<Sensor> for Field {
    fn from(sensor: Sensor) -> Self {
        match sensor {
            Sensor::Altitude => Field::Altitude,
            Sensor::CabinPressure => Field::CabinPressure,
            Sensor::Speed => Field::Speed,
            Sensor::Rain => Field::Rainfall,
        }
    }
}

/// A boolean that can go false → true exactly once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Latch(bool);

impl Latch {
    /// Whether the latch has fired.
    #[must_use]
    pub const fn is_set(self) -> bool {
        self.0
    }

    /// Check-and-set. Returns `true` only for the call that flips it.
    pub fn set(&mut self) -> bool {
        !std::mem::replace(&mut self.0, true)
    }
}

/// Sensor readings, actuator positions and one-shot transition flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlightState {
    altitude: i32,
    cabin_pressure: i32,
    speed: i32,
    rainfall: i32,
    engine_speed: i32,
    tail_flaps_angle: i32,
    wing_flaps_angle: i32,
    vents_open: bool,
    landing_gear_deployed: Latch,
    oxygen_mask_deployed: Latch,
    mode: Mode,
    landing_gear_signal_sent: Latch,
    speed_shutdown_signal_sent: Latch,
    has_landed: Latch,
}

impl Default for FlightState {
    fn default() -> Self {
        Self::new()
    }
}

impl FlightState {
    /// State at engine start: 30000 ft, 50 % pressure, 300 km/h, dry,
    /// 50 % throttle, flaps level, cruising.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            altitude: 30_000,
            cabin_pressure: 50,
            speed: 300,
            rainfall: 0,
            engine_speed: 50,
            tail_flaps_angle: 0,
            wing_flaps_angle: 0,
            vents_open: false,
            landing_gear_deployed: Latch(false),
            oxygen_mask_deployed: Latch(false),
            mode: Mode::Cruising,
            landing_gear_signal_sent: Latch(false),
            speed_shutdown_signal_sent: Latch(false),
            has_landed: Latch(false),
        }
    }

    /// Clamp `value` into the range of `field` for the current mode.
    ///
    /// Idempotent: `clamp(f, clamp(f, v)) == clamp(f, v)`.
    #[must_use]
    pub const fn clamp(&self, field: Field, value: i32) -> i32 {
        let (min, max) = field.bounds(self.mode);
        if value < min {
            min
        } else if value > max {
            max
        } else {
            value
        }
    }

    /// Current value of a field.
    #[must_use]
    pub const fn get(&self, field: Field) -> i32 {
        match field {
            Field::Altitude => self.altitude,
            Field::CabinPressure => self.cabin_pressure,
            Field::Speed => self.speed,
            Field::Rainfall => self.rainfall,
            Field::EngineSpeed => self.engine_speed,
            Field::TailFlapsAngle => self.tail_flaps_angle,
            Field::WingFlapsAngle => self.wing_flaps_angle,
        }
    }

    fn slot(&mut self, field: Field) -> &mut i32 {
        match field {
            Field::Altitude => &mut self.altitude,
            Field::CabinPressure => &mut self.cabin_pressure,
            Field::Speed => &mut self.speed,
            Field::Rainfall => &mut self.rainfall,
            Field::EngineSpeed => &mut self.engine_speed,
            Field::TailFlapsAngle => &mut self.tail_flaps_angle,
            Field::WingFlapsAngle => &mut self.wing_flaps_angle,
        }
    }

    /// Add `signed` to `field` and clamp to its range. Returns the new value.
    pub fn apply_delta(&mut self, field: Field, signed: i32) -> i32 {
        let value = self.clamp(field, self.get(field).saturating_add(signed));
        *self.slot(field) = value;
        value
    }

    /// Builder-style initialiser for a field, clamped. Intended for setting
    /// up scenarios; running code goes through [`apply_delta`](Self::apply_delta).
    #[must_use]
    pub fn with(mut self, field: Field, value: i32) -> Self {
        let current = self.get(field);
        self.apply_delta(field, value.saturating_sub(current));
        self
    }

    /// Builder-style initialiser for the mode.
    #[must_use]
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.advance_mode(mode);
        self
    }

    /// Builder-style initialiser marking the landing gear as down.
    #[must_use]
    pub fn with_landing_gear_deployed(mut self) -> Self {
        self.landing_gear_deployed.set();
        self
    }

    /// Current flight phase.
    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// Move the phase forward. Returns `false` (and changes nothing) if `to`
    /// is not strictly after the current mode.
    pub fn advance_mode(&mut self, to: Mode) -> bool {
        if to > self.mode {
            self.mode = to;
            true
        } else {
            false
        }
    }

    /// Whether the cabin vents are open.
    #[must_use]
    pub const fn vents_open(&self) -> bool {
        self.vents_open
    }

    /// Open or close the vents.
    pub fn set_vents_open(&mut self, open: bool) {
        self.vents_open = open;
    }

    /// Whether the landing gear is down.
    #[must_use]
    pub const fn landing_gear_deployed(&self) -> bool {
        self.landing_gear_deployed.is_set()
    }

    /// Lower the landing gear. Returns `true` only the first time.
    pub fn deploy_landing_gear(&mut self) -> bool {
        self.landing_gear_deployed.set()
    }

    /// Whether the oxygen masks are out.
    #[must_use]
    pub const fn oxygen_mask_deployed(&self) -> bool {
        self.oxygen_mask_deployed.is_set()
    }

    /// Drop the oxygen masks. Returns `true` only the first time.
    pub fn deploy_oxygen_mask(&mut self) -> bool {
        self.oxygen_mask_deployed.set()
    }

    /// Whether the deploy-landing-gear command has been issued.
    #[must_use]
    pub const fn landing_gear_signal_sent(&self) -> bool {
        self.landing_gear_signal_sent.is_set()
    }

    /// Check-and-set for the deploy-landing-gear command.
    pub fn mark_landing_gear_signal_sent(&mut self) -> bool {
        self.landing_gear_signal_sent.set()
    }

    /// Whether the stop-speed-generation signal has been issued.
    #[must_use]
    pub const fn speed_shutdown_signal_sent(&self) -> bool {
        self.speed_shutdown_signal_sent.is_set()
    }

    /// Check-and-set for the stop-speed-generation signal.
    pub fn mark_speed_shutdown_signal_sent(&mut self) -> bool {
        self.speed_shutdown_signal_sent.set()
    }

    /// Whether the aircraft has landed.
    #[must_use]
    pub const fn has_landed(&self) -> bool {
        self.has_landed.is_set()
    }

    /// Check-and-set for the landing.
    pub fn mark_landed(&mut self) -> bool {
        self.has_landed.set()
    }

    /// A serialisable copy for logging.
    #[must_use]
    pub fn snapshot(&self) -> FlightSnapshot {
        FlightSnapshot {
            mode: self.mode,
            altitude: self.altitude,
            cabin_pressure: self.cabin_pressure,
            speed: self.speed,
            rainfall: self.rainfall,
            engine_speed: self.engine_speed,
            tail_flaps_angle: self.tail_flaps_angle,
            wing_flaps_angle: self.wing_flaps_angle,
            vents_open: self.vents_open,
            landing_gear_deployed: self.landing_gear_deployed.is_set(),
            oxygen_mask_deployed: self.oxygen_mask_deployed.is_set(),
        }
    }
}

/// Point-in-time copy of the readings and actuator positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightSnapshot {
    pub mode: Mode,
    pub altitude: i32,
    pub cabin_pressure: i32,
    pub speed: i32,
    pub rainfall: i32,
    pub engine_speed: i32,
    pub tail_flaps_angle: i32,
    pub wing_flaps_angle: i32,
    pub vents_open: bool,
    pub landing_gear_deployed: bool,
    pub oxygen_mask_deployed: bool,
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_initial_values() {
        let state = FlightState::new();
        assert_eq!(state.get(Field::Altitude), 30_000);
        assert_eq!(state.get(Field::CabinPressure), 50);
        assert_eq!(state.get(Field::Speed), 300);
        assert_eq!(state.get(Field::Rainfall), 0);
        assert_eq!(state.get(Field::EngineSpeed), 50);
        assert_eq!(state.get(Field::TailFlapsAngle), 0);
        assert_eq!(state.mode(), Mode::Cruising);
        assert!(!state.has_landed());
    }

    #[test]
    fn test_apply_delta_clamps_each_field() {
        let mut state = FlightState::new();
        assert_eq!(state.apply_delta(Field::Altitude, -40_000), 500);
        assert_eq!(state.apply_delta(Field::CabinPressure, 80), 100);
        assert_eq!(state.apply_delta(Field::CabinPressure, -500), 0);
        assert_eq!(state.apply_delta(Field::Speed, -1000), 5);
        assert_eq!(state.apply_delta(Field::Rainfall, -1), 0);
        assert_eq!(state.apply_delta(Field::EngineSpeed, -51), 0);
        assert_eq!(state.apply_delta(Field::TailFlapsAngle, 200), 90);
        assert_eq!(state.apply_delta(Field::WingFlapsAngle, -200), -90);
    }

    #[test]
    fn test_speed_floor_drops_in_shutdown() {
        let mut state = FlightState::new().with_mode(Mode::Shutdown);
        assert_eq!(state.apply_delta(Field::Speed, -1000), 0);
    }

    #[test]
    fn test_mode_never_moves_backwards() {
        let mut state = FlightState::new();
        assert!(state.advance_mode(Mode::Landing));
        assert!(!state.advance_mode(Mode::Landing));
        assert!(!state.advance_mode(Mode::Cruising));
        assert!(state.advance_mode(Mode::Shutdown));
        assert_eq!(state.mode(), Mode::Shutdown);
    }

    #[test]
    fn test_latch_fires_once() {
        let mut latch = Latch::default();
        assert!(latch.set());
        assert!(!latch.set());
        assert!(latch.is_set());
    }

    #[test]
    fn test_with_clamps() {
        let state = FlightState::new().with(Field::Altitude, 100);
        assert_eq!(state.get(Field::Altitude), 500);
    }

    fn any_field() -> impl Strategy<Value = Field> {
        prop::sample::select(Field::ALL.to_vec())
    }

    fn any_mode() -> impl Strategy<Value = Mode> {
        prop::sample::select(vec![Mode::Cruising, Mode::Landing, Mode::Shutdown])
    }

    proptest! {
        #[test]
        fn apply_delta_stays_in_range(field in any_field(), mode in any_mode(), delta in any::<i32>()) {
            let mut state = FlightState::new().with_mode(mode);
            let value = state.apply_delta(field, delta);
            let (min, max) = field.bounds(mode);
            prop_assert!(value >= min && value <= max);
            prop_assert_eq!(state.get(field), value);
        }

        #[test]
        fn clamp_is_idempotent(field in any_field(), mode in any_mode(), value in any::<i32>()) {
            let state = FlightState::new().with_mode(mode);
            let once = state.clamp(field, value);
            prop_assert_eq!(state.clamp(field, once), once);
        }
    }
}
