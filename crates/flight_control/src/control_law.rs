//! Control law.
//!
//! Pure functions from (sensor delta, post-delta state, mode) to an actuator
//! command, and from an actuator acknowledgement to the sensor fields it
//! moves. No I/O and no locking: callers pass a state they already hold
//! exclusively.
//!
//! All arithmetic is integer arithmetic truncating toward zero, so
//! `(7 / 5) * 10 == 10` and `(-7 / 5) * 10 == -10`. Step products saturate
//! and the field clamp then pins them to range.

use flight_net::messages::{Actuator, ActuatorAck, ActuatorCommand, Sensor, SensorDelta, Verb};

use crate::state::{Field, FlightState, Mode};

/// Actuators moved together to change altitude.
pub const FLIGHT_SURFACES: [Actuator; 3] = [
    Actuator::EngineSpeed,
    Actuator::TailFlapsAngle,
    Actuator::WingFlapsAngle,
];

/// Flight surfaces plus the oxygen masks, for the decompression emergency.
pub const EMERGENCY_ACTUATORS: [Actuator; 4] = [
    Actuator::EngineSpeed,
    Actuator::TailFlapsAngle,
    Actuator::WingFlapsAngle,
    Actuator::OxygenMask,
];

/// Altitude change (ft) per step of surface correction.
pub const ALTITUDE_STEP_FT: i32 = 1000;
/// Surface correction (percent or degrees) per altitude step.
pub const SURFACE_STEP: i32 = 5;

/// Open the vents above this cabin pressure.
pub const PRESSURE_HIGH: i32 = 70;
/// Close the vents below this cabin pressure.
pub const PRESSURE_LOW: i32 = 30;
/// Below this cabin pressure the masks drop.
pub const PRESSURE_CRITICAL: i32 = 10;
/// Surface reduction issued with the oxygen masks.
pub const EMERGENCY_DESCENT: i32 = 50;

/// Throttle back above this speed.
pub const SPEED_HIGH: i32 = 400;
/// Throttle up below this speed.
pub const SPEED_LOW: i32 = 200;
/// Throttle step for speed corrections while cruising.
pub const SPEED_TRIM: i32 = 10;
/// Throttle step per speed reading while landing.
pub const LANDING_SPEED_TRIM: i32 = 5;

/// Rainfall from which the throttle is adjusted.
pub const RAIN_THRESHOLD: i32 = 10;
/// Throttle change per 10 % of rainfall.
pub const RAIN_STEP: i32 = 2;

/// Throttle change that maps to one speed step.
pub const ENGINE_STEP: i32 = 5;
/// Speed change (km/h) per throttle step.
pub const SPEED_PER_ENGINE_STEP: i32 = 10;
/// Flap change (degrees) that maps to one altitude step.
pub const FLAP_STEP: i32 = 5;
/// Altitude change (ft) per flap step.
pub const ALTITUDE_PER_FLAP_STEP: i32 = 500;
/// Cabin pressure change when the vents open or close.
pub const VENT_PRESSURE_STEP: i32 = 10;
/// Cabin pressure restored by the oxygen system.
pub const MASK_PRESSURE: i32 = 50;

/// Compute the actuator command for a sensor delta.
///
/// `state` is the state *after* the delta was applied; `mode` selects the
/// cruising or landing variant. Returns `None` when no actuation is needed.
#[must_use]
pub fn compute_command(
    delta: &SensorDelta,
    state: &FlightState,
    mode: Mode,
) -> Option<ActuatorCommand> {
    match mode {
        Mode::Cruising => cruising_command(delta, state),
        Mode::Landing => landing_command(delta, state),
        Mode::Shutdown => None,
    }
}

fn surface_correction(magnitude: i32) -> i32 {
    (magnitude / ALTITUDE_STEP_FT) * SURFACE_STEP
}

fn cruising_command(delta: &SensorDelta, state: &FlightState) -> Option<ActuatorCommand> {
    match delta.sensor {
        Sensor::Altitude => {
            let magnitude = surface_correction(delta.magnitude);
            (magnitude > 0).then(|| {
                ActuatorCommand::adjust(delta.direction.counter(), &FLIGHT_SURFACES, magnitude)
            })
        }
        Sensor::CabinPressure => {
            let pressure = state.get(Field::CabinPressure);
            if pressure > PRESSURE_HIGH {
                Some(ActuatorCommand::vents(true))
            } else if pressure < PRESSURE_LOW && pressure > PRESSURE_CRITICAL {
                Some(ActuatorCommand::vents(false))
            } else if pressure < PRESSURE_CRITICAL && !state.oxygen_mask_deployed() {
                Some(ActuatorCommand::adjust(
                    Verb::Decrease,
                    &EMERGENCY_ACTUATORS,
                    EMERGENCY_DESCENT,
                ))
            } else {
                None
            }
        }
        Sensor::Speed => {
            let speed = state.get(Field::Speed);
            if speed > SPEED_HIGH {
                Some(ActuatorCommand::adjust(
                    Verb::Decrease,
                    &[Actuator::EngineSpeed],
                    SPEED_TRIM,
                ))
            } else if speed < SPEED_LOW {
                Some(ActuatorCommand::adjust(
                    Verb::Increase,
                    &[Actuator::EngineSpeed],
                    SPEED_TRIM,
                ))
            } else {
                None
            }
        }
        Sensor::Rain => {
            let rainfall = state.get(Field::Rainfall);
            (rainfall >= RAIN_THRESHOLD).then(|| {
                ActuatorCommand::adjust(
                    delta.direction.counter(),
                    &[Actuator::EngineSpeed],
                    (rainfall / 10) * RAIN_STEP,
                )
            })
        }
    }
}

fn landing_command(delta: &SensorDelta, state: &FlightState) -> Option<ActuatorCommand> {
    match delta.sensor {
        Sensor::Altitude => {
            let (floor, _) = Field::Altitude.bounds(Mode::Landing);
            let magnitude = surface_correction(delta.magnitude);
            (state.get(Field::Altitude) > floor && magnitude > 0)
                .then(|| ActuatorCommand::adjust(Verb::Decrease, &FLIGHT_SURFACES, magnitude))
        }
        Sensor::Speed => (state.get(Field::Speed) > 0).then(|| {
            ActuatorCommand::adjust(
                Verb::Decrease,
                &[Actuator::EngineSpeed],
                LANDING_SPEED_TRIM,
            )
        }),
        Sensor::CabinPressure | Sensor::Rain => None,
    }
}

/// Fold an actuator acknowledgement back into the sensor fields.
///
/// Returns the sensor whose new reading should be republished, if any.
pub fn apply_feedback(state: &mut FlightState, ack: &ActuatorAck) -> Option<Sensor> {
    let change = ack.signed();
    match ack.actuator {
        Actuator::EngineSpeed => {
            state.apply_delta(Field::EngineSpeed, change);
            state.apply_delta(
                Field::Speed,
                (change / ENGINE_STEP).saturating_mul(SPEED_PER_ENGINE_STEP),
            );
        }
        Actuator::TailFlapsAngle | Actuator::WingFlapsAngle => {
            let field = if ack.actuator == Actuator::TailFlapsAngle {
                Field::TailFlapsAngle
            } else {
                Field::WingFlapsAngle
            };
            state.apply_delta(field, change);
            state.apply_delta(
                Field::Altitude,
                (change / FLAP_STEP).saturating_mul(ALTITUDE_PER_FLAP_STEP),
            );
        }
        Actuator::Vents => match ack.verb {
            Verb::Open => {
                state.set_vents_open(true);
                state.apply_delta(Field::CabinPressure, -VENT_PRESSURE_STEP);
            }
            Verb::Close => {
                state.set_vents_open(false);
                state.apply_delta(Field::CabinPressure, VENT_PRESSURE_STEP);
            }
            Verb::Increase | Verb::Decrease | Verb::Deploy => return None,
        },
        Actuator::OxygenMask => {
            state.deploy_oxygen_mask();
            let pressure = state.get(Field::CabinPressure);
            state.apply_delta(Field::CabinPressure, MASK_PRESSURE - pressure);
            state.set_vents_open(false);
        }
        Actuator::LandingGear => {
            state.deploy_landing_gear();
        }
    }
    ack.actuator.feedback_sensor()
}
