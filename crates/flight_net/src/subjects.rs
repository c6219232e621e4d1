//! Subject hierarchy.
//!
//! All subjects are prefixed with the exchange name `flight_control` to
//! namespace within a shared NATS cluster. Each role has a `data` subject
//! (role → engine) and an `update` subject (engine → role).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Root prefix for all flight control subjects.
pub const PREFIX: &str = "flight_control";

/// Sensor readings and acknowledgements. Sensors → Engine.
pub const SENSOR_DATA: &str = "flight_control.sensor.data";

/// Actuator acknowledgements. Actuators → Engine.
pub const ACTUATOR_DATA: &str = "flight_control.actuator.data";

/// Feedback readings and mode signals. Engine → Sensors.
pub const SENSOR_UPDATE: &str = "flight_control.sensor.update";

/// Actuator commands and mode signals. Engine → Actuators.
pub const ACTUATOR_UPDATE: &str = "flight_control.actuator.update";

/// Everything producers send to the engine.
pub const ALL_DATA: &str = "flight_control.*.data";

/// The two producer roles that talk to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// The sensor simulator.
    Sensor,
    /// The actuator simulator.
    Actuator,
}

impl Role {
    /// The subject token for this role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Role::Sensor => "sensor",
            Role::Actuator => "actuator",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Subject a role publishes its data on.
///
/// `flight_control.<role>.data`
#[must_use]
pub const fn data(role: Role) -> &'static str {
    match role {
        Role::Sensor => SENSOR_DATA,
        Role::Actuator => ACTUATOR_DATA,
    }
}

/// Subject the engine publishes a role's updates on.
///
/// `flight_control.<role>.update`
#[must_use]
pub const fn update(role: Role) -> &'static str {
    match role {
        Role::Sensor => SENSOR_UPDATE,
        Role::Actuator => ACTUATOR_UPDATE,
    }
}

/// Recover the role from a `flight_control.<role>.<kind>` subject.
#[must_use]
pub fn role_of(subject: &str) -> Option<Role> {
    let mut tokens = subject.split('.');
    if tokens.next() != Some(PREFIX) {
        return None;
    }
    match tokens.next() {
        Some("sensor") => Some(Role::Sensor),
        Some("actuator") => Some(Role::Actuator),
        _ => None,
    }
}

/// NATS-style subject matching.
///
/// `*` matches exactly one token, `>` matches one or more trailing tokens.
#[must_use]
pub fn subject_matches(pattern: &str, subject: &str) -> bool {
    let mut pattern_tokens = pattern.split('.');
    let mut subject_tokens = subject.split('.');
    loop {
        match (pattern_tokens.next(), subject_tokens.next()) {
            (Some(">"), Some(_)) => return true,
            (Some("*"), Some(_)) => {}
            (Some(p), Some(s)) if p == s => {}
            (None, None) => return true,
            _ => return false,
        }
    }
}
