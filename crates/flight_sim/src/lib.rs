//! # flight_sim
//!
//! The two peripheral actors of the flight control simulation.
//!
//! - [`sensor`] — Generates random sensor deltas, follows the landing
//!   sequence and counts the engine's feedback readings.
//! - [`actuator`] — Applies commands and acknowledges each actuator.
//!
//! Both implement [`flight_system::MessageHandler`] for their update
//! subject and stop on a shutdown signal.

pub mod actuator;
pub mod sensor;

pub use actuator::{ActuatorReport, ActuatorSimulator, acknowledgements};
pub use sensor::{SensorGenerator, SensorReport, SensorSimulator};
