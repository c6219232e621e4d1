//! # flight_app
//!
//! Shared wiring for the flight control processes.
//!
//! - [`cli`] — Common command-line flags and logging set-up.
//! - [`control`] — The controller lifecycle: landing scheduler, state
//!   monitor, engine actor, shutdown summary.
//! - [`actors`] — The sensor and actuator simulator lifecycles.
//! - [`simulation`] — All three actors on one in-memory bus.

pub mod actors;
pub mod cli;
pub mod control;
pub mod simulation;
