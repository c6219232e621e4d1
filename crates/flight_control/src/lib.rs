//! # flight_control
//!
//! The flight control core: the shared [`FlightState`], the pure
//! [`control_law`], the landing [`mode`] state machine and the
//! [`DecisionEngine`] that ties them to the bus.
//!
//! - [`state`] — Readings, actuator positions, one-shot latches and the
//!   clamp-only mutation primitive.
//! - [`control_law`] — Sensor delta → actuator command, actuator ack →
//!   sensor feedback.
//! - [`mode`] — Cruising → Landing → Shutdown.
//! - [`engine`] — Lock, compute, unlock, publish.

pub mod control_law;
pub mod engine;
pub mod mode;
pub mod state;

pub use engine::{DecisionEngine, EngineStats, Outcome};
pub use mode::Transition;
pub use state::{Field, FlightSnapshot, FlightState, Latch, Mode};
