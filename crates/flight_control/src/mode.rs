//! Flight-mode state machine.
//!
//! ```text
//! Cruising ──landingMode signal──▶ Landing ──altitude < 1000 & gear down──▶ Shutdown
//!                                     │
//!                                     └─ altitude < 2000: request gear (once)
//! ```
//!
//! Cruising → Landing is signalled; Landing → Shutdown is derived from the
//! state after every sensor delta. Every check here is a check-and-set on
//! a [`Latch`](crate::state::Latch), so the caller must hold the state lock
//! across the whole call.

use flight_net::messages::ModeTarget;

use crate::state::{Field, FlightState, Mode};

/// Below this altitude (ft) in landing mode the gear is requested.
pub const GEAR_ALTITUDE: i32 = 2000;

/// Below this altitude (ft) with the gear down the aircraft has landed.
pub const TOUCHDOWN_ALTITUDE: i32 = 1000;

/// A transition the machine just took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Cruising → Landing.
    EnteredLanding,
    /// The deploy-landing-gear command must be sent.
    GearRequested,
    /// Landing → Shutdown; every actor must be told to stop.
    Landed,
}

/// Handle an incoming mode signal.
///
/// Only `Landing` is accepted from outside, and only while cruising; a
/// repeated or late signal returns `None`.
pub fn on_signal(state: &mut FlightState, target: ModeTarget) -> Option<Transition> {
    match target {
        ModeTarget::Landing if state.mode() == Mode::Cruising => state
            .advance_mode(Mode::Landing)
            .then_some(Transition::EnteredLanding),
        ModeTarget::Landing | ModeTarget::Shutdown => None,
    }
}

/// Evaluate the derived landing transitions against the current state.
pub fn evaluate_descent(state: &mut FlightState) -> Option<Transition> {
    if state.mode() != Mode::Landing {
        return None;
    }
    let altitude = state.get(Field::Altitude);

    if altitude < GEAR_ALTITUDE
        && !state.landing_gear_deployed()
        && state.mark_landing_gear_signal_sent()
    {
        return Some(Transition::GearRequested);
    }

    if altitude < TOUCHDOWN_ALTITUDE && state.landing_gear_deployed() && state.mark_landed() {
        state.advance_mode(Mode::Shutdown);
        return Some(Transition::Landed);
    }

    None
}
