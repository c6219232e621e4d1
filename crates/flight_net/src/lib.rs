//! # flight_net
//!
//! Bus transport layer for the flight control simulation.
//!
//! This crate provides:
//!
//! - [`subjects`] — Subject hierarchy constants, builders and pattern matching.
//! - [`messages`] — The typed message model exchanged between actors.
//! - [`codec`] — UTF-8 text encoding/decoding of messages.
//! - [`bus`] — The [`Bus`] trait and the in-memory implementation.
//! - [`connection`] — The NATS-backed bus.
//! - [`error`] — Network-layer and parse error types.

pub mod bus;
pub mod codec;
pub mod connection;
pub mod error;
pub mod messages;
pub mod subjects;

pub use bus::{Bus, Envelope, MemoryBus, Subscription};
pub use codec::{decode, encode};
pub use connection::NatsBus;
pub use error::{NetError, ParseError};
pub use messages::Message;
pub use subjects::Role;
