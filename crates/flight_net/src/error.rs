//! Network-layer error types.

/// Errors that can occur during bus operations.
#[derive(Debug, thiserror::Error)]
pub enum NetError {
    /// NATS subscription error.
    #[error("NATS subscribe error: {0}")]
    Subscribe(#[from] async_nats::SubscribeError),

    /// NATS publish error.
    #[error("NATS publish error: {0}")]
    Publish(#[from] async_nats::PublishError),

    /// NATS connection error.
    #[error("NATS connection error: {0}")]
    Connect(#[from] async_nats::ConnectError),

    /// NATS flush error on close.
    #[error("NATS flush error: {0}")]
    Flush(String),

    /// The in-memory bus was closed.
    #[error("bus is closed")]
    Closed,
}

/// Errors raised while decoding a text payload into a [`Message`](crate::Message).
///
/// Parse errors never cross the bus: receivers log and drop the payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The payload had no tokens.
    #[error("empty message")]
    Empty,

    /// The payload was not valid UTF-8.
    #[error("payload is not valid UTF-8")]
    InvalidUtf8,

    /// The payload had the wrong number of whitespace-separated tokens.
    #[error("expected {expected} fields, found {found}")]
    FieldCount {
        /// Number of tokens the form requires.
        expected: usize,
        /// Number of tokens present.
        found: usize,
    },

    /// A sensor name that is not one of the known sensors.
    #[error("unknown sensor: {0}")]
    UnknownSensor(String),

    /// An actuator name that is not one of the known actuators.
    #[error("unknown actuator: {0}")]
    UnknownActuator(String),

    /// A delta direction other than `increased`/`decreased`.
    #[error("unknown direction: {0}")]
    UnknownDirection(String),

    /// A command verb other than `increase`/`decrease`/`open`/`close`/`deploy`.
    #[error("unknown verb: {0}")]
    UnknownVerb(String),

    /// The magnitude was not a non-negative integer.
    #[error("invalid magnitude: {0}")]
    InvalidMagnitude(String),

    /// An acknowledgement whose verb the actuator cannot perform.
    #[error("{actuator} cannot {verb}")]
    VerbMismatch {
        /// Actuator named in the acknowledgement.
        actuator: crate::messages::Actuator,
        /// Verb it reported.
        verb: crate::messages::Verb,
    },

    /// Structural problem not covered above (missing brackets, wrong keyword).
    #[error("malformed message: {0}")]
    Malformed(String),
}
