//! # flight_system
//!
//! Actor runtime for the flight control simulation.
//!
//! This crate provides the harness that turns a [`MessageHandler`] into a
//! bus-connected actor. Each actor:
//!
//! 1. Connects to the bus (or is handed an in-memory one).
//! 2. Subscribes to its inbound subject pattern.
//! 3. Dispatches every delivery onto a bounded [`WorkerPool`].
//! 4. On cancellation, stops accepting, drains in-flight handlers and
//!    returns its [`RunStats`].
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use async_trait::async_trait;
//! use flight_net::{Envelope, MemoryBus};
//! use flight_system::{ActorConfig, ActorRunner, MessageHandler};
//! use tokio_util::sync::CancellationToken;
//!
//! struct Echo;
//!
//! #[async_trait]
//! impl MessageHandler for Echo {
//!     async fn handle(&self, envelope: Envelope) {
//!         println!("{}", envelope.subject);
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let runner = ActorRunner::new(ActorConfig::new("echo").with_workers(4));
//!     let bus = Arc::new(MemoryBus::new());
//!     let cancel = CancellationToken::new();
//!     let _stats = runner
//!         .run(bus, "flight_control.>", Arc::new(Echo), cancel)
//!         .await;
//! }
//! ```

pub mod config;
pub mod error;
pub mod handler;
pub mod pool;
pub mod runner;
pub mod stats;

pub use config::ActorConfig;
pub use error::RunnerError;
pub use handler::MessageHandler;
pub use pool::WorkerPool;
pub use runner::ActorRunner;
pub use stats::RunStats;
