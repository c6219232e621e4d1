//! The per-message handler seam.

use async_trait::async_trait;
use flight_net::Envelope;

/// Handles one delivery. Implementations must finish in bounded time and
/// must never hold a lock across a bus call.
///
/// Every delivery is handled on its own task, so implementations are
/// called concurrently.
#[async_trait]
pub trait MessageHandler: Send + Sync + 'static {
    /// Handle one envelope. Failures are logged by the implementation;
    /// nothing propagates back into the runner.
    async fn handle(&self, envelope: Envelope);
}
