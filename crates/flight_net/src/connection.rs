//! NATS connection management.
//!
//! Provides a thin [`Bus`] implementation over `async-nats` with
//! flight-control defaults.

use async_trait::async_trait;
use futures::StreamExt;
use tracing::info;

use crate::bus::{Bus, Envelope, Subscription};
use crate::codec;
use crate::error::NetError;
use crate::messages::Message;

/// Default NATS server URL.
pub const DEFAULT_NATS_URL: &str = "nats://localhost:4222";

/// The environment variable used to override the NATS URL.
pub const NATS_URL_ENV: &str = "NATS_URL";

/// Resolve the NATS URL: an explicit override, else `NATS_URL`, else
/// [`DEFAULT_NATS_URL`].
#[must_use]
pub fn resolve_url(explicit: Option<&str>) -> String {
    explicit.map_or_else(
        || std::env::var(NATS_URL_ENV).unwrap_or_else(|_| DEFAULT_NATS_URL.to_string()),
        str::to_string,
    )
}

/// A [`Bus`] backed by an `async-nats` client.
#[derive(Debug, Clone)]
pub struct NatsBus {
    /// The underlying NATS client.
    client: async_nats::Client,
}

impl NatsBus {
    /// Connect to NATS using the URL from the `NATS_URL` environment variable,
    /// falling back to [`DEFAULT_NATS_URL`].
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Connect`] if the connection cannot be established.
    pub async fn connect() -> Result<Self, NetError> {
        Self::connect_to(&resolve_url(None)).await
    }

    /// Connect to NATS at the specified URL.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Connect`] if the connection cannot be established.
    pub async fn connect_to(url: &str) -> Result<Self, NetError> {
        info!(url, "connecting to NATS");
        let client = async_nats::connect(url).await?;
        info!("NATS connection established");
        Ok(Self { client })
    }

    /// Returns a reference to the underlying `async-nats` client.
    #[must_use]
    pub fn client(&self) -> &async_nats::Client {
        &self.client
    }
}

#[async_trait]
impl Bus for NatsBus {
    async fn publish(&self, subject: &str, message: &Message) -> Result<(), NetError> {
        self.client
            .publish(subject.to_string(), codec::encode(message).into())
            .await?;
        Ok(())
    }

    async fn subscribe(&self, pattern: &str) -> Result<Subscription, NetError> {
        let sub = self.client.subscribe(pattern.to_string()).await?;
        Ok(sub
            .map(|msg| Envelope::new(msg.subject.to_string(), msg.payload.to_vec()))
            .boxed())
    }

    async fn close(&self) -> Result<(), NetError> {
        self.client
            .flush()
            .await
            .map_err(|e| NetError::Flush(e.to_string()))?;
        info!("NATS connection flushed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_url_wins() {
        assert_eq!(resolve_url(Some("nats://bus:4222")), "nats://bus:4222");
    }
}
