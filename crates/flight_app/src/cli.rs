//! Command-line flags shared by every process.

use std::time::Duration;

use clap::Args;
use flight_system::ActorConfig;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Crates whose logs are shown at `info` unless `RUST_LOG` says otherwise.
const LOG_TARGETS: [&str; 5] = [
    "flight_app",
    "flight_control",
    "flight_net",
    "flight_sim",
    "flight_system",
];

/// Bus and worker flags.
#[derive(Debug, Clone, Args)]
pub struct ActorArgs {
    /// NATS server URL (defaults to `NATS_URL`, then `nats://localhost:4222`).
    #[arg(long)]
    pub nats_url: Option<String>,

    /// Maximum number of messages handled concurrently.
    #[arg(long, default_value_t = flight_system::config::DEFAULT_WORKERS)]
    pub workers: usize,

    /// How long shutdown waits for in-flight handlers, in milliseconds.
    #[arg(long, default_value_t = 5000)]
    pub drain_timeout_ms: u64,
}

impl ActorArgs {
    /// Build the actor configuration for `name`.
    #[must_use]
    pub fn config(&self, name: &str) -> ActorConfig {
        let config = ActorConfig::new(name)
            .with_workers(self.workers)
            .with_drain_timeout(Duration::from_millis(self.drain_timeout_ms));
        match &self.nats_url {
            Some(url) => config.with_nats_url(url),
            None => config,
        }
    }
}

/// Initialise structured logging for a process named `bin`.
///
/// # Errors
///
/// Returns an error if a default directive fails to parse.
pub fn init_tracing(bin: &str) -> anyhow::Result<()> {
    let mut filter = EnvFilter::from_default_env().add_directive(format!("{bin}=info").parse()?);
    for target in LOG_TARGETS {
        filter = filter.add_directive(format!("{target}=info").parse()?);
    }
    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

/// A token cancelled on Ctrl-C.
#[must_use]
pub fn interrupt_on_ctrl_c() -> CancellationToken {
    let interrupt = CancellationToken::new();
    tokio::spawn({
        let interrupt = interrupt.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                interrupt.cancel();
            }
        }
    });
    interrupt
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Debug, Parser)]
    struct Cli {
        #[command(flatten)]
        actor: ActorArgs,
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["test"]);
        let config = cli.actor.config("sensors");
        assert_eq!(config.name, "sensors");
        assert_eq!(config.workers, flight_system::config::DEFAULT_WORKERS);
        assert_eq!(config.drain_timeout, Duration::from_secs(5));
        assert!(config.nats_url.is_none());
    }

    #[test]
    fn test_overrides() {
        let cli = Cli::parse_from([
            "test",
            "--nats-url",
            "nats://bus:4222",
            "--workers",
            "2",
            "--drain-timeout-ms",
            "100",
        ]);
        let config = cli.actor.config("actuators");
        assert_eq!(config.nats_url.as_deref(), Some("nats://bus:4222"));
        assert_eq!(config.workers, 2);
        assert_eq!(config.drain_timeout, Duration::from_millis(100));
    }
}
