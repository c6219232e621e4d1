//! A whole flight, cruise to touchdown, on the in-memory bus.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use flight_app::cli::ActorArgs;
use flight_app::control::ControlOptions;
use flight_app::simulation::{SimulationOptions, run_simulation};
use flight_control::Mode;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_flight_lands_and_every_actor_stops() {
    let actor = ActorArgs {
        nats_url: None,
        workers: 4,
        drain_timeout_ms: 1000,
    };
    let options = SimulationOptions {
        control: ControlOptions {
            landing_after: Duration::from_millis(100),
            monitor_every: Duration::from_millis(25),
        },
        sensor_period: Duration::from_millis(5),
        seed: Some(42),
    };

    let summary = tokio::time::timeout(
        Duration::from_secs(30),
        run_simulation(&actor, options, CancellationToken::new()),
    )
    .await
    .expect("simulation did not land")
    .unwrap();

    let state = summary.control.final_state;
    assert_eq!(state.mode, Mode::Shutdown);
    assert!(state.landing_gear_deployed);
    assert!(state.altitude < 1000);

    assert!(summary.sensors.published > 0);
    assert!(summary.sensors.consumed > 0);
    assert!(summary.actuators.commands > 0);
    assert!(summary.actuators.acknowledged >= summary.actuators.commands);
    assert!(summary.control.engine.handled > 0);
    assert_eq!(summary.control.engine.publish_failures, 0);
}

#[tokio::test]
async fn test_interrupt_stops_every_actor() {
    let actor = ActorArgs {
        nats_url: None,
        workers: 2,
        drain_timeout_ms: 500,
    };
    let options = SimulationOptions {
        control: ControlOptions {
            landing_after: Duration::from_secs(3600),
            monitor_every: Duration::from_secs(3600),
        },
        sensor_period: Duration::from_millis(10),
        seed: Some(7),
    };
    let interrupt = CancellationToken::new();
    let task = tokio::spawn({
        let interrupt = interrupt.clone();
        async move { run_simulation(&actor, options, interrupt).await }
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    interrupt.cancel();

    let summary = tokio::time::timeout(Duration::from_secs(10), task)
        .await
        .expect("simulation ignored the interrupt")
        .unwrap()
        .unwrap();
    assert_eq!(summary.control.final_state.mode, Mode::Cruising);
}
