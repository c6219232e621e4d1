//! End-to-end behaviour of the decision engine over the in-memory bus.

use std::sync::Arc;
use std::time::Duration;

use flight_control::{DecisionEngine, Field, FlightState, Mode};
use flight_net::messages::{
    Actuator, ActuatorAck, ActuatorCommand, Direction, FeedbackReading, GeneratorStop, ModeSignal,
    ModeTarget, Sensor, SensorDelta, Verb,
};
use flight_net::{Bus, Envelope, MemoryBus, Message, subjects};
use flight_system::{ActorConfig, ActorRunner, MessageHandler};

fn engine_with(state: FlightState) -> (MemoryBus, Arc<DecisionEngine>) {
    let bus = MemoryBus::recording();
    let engine = Arc::new(DecisionEngine::with_state(Arc::new(bus.clone()), state));
    (bus, engine)
}

fn count(messages: &[Message], wanted: &Message) -> usize {
    messages.iter().filter(|m| *m == wanted).count()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_touchdowns_shut_down_once() {
    let state = FlightState::new()
        .with_mode(Mode::Landing)
        .with(Field::Altitude, 900)
        .with_landing_gear_deployed();
    let (bus, engine) = engine_with(state);

    let mut tasks = Vec::new();
    for _ in 0..64 {
        let engine = Arc::clone(&engine);
        tasks.push(tokio::spawn(async move {
            engine
                .on_sensor_data(&SensorDelta::new(Sensor::Altitude, Direction::Decreased, 10))
                .await;
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    for (role, subject) in [
        ("sensor", subjects::SENSOR_UPDATE),
        ("actuator", subjects::ACTUATOR_UPDATE),
    ] {
        let shutdown = Message::from(ModeSignal::new(ModeTarget::Shutdown, role));
        assert_eq!(count(&bus.published_on(subject), &shutdown), 1, "{role}");
    }
    assert!(engine.shutdown_token().is_cancelled());
    assert_eq!(engine.mode(), Mode::Shutdown);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_descent_deploys_gear_once() {
    let state = FlightState::new()
        .with_mode(Mode::Landing)
        .with(Field::Altitude, 1900);
    let (bus, engine) = engine_with(state);

    let mut tasks = Vec::new();
    for _ in 0..64 {
        let engine = Arc::clone(&engine);
        tasks.push(tokio::spawn(async move {
            engine
                .on_sensor_data(&SensorDelta::new(Sensor::Altitude, Direction::Decreased, 10))
                .await;
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let deploy = Message::from(ActuatorCommand::deploy_landing_gear());
    assert_eq!(count(&bus.published_on(subjects::ACTUATOR_UPDATE), &deploy), 1);
    assert_eq!(engine.snapshot().altitude, 1260);
    assert_eq!(engine.mode(), Mode::Landing);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_slowdown_stops_generator_once() {
    let (bus, engine) = engine_with(FlightState::new().with(Field::Speed, 8));

    let mut tasks = Vec::new();
    for _ in 0..64 {
        let engine = Arc::clone(&engine);
        tasks.push(tokio::spawn(async move {
            engine
                .on_actuator_data(&ActuatorAck::new(Actuator::EngineSpeed, Verb::Decrease, 5))
                .await;
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let stop = Message::from(GeneratorStop {
        sensor: Sensor::Speed,
    });
    assert_eq!(stop.to_string(), "shutdown speed generator");
    assert_eq!(count(&bus.published_on(subjects::SENSOR_UPDATE), &stop), 1);
    assert_eq!(engine.snapshot().speed, 5);
}

#[tokio::test]
async fn test_landing_gear_deployed_exactly_once() {
    let state = FlightState::new()
        .with_mode(Mode::Landing)
        .with(Field::Altitude, 2100);
    let (bus, engine) = engine_with(state);
    let delta = SensorDelta::new(Sensor::Altitude, Direction::Decreased, 200);

    engine.on_sensor_data(&delta).await;
    engine.on_sensor_data(&delta).await;

    let deploy = Message::from(ActuatorCommand::deploy_landing_gear());
    let commands = bus.published_on(subjects::ACTUATOR_UPDATE);
    assert_eq!(count(&commands, &deploy), 1);
    assert_eq!(deploy.to_string(), "deploy [landingGear] to 1");
}

#[tokio::test]
async fn test_no_landing_gear_while_cruising() {
    let (bus, engine) = engine_with(FlightState::new().with(Field::Altitude, 2500));
    engine
        .on_sensor_data(&SensorDelta::new(Sensor::Altitude, Direction::Decreased, 1500))
        .await;

    assert_eq!(engine.snapshot().altitude, 1000);
    let deploy = Message::from(ActuatorCommand::deploy_landing_gear());
    assert_eq!(count(&bus.published_on(subjects::ACTUATOR_UPDATE), &deploy), 0);
}

#[tokio::test]
async fn test_speed_generator_stopped_once() {
    let (bus, engine) = engine_with(FlightState::new().with(Field::Speed, 8));
    let vents = ActuatorAck::new(Actuator::Vents, Verb::Open, 10);

    engine.on_actuator_data(&vents).await;
    engine
        .on_actuator_data(&ActuatorAck::new(Actuator::EngineSpeed, Verb::Decrease, 5))
        .await;
    assert_eq!(engine.snapshot().speed, 5);

    let stop = Message::from(GeneratorStop {
        sensor: Sensor::Speed,
    });
    assert_eq!(count(&bus.published_on(subjects::SENSOR_UPDATE), &stop), 1);
}

#[tokio::test]
async fn test_malformed_messages_are_dropped() {
    let (bus, engine) = engine_with(FlightState::new());
    let before = engine.snapshot();

    for payload in [
        "",
        "altitude decreased",
        "altitude decreased lots",
        "humidity increased 5",
        "increase [rudder] by 5",
        "flapsAngle open by 3",
    ] {
        engine.handle(Envelope::new(subjects::SENSOR_DATA, payload)).await;
    }
    for payload in [
        "landingGear decrease by 5",
        "engineSpeed open by 10",
        "vents increase by 10",
    ] {
        engine.handle(Envelope::new(subjects::ACTUATOR_DATA, payload)).await;
    }
    engine
        .handle(Envelope::new(
            subjects::ACTUATOR_DATA,
            vec![0xff_u8, 0xfe, 0x00],
        ))
        .await;

    assert_eq!(engine.snapshot(), before);
    assert!(!engine.snapshot().landing_gear_deployed);
    assert_eq!(engine.stats().dropped, 10);
    assert_eq!(engine.stats().handled, 0);
    assert!(bus.published().is_empty());
}

#[tokio::test]
async fn test_oversized_acks_saturate() {
    let (bus, engine) = engine_with(FlightState::new());

    engine
        .handle(Envelope::new(
            subjects::ACTUATOR_DATA,
            "tailFlapsAngle increase by 30000000",
        ))
        .await;
    engine
        .handle(Envelope::new(
            subjects::ACTUATOR_DATA,
            "engineSpeed increase by 2147483647",
        ))
        .await;

    let snapshot = engine.snapshot();
    assert_eq!(snapshot.tail_flaps_angle, 90);
    assert_eq!(snapshot.altitude, i32::MAX);
    assert_eq!(snapshot.engine_speed, i32::MAX);
    assert_eq!(snapshot.speed, i32::MAX);
    assert_eq!(engine.stats().handled, 2);

    assert_eq!(
        bus.published_on(subjects::SENSOR_UPDATE),
        vec![
            Message::from(FeedbackReading {
                sensor: Sensor::Altitude,
                value: i32::MAX,
            }),
            Message::from(FeedbackReading {
                sensor: Sensor::Speed,
                value: i32::MAX,
            }),
        ]
    );
}

#[tokio::test]
async fn test_runner_drives_engine_to_shutdown() {
    let state = FlightState::new()
        .with(Field::Altitude, 1500)
        .with_landing_gear_deployed();
    let (bus, engine) = engine_with(state);

    let runner = ActorRunner::new(ActorConfig::new("flight_control").with_workers(4));
    let shared: Arc<dyn Bus> = Arc::new(bus.clone());
    let handler: Arc<dyn MessageHandler> = engine.clone();
    let token = engine.shutdown_token();
    let task =
        tokio::spawn(async move { runner.run(shared, subjects::ALL_DATA, handler, token).await });
    tokio::time::sleep(Duration::from_millis(20)).await;

    bus.publish(
        subjects::SENSOR_DATA,
        &Message::from(ModeSignal::new(ModeTarget::Landing, "acknowledged")),
    )
    .await
    .unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(engine.mode(), Mode::Landing);

    bus.publish_raw(subjects::SENSOR_DATA, "altitude decreased 700")
        .unwrap();

    let stats = tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("engine did not shut down")
        .unwrap()
        .unwrap();

    assert_eq!(stats.handled, 2);
    assert_eq!(engine.mode(), Mode::Shutdown);
    assert_eq!(engine.snapshot().altitude, 800);
}
