//! Startup failure, stop handling and exactly-once release.

use super::mock_link::{RecordingLink, ScriptedSensor, fast_config, journal};
use servo_common::config::SensorConfig;
use servo_common::link::{LinkError, SensorLine};
use servo_common::stop::StopToken;
use servo_control::cycle::{ControlLoop, StartupError, StepOutcome};
use servo_control::state::LoopState;
use servo_hal::SerialSensorLine;
use servo_hal::simulation::{SimulatedActuator, SimulatedButtons};
use std::thread;
use std::time::{Duration, Instant};

#[test]
fn test_open_failure_leaves_nothing_to_close() {
    let journal = journal();
    let link = RecordingLink::new(&journal)
        .failing_open(LinkError::OpenFailed("/dev/ttyUSB0: No such file or directory".to_string()));
    let sensor_journal = journal.clone();

    let result = ControlLoop::start(
        fast_config(),
        Box::new(link),
        move |_| Ok(ScriptedSensor::lines(&sensor_journal, &[]).boxed()),
        StopToken::new(),
    );

    assert!(matches!(result, Err(StartupError::ActuatorOpen(LinkError::OpenFailed(_)))));
    let journal = journal.lock().unwrap();
    assert_eq!(journal.opens, 0);
    assert_eq!(journal.actuator_closes, 0);
    assert_eq!(journal.sensor_closes, 0);
}

#[test]
fn test_sensor_device_that_is_not_a_tty_fails_startup() {
    let journal = journal();
    let not_a_tty = tempfile::NamedTempFile::new().unwrap();
    let mut config = fast_config();
    config.sensor.device = not_a_tty.path().to_path_buf();

    let result = ControlLoop::start(
        config,
        Box::new(RecordingLink::new(&journal)),
        |sensor: &SensorConfig| -> Result<Box<dyn SensorLine>, LinkError> {
            Ok(Box::new(SerialSensorLine::open(sensor)?))
        },
        StopToken::new(),
    );

    assert!(matches!(result, Err(StartupError::SensorOpen(LinkError::OpenFailed(_)))));
    // The actuator channel was already open and is released once.
    let journal = journal.lock().unwrap();
    assert_eq!(journal.opens, 1);
    assert_eq!(journal.actuator_closes, 1);
}

#[test]
fn test_stop_mid_loop_stops_within_one_iteration() {
    let journal = journal();
    let stop = StopToken::new();
    let sensor = ScriptedSensor::lines(
        &journal,
        &["BUTTON_1_PRESSED", "BUTTON_2_PRESSED", "BUTTON_1_PRESSED"],
    );
    let mut control = ControlLoop::start(
        fast_config(),
        Box::new(RecordingLink::new(&journal)),
        move |_| Ok(sensor.boxed()),
        stop.clone(),
    )
    .unwrap();

    assert!(matches!(control.step(), StepOutcome::Issued(..)));
    stop.request_stop();
    assert_eq!(control.step(), StepOutcome::Stopping);
    assert_eq!(control.state(), LoopState::Stopping);

    let stats = control.run();
    assert_eq!(control.state(), LoopState::Stopped);
    assert_eq!(stats.commands, 1);

    let journal = journal.lock().unwrap();
    assert_eq!(journal.writes.len(), 2);
    assert_eq!(journal.actuator_closes, 1);
    assert_eq!(journal.sensor_closes, 1);
}

#[test]
fn test_stop_from_another_thread_ends_run() {
    let journal = journal();
    let stop = StopToken::new();
    let sensor = ScriptedSensor::lines(&journal, &["BUTTON_1_PRESSED"]);
    let mut control = ControlLoop::start(
        fast_config(),
        Box::new(RecordingLink::new(&journal)),
        move |_| Ok(sensor.boxed()),
        stop.clone(),
    )
    .unwrap();

    let listener = stop.clone();
    let handle = thread::spawn(move || {
        thread::sleep(Duration::from_millis(30));
        listener.request_stop();
    });

    let started = Instant::now();
    let stats = control.run();
    handle.join().unwrap();

    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(stats.commands, 1);
    assert_eq!(control.state(), LoopState::Stopped);
    assert_eq!(journal.lock().unwrap().actuator_closes, 1);
}

#[test]
fn test_close_is_idempotent_across_exit_paths() {
    let journal = journal();
    let stop = StopToken::new();
    stop.request_stop();
    let sensor = ScriptedSensor::lines(&journal, &[]);
    let mut control = ControlLoop::start(
        fast_config(),
        Box::new(RecordingLink::new(&journal)),
        move |_| Ok(sensor.boxed()),
        stop,
    )
    .unwrap();

    control.run();
    control.shutdown();
    control.shutdown();
    drop(control);

    let journal = journal.lock().unwrap();
    assert_eq!(journal.actuator_closes, 1);
    assert_eq!(journal.sensor_closes, 1);
}

#[test]
fn test_drop_without_stop_releases_once() {
    let journal = journal();
    let sensor = ScriptedSensor::lines(&journal, &[]);
    let control = ControlLoop::start(
        fast_config(),
        Box::new(RecordingLink::new(&journal)),
        move |_| Ok(sensor.boxed()),
        StopToken::new(),
    )
    .unwrap();

    drop(control);
    assert_eq!(journal.lock().unwrap().actuator_closes, 1);
}

#[test]
fn test_simulation_drivers_end_to_end() {
    let stop = StopToken::new();
    let mut control = ControlLoop::start(
        fast_config(),
        Box::new(SimulatedActuator::new()),
        |_| Ok(Box::new(SimulatedButtons::new(1)) as Box<dyn SensorLine>),
        stop.clone(),
    )
    .unwrap();

    for _ in 0..4 {
        assert!(matches!(control.step(), StepOutcome::Issued(_, outcome) if outcome.is_success()));
    }
    stop.request_stop();
    let stats = control.run();

    assert_eq!(stats.commands, 4);
    assert_eq!(stats.successes, 4);
    assert_eq!(control.state(), LoopState::Stopped);
}
