//! Trigger scenarios: what the loop writes for each sensor line.

use super::mock_link::{RecordingLink, ScriptedSensor, fast_config, journal};
use servo_common::config::{ControllerConfig, MotionConfig, ProtocolVersion};
use servo_common::link::{CommFault, LinkError};
use servo_common::stop::StopToken;
use servo_common::token::Trigger;
use servo_control::cycle::{ControlLoop, StepOutcome};
use servo_control::issuer::IssueOutcome;

const SPEED: u16 = 104;
const POSITION: u16 = 116;

fn start(link: RecordingLink, sensor: ScriptedSensor) -> ControlLoop {
    start_with_config(fast_config(), link, sensor)
}

fn start_with_config(
    config: ControllerConfig,
    link: RecordingLink,
    sensor: ScriptedSensor,
) -> ControlLoop {
    ControlLoop::start(
        config,
        Box::new(link),
        move |_| Ok(sensor.boxed()),
        StopToken::new(),
    )
    .expect("startup failed")
}

#[test]
fn test_button_1_moves_to_max() {
    let journal = journal();
    let mut control = start(
        RecordingLink::new(&journal),
        ScriptedSensor::lines(&journal, &["BUTTON_1_PRESSED"]),
    );

    assert_eq!(
        control.step(),
        StepOutcome::Issued(Trigger::A, IssueOutcome::Success)
    );
    assert_eq!(journal.lock().unwrap().writes, vec![(SPEED, 100), (POSITION, 1023)]);
}

#[test]
fn test_button_2_moves_to_min() {
    let journal = journal();
    let mut control = start(
        RecordingLink::new(&journal),
        ScriptedSensor::lines(&journal, &["BUTTON_2_PRESSED"]),
    );

    assert_eq!(
        control.step(),
        StepOutcome::Issued(Trigger::B, IssueOutcome::Success)
    );
    assert_eq!(journal.lock().unwrap().writes, vec![(SPEED, 100), (POSITION, 0)]);
}

#[test]
fn test_speed_comm_failure_skips_position() {
    let journal = journal();
    let link = RecordingLink::new(&journal)
        .with_results(vec![Err(CommFault::TxFail("short write".to_string()).into())]);
    let mut control = start(link, ScriptedSensor::lines(&journal, &["BUTTON_1_PRESSED"]));

    let outcome = control.step();
    assert!(matches!(
        outcome,
        StepOutcome::Issued(
            Trigger::A,
            IssueOutcome::SpeedFailed(LinkError::CommFailure(_))
        )
    ));
    assert_eq!(journal.lock().unwrap().writes, vec![(SPEED, 100)]);
}

#[test]
fn test_position_device_error_keeps_polling() {
    let journal = journal();
    let link = RecordingLink::new(&journal).with_results(vec![Ok(()), Err(LinkError::DeviceError(5))]);
    let sensor = ScriptedSensor::lines(&journal, &["BUTTON_1_PRESSED", "BUTTON_2_PRESSED"]);
    let mut control = start(link, sensor);

    assert_eq!(
        control.step(),
        StepOutcome::Issued(
            Trigger::A,
            IssueOutcome::PositionFailed(LinkError::DeviceError(5))
        )
    );
    assert_eq!(
        control.step(),
        StepOutcome::Issued(Trigger::B, IssueOutcome::Success)
    );
    assert_eq!(
        journal.lock().unwrap().writes,
        vec![(SPEED, 100), (POSITION, 1023), (SPEED, 100), (POSITION, 0)]
    );
    assert_eq!(control.stats().position_failures, 1);
    assert_eq!(control.stats().successes, 1);
}

#[test]
fn test_heartbeat_is_ignored() {
    let journal = journal();
    let mut control = start(
        RecordingLink::new(&journal),
        ScriptedSensor::lines(&journal, &["HEARTBEAT", "BUTTON_1_PRESSED"]),
    );

    assert_eq!(control.step(), StepOutcome::Ignored("HEARTBEAT".to_string()));
    assert!(journal.lock().unwrap().writes.is_empty());
    assert!(matches!(control.step(), StepOutcome::Issued(Trigger::A, _)));
}

#[test]
fn test_malformed_line_is_unrecognized() {
    let journal = journal();
    let sensor = ScriptedSensor::new(&journal, vec![Ok(Some(vec![0xFF, 0xFE, b'\n']))]);
    let mut control = start(RecordingLink::new(&journal), sensor);

    assert!(matches!(control.step(), StepOutcome::Ignored(_)));
    assert!(journal.lock().unwrap().writes.is_empty());
}

#[test]
fn test_one_issue_per_recognized_token() {
    let tokens = [
        "BUTTON_1_PRESSED",
        "HEARTBEAT",
        "BUTTON_1_PRESSED",
        "BUTTON_2_PRESSED",
        "",
        "BUTTON_1_PRESSED ",
        "button_2_pressed",
    ];
    let journal = journal();
    let mut control = start(
        RecordingLink::new(&journal),
        ScriptedSensor::lines(&journal, &tokens),
    );

    for _ in 0..tokens.len() {
        control.step();
    }

    // Four triggers: three A (one with trailing space), one B.
    let writes = journal.lock().unwrap().writes.clone();
    let positions: Vec<u32> = writes
        .iter()
        .filter(|(addr, _)| *addr == POSITION)
        .map(|(_, value)| *value)
        .collect();
    assert_eq!(positions, vec![1023, 1023, 0, 1023]);
    assert_eq!(control.stats().commands, 4);
}

#[test]
fn test_speed_always_precedes_position() {
    let journal = journal();
    let link = RecordingLink::new(&journal).with_results(vec![
        Ok(()),
        Ok(()),
        Err(LinkError::DeviceError(2)),
        Ok(()),
        Err(CommFault::RxTimeout.into()),
    ]);
    let sensor = ScriptedSensor::lines(
        &journal,
        &["BUTTON_1_PRESSED", "BUTTON_2_PRESSED", "BUTTON_1_PRESSED", "BUTTON_2_PRESSED"],
    );
    let mut control = start(link, sensor);
    for _ in 0..4 {
        control.step();
    }

    // Every position write directly follows a speed write.
    let writes = journal.lock().unwrap().writes.clone();
    for (i, (addr, _)) in writes.iter().enumerate() {
        if *addr == POSITION {
            assert!(i > 0 && writes[i - 1].0 == SPEED, "position write at {i} not preceded by speed");
        }
    }
    let stats = control.stats();
    assert_eq!(stats.successes, 2);
    assert_eq!(stats.speed_failures, 1);
    assert_eq!(stats.position_failures, 1);
    assert_eq!(writes.len(), 7);
}

#[test]
fn test_custom_motion_and_protocol1_registers() {
    let journal = journal();
    let mut config = fast_config();
    config.bus.protocol = ProtocolVersion::V1;
    config.motion = MotionConfig {
        position_max: 800,
        position_min: 200,
        speed: 50,
    };

    let mut control = start_with_config(
        config,
        RecordingLink::new(&journal),
        ScriptedSensor::lines(&journal, &["BUTTON_1_PRESSED", "BUTTON_2_PRESSED"]),
    );
    control.step();
    control.step();

    assert_eq!(
        journal.lock().unwrap().writes,
        vec![(32, 50), (30, 800), (32, 50), (30, 200)]
    );
}

#[test]
fn test_sensor_errors_do_not_stop_the_loop() {
    let journal = journal();
    let sensor = ScriptedSensor::new(
        &journal,
        vec![
            Err(CommFault::Io("device reports readiness but returned no data".to_string()).into()),
            Err(CommFault::Io("device reports readiness but returned no data".to_string()).into()),
            Ok(Some(b"BUTTON_2_PRESSED".to_vec())),
        ],
    );
    let mut control = start(RecordingLink::new(&journal), sensor);

    assert!(matches!(control.step(), StepOutcome::SensorError(_)));
    assert!(matches!(control.step(), StepOutcome::SensorError(_)));
    assert!(matches!(control.step(), StepOutcome::Issued(Trigger::B, _)));
    assert_eq!(control.stats().sensor_errors, 2);
}
